//! Customer/person import from a semicolon separated export
//!
//! Every line creates a customer, a person, and the employee link between
//! the two. A failing line is logged and skipped; the run continues.

pub mod clean;
pub mod row;

pub use clean::clean;
pub use row::ImportRow;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use serde_json::json;
use std::borrow::Cow;
use std::time::Duration;

use crate::api::{Entity, ListQuery, Session};

/// Import settings
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Role assigned to every person on the customer's employee list
    pub employee_role_id: String,
    /// Data lines to skip after the header
    pub skip: usize,
    /// Pause between lines
    pub delay: Duration,
}

impl ImportOptions {
    pub fn new(employee_role_id: impl Into<String>) -> Self {
        Self {
            employee_role_id: employee_role_id.into(),
            skip: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Ids created for one imported line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRow {
    pub line: usize,
    pub customer_id: String,
    pub person_id: String,
}

/// Outcome of an import run
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: Vec<ImportedRow>,
    /// (line number, error message)
    pub failed: Vec<(usize, String)>,
    pub skipped: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.imported.len() + self.failed.len()
    }
}

/// Import every data line of the raw file `content`
///
/// Line numbers are 0-based with the header at 0, so `skip = 131` resumes
/// at line 132. Lines are decoded one at a time, see [`decode_line`].
pub async fn run(session: &Session, content: &[u8], options: &ImportOptions) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for (index, raw) in split_lines(content).enumerate() {
        if index == 0 {
            continue;
        }
        if index <= options.skip {
            summary.skipped += 1;
            continue;
        }
        let line = decode_line(raw);
        if line.trim().is_empty() {
            continue;
        }

        info!("Importing line {}", index);
        match import_line(session, &line, &options.employee_role_id).await {
            Ok((customer_id, person_id)) => {
                info!(
                    "Line {}: customer {} linked to person {}",
                    index, customer_id, person_id
                );
                summary.imported.push(ImportedRow {
                    line: index,
                    customer_id,
                    person_id,
                });
            }
            Err(e) => {
                warn!("Line {} failed: {:#}", index, e);
                summary.failed.push((index, format!("{:#}", e)));
            }
        }

        if !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    summary
}

/// Split on `\n`, dropping a trailing `\r`
fn split_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    content
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

/// Windows-1252 code points for bytes 0x80..=0x9F; unassigned bytes map to
/// their Latin-1 control character
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}',
    '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}',
    '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}',
    '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}',
    '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// UTF-8 when the line is valid UTF-8, otherwise Windows-1252
///
/// Exports are mostly UTF-8 but older ones were saved from Excel on Windows;
/// decoding per line keeps one legacy line from failing the whole file.
pub fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(raw) {
        Ok(line) => Cow::Borrowed(line),
        Err(_) => Cow::Owned(
            raw.iter()
                .map(|&b| match b {
                    0x80..=0x9F => CP1252_HIGH[usize::from(b - 0x80)],
                    _ => char::from(b),
                })
                .collect(),
        ),
    }
}

/// Create customer, person and the employee link for one line
async fn import_line(
    session: &Session,
    line: &str,
    employee_role_id: &str,
) -> Result<(String, String)> {
    let row = ImportRow::parse(line)?;

    let customer = create(session, "customers", &row.customer_payload())
        .await
        .context("Creating customer")?;
    let person = create(session, "persons", &row.person_payload())
        .await
        .context("Creating person")?;

    let customer_id = customer.id().ok_or_else(|| anyhow!("Customer has no id"))?;
    let person_id = person.id().ok_or_else(|| anyhow!("Person has no id"))?;

    let link = json!({
        "customer_email": person.get_str("email_private").unwrap_or(row.email.as_str()),
        "customer_phone": person.get_str("phone_number_private").unwrap_or(row.phone.as_str()),
        "customer_role_id": employee_role_id,
    });
    let endpoint = format!("customers/{}/employees/{}", customer_id, person_id);
    session
        .post(&endpoint, &link, &ListQuery::new())
        .await
        .context("Attaching person to customer")?;

    Ok((customer_id, person_id))
}

async fn create(session: &Session, endpoint: &str, data: &serde_json::Value) -> Result<Entity> {
    Entity::create(session, endpoint, data, &[])
        .await?
        .ok_or_else(|| anyhow!("{} did not return a record", endpoint))
}
