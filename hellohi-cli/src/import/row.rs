//! One customer line of the export

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use super::clean::clean;

/// Remote ids from this value on belong to companies
pub const BUSINESS_ID_THRESHOLD: i64 = 10105;

/// Number of columns a line needs (phone is the last one used)
const MIN_COLUMNS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub remote_id: i64,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub email: String,
    pub phone: String,
}

impl ImportRow {
    /// Clean a raw line and split it into columns
    pub fn parse(line: &str) -> Result<Self> {
        let cleaned = clean(line);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(cleaned.trim().as_bytes());

        let record = match reader.records().next() {
            Some(record) => record.context("Failed to split line")?,
            None => bail!("Empty line"),
        };
        if record.len() < MIN_COLUMNS {
            bail!(
                "Expected at least {} columns, found {}",
                MIN_COLUMNS,
                record.len()
            );
        }

        let column = |index: usize| record.get(index).unwrap_or_default().to_string();
        let remote_id = column(0)
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Remote id is not a number: '{}'", column(0)))?;

        Ok(Self {
            remote_id,
            name: column(1),
            address: column(2),
            postal_code: column(3),
            city: capitalize(&column(4)),
            email: column(6),
            phone: column(7).replace(' ', ""),
        })
    }

    /// `business` for company ids, `person` otherwise
    pub fn customer_type(&self) -> &'static str {
        if self.remote_id >= BUSINESS_ID_THRESHOLD {
            "business"
        } else {
            "person"
        }
    }

    /// Split the full name into (first, last): the last word is the last
    /// name, each part falls back to the other when empty
    pub fn split_name(&self) -> (String, String) {
        let words: Vec<&str> = self.name.split(' ').collect();
        let (last, rest) = match words.split_last() {
            Some((last, rest)) => (last.to_string(), rest.join(" ")),
            None => (String::new(), String::new()),
        };

        let first = if rest.is_empty() { last.clone() } else { rest };
        let last = if last.is_empty() { first.clone() } else { last };
        (first, last)
    }

    pub fn customer_payload(&self) -> Value {
        json!({
            "name": self.name,
            "status": "customer",
            "type": self.customer_type(),
            "address": self.address,
            "postal_code": self.postal_code,
            "city": self.city,
            "email": self.email,
            "phone": self.phone,
        })
    }

    pub fn person_payload(&self) -> Value {
        let (first_name, last_name) = self.split_name();
        json!({
            "first_name": first_name,
            "last_name": last_name,
            "address": self.address,
            "postal_code": self.postal_code,
            "city": self.city,
            "email_private": self.email,
            "phone_number_private": self.phone,
        })
    }
}

/// First letter upper case, the rest lower case
fn capitalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
