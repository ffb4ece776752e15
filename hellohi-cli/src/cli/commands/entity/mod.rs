//! Record commands: get, list, search, create, update, delete

pub mod handler;

use clap::Args;

use hellohi_cli::api::ListQuery;
use hellohi_cli::api::constants::{DEFAULT_PAGE, DEFAULT_PER_PAGE};

/// Relation includes and paging shared by read commands
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Relations to embed, comma separated
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Records per page
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    pub per_page: u32,

    /// Page number (1-based)
    #[arg(long, default_value_t = DEFAULT_PAGE)]
    pub page: u32,
}

impl PageArgs {
    pub fn to_query(&self) -> ListQuery {
        ListQuery::with_includes(self.include.iter().cloned())
            .per_page(self.per_page)
            .page(self.page)
    }
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Resource path, e.g. `customers`
    pub endpoint: String,
    pub id: String,

    /// Relations to embed, comma separated
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    pub endpoint: String,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    pub endpoint: String,

    /// Filters as key=value
    #[arg(required = true, value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    pub endpoint: String,

    /// Attributes as a JSON object
    pub json: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub endpoint: String,
    pub id: String,

    /// Changed attributes as a JSON object
    pub json: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub endpoint: String,
    pub id: String,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}
