//! HelloHi API constants

/// Default page size the API uses when no `limit` is given
pub const DEFAULT_PER_PAGE: u32 = 15;

/// First page number (pages are 1-based)
pub const DEFAULT_PAGE: u32 = 1;

/// Per-call timeout applied to every request unless configured otherwise
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tokens are refreshed this many seconds before they actually expire
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 30;

/// Marker field that identifies a JSON object as a resource record
pub const OBJECT_MARKER: &str = "object";

/// Envelope key wrapping the actual payload
pub const DATA_KEY: &str = "data";

/// Search endpoints live under this prefix: `search/<resource>`
pub const SEARCH_PREFIX: &str = "search";

/// HTTP headers
pub mod headers {
    pub const TENANT: &str = "X-Tenant";
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const ACCEPT_JSON: &str = "application/json";
}

/// Multipart endpoints
pub mod endpoints {
    pub const DOSSIER_ITEMS: &str = "dossier_items";
    pub const TASKS: &str = "tasks";
    pub const WEBSHOP: &str = "webshop";
}
