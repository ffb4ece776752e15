//! List query parameters and request URL construction

use urlencoding::encode;

use super::constants::{DEFAULT_PAGE, DEFAULT_PER_PAGE, SEARCH_PREFIX};

/// Relations to include plus limit/page for a request
///
/// Every request carries `limit` and `page`; `include` is only sent when at
/// least one relation is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub includes: Vec<String>,
    pub per_page: u32,
    pub page: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            includes: Vec::new(),
            per_page: DEFAULT_PER_PAGE,
            page: DEFAULT_PAGE,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query with relations to include and default paging
    pub fn with_includes<I, S>(includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().includes(includes)
    }

    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.includes.push(relation.into());
        self
    }

    pub fn includes<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes.extend(relations.into_iter().map(Into::into));
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Append `include`, `limit` and `page` to `url`
    pub fn apply_to(&self, url: &str) -> String {
        let sign = if url.contains('?') { '&' } else { '?' };

        if self.includes.is_empty() {
            format!("{}{}limit={}&page={}", url, sign, self.per_page, self.page)
        } else {
            format!(
                "{}{}include={}&limit={}&page={}",
                url,
                sign,
                self.includes.join(","),
                self.per_page,
                self.page
            )
        }
    }
}

/// `{base_url}/{endpoint}` followed by the query parameters
pub fn build_url(base_url: &str, endpoint: &str, query: &ListQuery) -> String {
    let url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    );
    query.apply_to(&url)
}

/// `search/{endpoint}?k=v&...` with keys and values URL-encoded
pub fn search_endpoint<K, V>(endpoint: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let path = format!("{}/{}", SEARCH_PREFIX, endpoint.trim_matches('/'));
    if params.is_empty() {
        return path;
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key.as_ref()), encode(value.as_ref())))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", path, query)
}
