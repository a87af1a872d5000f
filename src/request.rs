//! Pagination cursor and request URL building
//!
//! A [`Cursor`] is the resumable pagination state for one module/endpoint
//! pair: (module, method, from-index). URL construction is pure formatting
//! with no network access; the crawl loop owns all side effects.

use crate::error::Result;
use url::Url;

/// Records per page; a hard limit of the upstream API
pub const PAGE_SIZE: u32 = 200;

/// Query scope required by every Zoho CRM API call
pub const API_SCOPE: &str = "crmapi";

/// The two paginated record endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    /// Live record rows
    GetRecords,
    /// Deleted record ids
    GetDeletedRecordIds,
}

impl ApiMethod {
    /// The method's path segment
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetRecords => "getRecords",
            Self::GetDeletedRecordIds => "getDeletedRecordIds",
        }
    }
}

impl std::fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Offset-based pagination state for one module/endpoint pair
///
/// From-index starts at 1 and strictly increases by [`PAGE_SIZE`]; an
/// offset is never revisited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    module: String,
    method: ApiMethod,
    from_index: u32,
}

impl Cursor {
    /// Cursor positioned at the first page of a module
    pub fn first(module: impl Into<String>, method: ApiMethod) -> Self {
        Self {
            module: module.into(),
            method,
            from_index: 1,
        }
    }

    /// Cursor at an arbitrary offset (tests and resumption)
    pub fn at(module: impl Into<String>, method: ApiMethod, from_index: u32) -> Self {
        Self {
            module: module.into(),
            method,
            from_index,
        }
    }

    /// The module being paged
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The endpoint being paged
    pub fn method(&self) -> ApiMethod {
        self.method
    }

    /// First record index requested by this page
    pub fn from_index(&self) -> u32 {
        self.from_index
    }

    /// Last record index requested by this page
    pub fn to_index(&self) -> u32 {
        self.from_index + PAGE_SIZE - 1
    }

    /// The cursor for the next page, or `None` once the next from-index
    /// would exceed the configured ceiling.
    pub fn advance(&self, ceiling: Option<u32>) -> Option<Self> {
        let next = self.from_index + PAGE_SIZE;
        if let Some(max) = ceiling {
            if next > max {
                return None;
            }
        }
        Some(Self {
            module: self.module.clone(),
            method: self.method,
            from_index: next,
        })
    }
}

/// Build the paginated record-fetch URL for a cursor.
///
/// Includes auth token, scope, and the page window; `lastModifiedTime` is
/// appended only when an incremental filter is configured.
pub fn build_url(
    base: &str,
    cursor: &Cursor,
    auth_token: &str,
    last_modified: Option<&str>,
) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        cursor.module(),
        cursor.method()
    ))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("authtoken", auth_token)
            .append_pair("scope", API_SCOPE)
            .append_pair("fromIndex", &cursor.from_index().to_string())
            .append_pair("toIndex", &cursor.to_index().to_string());
        if let Some(ts) = last_modified {
            query.append_pair("lastModifiedTime", ts);
        }
    }
    Ok(url)
}

/// Build the one-shot module-discovery URL
pub fn discovery_url(base: &str, auth_token: &str) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}/Info/getModules",
        base.trim_end_matches('/')
    ))?;
    url.query_pairs_mut()
        .append_pair("authtoken", auth_token)
        .append_pair("scope", API_SCOPE);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, 200)]
    #[test_case(201, 400)]
    #[test_case(401, 600)]
    #[test_case(1801, 2000)]
    fn test_to_index_is_from_plus_199(from: u32, expected: u32) {
        let cursor = Cursor::at("Leads", ApiMethod::GetRecords, from);
        assert_eq!(cursor.to_index(), expected);
        assert_eq!(cursor.to_index(), from + PAGE_SIZE - 1);
    }

    #[test]
    fn test_advance_strictly_increases_by_page_size() {
        let mut cursor = Cursor::first("Leads", ApiMethod::GetRecords);
        let mut seen = vec![cursor.from_index()];
        for _ in 0..5 {
            cursor = cursor.advance(None).unwrap();
            seen.push(cursor.from_index());
        }
        assert_eq!(seen, vec![1, 201, 401, 601, 801, 1001]);
    }

    #[test]
    fn test_advance_stops_at_ceiling() {
        // Ceiling below one page: the first page is fetched, no second page
        let cursor = Cursor::first("Leads", ApiMethod::GetRecords);
        assert!(cursor.advance(Some(150)).is_none());

        // Ceiling of exactly the next from-index still allows it
        assert!(cursor.advance(Some(201)).is_some());
        assert!(cursor.advance(Some(200)).is_none());
    }

    #[test]
    fn test_build_url_contents() {
        let cursor = Cursor::first("Contacts", ApiMethod::GetRecords);
        let url = build_url(
            "https://crm.zoho.com/crm/private/json",
            &cursor,
            "token123",
            None,
        )
        .unwrap();

        assert_eq!(url.path(), "/crm/private/json/Contacts/getRecords");
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(query.contains(&("authtoken".into(), "token123".into())));
        assert!(query.contains(&("scope".into(), "crmapi".into())));
        assert!(query.contains(&("fromIndex".into(), "1".into())));
        assert!(query.contains(&("toIndex".into(), "200".into())));
        assert!(!url.query().unwrap().contains("lastModifiedTime"));
    }

    #[test]
    fn test_build_url_with_last_modified() {
        let cursor = Cursor::at("Leads", ApiMethod::GetDeletedRecordIds, 201);
        let url = build_url(
            "https://crm.zoho.com/crm/private/json/",
            &cursor,
            "t",
            Some("2016-07-11 00:00:00"),
        )
        .unwrap();

        assert_eq!(url.path(), "/crm/private/json/Leads/getDeletedRecordIds");
        let has_filter = url
            .query_pairs()
            .any(|(k, v)| k == "lastModifiedTime" && v == "2016-07-11 00:00:00");
        assert!(has_filter);
    }

    #[test]
    fn test_discovery_url() {
        let url = discovery_url("https://crm.zoho.com/crm/private/json", "t").unwrap();
        assert_eq!(url.path(), "/crm/private/json/Info/getModules");
        assert!(url.query().unwrap().contains("scope=crmapi"));
    }
}
