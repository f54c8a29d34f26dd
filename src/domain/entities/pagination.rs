use std::collections::HashMap;

use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl Pagination {
    /// Reads `page` and `limit` from query parameters. Missing, malformed or
    /// zero values fall back to the defaults; `limit` is capped at `MAX_LIMIT`.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let page = query.get("page")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(DEFAULT_PAGE);

        let limit = query.get("limit")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&l| l >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        Pagination { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * (self.limit as i64)
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total_docs: i64,
    pub total_pages: i64,
    /// 0 when there is no next page.
    pub next_page: i64,
    /// 0 when there is no previous page.
    pub prev_page: i64,
}

impl PageMeta {
    pub fn new(pagination: Pagination, total_docs: i64) -> Self {
        let limit = pagination.limit.max(1) as i64;
        let page = pagination.page as i64;
        let total_pages = (total_docs + limit - 1) / limit;

        PageMeta {
            page: pagination.page,
            limit: pagination.limit,
            total_docs,
            total_pages,
            next_page: if page < total_pages { page + 1 } else { 0 },
            prev_page: if page > 1 { page - 1 } else { 0 },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn falls_back_to_defaults() {
        assert_eq!(Pagination::from_query(&query(&[])), Pagination::default());
        assert_eq!(
            Pagination::from_query(&query(&[("page", "0"), ("limit", "abc")])),
            Pagination { page: 1, limit: 10 }
        );
    }

    #[test]
    fn caps_limit() {
        let p = Pagination::from_query(&query(&[("page", "3"), ("limit", "500")]));
        assert_eq!(p, Pagination { page: 3, limit: MAX_LIMIT });
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn meta_links_pages() {
        let meta = PageMeta::new(Pagination { page: 2, limit: 10 }, 25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.next_page, 3);
        assert_eq!(meta.prev_page, 1);

        let last = PageMeta::new(Pagination { page: 3, limit: 10 }, 25);
        assert_eq!(last.next_page, 0);

        let empty = PageMeta::new(Pagination::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.next_page, 0);
        assert_eq!(empty.prev_page, 0);
    }

    #[test]
    fn meta_serializes_camel_case() {
        let json = serde_json::to_value(PageMeta::new(Pagination::default(), 4)).unwrap();
        assert_eq!(json["totalDocs"], 4);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["nextPage"], 0);
    }
}
