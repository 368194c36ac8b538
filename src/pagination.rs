use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// SortOrder
///
/// Ordering of thread listings. `Popular` ranks by the opening post's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Popular,
}

/// ListOptions
///
/// Query parameters accepted by listing endpoints (GET /threads). Values out
/// of range are clamped rather than rejected.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListOptions {
    /// 1-indexed page number.
    pub page: Option<u32>,
    /// Page size, clamped to 1..=100.
    pub per_page: Option<u32>,
    pub sort: Option<SortOrder>,
    /// Only list threads carrying this tag.
    pub tag: Option<String>,
}

impl ListOptions {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn sort(&self) -> SortOrder {
        self.sort.unwrap_or_default()
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.per_page())
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page())
    }
}

/// Page
///
/// One page of a listing plus the metadata clients need to paginate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, options: &ListOptions, total: i64) -> Self {
        let page = options.page();
        let per_page = options.per_page();
        let has_next = i64::from(page) * i64::from(per_page) < total;
        Self {
            items,
            page,
            per_page,
            total,
            has_next,
        }
    }

    pub fn empty(options: &ListOptions) -> Self {
        Self::new(Vec::new(), options, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let options = ListOptions::default();
        assert_eq!(options.page(), 1);
        assert_eq!(options.per_page(), DEFAULT_PAGE_SIZE);
        assert_eq!(options.offset(), 0);
        assert_eq!(options.sort(), SortOrder::Newest);

        let options = ListOptions {
            page: Some(0),
            per_page: Some(5_000),
            ..ListOptions::default()
        };
        assert_eq!(options.page(), 1);
        assert_eq!(options.per_page(), MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_follows_page_number() {
        let options = ListOptions {
            page: Some(3),
            per_page: Some(10),
            ..ListOptions::default()
        };
        assert_eq!(options.offset(), 20);
        assert_eq!(options.limit(), 10);
    }

    #[test]
    fn has_next_reflects_remaining_items() {
        let options = ListOptions {
            page: Some(2),
            per_page: Some(10),
            ..ListOptions::default()
        };
        assert!(Page::new(vec![0; 10], &options, 21).has_next);
        assert!(!Page::new(vec![0; 10], &options, 20).has_next);
        assert!(!Page::<u8>::empty(&options).has_next);
    }
}
