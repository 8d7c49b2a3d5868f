//! Numbered pagination for the blog listing.
//!
//! Page state lives in the URL (`?page=N`) so navigating back restores the
//! page that was on screen.

use serde::{Deserialize, Serialize};

/// Pages shown on each side of the current one.
pub const NEIGHBOR_WINDOW: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum PageToken {
    Page(u32),
    Ellipsis,
}

/// Total number of pages for `total` items; never less than one.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Tokens rendered by the pagination control.
///
/// The first page, the window around `page`, and the last page are always
/// present; gaps between them collapse to a single ellipsis.
pub fn page_tokens(page: u32, total_pages: u32) -> Vec<PageToken> {
    let total_pages = total_pages.max(1);
    let page = page.clamp(1, total_pages);

    let mut tokens = vec![PageToken::Page(1)];

    let start = page.saturating_sub(NEIGHBOR_WINDOW).max(2);
    let end = page.saturating_add(NEIGHBOR_WINDOW).min(total_pages - 1);

    if start > 2 {
        tokens.push(PageToken::Ellipsis);
    }
    for number in start..=end {
        tokens.push(PageToken::Page(number));
    }
    if end < total_pages.saturating_sub(1) {
        tokens.push(PageToken::Ellipsis);
    }
    if total_pages > 1 {
        tokens.push(PageToken::Page(total_pages));
    }

    tokens
}

/// Query parameters understood by the listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl ListingQuery {
    /// Requested page; anything unparsable or below one reads as page one.
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    pub fn search(&self) -> Option<&str> {
        non_blank(self.q.as_deref())
    }

    pub fn tag(&self) -> Option<&str> {
        non_blank(self.tag.as_deref())
    }

    /// Upstream list parameters for this query.
    pub fn upstream_params(&self, page_size: u32) -> Vec<(String, String)> {
        list_params(self.page(), page_size, self.search(), self.tag())
    }

    /// Listing URL for `page`, keeping the active filters.
    pub fn href_for_page(&self, page: u32) -> String {
        let mut url = format!("/blog?page={page}");
        if let Some(q) = self.search() {
            url.push_str("&q=");
            url.push_str(&encode_component(q));
        }
        if let Some(tag) = self.tag() {
            url.push_str("&tag=");
            url.push_str(&encode_component(tag));
        }
        url
    }
}

/// `page_no`/`page_size` plus the optional title and tag filters.
pub fn list_params(
    page: u32,
    page_size: u32,
    title: Option<&str>,
    tag: Option<&str>,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("page_no".to_string(), page.to_string()),
        ("page_size".to_string(), page_size.to_string()),
    ];
    if let Some(title) = title {
        params.push(("filter_title".to_string(), title.to_string()));
    }
    if let Some(tag) = tag {
        params.push(("filter_tag".to_string(), tag.to_string()));
    }
    params
}

/// Everything the pagination control needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    pub page: u32,
    pub total_pages: u32,
    pub tokens: Vec<PageToken>,
}

impl Pager {
    pub fn new(page: u32, total: u64, page_size: u32) -> Self {
        let total_pages = total_pages(total, page_size);
        let page = page.clamp(1, total_pages);
        Self {
            page,
            total_pages,
            tokens: page_tokens(page, total_pages),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn previous(&self) -> Option<u32> {
        self.has_previous().then(|| self.page - 1)
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next().then(|| self.page + 1)
    }

    /// Single-page listings render no control at all.
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
