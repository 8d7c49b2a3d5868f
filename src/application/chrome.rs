use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::{NavLink, SiteSettings};
use crate::presentation::views::{
    BrandView, FooterView, LayoutChrome, NavigationLinkView, NavigationView, PageMetaView,
};

const HOME_HREF: &str = "/home";

/// Builds the header, footer and default meta shared by every page shell.
#[derive(Clone)]
pub struct ChromeService {
    site: Arc<SiteSettings>,
}

impl ChromeService {
    pub fn new(site: Arc<SiteSettings>) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &SiteSettings {
        &self.site
    }

    /// Chrome for the page at `current_path`, used to mark the active tab.
    pub fn load(&self, current_path: &str) -> LayoutChrome {
        let entries = self
            .site
            .navigation
            .iter()
            .map(|link| map_navigation_link(link, current_path))
            .collect();

        LayoutChrome {
            brand: BrandView {
                title: self.site.title.clone(),
                href: HOME_HREF.to_string(),
            },
            navigation: NavigationView { entries },
            footer: FooterView {
                copy: format!(
                    "© {} {}. All rights reserved.",
                    OffsetDateTime::now_utc().year(),
                    self.site.profile.name
                ),
            },
            meta: self.page_meta(None, None, current_path),
        }
    }

    /// Page meta; `None` fields fall back to the site title and description.
    pub fn page_meta(
        &self,
        page_title: Option<&str>,
        description: Option<&str>,
        canonical: &str,
    ) -> PageMetaView {
        let title = match page_title {
            Some(page) if !page.trim().is_empty() => format!("{page} | {}", self.site.title),
            _ => self.site.title.clone(),
        };
        let description = description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.site.description)
            .to_string();

        PageMetaView {
            og_title: page_title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(&self.site.title)
                .to_string(),
            og_description: description.clone(),
            og_type: "website",
            og_image: None,
            canonical: canonical.to_string(),
            title,
            description,
        }
    }
}

fn map_navigation_link(link: &NavLink, current_path: &str) -> NavigationLinkView {
    if is_external(&link.href) {
        return NavigationLinkView {
            label: link.label.clone(),
            href: link.href.clone(),
            is_active: false,
            target: Some("_blank".to_string()),
            rel: Some("noopener noreferrer".to_string()),
        };
    }

    NavigationLinkView {
        label: link.label.clone(),
        href: link.href.clone(),
        is_active: is_active_path(&link.href, current_path),
        target: None,
        rel: None,
    }
}

fn is_external(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}

fn is_active_path(href: &str, current_path: &str) -> bool {
    let href = href.trim_end_matches('/');
    if href.is_empty() {
        return current_path == "/";
    }
    current_path == href
        || current_path
            .strip_prefix(href)
            .is_some_and(|rest| rest.starts_with('/'))
}
