use crate::application::error::{ErrorReport, HttpError};
use crate::config::{Education, FriendLink, SponsorQr, TechCategory};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    render_error_response(
        chrome,
        ErrorPageView::not_found(),
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
}

/// Error page carrying `detail` in its report for the response logger.
pub fn render_error_response(
    chrome: LayoutChrome,
    content: ErrorPageView,
    status: StatusCode,
    detail: impl Into<String>,
) -> Response {
    let view = LayoutContext::new(chrome, content);
    let mut response = render_template_response(ErrorTemplate { view }, status);
    ErrorReport::from_message("presentation::views::render_error_response", status, detail)
        .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
    pub is_active: bool,
    pub target: Option<String>,
    pub rel: Option<String>,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn with_meta(self, meta: PageMetaView) -> Self {
        Self { meta, ..self }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub og_title: String,
    pub og_description: String,
    pub og_type: &'static str,
    pub og_image: Option<String>,
    pub canonical: String,
}

#[derive(Clone)]
pub struct TagBadge {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PostCard {
    pub href: String,
    pub title: String,
    pub summary: String,
    pub date: String,
    pub badges: Vec<TagBadge>,
    pub cover: Option<String>,
    pub author: Option<String>,
}

#[derive(Clone)]
pub struct TagSummary {
    pub label: String,
    pub href: String,
    pub count: u64,
    pub is_active: bool,
}

pub struct ProfileView {
    pub name: String,
    pub tagline: String,
    pub avatar: Option<String>,
    pub github: Option<String>,
    pub email_href: Option<String>,
}

/// Counters in the home sidebar; `None` renders a dash.
pub struct SiteStatsView {
    pub post_count: Option<u64>,
    pub tag_count: Option<u64>,
    pub running_days: i64,
}

impl SiteStatsView {
    pub fn post_count_label(&self) -> String {
        count_label(self.post_count)
    }

    pub fn tag_count_label(&self) -> String {
        count_label(self.tag_count)
    }
}

fn count_label(value: Option<u64>) -> String {
    value.map_or_else(|| "–".to_string(), |v| v.to_string())
}

pub struct HomeContext {
    pub profile: ProfileView,
    pub announcement: String,
    pub recent_posts: Vec<PostCard>,
    pub recent_failed: bool,
    pub tags: Vec<TagSummary>,
    pub stats: SiteStatsView,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub view: LayoutContext<HomeContext>,
}

pub struct PageLinkView {
    pub label: String,
    pub href: String,
    pub is_current: bool,
    pub is_ellipsis: bool,
}

pub struct PaginationView {
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub links: Vec<PageLinkView>,
    pub page: u32,
    pub total_pages: u32,
}

pub struct BlogListContext {
    pub posts: Vec<PostCard>,
    pub has_results: bool,
    pub load_failed: bool,
    pub search: String,
    pub active_tag: Option<String>,
    pub tags: Vec<TagSummary>,
    pub recent_posts: Vec<PostCard>,
    pub recent_failed: bool,
    pub total: u64,
    pub pagination: Option<PaginationView>,
}

#[derive(Template)]
#[template(path = "blog.html")]
pub struct BlogListTemplate {
    pub view: LayoutContext<BlogListContext>,
}

#[derive(Clone)]
pub struct TocEntryView {
    pub anchor: String,
    pub title: String,
    pub level: u8,
    pub indent: u8,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct PostTocView {
    pub entries: Vec<TocEntryView>,
}

pub struct PostDetailContext {
    pub id: String,
    pub href: String,
    pub title: String,
    pub date: String,
    pub summary: String,
    pub author: Option<String>,
    pub cover: Option<String>,
    pub badges: Vec<TagBadge>,
    pub body_html: String,
    pub toc: Option<PostTocView>,
    pub ld_json: String,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeTone {
    Healthy,
    Elevated,
    Critical,
}

impl GaugeTone {
    pub fn for_percent(percent: f64) -> Self {
        if percent < 50.0 {
            GaugeTone::Healthy
        } else if percent < 80.0 {
            GaugeTone::Elevated
        } else {
            GaugeTone::Critical
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            GaugeTone::Healthy => "gauge--healthy",
            GaugeTone::Elevated => "gauge--elevated",
            GaugeTone::Critical => "gauge--critical",
        }
    }
}

pub struct GaugeView {
    pub label: &'static str,
    pub percent: String,
    pub width: String,
    pub tone_class: &'static str,
}

impl GaugeView {
    pub fn new(label: &'static str, percent: f64) -> Self {
        let clamped = percent.clamp(0.0, 100.0);
        Self {
            label,
            percent: format!("{percent:.1}"),
            width: format!("{clamped:.1}%"),
            tone_class: GaugeTone::for_percent(percent).css_class(),
        }
    }
}

pub struct ProjectView {
    pub title: String,
    pub description: String,
    pub href: Option<String>,
    pub tags: Vec<String>,
    pub icon: String,
}

pub struct LabContext {
    pub gauges: Vec<GaugeView>,
    pub status_failed: bool,
    pub projects: Vec<ProjectView>,
}

#[derive(Template)]
#[template(path = "lab.html")]
pub struct LabTemplate {
    pub view: LayoutContext<LabContext>,
}

pub struct AboutContext {
    pub education: Vec<Education>,
    pub tech_stack: Vec<TechCategory>,
    pub friend_links: Vec<FriendLink>,
    pub sponsors: Vec<SponsorQr>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub view: LayoutContext<AboutContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try returning to the homepage to continue exploring.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            title: "Temporarily Unavailable".to_string(),
            message: "This content could not be loaded right now. Please try again in a moment."
                .to_string(),
            primary_action: Some(ErrorAction::blog()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/home".to_string(),
            label: "Back to home".to_string(),
        }
    }

    pub fn blog() -> Self {
        Self {
            href: "/blog".to_string(),
            label: "Browse all posts".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

pub fn build_tag_badges<'a, T>(tags: T) -> Vec<TagBadge>
where
    T: IntoIterator<Item = &'a String>,
{
    tags.into_iter()
        .map(|tag| TagBadge {
            label: format!("#{tag}"),
            href: format!("/blog?tag={}", encode_query_value(tag)),
        })
        .collect()
}

pub fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Site-relative address of a post page.
pub fn post_href(id: &str) -> String {
    format!("/blog/{}", encode_query_value(id))
}
