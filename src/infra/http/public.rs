use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, Query, RawQuery, State},
    http::{
        StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use crate::{
    application::{
        backend::BackendError,
        chrome::ChromeService,
        error::HttpError,
        feed::{FeedError, FeedService},
        page::PageService,
        pagination::ListingQuery,
    },
    infra::upstream::HttpBlogBackend,
    presentation::views::{
        AboutTemplate, BlogListTemplate, ErrorPageView, HomeTemplate, LabTemplate, LayoutChrome,
        LayoutContext, PageMetaView, PostDetailContext, PostTemplate, render_error_response,
        render_not_found_response, render_template_response,
    },
};

use super::RouterState;

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub pages: Arc<PageService>,
    pub chrome: Arc<ChromeService>,
    pub upstream: Arc<HttpBlogBackend>,
}

pub fn build_public_router() -> Router<RouterState> {
    Router::new()
        .route("/", get(root))
        .route("/home", get(home))
        .route("/blog", get(blog_list))
        .route("/blog/{id}", get(post_detail))
        .route("/lab", get(lab))
        .route("/about", get(about))
        .route("/static/{*path}", get(static_asset))
        .fallback(fallback)
}

async fn root() -> Redirect {
    Redirect::temporary("/home")
}

async fn home(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.load("/home");
    let content = state.feed.home_context().await;
    let view = LayoutContext::new(chrome, content);
    render_template_response(HomeTemplate { view }, StatusCode::OK)
}

async fn blog_list(State(state): State<HttpState>, Query(query): Query<ListingQuery>) -> Response {
    let chrome = state.chrome.load("/blog");
    let title = match query.tag() {
        Some(tag) => format!("#{tag}"),
        None => "Blog".to_string(),
    };
    let meta = state.chrome.page_meta(Some(&title), None, "/blog");

    let content = state.feed.blog_list_context(&query).await;
    let view = LayoutContext::new(chrome.with_meta(meta), content);
    render_template_response(BlogListTemplate { view }, StatusCode::OK)
}

async fn post_detail(State(state): State<HttpState>, Path(id): Path<String>) -> Response {
    let chrome = state.chrome.load("/blog");

    match state.feed.post_detail(&id).await {
        Ok(Some(content)) => {
            let meta = post_meta(&state.chrome, &content);
            let view = LayoutContext::new(chrome.with_meta(meta), content);
            render_template_response(PostTemplate { view }, StatusCode::OK)
        }
        Ok(None) => render_not_found_response(chrome),
        Err(err) => feed_error_to_response(err, chrome),
    }
}

async fn lab(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.load("/lab");
    let meta = state.chrome.page_meta(Some("Lab"), None, "/lab");
    let content = state.pages.lab_context().await;
    let view = LayoutContext::new(chrome.with_meta(meta), content);
    render_template_response(LabTemplate { view }, StatusCode::OK)
}

async fn about(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome.load("/about");
    let meta = state.chrome.page_meta(Some("About"), None, "/about");
    let view = LayoutContext::new(chrome.with_meta(meta), state.pages.about_context());
    render_template_response(AboutTemplate { view }, StatusCode::OK)
}

async fn fallback(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.chrome.load(""))
}

fn post_meta(chrome: &ChromeService, content: &PostDetailContext) -> PageMetaView {
    let mut meta = chrome.page_meta(Some(&content.title), Some(&content.summary), &content.href);
    meta.og_type = "article";
    meta.og_image = content.cover.clone();
    meta
}

fn feed_error_to_response(err: FeedError, chrome: LayoutChrome) -> Response {
    let status = match &err {
        FeedError::Upstream(proxy) => proxy.status(),
    };
    render_error_response(
        chrome,
        ErrorPageView::unavailable(),
        status,
        format!("post detail failed: {err}"),
    )
}

async fn static_asset(
    State(state): State<HttpState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    const SOURCE: &str = "infra::http::public::static_asset";

    if path
        .split('/')
        .any(|segment| segment == "." || segment == "..")
    {
        return HttpError::new(
            SOURCE,
            StatusCode::NOT_FOUND,
            "Not Found",
            format!("rejected asset path `{path}`"),
        )
        .into_response();
    }

    let asset = match state.upstream.fetch_asset(&path, query.as_deref()).await {
        Ok(asset) => asset,
        Err(err) => {
            let status = match &err {
                BackendError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            };
            return HttpError::from_error(SOURCE, status, "Asset unavailable", &err)
                .into_response();
        }
    };

    let mut response = Response::new(Body::from(asset.body));
    *response.status_mut() = asset.status;
    let headers = response.headers_mut();
    if let Some(content_type) = asset.content_type {
        headers.insert(CONTENT_TYPE, content_type);
    }
    if let Some(cache_control) = asset.cache_control {
        headers.insert(CACHE_CONTROL, cache_control);
    }
    response
}
