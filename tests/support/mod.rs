#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::HeaderMap},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;
use whalefall::{
    application::{blog::BlogService, chrome::ChromeService, feed::FeedService, page::PageService},
    config::{SiteSettings, UpstreamSettings},
    infra::{
        http::{ApiState, HttpState, RouterState, build_router},
        upstream::HttpBlogBackend,
    },
};

pub const PAGE_SIZE: u32 = 10;
pub const RECENT_LIMIT: u32 = 5;

/// Full router wired against `base` as the backend origin.
pub fn app(base: Option<&str>) -> Router {
    let settings = UpstreamSettings {
        base_url: base.map(|b| Url::parse(b).expect("mock url")),
        timeout: Duration::from_secs(5),
    };
    let upstream = Arc::new(HttpBlogBackend::new(&settings).expect("upstream client"));
    let site = Arc::new(SiteSettings::default());
    let blog = BlogService::new(upstream.clone(), RECENT_LIMIT);

    build_router(RouterState {
        http: HttpState {
            feed: Arc::new(FeedService::new(blog.clone(), site.clone(), PAGE_SIZE)),
            pages: Arc::new(PageService::new(blog.clone(), site.clone())),
            chrome: Arc::new(ChromeService::new(site)),
            upstream,
        },
        api: ApiState { blog },
    })
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}

pub async fn get(app: Router, uri: &str) -> TestResponse {
    get_with_headers(app, uri, &[]).await
}

pub async fn get_with_headers(app: Router, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::empty()).expect("request should build");
    let response = app.oneshot(request).await.expect("router should respond");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();

    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}
