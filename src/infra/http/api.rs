//! Same-origin JSON routes proxying the blog backend.

use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use whalefall_api_types::{ApiResponse, BlogPost};

use crate::application::{
    blog::{BlogService, ProxyError},
    error::ErrorReport,
};

use super::RouterState;

#[derive(Clone)]
pub struct ApiState {
    pub blog: BlogService,
}

pub fn build_api_router() -> Router<RouterState> {
    Router::new()
        .route("/api/blog", get(list_blogs))
        .route("/api/blog/recent", get(recent_blogs))
        .route("/api/blog/{id}", get(get_blog))
        .route("/api/tags", get(list_tags))
        .route("/api/stats", get(site_stats))
        .route("/api/system/stats", get(system_stats))
        .layer(middleware::map_response(no_store))
}

async fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Failure envelope for a proxied read.
#[derive(Debug)]
pub struct ApiError(ProxyError);

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let body: ApiResponse<()> = ApiResponse::failure(self.0.message());
        let mut response = (status, Json(body)).into_response();
        ErrorReport::from_error("infra::http::api", status, &self.0).attach(&mut response);
        response
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

/// Inbound query pairs in arrival order.
fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}

async fn list_blogs(
    State(state): State<ApiState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, ApiError> {
    let page = state.blog.list_blogs(&query_pairs(raw.as_deref())).await?;
    let body: ApiResponse<Vec<BlogPost>> = ApiResponse::ok_with_total(page.posts, page.total);
    Ok((StatusCode::OK, Json(body)).into_response())
}

async fn get_blog(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(ok(state.blog.get_blog(&id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecentQuery {
    limit: Option<String>,
}

async fn recent_blogs(
    State(state): State<ApiState>,
    Query(query): Query<RecentQuery>,
) -> Result<Response, ApiError> {
    Ok(ok(state.blog.recent_blogs(query.limit.as_deref()).await?))
}

async fn list_tags(State(state): State<ApiState>) -> Result<Response, ApiError> {
    Ok(ok(state.blog.list_tags().await?))
}

async fn site_stats(State(state): State<ApiState>) -> Result<Response, ApiError> {
    Ok(ok(state.blog.site_stats().await?))
}

async fn system_stats(State(state): State<ApiState>) -> Result<Response, ApiError> {
    Ok(ok(state.blog.system_stats().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_keep_order_and_decode() {
        let pairs = query_pairs(Some("page_no=2&filter_title=rust+%26+go&order=desc"));
        assert_eq!(
            pairs,
            vec![
                ("page_no".to_string(), "2".to_string()),
                ("filter_title".to_string(), "rust & go".to_string()),
                ("order".to_string(), "desc".to_string()),
            ]
        );
        assert!(query_pairs(None).is_empty());
    }
}
