use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::infra::request_id::{self, REQUEST_ID_HEADER};

/// Correlation id assigned to one inbound request.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Reuses a well-formed inbound `x-request-id` or mints a uuid, makes it the
/// current id for upstream calls and echoes it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| request_id::is_acceptable(value))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = request_id::scope(request_id.clone(), next.run(request)).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Which part of the site a matched route belongs to.
fn surface(route: Option<&str>) -> &'static str {
    match route {
        Some(route) if route.starts_with("/api/") => "api",
        Some(route) if route.starts_with("/static/") => "static",
        Some(_) => "page",
        None => "unmatched",
    }
}

/// Logs 4xx as warn and 5xx as error, with the route, the request id and
/// the `ErrorReport` the handler attached.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string());
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let surface = surface(route.as_deref());
    let route = route.unwrap_or_default();
    let (source, chain) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unreported", Vec::new()),
    };
    let detail = chain.first().map(String::as_str).unwrap_or("-");

    if status.is_server_error() {
        error!(
            target = "whalefall::http::response",
            status = status.as_u16(),
            %method,
            path = %path,
            route = %route,
            surface,
            source,
            detail,
            ?chain,
            request_id = %request_id,
            elapsed_ms,
            "request failed",
        );
    } else {
        warn!(
            target = "whalefall::http::response",
            status = status.as_u16(),
            %method,
            path = %path,
            route = %route,
            surface,
            source,
            detail,
            request_id = %request_id,
            elapsed_ms,
            "request rejected",
        );
    }

    response
}
