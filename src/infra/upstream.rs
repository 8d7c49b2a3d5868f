//! reqwest-backed client for the external blog backend.

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::application::backend::{BackendError, BlogBackend};
use crate::config::UpstreamSettings;
use crate::domain::wire::{
    BackendStatsData, BackendSystemStatus, BackendTagsData, Envelope, GetBlogData, ListBlogsData,
    RecentBlogsData,
};

use super::error::InfraError;
use super::request_id::{self, REQUEST_ID_HEADER};

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Body of a proxied static asset.
#[derive(Debug, Clone)]
pub struct UpstreamAsset {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub cache_control: Option<HeaderValue>,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct HttpBlogBackend {
    client: Client,
    base_url: Option<Url>,
}

impl HttpBlogBackend {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(concat!("whalefall/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::client(err.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// `{origin}/{segments...}?{query}`; every segment is percent-encoded on its own.
    fn endpoint_url<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
        query: &[(String, String)],
    ) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone().ok_or(BackendError::NotConfigured)?;

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| BackendError::NotConfigured)?;
            path.pop_if_empty();
            path.extend(segments);
        }

        url.set_query(None);
        url.set_fragment(None);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// GET carrying the current request id, when one is in scope.
    fn get(&self, url: Url) -> RequestBuilder {
        let request = self.client.get(url);
        match request_id::current() {
            Some(id) => request.header(REQUEST_ID_HEADER, id),
            None => request,
        }
    }

    fn api_url(&self, path: &[&str], query: &[(String, String)]) -> Result<Url, BackendError> {
        self.endpoint_url(API_PREFIX.iter().copied().chain(path.iter().copied()), query)
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: Result<Url, BackendError>,
    ) -> Result<Envelope<T>, BackendError> {
        let started = Instant::now();
        let result = match url {
            Ok(url) => self.fetch_envelope(url).await,
            Err(err) => Err(err),
        };

        let outcome = match &result {
            Ok(envelope) if envelope.is_ok() => "ok",
            Ok(_) => "rejected",
            Err(err) => err.kind(),
        };
        metrics::counter!(
            "whalefall_upstream_requests_total",
            "endpoint" => endpoint,
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("whalefall_upstream_latency_ms", "endpoint" => endpoint)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        debug!(
            target = "infra::upstream::HttpBlogBackend",
            endpoint,
            outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream request finished"
        );

        result
    }

    async fn fetch_envelope<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Envelope<T>, BackendError> {
        let response = self
            .get(url)
            .send()
            .await
            .map_err(BackendError::transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(BackendError::transport)?;

        // An error status with a parseable envelope still carries the
        // upstream message, so the body wins over the status line.
        match serde_json::from_slice::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(BackendError::Status {
                status: status.as_u16(),
            }),
            Err(err) => Err(BackendError::decode(err)),
        }
    }

    /// Fetch `{origin}/static/{path}` as-is.
    pub async fn fetch_asset(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> Result<UpstreamAsset, BackendError> {
        let mut url = self.endpoint_url(
            std::iter::once("static").chain(path.split('/').filter(|s| !s.is_empty())),
            &[],
        )?;
        url.set_query(query.filter(|q| !q.is_empty()));

        let response = self
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("*/*"))
            .send()
            .await
            .map_err(BackendError::transport)?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let cache_control = response.headers().get(CACHE_CONTROL).cloned();
        let body = response.bytes().await.map_err(BackendError::transport)?;

        Ok(UpstreamAsset {
            status,
            content_type,
            cache_control,
            body,
        })
    }
}

#[async_trait]
impl BlogBackend for HttpBlogBackend {
    async fn list_blogs(
        &self,
        query: &[(String, String)],
    ) -> Result<Envelope<ListBlogsData>, BackendError> {
        self.get_envelope("blogs", self.api_url(&["blogs"], query))
            .await
    }

    async fn get_blog(&self, id: &str) -> Result<Envelope<GetBlogData>, BackendError> {
        self.get_envelope("blog", self.api_url(&["blogs", id], &[]))
            .await
    }

    async fn recent_blogs(&self, limit: &str) -> Result<Envelope<RecentBlogsData>, BackendError> {
        let query = [("limit".to_string(), limit.to_string())];
        self.get_envelope("recent_blogs", self.api_url(&["blogs", "recent"], &query))
            .await
    }

    async fn list_tags(&self) -> Result<Envelope<BackendTagsData>, BackendError> {
        self.get_envelope("tags", self.api_url(&["tags"], &[])).await
    }

    async fn site_stats(&self) -> Result<Envelope<BackendStatsData>, BackendError> {
        self.get_envelope("stats", self.api_url(&["stats"], &[])).await
    }

    async fn system_stats(&self) -> Result<Envelope<BackendSystemStatus>, BackendError> {
        self.get_envelope("system_stats", self.api_url(&["system", "stats"], &[]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn backend(base: Option<&str>) -> HttpBlogBackend {
        HttpBlogBackend::new(&UpstreamSettings {
            base_url: base.map(|b| Url::parse(b).expect("url")),
            timeout: Duration::from_secs(5),
        })
        .expect("client")
    }

    #[test]
    fn ids_are_encoded_as_a_single_segment() {
        let url = backend(Some("http://backend:8080"))
            .api_url(&["blogs", "a/b c"], &[])
            .expect("url");
        assert_eq!(url.as_str(), "http://backend:8080/api/v1/blogs/a%2Fb%20c");
    }

    #[test]
    fn base_path_and_query_are_preserved() {
        let query = vec![
            ("page_no".to_string(), "2".to_string()),
            ("filter_title".to_string(), "rust & go".to_string()),
        ];
        let url = backend(Some("https://example.com/backend/"))
            .api_url(&["blogs"], &query)
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://example.com/backend/api/v1/blogs?page_no=2&filter_title=rust+%26+go"
        );
    }

    #[tokio::test]
    async fn current_request_id_is_forwarded() {
        let server = httpmock::MockServer::start();
        let tagged = server.mock(|when, then| {
            when.method("GET")
                .path("/api/v1/tags")
                .header("x-request-id", "req-42");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"code":"OK","data":{"items":[]}}"#);
        });

        let backend = backend(Some(&server.base_url()));
        let envelope = request_id::scope("req-42".to_string(), backend.list_tags())
            .await
            .expect("tags");

        tagged.assert();
        assert!(envelope.is_ok());
    }

    #[test]
    fn unconfigured_origin_fails_every_url() {
        let backend = backend(None);
        assert!(!backend.is_configured());
        assert!(matches!(
            backend.api_url(&["tags"], &[]),
            Err(BackendError::NotConfigured)
        ));
    }
}
