//! HTTP client for a running Whalefall site's `/api` routes.

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use whalefall_api_types::{ApiResponse, BlogPost};

use crate::application::search::{PostSource, SearchError, SearchResults};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Server(String),
}

#[derive(Clone, Debug)]
pub struct SiteClient {
    client: Client,
    base: Url,
}

impl SiteClient {
    pub fn new(site: &str) -> Result<Self, ClientError> {
        let base = Url::parse(site)?.join("/")?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("whalefall-search/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url, ClientError> {
        let mut url = self.base.join(path)?;
        url.set_query(None);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// `GET /api/blog` with the given list parameters.
    pub async fn list_blogs(
        &self,
        query: &[(String, String)],
    ) -> Result<(Vec<BlogPost>, u64), ClientError> {
        let url = self.url("api/blog", query)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let envelope: ApiResponse<Vec<BlogPost>> = serde_json::from_str(&text)
            .map_err(|err| ClientError::Server(format!("status {status}: {err}")))?;

        if !envelope.success {
            let message = envelope
                .error
                .unwrap_or_else(|| format!("status {status}"));
            return Err(ClientError::Server(message));
        }

        let total = envelope.total;
        let posts = envelope.into_data().unwrap_or_default();
        let total = total.unwrap_or(posts.len() as u64);
        Ok((posts, total))
    }
}

#[async_trait]
impl PostSource for SiteClient {
    async fn search(&self, params: &[(String, String)]) -> Result<SearchResults, SearchError> {
        match self.list_blogs(params).await {
            Ok((posts, total)) => Ok(SearchResults { posts, total }),
            Err(ClientError::Server(message)) => Err(SearchError::Rejected(message)),
            Err(err) => Err(SearchError::Request(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[tokio::test]
    async fn search_forwards_list_parameters() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/api/blog")
                .query_param("page_no", "1")
                .query_param("page_size", "10")
                .query_param("filter_title", "rust");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"success":true,"data":[{"id":"3","title":"Rust","summary":"","date":"2025-02-03"}],"total":7}"#);
        });

        let client = SiteClient::new(&server.base_url()).expect("client");
        let params = vec![
            ("page_no".to_string(), "1".to_string()),
            ("page_size".to_string(), "10".to_string()),
            ("filter_title".to_string(), "rust".to_string()),
        ];
        let results = client.search(&params).await.expect("results");

        mock.assert();
        assert_eq!(results.total, 7);
        assert_eq!(results.posts[0].title, "Rust");
    }

    #[tokio::test]
    async fn failure_envelope_becomes_rejection() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/api/blog");
            then.status(500)
                .header("content-type", "application/json")
                .body(r#"{"success":false,"error":"Backend URL not configured"}"#);
        });

        let client = SiteClient::new(&server.base_url()).expect("client");
        let err = client.search(&[]).await.expect_err("rejected");

        match err {
            SearchError::Rejected(message) => assert_eq!(message, "Backend URL not configured"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_a_server_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/api/blog");
            then.status(502).body("bad gateway");
        });

        let client = SiteClient::new(&server.base_url()).expect("client");
        let err = client.list_blogs(&[]).await.expect_err("not json");
        assert!(matches!(err, ClientError::Server(_)));
    }
}
