//! Blog reads: backend access plus normalization, shared by the proxy routes
//! and the page shells.

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::debug;
use whalefall_api_types::{BlogPost, BlogPostDetail, ServerStats, SiteStats, TagItem};

use crate::application::backend::{BackendError, BlogBackend, open_envelope};
use crate::application::normalize;

/// Upstream resources exposed through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    BlogList,
    BlogDetail,
    RecentBlogs,
    Tags,
    Stats,
    SystemStats,
}

impl Resource {
    pub fn label(self) -> &'static str {
        match self {
            Resource::BlogList => "blogs",
            Resource::BlogDetail => "blog",
            Resource::RecentBlogs => "recent_blogs",
            Resource::Tags => "tags",
            Resource::Stats => "stats",
            Resource::SystemStats => "system_stats",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Resource::BlogList => "Failed to fetch blogs",
            Resource::BlogDetail => "Blog not found",
            Resource::RecentBlogs => "Failed to fetch recent blogs",
            Resource::Tags => "Failed to fetch tags",
            Resource::Stats => "Failed to fetch stats",
            Resource::SystemStats => "Failed to fetch system stats",
        }
    }

    /// Status used when the upstream answers but refuses the request.
    fn rejection_status(self) -> StatusCode {
        match self {
            Resource::BlogDetail => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure of a proxied read, already reduced to what the caller shows.
#[derive(Debug, Error)]
#[error("{resource:?} request failed: {message}")]
pub struct ProxyError {
    resource: Resource,
    status: StatusCode,
    message: String,
    #[source]
    source: BackendError,
}

impl ProxyError {
    pub fn from_backend(resource: Resource, source: BackendError) -> Self {
        let (status, message) = match &source {
            BackendError::NotConfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, source.to_string())
            }
            BackendError::Rejected { .. } | BackendError::MissingData => (
                resource.rejection_status(),
                source
                    .upstream_message()
                    .unwrap_or(resource.default_message())
                    .to_string(),
            ),
            BackendError::Status { status } => {
                let status = if *status == 404 && resource == Resource::BlogDetail {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, resource.default_message().to_string())
            }
            BackendError::Transport(_) | BackendError::Decode(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, source.to_string())
            }
        };

        Self {
            resource,
            status,
            message,
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// One page of the blog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPage {
    pub posts: Vec<BlogPost>,
    pub total: u64,
}

#[derive(Clone)]
pub struct BlogService {
    backend: Arc<dyn BlogBackend>,
    default_recent_limit: u32,
}

impl BlogService {
    pub fn new(backend: Arc<dyn BlogBackend>, default_recent_limit: u32) -> Self {
        Self {
            backend,
            default_recent_limit,
        }
    }

    pub async fn list_blogs(&self, query: &[(String, String)]) -> Result<BlogPage, ProxyError> {
        let resource = Resource::BlogList;
        let data = self
            .backend
            .list_blogs(query)
            .await
            .and_then(open_envelope)
            .map_err(|err| ProxyError::from_backend(resource, err))?;

        debug!(
            target = "application::blog::BlogService",
            total = data.total,
            items = data.item_list.len(),
            "listed blogs"
        );

        Ok(BlogPage {
            posts: normalize::blog_posts(data.item_list),
            total: data.total,
        })
    }

    pub async fn get_blog(&self, id: &str) -> Result<BlogPostDetail, ProxyError> {
        let resource = Resource::BlogDetail;
        let detail = self
            .backend
            .get_blog(id)
            .await
            .and_then(open_envelope)
            .and_then(|data| data.item.ok_or(BackendError::MissingData))
            .map_err(|err| ProxyError::from_backend(resource, err))?;

        Ok(normalize::blog_post_detail(detail))
    }

    /// `limit` is forwarded verbatim; absent means the configured default.
    pub async fn recent_blogs(&self, limit: Option<&str>) -> Result<Vec<BlogPost>, ProxyError> {
        let resource = Resource::RecentBlogs;
        let default_limit = self.default_recent_limit.to_string();
        let limit = limit.filter(|l| !l.is_empty()).unwrap_or(&default_limit);

        let data = self
            .backend
            .recent_blogs(limit)
            .await
            .and_then(open_envelope)
            .map_err(|err| ProxyError::from_backend(resource, err))?;

        Ok(normalize::blog_posts(data.item_list))
    }

    pub async fn list_tags(&self) -> Result<Vec<TagItem>, ProxyError> {
        let data = self
            .backend
            .list_tags()
            .await
            .and_then(open_envelope)
            .map_err(|err| ProxyError::from_backend(Resource::Tags, err))?;

        Ok(data.items.into_iter().map(normalize::tag_item).collect())
    }

    pub async fn site_stats(&self) -> Result<SiteStats, ProxyError> {
        self.backend
            .site_stats()
            .await
            .and_then(open_envelope)
            .map(normalize::site_stats)
            .map_err(|err| ProxyError::from_backend(Resource::Stats, err))
    }

    pub async fn system_stats(&self) -> Result<ServerStats, ProxyError> {
        self.backend
            .system_stats()
            .await
            .and_then(open_envelope)
            .map(normalize::server_stats)
            .map_err(|err| ProxyError::from_backend(Resource::SystemStats, err))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::wire::{
        BackendBlogDetail, BackendBlogItem, BackendServerStats, BackendStatsData,
        BackendSystemStatus, BackendTagItem, BackendTagsData, Envelope, GetBlogData,
        ListBlogsData, RecentBlogsData,
    };

    /// Backend answering from canned envelopes. `configured: false` behaves
    /// like a missing upstream origin.
    #[derive(Default)]
    pub(crate) struct StubBackend {
        pub configured: bool,
        pub reject_code: Option<(String, Option<String>)>,
        pub items: Vec<BackendBlogItem>,
        pub recent_limits: Mutex<Vec<String>>,
    }

    impl StubBackend {
        pub(crate) fn with_items(items: Vec<BackendBlogItem>) -> Self {
            Self {
                configured: true,
                items,
                ..Self::default()
            }
        }

        fn envelope<T>(&self, data: T) -> Result<Envelope<T>, BackendError> {
            if !self.configured {
                return Err(BackendError::NotConfigured);
            }
            Ok(match &self.reject_code {
                Some((code, message)) => Envelope {
                    code: code.clone(),
                    message: message.clone(),
                    data: None,
                },
                None => Envelope {
                    code: "OK".to_string(),
                    message: None,
                    data: Some(data),
                },
            })
        }
    }

    #[async_trait]
    impl BlogBackend for StubBackend {
        async fn list_blogs(
            &self,
            _query: &[(String, String)],
        ) -> Result<Envelope<ListBlogsData>, BackendError> {
            self.envelope(ListBlogsData {
                total: self.items.len() as u64,
                item_list: self.items.clone(),
            })
        }

        async fn get_blog(&self, id: &str) -> Result<Envelope<GetBlogData>, BackendError> {
            let item = self
                .items
                .iter()
                .find(|item| item.id.to_string() == id)
                .cloned()
                .map(|item| BackendBlogDetail {
                    item,
                    text: Some("## One\n\n## Two".to_string()),
                });
            self.envelope(GetBlogData { item })
        }

        async fn recent_blogs(
            &self,
            limit: &str,
        ) -> Result<Envelope<RecentBlogsData>, BackendError> {
            self.recent_limits
                .lock()
                .expect("limits lock")
                .push(limit.to_string());
            self.envelope(RecentBlogsData {
                item_list: self.items.clone(),
            })
        }

        async fn list_tags(&self) -> Result<Envelope<BackendTagsData>, BackendError> {
            self.envelope(BackendTagsData {
                items: vec![BackendTagItem {
                    id: 1,
                    name: "rust".to_string(),
                    post_count: 3,
                }],
            })
        }

        async fn site_stats(&self) -> Result<Envelope<BackendStatsData>, BackendError> {
            self.envelope(BackendStatsData {
                post_count: self.items.len() as u64,
                tag_count: 1,
            })
        }

        async fn system_stats(&self) -> Result<Envelope<BackendSystemStatus>, BackendError> {
            self.envelope(BackendSystemStatus {
                status: BackendServerStats {
                    cpu: 10.0,
                    memory: 55.0,
                    disk: 90.0,
                },
            })
        }
    }

    pub(crate) fn wire_item(id: i64, title: &str, tags: &str) -> BackendBlogItem {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "summary": format!("{title} summary"),
            "date": "2025-02-01",
            "tags": tags,
        }))
        .expect("wire item")
    }

    fn service(backend: StubBackend) -> BlogService {
        BlogService::new(Arc::new(backend), 5)
    }

    #[tokio::test]
    async fn list_returns_normalized_posts_and_total() {
        let page = service(StubBackend::with_items(vec![
            wire_item(1, "One", "a,b"),
            wire_item(2, "Two", ""),
        ]))
        .list_blogs(&[])
        .await
        .expect("page");

        assert_eq!(page.total, 2);
        assert_eq!(page.posts[0].id, "1");
        assert_eq!(page.posts[1].tags, None);
    }

    #[tokio::test]
    async fn unconfigured_backend_maps_to_server_error() {
        let err = service(StubBackend::default())
            .list_tags()
            .await
            .expect_err("not configured");

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Backend URL not configured");
    }

    #[tokio::test]
    async fn rejected_detail_is_not_found_with_upstream_message() {
        let backend = StubBackend {
            configured: true,
            reject_code: Some(("NOT_FOUND".to_string(), Some("blog 9 missing".to_string()))),
            ..StubBackend::default()
        };
        let err = service(backend).get_blog("9").await.expect_err("rejected");

        assert!(err.is_not_found());
        assert_eq!(err.message(), "blog 9 missing");
    }

    #[tokio::test]
    async fn missing_item_falls_back_to_default_message() {
        let err = service(StubBackend::with_items(vec![]))
            .get_blog("404")
            .await
            .expect_err("missing");

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Blog not found");
    }

    #[tokio::test]
    async fn rejected_listing_is_server_error_with_default_message() {
        let backend = StubBackend {
            configured: true,
            reject_code: Some(("ERR".to_string(), None)),
            ..StubBackend::default()
        };
        let err = service(backend).site_stats().await.expect_err("rejected");

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to fetch stats");
    }

    #[tokio::test]
    async fn recent_uses_default_limit_when_absent() {
        let backend = Arc::new(StubBackend::with_items(vec![wire_item(1, "One", "")]));
        let service = BlogService::new(backend.clone(), 5);

        service.recent_blogs(None).await.expect("recent");
        service.recent_blogs(Some("3")).await.expect("recent");

        let limits = backend.recent_limits.lock().expect("limits lock").clone();
        assert_eq!(limits, vec!["5".to_string(), "3".to_string()]);
    }
}
