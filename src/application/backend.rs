//! Port describing the external blog backend.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::wire::{
    BackendStatsData, BackendSystemStatus, BackendTagsData, Envelope, GetBlogData, ListBlogsData,
    RecentBlogsData,
};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend URL not configured")]
    NotConfigured,
    #[error("{0}")]
    Transport(String),
    #[error("invalid upstream payload: {0}")]
    Decode(String),
    #[error("upstream responded with HTTP {status}")]
    Status { status: u16 },
    #[error("upstream rejected request with code `{code}`")]
    Rejected {
        code: String,
        message: Option<String>,
    },
    #[error("upstream envelope carried no data")]
    MissingData,
}

impl BackendError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Message supplied by the upstream alongside a rejection, if any.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            BackendError::Rejected { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// Stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::NotConfigured => "not_configured",
            BackendError::Transport(_) => "transport",
            BackendError::Decode(_) => "decode",
            BackendError::Status { .. } => "status",
            BackendError::Rejected { .. } => "rejected",
            BackendError::MissingData => "missing_data",
        }
    }
}

/// Unwrap an upstream envelope, treating anything but `OK` with data as failure.
pub fn open_envelope<T>(envelope: Envelope<T>) -> Result<T, BackendError> {
    if !envelope.is_ok() {
        return Err(BackendError::Rejected {
            code: envelope.code,
            message: envelope.message,
        });
    }
    envelope.data.ok_or(BackendError::MissingData)
}

/// Read access to the blog backend. Each method returns the raw envelope so
/// callers decide which failures map to which status.
#[async_trait]
pub trait BlogBackend: Send + Sync {
    /// `query` pairs are forwarded verbatim.
    async fn list_blogs(
        &self,
        query: &[(String, String)],
    ) -> Result<Envelope<ListBlogsData>, BackendError>;

    async fn get_blog(&self, id: &str) -> Result<Envelope<GetBlogData>, BackendError>;

    async fn recent_blogs(&self, limit: &str) -> Result<Envelope<RecentBlogsData>, BackendError>;

    async fn list_tags(&self) -> Result<Envelope<BackendTagsData>, BackendError>;

    async fn site_stats(&self) -> Result<Envelope<BackendStatsData>, BackendError>;

    async fn system_stats(&self) -> Result<Envelope<BackendSystemStatus>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_envelope_requires_ok_code_and_data() {
        let ok = Envelope {
            code: "OK".to_string(),
            message: None,
            data: Some(5_u8),
        };
        assert_eq!(open_envelope(ok).expect("ok"), 5);

        let empty: Envelope<u8> = Envelope {
            code: "OK".to_string(),
            message: None,
            data: None,
        };
        assert!(matches!(open_envelope(empty), Err(BackendError::MissingData)));

        let rejected: Envelope<u8> = Envelope {
            code: "NOT_FOUND".to_string(),
            message: Some("no such blog".to_string()),
            data: Some(1),
        };
        let err = open_envelope(rejected).expect_err("rejected");
        assert_eq!(err.upstream_message(), Some("no such blog"));
        assert_eq!(err.kind(), "rejected");
    }

    #[test]
    fn blank_upstream_message_is_ignored() {
        let err = BackendError::Rejected {
            code: "ERR".to_string(),
            message: Some(String::new()),
        };
        assert_eq!(err.upstream_message(), None);
    }
}
