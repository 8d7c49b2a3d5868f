//! Shapes emitted by the upstream blog backend.
//!
//! Every upstream endpoint wraps its payload in [`Envelope`]; a request
//! succeeded only when `code` equals [`CODE_OK`] and `data` is present.

use serde::Deserialize;

pub const CODE_OK: &str = "OK";

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

/// Payload of `GET /api/v1/blogs`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListBlogsData {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub item_list: Vec<BackendBlogItem>,
}

/// Payload of `GET /api/v1/blogs/recent`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentBlogsData {
    #[serde(default)]
    pub item_list: Vec<BackendBlogItem>,
}

/// Payload of `GET /api/v1/blogs/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetBlogData {
    #[serde(default)]
    pub item: Option<BackendBlogDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendBlogItem {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub tags: Option<WireTags>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendBlogDetail {
    #[serde(flatten)]
    pub item: BackendBlogItem,
    #[serde(default)]
    pub text: Option<String>,
}

/// Tags arrive comma-joined; some backend builds already send a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireTags {
    Joined(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendTagItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub post_count: u64,
}

/// Payload of `GET /api/v1/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendTagsData {
    #[serde(default)]
    pub items: Vec<BackendTagItem>,
}

/// Payload of `GET /api/v1/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendStatsData {
    #[serde(default)]
    pub post_count: u64,
    #[serde(default)]
    pub tag_count: u64,
}

/// Payload of `GET /api/v1/system/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSystemStatus {
    pub status: BackendServerStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendServerStats {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

#[cfg(test)]
mod tests {
    use serde::de::DeserializeOwned;

    use super::*;

    fn parse_envelope<T: DeserializeOwned>(raw: &str) -> Envelope<T> {
        serde_json::from_str(raw).expect("parse")
    }

    #[test]
    fn generic_envelope_parses_payloads_without_default() {
        let envelope: Envelope<BackendStatsData> =
            parse_envelope(r#"{"code":"OK","data":{"post_count":3,"tag_count":2}}"#);
        assert!(envelope.is_ok());
        assert!(envelope.data.is_some());

        let empty: Envelope<GetBlogData> = parse_envelope(r#"{"code":"ERR"}"#);
        assert!(empty.data.is_none());
        assert!(empty.message.is_none());
    }

    #[test]
    fn envelope_without_data_parses() {
        let envelope: Envelope<ListBlogsData> =
            serde_json::from_str(r#"{"code":"NOT_FOUND","message":"missing"}"#).expect("parse");
        assert!(!envelope.is_ok());
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("missing"));
    }

    #[test]
    fn detail_accepts_joined_or_listed_tags() {
        let joined: BackendBlogDetail =
            serde_json::from_str(r#"{"id":1,"title":"a","tags":"x, y","text":"body"}"#)
                .expect("joined");
        assert_eq!(joined.item.tags, Some(WireTags::Joined("x, y".to_string())));
        assert_eq!(joined.text.as_deref(), Some("body"));

        let listed: BackendBlogItem =
            serde_json::from_str(r#"{"id":2,"tags":["x","y"]}"#).expect("listed");
        assert_eq!(
            listed.tags,
            Some(WireTags::List(vec!["x".to_string(), "y".to_string()]))
        );
    }

    #[test]
    fn null_optional_fields_are_tolerated() {
        let item: BackendBlogItem = serde_json::from_str(
            r#"{"id":3,"title":"t","summary":null,"date":"2025-01-01","tags":null,"cover":null,"author":null}"#,
        )
        .expect("parse");
        assert!(item.summary.is_none());
        assert!(item.tags.is_none());
    }
}
