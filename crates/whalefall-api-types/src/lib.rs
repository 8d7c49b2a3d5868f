//! View models and envelopes returned by the Whalefall same-origin API.
//!
//! Field names follow the browser-facing convention (camelCase) and optional
//! values are omitted rather than serialized as `null` or an empty string.

use serde::{Deserialize, Serialize};

/// Blog post summary returned by the listing routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl BlogPost {
    /// Tags as a slice; empty when the post carries none.
    pub fn tag_list(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }
}

/// Full blog post including the markdown body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostDetail {
    #[serde(flatten)]
    pub post: BlogPost,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagItem {
    pub id: i64,
    pub name: String,
    pub post_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub post_count: u64,
    pub tag_count: u64,
}

/// Server resource usage in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

/// Envelope emitted by every `/api/*` route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            total: None,
        }
    }

    pub fn ok_with_total(data: T, total: u64) -> Self {
        Self {
            total: Some(total),
            ..Self::ok(data)
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            total: None,
        }
    }

    /// Payload of a successful envelope, `None` otherwise.
    pub fn into_data(self) -> Option<T> {
        if self.success { self.data } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_optional_fields_are_omitted() {
        let post = BlogPost {
            id: "7".to_string(),
            title: "Hello".to_string(),
            summary: "First".to_string(),
            date: "2025-02-01".to_string(),
            tags: None,
            cover: None,
            author: None,
        };

        let value = serde_json::to_value(&post).expect("serialize");
        assert_eq!(
            value,
            json!({"id": "7", "title": "Hello", "summary": "First", "date": "2025-02-01"})
        );
    }

    #[test]
    fn detail_flattens_summary_fields() {
        let detail = BlogPostDetail {
            post: BlogPost {
                id: "1".to_string(),
                title: "T".to_string(),
                summary: "S".to_string(),
                date: "D".to_string(),
                tags: Some(vec!["rust".to_string()]),
                cover: None,
                author: Some("whalefall".to_string()),
            },
            text: "## body".to_string(),
        };

        let value = serde_json::to_value(&detail).expect("serialize");
        assert_eq!(value["tags"], json!(["rust"]));
        assert_eq!(value["author"], "whalefall");
        assert_eq!(value["text"], "## body");
        assert!(value.get("post").is_none());
    }

    #[test]
    fn failure_envelope_hides_data_and_total() {
        let envelope: ApiResponse<Vec<BlogPost>> = ApiResponse::failure("Blog not found");
        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value, json!({"success": false, "error": "Blog not found"}));
    }

    #[test]
    fn tag_counts_use_camel_case() {
        let tag = TagItem {
            id: 3,
            name: "rust".to_string(),
            post_count: 12,
        };
        let value = serde_json::to_value(&tag).expect("serialize");
        assert_eq!(value, json!({"id": 3, "name": "rust", "postCount": 12}));
    }

    #[test]
    fn into_data_ignores_unsuccessful_payloads() {
        let envelope = ApiResponse {
            success: false,
            data: Some(1_u8),
            error: None,
            total: None,
        };
        assert_eq!(envelope.into_data(), None);
        assert_eq!(ApiResponse::ok(2_u8).into_data(), Some(2));
    }

    #[test]
    fn failure_envelope_parses_for_non_default_payloads() {
        let envelope: ApiResponse<ServerStats> =
            serde_json::from_value(json!({"success": false, "error": "down"})).expect("parse");
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("down"));
    }
}
