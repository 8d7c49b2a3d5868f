//! Pure mapping from upstream wire shapes to view models.
//!
//! Every function here is total: any parsed upstream value maps to exactly one
//! view value and nothing is read from outside the arguments.

use whalefall_api_types::{BlogPost, BlogPostDetail, ServerStats, SiteStats, TagItem};

use crate::domain::wire::{
    BackendBlogDetail, BackendBlogItem, BackendStatsData, BackendSystemStatus, BackendTagItem,
    WireTags,
};

pub fn blog_post(item: BackendBlogItem) -> BlogPost {
    BlogPost {
        id: item.id.to_string(),
        title: item.title.unwrap_or_default(),
        summary: item.summary.unwrap_or_default(),
        date: item.date.unwrap_or_default(),
        tags: item.tags.and_then(tags),
        cover: non_empty(item.cover),
        author: non_empty(item.author),
    }
}

pub fn blog_posts(items: Vec<BackendBlogItem>) -> Vec<BlogPost> {
    items.into_iter().map(blog_post).collect()
}

pub fn blog_post_detail(detail: BackendBlogDetail) -> BlogPostDetail {
    BlogPostDetail {
        post: blog_post(detail.item),
        text: detail.text.unwrap_or_default(),
    }
}

/// Split tags into trimmed, non-empty entries in their original order.
/// Returns `None` when nothing survives.
pub fn tags(raw: WireTags) -> Option<Vec<String>> {
    let collected: Vec<String> = match raw {
        WireTags::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        WireTags::List(list) => list
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
    };

    if collected.is_empty() {
        None
    } else {
        Some(collected)
    }
}

pub fn tag_item(item: BackendTagItem) -> TagItem {
    TagItem {
        id: item.id,
        name: item.name,
        post_count: item.post_count,
    }
}

pub fn site_stats(stats: BackendStatsData) -> SiteStats {
    SiteStats {
        post_count: stats.post_count,
        tag_count: stats.tag_count,
    }
}

pub fn server_stats(system: BackendSystemStatus) -> ServerStats {
    ServerStats {
        cpu: system.status.cpu,
        memory: system.status.memory,
        disk: system.status.disk,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
