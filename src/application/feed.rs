use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use time::{Date, OffsetDateTime};
use tracing::warn;
use whalefall_api_types::{BlogPost, BlogPostDetail, TagItem};

use crate::application::blog::{BlogService, ProxyError};
use crate::application::pagination::{ListingQuery, PageToken, Pager};
use crate::application::render::{RenderedArticle, article_renderer};
use crate::config::SiteSettings;
use crate::domain::toc::TableOfContents;
use crate::presentation::views::{
    BlogListContext, HomeContext, PageLinkView, PaginationView, PostCard, PostDetailContext,
    PostTocView, ProfileView, SiteStatsView, TagSummary, TocEntryView, build_tag_badges,
    encode_query_value, post_href,
};

const SOURCE: &str = "application::feed::FeedService";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Upstream(#[from] ProxyError),
}

/// Assembles the home, listing and detail shells from proxied reads.
///
/// Home and listing never fail: each section degrades to its empty state and
/// the cause is logged. Only the detail page surfaces upstream errors.
#[derive(Clone)]
pub struct FeedService {
    blog: BlogService,
    site: Arc<SiteSettings>,
    page_size: u32,
}

impl FeedService {
    pub fn new(blog: BlogService, site: Arc<SiteSettings>, page_size: u32) -> Self {
        Self {
            blog,
            site,
            page_size,
        }
    }

    pub async fn home_context(&self) -> HomeContext {
        let (recent, tags, stats) = tokio::join!(
            self.blog.recent_blogs(None),
            self.blog.list_tags(),
            self.blog.site_stats(),
        );

        let recent_failed = recent.is_err();
        let recent_posts = degrade(recent, "recent_blogs")
            .iter()
            .map(post_card)
            .collect();
        let tags = build_tag_summaries(&degrade(tags, "list_tags"), None);
        let stats = match stats {
            Ok(stats) => Some(stats),
            Err(err) => {
                log_degraded("site_stats", &err);
                None
            }
        };

        let profile = &self.site.profile;
        HomeContext {
            profile: ProfileView {
                name: profile.name.clone(),
                tagline: profile.tagline.clone(),
                avatar: profile.avatar.clone(),
                github: profile.github.clone(),
                email_href: profile.email.as_ref().map(|email| format!("mailto:{email}")),
            },
            announcement: self.site.announcement.clone(),
            recent_posts,
            recent_failed,
            tags,
            stats: SiteStatsView {
                post_count: stats.map(|s| s.post_count),
                tag_count: stats.map(|s| s.tag_count),
                running_days: running_days(self.site.launch_date, OffsetDateTime::now_utc().date()),
            },
        }
    }

    pub async fn blog_list_context(&self, query: &ListingQuery) -> BlogListContext {
        let params = query.upstream_params(self.page_size);
        let (page, tags, recent) = tokio::join!(
            self.blog.list_blogs(&params),
            self.blog.list_tags(),
            self.blog.recent_blogs(None),
        );

        let load_failed = page.is_err();
        let (posts, total) = match page {
            Ok(page) => (page.posts, page.total),
            Err(err) => {
                log_degraded("list_blogs", &err);
                (Vec::new(), 0)
            }
        };

        let recent_failed = recent.is_err();
        let recent_posts = degrade(recent, "recent_blogs")
            .iter()
            .map(post_card)
            .collect();

        let pager = Pager::new(query.page(), total, self.page_size);
        let pagination = pager
            .is_visible()
            .then(|| build_pagination_view(&pager, query));

        BlogListContext {
            has_results: !posts.is_empty(),
            posts: posts.iter().map(post_card).collect(),
            load_failed,
            search: query.search().unwrap_or_default().to_string(),
            active_tag: query.tag().map(str::to_string),
            tags: build_tag_summaries(&degrade(tags, "list_tags"), query.tag()),
            recent_posts,
            recent_failed,
            total,
            pagination,
        }
    }

    /// `Ok(None)` when the upstream reports the post as missing.
    pub async fn post_detail(&self, id: &str) -> Result<Option<PostDetailContext>, FeedError> {
        match self.blog.get_blog(id).await {
            Ok(detail) => Ok(Some(self.build_post_context(detail))),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn build_post_context(&self, detail: BlogPostDetail) -> PostDetailContext {
        let RenderedArticle { html, toc } = article_renderer().render_or_plain(&detail.text);
        let BlogPostDetail { post, .. } = detail;
        let ld_json = build_post_ld_json(&post, &self.site);

        PostDetailContext {
            badges: build_tag_badges(post.tag_list()),
            date: display_date(&post.date),
            toc: build_post_toc_view(&toc),
            href: post_href(&post.id),
            id: post.id,
            title: post.title,
            summary: post.summary,
            author: post.author,
            cover: post.cover,
            body_html: html,
            ld_json,
        }
    }
}

fn degrade<T: Default>(result: Result<T, ProxyError>, operation: &'static str) -> T {
    result.unwrap_or_else(|err| {
        log_degraded(operation, &err);
        T::default()
    })
}

fn log_degraded(operation: &'static str, err: &ProxyError) {
    warn!(
        target = SOURCE,
        operation,
        status = err.status().as_u16(),
        error = %err,
        "section degraded to empty state"
    );
}

/// Whole days since `launch`, never negative.
pub fn running_days(launch: Date, today: Date) -> i64 {
    (today - launch).whole_days().max(0)
}

/// Calendar part of an upstream timestamp.
fn display_date(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .split(['T', ' '])
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

fn post_card(post: &BlogPost) -> PostCard {
    PostCard {
        href: post_href(&post.id),
        title: post.title.clone(),
        summary: post.summary.clone(),
        date: display_date(&post.date),
        badges: build_tag_badges(post.tag_list()),
        cover: post.cover.clone(),
        author: post.author.clone(),
    }
}

fn build_tag_summaries(tags: &[TagItem], active: Option<&str>) -> Vec<TagSummary> {
    tags.iter()
        .map(|tag| TagSummary {
            label: tag.name.clone(),
            href: format!("/blog?tag={}", encode_query_value(&tag.name)),
            count: tag.post_count,
            is_active: active == Some(tag.name.as_str()),
        })
        .collect()
}

fn build_pagination_view(pager: &Pager, query: &ListingQuery) -> PaginationView {
    let links = pager
        .tokens
        .iter()
        .map(|token| match token {
            PageToken::Page(page) => PageLinkView {
                label: page.to_string(),
                href: query.href_for_page(*page),
                is_current: *page == pager.page,
                is_ellipsis: false,
            },
            PageToken::Ellipsis => PageLinkView {
                label: "…".to_string(),
                href: String::new(),
                is_current: false,
                is_ellipsis: true,
            },
        })
        .collect();

    PaginationView {
        previous_href: pager.previous().map(|page| query.href_for_page(page)),
        next_href: pager.next().map(|page| query.href_for_page(page)),
        links,
        page: pager.page,
        total_pages: pager.total_pages,
    }
}

fn build_post_toc_view(toc: &TableOfContents) -> Option<PostTocView> {
    if !toc.is_visible() {
        return None;
    }

    let active = toc.initial_active_id();
    let entries = toc
        .items()
        .iter()
        .map(|item| TocEntryView {
            anchor: item.id.clone(),
            title: item.text.clone(),
            level: item.level,
            indent: item.indent(),
            is_active: active == Some(item.id.as_str()),
        })
        .collect();

    Some(PostTocView { entries })
}

fn build_post_ld_json(post: &BlogPost, site: &SiteSettings) -> String {
    let mut document = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post.summary,
        "datePublished": post.date,
        "keywords": post.tag_list(),
        "author": {
            "@type": "Person",
            "name": post.author.as_deref().unwrap_or(&site.profile.name),
        },
        "publisher": {
            "@type": "Organization",
            "name": site.title,
        },
        "mainEntityOfPage": post_href(&post.id),
    });
    if let Some(cover) = post.cover.as_ref() {
        document["image"] = json!(cover);
    }

    // `</` inside a script element would end it early.
    document.to_string().replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::blog::tests::{StubBackend, wire_item};
    use time::macros::date;

    fn feed(backend: StubBackend) -> FeedService {
        let blog = BlogService::new(Arc::new(backend), 5);
        FeedService::new(blog, Arc::new(SiteSettings::default()), 1)
    }

    #[test]
    fn running_days_counts_whole_days() {
        assert_eq!(running_days(date!(2025 - 02 - 01), date!(2025 - 02 - 11)), 10);
        assert_eq!(running_days(date!(2025 - 02 - 01), date!(2025 - 01 - 01)), 0);
    }

    #[test]
    fn display_date_drops_time_of_day() {
        assert_eq!(display_date("2025-03-04T10:00:00Z"), "2025-03-04");
        assert_eq!(display_date("2025-03-04 10:00"), "2025-03-04");
        assert_eq!(display_date(" 2025-03-04 "), "2025-03-04");
    }

    #[tokio::test]
    async fn home_degrades_when_backend_missing() {
        let context = feed(StubBackend::default()).home_context().await;
        assert!(context.recent_posts.is_empty());
        assert!(context.recent_failed);
        assert!(context.tags.is_empty());
        assert_eq!(context.stats.post_count, None);
    }

    #[tokio::test]
    async fn listing_builds_pager_from_total() {
        let backend = StubBackend::with_items(vec![
            wire_item(1, "One", "rust"),
            wire_item(2, "Two", ""),
            wire_item(3, "Three", ""),
        ]);
        let query = ListingQuery {
            page: Some("2".to_string()),
            q: None,
            tag: Some("rust".to_string()),
        };
        let context = feed(backend).blog_list_context(&query).await;

        assert!(context.has_results);
        assert_eq!(context.total, 3);
        assert_eq!(context.active_tag.as_deref(), Some("rust"));
        assert!(context.tags[0].is_active);

        let pagination = context.pagination.expect("three pages");
        assert_eq!(pagination.page, 2);
        assert_eq!(
            pagination.previous_href.as_deref(),
            Some("/blog?page=1&tag=rust")
        );
        assert_eq!(
            pagination.next_href.as_deref(),
            Some("/blog?page=3&tag=rust")
        );
        assert!(pagination.links.iter().any(|link| link.is_current));

        assert!(!context.recent_failed);
        assert_eq!(context.recent_posts.len(), 3);
        assert_eq!(context.recent_posts[0].href, "/blog/1");
    }

    #[tokio::test]
    async fn listing_sidebar_degrades_when_backend_missing() {
        let context = feed(StubBackend::default())
            .blog_list_context(&ListingQuery::default())
            .await;
        assert!(context.load_failed);
        assert!(context.recent_failed);
        assert!(context.recent_posts.is_empty());
    }

    #[tokio::test]
    async fn missing_post_is_none() {
        let backend = StubBackend::with_items(vec![wire_item(1, "One", "")]);
        let result = feed(backend).post_detail("99").await.expect("no error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn detail_renders_markdown_and_toc() {
        let backend = StubBackend::with_items(vec![wire_item(7, "Seven", "rust,web")]);
        let context = feed(backend)
            .post_detail("7")
            .await
            .expect("loaded")
            .expect("present");

        assert!(context.body_html.contains("id=\"one\""));
        let toc = context.toc.expect("two headings");
        assert_eq!(toc.entries.len(), 2);
        assert!(toc.entries[0].is_active);
        assert_eq!(context.badges.len(), 2);
        assert!(context.ld_json.contains("\"BlogPosting\""));
        assert_eq!(context.href, "/blog/7");
        assert!(context.ld_json.contains("\"mainEntityOfPage\":\"/blog/7\""));
    }

    #[tokio::test]
    async fn unconfigured_detail_is_an_error() {
        let result = feed(StubBackend::default()).post_detail("1").await;
        match result {
            Err(FeedError::Upstream(proxy)) => assert_eq!(proxy.status().as_u16(), 500),
            Ok(_) => panic!("unconfigured backend should not load a post"),
        }
    }

    #[test]
    fn ld_json_escapes_script_terminator() {
        let post = BlogPost {
            id: "1".to_string(),
            title: "</script><b>".to_string(),
            summary: String::new(),
            date: "2025-02-01".to_string(),
            tags: None,
            cover: None,
            author: None,
        };
        let json = build_post_ld_json(&post, &SiteSettings::default());
        assert!(!json.contains("</script>"));
    }
}
