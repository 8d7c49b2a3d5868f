use std::sync::Arc;

use tracing::warn;

use crate::application::blog::BlogService;
use crate::config::{Project, SiteSettings};
use crate::presentation::views::{AboutContext, GaugeView, LabContext, ProjectView};

const SOURCE: &str = "application::page::PageService";
const DEFAULT_PROJECT_ICON: &str = "📦";

/// Static sections: the lab with live server gauges, and the about page.
#[derive(Clone)]
pub struct PageService {
    blog: BlogService,
    site: Arc<SiteSettings>,
}

impl PageService {
    pub fn new(blog: BlogService, site: Arc<SiteSettings>) -> Self {
        Self { blog, site }
    }

    pub async fn lab_context(&self) -> LabContext {
        let (gauges, status_failed) = match self.blog.system_stats().await {
            Ok(stats) => (
                vec![
                    GaugeView::new("CPU", stats.cpu),
                    GaugeView::new("Memory", stats.memory),
                    GaugeView::new("Disk", stats.disk),
                ],
                false,
            ),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    status = err.status().as_u16(),
                    error = %err,
                    "server status unavailable"
                );
                (Vec::new(), true)
            }
        };

        LabContext {
            gauges,
            status_failed,
            projects: self.site.projects.iter().map(project_view).collect(),
        }
    }

    pub fn about_context(&self) -> AboutContext {
        AboutContext {
            education: self.site.education.clone(),
            tech_stack: self.site.tech_stack.clone(),
            friend_links: self.site.friend_links.clone(),
            sponsors: self.site.sponsors.clone(),
        }
    }
}

fn project_view(project: &Project) -> ProjectView {
    ProjectView {
        title: project.title.clone(),
        description: project.description.clone(),
        href: project.href.clone(),
        tags: project.tags.clone(),
        icon: project
            .icon
            .clone()
            .unwrap_or_else(|| DEFAULT_PROJECT_ICON.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::blog::tests::StubBackend;

    fn service(backend: StubBackend) -> PageService {
        PageService::new(
            BlogService::new(Arc::new(backend), 5),
            Arc::new(SiteSettings::default()),
        )
    }

    #[tokio::test]
    async fn lab_shows_colored_gauges() {
        let context = service(StubBackend::with_items(Vec::new()))
            .lab_context()
            .await;

        assert!(!context.status_failed);
        let tones: Vec<_> = context.gauges.iter().map(|g| g.tone_class).collect();
        assert_eq!(
            tones,
            vec!["gauge--healthy", "gauge--elevated", "gauge--critical"]
        );
        assert_eq!(context.projects.len(), SiteSettings::default().projects.len());
    }

    #[tokio::test]
    async fn lab_survives_missing_backend() {
        let context = service(StubBackend::default()).lab_context().await;
        assert!(context.status_failed);
        assert!(context.gauges.is_empty());
    }

    #[test]
    fn about_mirrors_site_content() {
        let context = service(StubBackend::default()).about_context();
        assert_eq!(
            context.friend_links.len(),
            SiteSettings::default().friend_links.len()
        );
    }
}
