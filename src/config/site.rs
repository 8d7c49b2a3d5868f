//! Site identity and static page content.
//!
//! Everything here has a built-in default; a `[site]` table in the config
//! file replaces individual fields.

use serde::Deserialize;
use time::{Date, macros::date, macros::format_description};

use super::LoadError;

const DEFAULT_TITLE: &str = "Whalefall's Blog";
const DEFAULT_DESCRIPTION: &str = "Personal blog of Whalefall: posts, interests and projects.";
const DEFAULT_ANNOUNCEMENT: &str = "Welcome to my blog! This site is under active development.";
const DEFAULT_LAUNCH_DATE: Date = date!(2025 - 02 - 01);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub name: String,
    pub tagline: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub major: String,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TechCategory {
    pub name: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FriendLink {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SponsorQr {
    pub label: String,
    pub src: String,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub title: String,
    pub description: String,
    pub navigation: Vec<NavLink>,
    pub profile: Profile,
    pub announcement: String,
    pub launch_date: Date,
    pub projects: Vec<Project>,
    pub education: Vec<Education>,
    pub tech_stack: Vec<TechCategory>,
    pub friend_links: Vec<FriendLink>,
    pub sponsors: Vec<SponsorQr>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            navigation: default_navigation(),
            profile: default_profile(),
            announcement: DEFAULT_ANNOUNCEMENT.to_string(),
            launch_date: DEFAULT_LAUNCH_DATE,
            projects: default_projects(),
            education: default_education(),
            tech_stack: default_tech_stack(),
            friend_links: default_friend_links(),
            sponsors: default_sponsors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub(super) struct RawSiteSettings {
    pub(super) title: Option<String>,
    pub(super) description: Option<String>,
    pub(super) navigation: Option<Vec<NavLink>>,
    pub(super) profile: Option<Profile>,
    pub(super) announcement: Option<String>,
    pub(super) launch_date: Option<String>,
    pub(super) projects: Option<Vec<Project>>,
    pub(super) education: Option<Vec<Education>>,
    pub(super) tech_stack: Option<Vec<TechCategory>>,
    pub(super) friend_links: Option<Vec<FriendLink>>,
    pub(super) sponsors: Option<Vec<SponsorQr>>,
}

pub(super) fn build_site_settings(raw: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let defaults = SiteSettings::default();

    let title = non_blank(raw.title).unwrap_or(defaults.title);
    let navigation = raw.navigation.unwrap_or(defaults.navigation);
    if navigation.iter().any(|link| link.href.trim().is_empty()) {
        return Err(LoadError::invalid(
            "site.navigation",
            "navigation links need an href",
        ));
    }

    let launch_date = match raw.launch_date {
        Some(value) => parse_date(value.trim())
            .map_err(|reason| LoadError::invalid("site.launch_date", reason))?,
        None => defaults.launch_date,
    };

    Ok(SiteSettings {
        title,
        description: non_blank(raw.description).unwrap_or(defaults.description),
        navigation,
        profile: raw.profile.unwrap_or(defaults.profile),
        announcement: raw.announcement.unwrap_or(defaults.announcement),
        launch_date,
        projects: raw.projects.unwrap_or(defaults.projects),
        education: raw.education.unwrap_or(defaults.education),
        tech_stack: raw.tech_stack.unwrap_or(defaults.tech_stack),
        friend_links: raw.friend_links.unwrap_or(defaults.friend_links),
        sponsors: raw.sponsors.unwrap_or(defaults.sponsors),
    })
}

fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|err| format!("expected YYYY-MM-DD, got `{value}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn default_navigation() -> Vec<NavLink> {
    [
        ("Home", "/home"),
        ("Blogs", "/blog"),
        ("MyLab", "/lab"),
        ("About", "/about"),
    ]
    .into_iter()
    .map(|(label, href)| NavLink {
        label: label.to_string(),
        href: href.to_string(),
    })
    .collect()
}

fn default_profile() -> Profile {
    Profile {
        name: "Whalefall".to_string(),
        tagline: "Developer · Blogger · Explorer".to_string(),
        avatar: Some("/images/avatar.png".to_string()),
        github: Some("https://github.com/".to_string()),
        email: Some("hello@example.com".to_string()),
    }
}

fn default_projects() -> Vec<Project> {
    vec![
        Project {
            id: "1".to_string(),
            title: "Personal Blog".to_string(),
            description: "The presentation layer of this site: page shells, proxy routes and search."
                .to_string(),
            href: Some("https://github.com/LtePrince/personal-blog".to_string()),
            tags: vec!["Rust".to_string(), "axum".to_string(), "askama".to_string()],
            icon: Some("📝".to_string()),
        },
        Project {
            id: "2".to_string(),
            title: "Blog Backend".to_string(),
            description: "Go-based REST API server with MongoDB, providing blog CRUD, weather data and system monitoring."
                .to_string(),
            href: Some("https://github.com/LtePrince/blog-backend".to_string()),
            tags: vec!["Go".to_string(), "MongoDB".to_string(), "REST".to_string()],
            icon: Some("⚙️".to_string()),
        },
        Project {
            id: "3".to_string(),
            title: "More Coming…".to_string(),
            description: "Stay tuned! More projects and experiments are on the way.".to_string(),
            href: None,
            tags: vec!["WIP".to_string()],
            icon: Some("🧪".to_string()),
        },
    ]
}

fn default_education() -> Vec<Education> {
    vec![
        Education {
            school: "Huazhong University of Science and Technology".to_string(),
            degree: "Bachelor".to_string(),
            major: "Computer Science".to_string(),
            period: "2021 – 2025".to_string(),
        },
        Education {
            school: "University of Sydney".to_string(),
            degree: "Master".to_string(),
            major: "Computer Science(advanced)".to_string(),
            period: "2026 – 2028".to_string(),
        },
    ]
}

fn default_tech_stack() -> Vec<TechCategory> {
    let category = |name: &str, items: &[&str]| TechCategory {
        name: name.to_string(),
        items: items.iter().map(|item| item.to_string()).collect(),
    };

    vec![
        category(
            "Full Stack",
            &[
                "React",
                "Next.js",
                "TypeScript",
                "Go",
                "Python",
                "Node.js",
                "MongoDB",
                "PostgreSQL",
                "Redis",
            ],
        ),
        category(
            "Cryptography",
            &[
                "Blockchain",
                "Zero-Knowledge Proofs",
                "Homomorphic Encryption",
            ],
        ),
        category(
            "DevOps & Tools",
            &["Linux", "Nginx", "GitHub Actions", "Docker"],
        ),
        category(
            "Exploring...",
            &["Neural Networks", "AI Architecture", "AI Applications"],
        ),
    ]
}

fn default_friend_links() -> Vec<FriendLink> {
    vec![
        FriendLink {
            name: "Next.js".to_string(),
            url: "https://nextjs.org".to_string(),
            avatar: None,
            description: Some("The React framework for the Web".to_string()),
        },
        FriendLink {
            name: "Astro".to_string(),
            url: "https://astro.build".to_string(),
            avatar: None,
            description: Some("The web framework for content-driven websites".to_string()),
        },
    ]
}

fn default_sponsors() -> Vec<SponsorQr> {
    vec![
        SponsorQr {
            label: "WeChat Pay".to_string(),
            src: "/images/wechat-pay-qr.png".to_string(),
        },
        SponsorQr {
            label: "Alipay".to_string(),
            src: "/images/alipay-qr.png".to_string(),
        },
    ]
}
