//! Markdown to sanitized article HTML, plus the table of contents read back
//! from the rendered headings.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use ammonia::Builder as AmmoniaBuilder;
use comrak::{
    Arena, format_html,
    options::{ListStyleType, Options},
    parse_document,
};
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::warn;

use crate::domain::slug::HeadingSlugger;
use crate::domain::toc::{MAX_LEVEL, MIN_LEVEL, TableOfContents, TocItem};

const HEADING_SELECTOR: &str = "h2, h3, h4";

static RENDERER: Lazy<ArticleRenderer> = Lazy::new(ArticleRenderer::new);

/// Process-wide renderer.
pub fn article_renderer() -> &'static ArticleRenderer {
    &RENDERER
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("html post-processing failed: {message}")]
    Document { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArticle {
    pub html: String,
    pub toc: TableOfContents,
}

pub struct ArticleRenderer {
    options: Options<'static>,
    sanitizer: AmmoniaBuilder<'static>,
}

impl Default for ArticleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleRenderer {
    pub fn new() -> Self {
        Self {
            options: markdown_options(),
            sanitizer: build_sanitizer(),
        }
    }

    pub fn render(&self, markdown: &str) -> Result<RenderedArticle, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);

        let mut html = String::new();
        format_html(root, &self.options, &mut html).map_err(|err| RenderError::Markdown {
            message: err.to_string(),
        })?;

        let sanitized = self.sanitizer.clean(&html).to_string();
        let headings = collect_headings(&sanitized)?;

        let mut slugger = HeadingSlugger::new();
        let items: Vec<TocItem> = headings
            .into_iter()
            .map(|(level, text)| TocItem {
                id: slugger.anchor_for(&text),
                level,
                text,
            })
            .collect();

        let html = apply_heading_ids(&sanitized, &items)?;

        Ok(RenderedArticle {
            html,
            toc: TableOfContents::new(items),
        })
    }

    /// Render, falling back to escaped plain text when the pipeline fails.
    pub fn render_or_plain(&self, markdown: &str) -> RenderedArticle {
        match self.render(markdown) {
            Ok(article) => article,
            Err(err) => {
                warn!(
                    target = "application::render::ArticleRenderer",
                    error = %err,
                    "article rendering failed; serving plain text"
                );
                RenderedArticle {
                    html: format!("<pre>{}</pre>", ammonia::clean_text(markdown)),
                    toc: TableOfContents::default(),
                }
            }
        }
    }
}

fn markdown_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;
    ext.superscript = true;
    ext.front_matter_delimiter = Some("---".to_string());
    ext.alerts = true;
    ext.cjk_friendly_emphasis = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.tasklist_classes = true;
    render.list_style = ListStyleType::Dash;
    render.r#unsafe = true;
    render.figure_with_caption = true;

    options
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "abbr",
        "blockquote",
        "br",
        "code",
        "del",
        "div",
        "em",
        "figcaption",
        "figure",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "img",
        "input",
        "kbd",
        "li",
        "ol",
        "p",
        "pre",
        "s",
        "section",
        "span",
        "strong",
        "sub",
        "sup",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "ul",
    ]);
    builder.tags(tags);

    // ids are assigned after sanitizing; author-supplied ones would collide
    let generic: HashSet<&'static str> = HashSet::from([
        "class",
        "title",
        "lang",
        "dir",
        "aria-hidden",
        "aria-label",
        "role",
        "data-footnote-ref",
        "data-footnotes",
        "data-footnote-backref",
    ]);
    builder.generic_attributes(generic);

    builder.add_tag_attributes("a", &["target"]);
    builder.add_tag_attributes("img", &["title", "width", "height", "alt", "loading"]);
    builder.add_tag_attributes("code", &["class", "data-language"]);
    builder.add_tag_attributes("pre", &["class", "lang"]);
    builder.add_tag_attributes("th", &["align", "colspan", "rowspan", "scope"]);
    builder.add_tag_attributes("td", &["align", "colspan", "rowspan"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled", "class"]);

    builder
}

struct PendingHeading {
    level: u8,
    text: String,
}

/// Level and plain text of every tracked heading, in document order.
fn collect_headings(html: &str) -> Result<Vec<(u8, String)>, RenderError> {
    let headings: Rc<RefCell<Vec<PendingHeading>>> = Rc::new(RefCell::new(Vec::new()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(HEADING_SELECTOR, {
                    let headings = Rc::clone(&headings);
                    move |el| {
                        let level = heading_level(&el.tag_name());
                        headings.borrow_mut().push(PendingHeading {
                            level,
                            text: String::new(),
                        });
                        Ok(())
                    }
                }),
                text!(HEADING_SELECTOR, {
                    let headings = Rc::clone(&headings);
                    move |chunk| {
                        if let Some(current) = headings.borrow_mut().last_mut() {
                            current.text.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })?;

    let collected = headings
        .borrow_mut()
        .drain(..)
        .filter(|heading| (MIN_LEVEL..=MAX_LEVEL).contains(&heading.level))
        .map(|heading| {
            let text = decode_entities(heading.text.trim());
            (heading.level, text)
        })
        .collect();

    Ok(collected)
}

fn apply_heading_ids(html: &str, items: &[TocItem]) -> Result<String, RenderError> {
    let ids: Rc<Vec<String>> = Rc::new(items.iter().map(|item| item.id.clone()).collect());
    let index = Rc::new(RefCell::new(0usize));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(HEADING_SELECTOR, {
                let ids = Rc::clone(&ids);
                let index = Rc::clone(&index);
                move |el| {
                    let mut idx = index.borrow_mut();
                    if let Some(id) = ids.get(*idx) {
                        el.set_attribute("id", id)?;
                    }
                    *idx += 1;
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })
}

fn heading_level(tag_name: &str) -> u8 {
    tag_name
        .strip_prefix('h')
        .or_else(|| tag_name.strip_prefix('H'))
        .and_then(|value| value.parse::<u8>().ok())
        .unwrap_or(0)
}

/// Undo the escaping html5ever applies to text nodes.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_receive_unique_ids() {
        let article = ArticleRenderer::new()
            .render("# Title\n\n## Setup\n\ntext\n\n### Setup\n\n## 安装步骤\n\n##### Deep\n")
            .expect("render");

        let ids: Vec<&str> = article.toc.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-2", "an-zhuang-bu-zhou"]);

        let levels: Vec<u8> = article.toc.items().iter().map(|i| i.level).collect();
        assert_eq!(levels, vec![2, 3, 2]);

        assert!(article.html.contains("<h2 id=\"setup\">Setup</h2>"));
        assert!(article.html.contains("<h3 id=\"setup-2\">Setup</h3>"));
        assert!(!article.html.contains("<h1 id="));
        assert!(!article.html.contains("<h5 id="));
    }

    #[test]
    fn literal_heading_matching_a_suffix_gets_its_own_id() {
        let article = ArticleRenderer::new()
            .render("## Setup\n\n## Setup\n\n## Setup 2\n")
            .expect("render");

        let ids: Vec<&str> = article.toc.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-2", "setup-2-2"]);
        assert!(article.html.contains("<h2 id=\"setup-2-2\">Setup 2</h2>"));
    }

    #[test]
    fn heading_text_is_plain_and_unescaped() {
        let article = ArticleRenderer::new()
            .render("## Using `Vec<T>` & *friends*\n\n## Next\n")
            .expect("render");

        assert_eq!(article.toc.items()[0].text, "Using Vec<T> & friends");
        assert!(article.toc.is_visible());
    }

    #[test]
    fn scripts_are_stripped() {
        let article = ArticleRenderer::new()
            .render("## Hi\n\n<script>alert(1)</script>\n\n<p id=\"evil\">x</p>")
            .expect("render");

        assert!(!article.html.contains("<script"));
        assert!(!article.html.contains("evil"));
    }

    #[test]
    fn single_heading_hides_toc() {
        let article = ArticleRenderer::new()
            .render("## Only\n\nbody")
            .expect("render");
        assert_eq!(article.toc.len(), 1);
        assert!(!article.toc.is_visible());
    }
}
