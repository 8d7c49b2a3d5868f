//! Table of contents derived from rendered article headings.

use serde::Serialize;

/// Headings whose top edge sits within this many pixels below the viewport
/// top already count as "reached".
pub const ACTIVE_OFFSET_PX: f64 = 120.0;

/// Heading levels that participate in the table of contents.
pub const MIN_LEVEL: u8 = 2;
pub const MAX_LEVEL: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocItem {
    pub level: u8,
    pub text: String,
    pub id: String,
}

impl TocItem {
    /// Indentation steps relative to the shallowest tracked level.
    pub fn indent(&self) -> u8 {
        self.level.saturating_sub(MIN_LEVEL)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableOfContents {
    items: Vec<TocItem>,
}

impl TableOfContents {
    pub fn new(items: Vec<TocItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[TocItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// A single heading does not warrant navigation.
    pub fn is_visible(&self) -> bool {
        self.items.len() >= 2
    }

    /// Id of the section the reader is in.
    ///
    /// `offsets` holds the document offset of each heading, in the same order
    /// as [`items`](Self::items). The active entry is the last heading whose
    /// offset is at or above `scroll_y + ACTIVE_OFFSET_PX`; before any heading
    /// is reached the first one is active.
    pub fn active_id(&self, offsets: &[f64], scroll_y: f64) -> Option<&str> {
        let first = self.items.first()?;
        let threshold = scroll_y + ACTIVE_OFFSET_PX;

        let active = self
            .items
            .iter()
            .zip(offsets)
            .filter(|(_, offset)| **offset <= threshold)
            .map(|(item, _)| item)
            .last()
            .unwrap_or(first);

        Some(active.id.as_str())
    }

    /// Heading active when the page is first shown.
    pub fn initial_active_id(&self) -> Option<&str> {
        self.items.first().map(|item| item.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toc() -> TableOfContents {
        TableOfContents::new(vec![
            TocItem {
                level: 2,
                text: "Intro".to_string(),
                id: "intro".to_string(),
            },
            TocItem {
                level: 3,
                text: "Details".to_string(),
                id: "details".to_string(),
            },
            TocItem {
                level: 4,
                text: "Fine print".to_string(),
                id: "fine-print".to_string(),
            },
        ])
    }

    #[test]
    fn first_heading_is_active_before_scrolling() {
        let toc = toc();
        assert_eq!(toc.active_id(&[400.0, 900.0, 1500.0], 0.0), Some("intro"));
        assert_eq!(toc.initial_active_id(), Some("intro"));
    }

    #[test]
    fn last_reached_heading_wins() {
        let toc = toc();
        let offsets = [400.0, 900.0, 1500.0];

        assert_eq!(toc.active_id(&offsets, 780.0), Some("details"));
        assert_eq!(toc.active_id(&offsets, 779.0), Some("intro"));
        assert_eq!(toc.active_id(&offsets, 5000.0), Some("fine-print"));
    }

    #[test]
    fn visibility_requires_two_headings() {
        assert!(toc().is_visible());
        assert!(!TableOfContents::default().is_visible());
        assert_eq!(TableOfContents::default().active_id(&[], 0.0), None);

        let single = TableOfContents::new(toc().items()[..1].to_vec());
        assert!(!single.is_visible());
    }

    #[test]
    fn indent_follows_level() {
        let toc = toc();
        let indents: Vec<u8> = toc.items().iter().map(TocItem::indent).collect();
        assert_eq!(indents, vec![0, 1, 2]);
    }
}
