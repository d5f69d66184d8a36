//! Keyword anchors: locating where on the page a stamp goes.
//!
//! A keyword is matched literally against the glyph sequence of the
//! document's last page. Stamps go next to the *last* occurrence, which on a
//! contract page is the signature line nearest the bottom even when the same
//! label appears earlier in the text.
//!
//! Only the last page is searched. Input documents are expected to carry
//! their signature block on the final page.

use crate::engine::StampDocument;
use crate::error::StampError;
use std::collections::HashMap;
use tracing::debug;

/// Axis-aligned rectangle in PDF user space (points, origin bottom-left).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning `left..right` and `bottom..top`.
    pub fn from_edges(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            x: left,
            y: bottom,
            width: right - left,
            height: top - bottom,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_edges(
            self.left().min(other.left()),
            self.bottom().min(other.bottom()),
            self.right().max(other.right()),
            self.top().max(other.top()),
        )
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x:{},y:{},w:{},h:{}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// One character of page text with its bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bounds: Rect,
}

impl Glyph {
    /// Stand-in for a character the engine could not decode.
    pub const PLACEHOLDER: char = char::REPLACEMENT_CHARACTER;

    /// A glyph that occupies a position in the text but matches nothing.
    pub fn placeholder(bounds: Rect) -> Self {
        Self {
            ch: Self::PLACEHOLDER,
            bounds,
        }
    }

    fn matches(&self, c: char) -> bool {
        self.ch == c && self.ch != Self::PLACEHOLDER
    }
}

/// Rectangle of the last literal occurrence of `keyword` in `glyphs`.
///
/// The result is the union of the matched glyphs' bounds. Occurrences may
/// overlap (`"aa"` in `"aaa"` ends at the last `a`). An empty keyword never
/// matches, and neither does any span containing a [`Glyph::placeholder`].
pub fn find_last_match(glyphs: &[Glyph], keyword: &str) -> Option<Rect> {
    let needle: Vec<char> = keyword.chars().collect();
    if needle.is_empty() || needle.len() > glyphs.len() {
        return None;
    }

    (0..=glyphs.len() - needle.len())
        .rev()
        .find(|&start| {
            glyphs[start..start + needle.len()]
                .iter()
                .zip(&needle)
                .all(|(g, c)| g.matches(*c))
        })
        .map(|start| {
            let matched = &glyphs[start..start + needle.len()];
            matched[1..]
                .iter()
                .fold(matched[0].bounds, |acc, g| acc.union(&g.bounds))
        })
}

/// Per-request keyword → rectangle memo over one document's last page.
#[derive(Debug)]
pub struct AnchorResolver {
    page: usize,
    resolved: HashMap<String, Rect>,
}

impl AnchorResolver {
    /// Resolver searching page index `page` (the document's last page).
    pub fn new(page: usize) -> Self {
        Self {
            page,
            resolved: HashMap::new(),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Rectangle of the last occurrence of `keyword`, searching the document
    /// at most once per distinct keyword.
    ///
    /// # Errors
    /// [`StampError::KeywordNotFound`] when the keyword does not occur, or
    /// whatever the engine's search reports.
    pub fn resolve<D: StampDocument + ?Sized>(
        &mut self,
        document: &D,
        keyword: &str,
    ) -> Result<Rect, StampError> {
        if let Some(rect) = self.resolved.get(keyword) {
            return Ok(*rect);
        }

        let rect = document
            .find_last_keyword_rect(self.page, keyword)?
            .ok_or_else(|| StampError::KeywordNotFound {
                keyword: keyword.to_string(),
            })?;
        debug!("rect for '{}' on page {}: {}", keyword, self.page + 1, rect);

        self.resolved.insert(keyword.to_string(), rect);
        Ok(rect)
    }

    /// Number of distinct keywords resolved so far.
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }
}
