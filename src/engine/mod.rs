//! The document-engine capability the stamping pipeline drives.
//!
//! Parsing, text extraction, font embedding and drawing all belong to the
//! engine. The pipeline only sees these two traits, so the production PDFium
//! binding ([`pdfium::PdfiumEngine`]) and the in-memory doubles used in tests
//! are interchangeable.
//!
//! ## Lifetimes
//!
//! An opened document borrows both the engine (PDFium bindings, font table)
//! and the source bytes. It lives for one request and is dropped on every
//! exit path, which releases the native document.

pub mod pdfium;

use crate::anchor::Rect;
use crate::error::StampError;
use crate::fonts::FontRegistry;

/// Opens documents. One instance serves every request.
pub trait DocumentEngine: Send + Sync {
    /// A single opened, mutable document.
    type Document<'a>: StampDocument
    where
        Self: 'a;

    /// Engine name reported by the health endpoint.
    fn name(&self) -> &'static str;

    /// The read-only font table text operations resolve against.
    fn fonts(&self) -> &FontRegistry;

    /// Parse `bytes` into a mutable document.
    ///
    /// # Errors
    /// [`StampError::Engine`] when the bytes are not a usable document.
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Self::Document<'a>, StampError>;
}

/// Primitives the pipeline applies to an opened document.
///
/// Page indices are zero-based. Every method reports failure as
/// [`StampError::Engine`]; none of them retry.
pub trait StampDocument {
    fn page_count(&self) -> usize;

    /// Index of the final page, or `None` for an empty document.
    fn last_page_index(&self) -> Option<usize> {
        self.page_count().checked_sub(1)
    }

    /// Width of `page` in points.
    fn page_width(&self, page: usize) -> Result<f32, StampError>;

    /// Rectangle of the last literal occurrence of `keyword` on `page`.
    fn find_last_keyword_rect(&self, page: usize, keyword: &str)
        -> Result<Option<Rect>, StampError>;

    /// Draw encoded image bytes (PNG or JPEG) next to `anchor`.
    fn draw_image(
        &mut self,
        page: usize,
        anchor: Rect,
        image: &[u8],
        vertical_offset: f32,
        opacity: f32,
    ) -> Result<(), StampError>;

    /// Draw `text` next to `anchor` in a font from the engine's registry.
    fn draw_text(
        &mut self,
        page: usize,
        anchor: Rect,
        text: &str,
        font: &str,
        font_size: f32,
    ) -> Result<(), StampError>;

    /// Set the form field called `name`. Returns `false` when the document
    /// has no such field or the field cannot hold text.
    fn set_form_field(&mut self, name: &str, value: &str, read_only: bool)
        -> Result<bool, StampError>;

    /// Serialize the document with all changes applied.
    fn save(&self) -> Result<Vec<u8>, StampError>;
}
