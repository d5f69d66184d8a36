//! The stamping pipeline: apply an ordered operation list to one document.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ open ──▶ resolve anchors ──▶ apply ops in order ──▶ save
//!          (engine)  (once per keyword)  (single match)        (bytes)
//! ```
//!
//! The run is all-or-nothing: the first failing operation aborts it and the
//! half-stamped document is dropped unsaved.
//!
//! Helpers:
//! 1. [`placement`]: anchor-relative coordinates for image and text stamps
//! 2. [`raster`]:    decode image payloads and bake in opacity

pub mod placement;
pub mod raster;

use crate::anchor::AnchorResolver;
use crate::engine::{DocumentEngine, StampDocument};
use crate::error::StampError;
use crate::operation::Operation;
use tracing::{debug, info, warn};

/// Apply `operations` to `document` and return the stamped bytes.
///
/// Keyword anchors are resolved up front, once per distinct keyword, so a
/// missing keyword fails the request before anything is drawn. Operations
/// are then applied in the order given; later ones draw on top.
///
/// This is blocking, CPU-bound work. Call it from `spawn_blocking` (see
/// [`crate::stamp::stamp`]).
///
/// # Errors
/// [`StampError::KeywordNotFound`] or [`StampError::Engine`]; no output is
/// produced in either case.
pub fn apply<E: DocumentEngine + ?Sized>(
    engine: &E,
    document: &[u8],
    operations: &[Operation],
) -> Result<Vec<u8>, StampError> {
    let mut doc = engine.open(document)?;
    let last_page = doc
        .last_page_index()
        .ok_or_else(|| StampError::engine("open", "document has no pages"))?;
    debug!(
        "Opened document: {} pages, stamping page {}",
        doc.page_count(),
        last_page + 1
    );

    let mut anchors = AnchorResolver::new(last_page);
    for keyword in operations.iter().filter_map(Operation::keyword) {
        anchors.resolve(&doc, keyword)?;
    }

    for op in operations {
        apply_one(&mut doc, &mut anchors, op)?;
    }

    let out = doc.save()?;
    info!(
        "Stamped {} operations ({} anchors): {} → {} bytes",
        operations.len(),
        anchors.resolved_count(),
        document.len(),
        out.len()
    );
    Ok(out)
}

fn apply_one<D: StampDocument>(
    doc: &mut D,
    anchors: &mut AnchorResolver,
    op: &Operation,
) -> Result<(), StampError> {
    let page = anchors.page();
    match op {
        Operation::FormFill(values) => {
            for (name, value) in values {
                if !doc.set_form_field(name, value, true)? {
                    warn!("Form field '{}' not filled: missing or not a text field", name);
                }
            }
            Ok(())
        }
        Operation::ImageAtKeyword {
            image,
            keyword,
            vertical_offset,
            opacity,
        } => {
            let rect = anchors.resolve(&*doc, keyword)?;
            doc.draw_image(page, rect, image, *vertical_offset, *opacity)
        }
        Operation::TextAtKeyword {
            text,
            keyword,
            font,
            font_size,
        } => {
            let rect = anchors.resolve(&*doc, keyword)?;
            doc.draw_text(page, rect, text, font, *font_size)
        }
    }
}
