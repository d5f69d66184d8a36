//! PDFium-backed document engine.
//!
//! ## Why bind once?
//!
//! Loading the pdfium shared library is slow and its bindings are global to
//! the process. [`PdfiumEngine::bind`] loads it once at startup; every
//! request then opens its own [`PdfDocument`] against the shared bindings.
//! Document access itself is never shared: one document, one blocking
//! worker, one request.
//!
//! ## Why search glyphs ourselves?
//!
//! PDFium exposes every character on a page together with its bounding box.
//! Matching the keyword over that sequence with
//! [`crate::anchor::find_last_match`] keeps the "literal, last occurrence"
//! rule in code we own and test, independent of PDFium's search flags.

use crate::anchor::{find_last_match, Glyph, Rect};
use crate::engine::{DocumentEngine, StampDocument};
use crate::error::StampError;
use crate::fonts::{FontFace, FontRegistry, StandardFont};
use crate::pipeline::{placement, raster};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Document engine backed by the pdfium library.
pub struct PdfiumEngine {
    pdfium: Pdfium,
    fonts: FontRegistry,
}

impl std::fmt::Debug for PdfiumEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfiumEngine")
            .field("pdfium", &"<bindings>")
            .field("fonts", &self.fonts)
            .finish()
    }
}

impl PdfiumEngine {
    /// Bind to the pdfium library in `library_dir`, or to the system library
    /// when `None`.
    ///
    /// # Errors
    /// [`StampError::PdfiumBindingFailed`] when no usable library is found.
    pub fn bind(library_dir: Option<&Path>, fonts: FontRegistry) -> Result<Self, StampError> {
        let bindings = match library_dir {
            Some(dir) => {
                let lib = Pdfium::pdfium_platform_library_name_at_path(dir);
                info!("Binding pdfium from {}", lib.display());
                Pdfium::bind_to_library(&lib)
            }
            None => {
                info!("Binding system pdfium library");
                Pdfium::bind_to_system_library()
            }
        }
        .map_err(|e| StampError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            fonts,
        })
    }

    /// The bound library. Pdfium cannot be bound twice in one process, so
    /// anything else that needs it (inspecting output, say) borrows this one.
    pub fn pdfium(&self) -> &Pdfium {
        &self.pdfium
    }
}

impl DocumentEngine for PdfiumEngine {
    type Document<'a>
        = PdfiumDocument<'a>
    where
        Self: 'a;

    fn name(&self) -> &'static str {
        "pdfium"
    }

    fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<PdfiumDocument<'a>, StampError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(pdfium_err("open document"))?;
        Ok(PdfiumDocument {
            document,
            fonts: &self.fonts,
        })
    }
}

/// One opened document. Dropping it closes the native handle.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    fonts: &'a FontRegistry,
}

impl<'a> PdfiumDocument<'a> {
    fn font_token(&mut self, name: &str) -> Result<PdfFontToken, StampError> {
        let face = self.fonts.get(name).ok_or_else(|| {
            StampError::engine("draw text", format!("font '{name}' is not registered"))
        })?;
        match face {
            FontFace::Standard(font) => Ok(self.document.fonts_mut().new_built_in(builtin(*font))),
            FontFace::TrueType(program) => self
                .document
                .fonts_mut()
                .load_true_type_from_bytes(program, true)
                .map_err(pdfium_err("embed font")),
        }
    }
}

impl<'a> StampDocument for PdfiumDocument<'a> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_width(&self, page: usize) -> Result<f32, StampError> {
        let page = self
            .document
            .pages()
            .get(page as PdfPageIndex)
            .map_err(pdfium_err("load page"))?;
        Ok(page.width().value)
    }

    fn find_last_keyword_rect(
        &self,
        page: usize,
        keyword: &str,
    ) -> Result<Option<Rect>, StampError> {
        let page = self
            .document
            .pages()
            .get(page as PdfPageIndex)
            .map_err(pdfium_err("load page"))?;
        let text = page.text().map_err(pdfium_err("extract text"))?;

        // Unreadable characters stay in the sequence as placeholders so the
        // glyphs around them never become adjacent.
        let glyphs: Vec<Glyph> = text
            .chars()
            .iter()
            .map(|c| {
                let bounds = c
                    .loose_bounds()
                    .map(|b| {
                        Rect::from_edges(
                            b.left().value,
                            b.bottom().value,
                            b.right().value,
                            b.top().value,
                        )
                    })
                    .ok();
                match (c.unicode_char(), bounds) {
                    (Some(ch), Some(bounds)) => Glyph { ch, bounds },
                    (_, bounds) => Glyph::placeholder(bounds.unwrap_or_default()),
                }
            })
            .collect();
        debug!("Searching {} glyphs for '{}'", glyphs.len(), keyword);

        Ok(find_last_match(&glyphs, keyword))
    }

    fn draw_image(
        &mut self,
        page: usize,
        anchor: Rect,
        image: &[u8],
        vertical_offset: f32,
        opacity: f32,
    ) -> Result<(), StampError> {
        let image = raster::decode_stamp_image(image, opacity)?;
        // One image pixel per point, as the stamp artwork is authored.
        let (width, height) = (image.width() as f32, image.height() as f32);
        let (x, y) = placement::image_origin(anchor, height, vertical_offset);

        let mut object = PdfPageImageObject::new_with_size(
            &self.document,
            &image,
            PdfPoints::new(width),
            PdfPoints::new(height),
        )
        .map_err(pdfium_err("draw image"))?;
        object
            .translate(PdfPoints::new(x), PdfPoints::new(y))
            .map_err(pdfium_err("draw image"))?;

        let mut page = self
            .document
            .pages()
            .get(page as PdfPageIndex)
            .map_err(pdfium_err("load page"))?;
        page.objects_mut()
            .add_image_object(object)
            .map_err(pdfium_err("draw image"))?;
        debug!("Image {}x{} placed at ({}, {})", width, height, x, y);
        Ok(())
    }

    fn draw_text(
        &mut self,
        page: usize,
        anchor: Rect,
        text: &str,
        font: &str,
        font_size: f32,
    ) -> Result<(), StampError> {
        let token = self.font_token(font)?;
        let (x, y) = placement::text_origin(anchor, self.page_width(page)?);

        let mut page = self
            .document
            .pages()
            .get(page as PdfPageIndex)
            .map_err(pdfium_err("load page"))?;
        page.objects_mut()
            .create_text_object(
                PdfPoints::new(x),
                PdfPoints::new(y),
                text,
                token,
                PdfPoints::new(font_size),
            )
            .map_err(pdfium_err("draw text"))?;
        debug!("Text '{}' ({} {}pt) placed at ({}, {})", text, font, font_size, x, y);
        Ok(())
    }

    fn set_form_field(
        &mut self,
        name: &str,
        value: &str,
        read_only: bool,
    ) -> Result<bool, StampError> {
        let mut filled = false;

        for page in self.document.pages().iter() {
            for mut annotation in page.annotations().iter() {
                let Some(field) = annotation.as_form_field_mut() else {
                    continue;
                };
                if field.name().as_deref() != Some(name) {
                    continue;
                }

                let PdfFormField::Text(text_field) = field else {
                    warn!("Form field '{}' is not a text field; left unchanged", name);
                    continue;
                };
                text_field.set_value(value).map_err(pdfium_err("fill form"))?;
                // Field flag (Ff bit 1). The widget's /F ReadOnly bit has no
                // effect on form widgets.
                if read_only {
                    text_field
                        .set_is_read_only(true)
                        .map_err(pdfium_err("fill form"))?;
                }
                filled = true;
            }
        }

        Ok(filled)
    }

    fn save(&self) -> Result<Vec<u8>, StampError> {
        self.document
            .save_to_bytes()
            .map_err(pdfium_err("save document"))
    }
}

fn builtin(font: StandardFont) -> PdfFontBuiltin {
    match font {
        StandardFont::Helvetica => PdfFontBuiltin::Helvetica,
        StandardFont::HelveticaBold => PdfFontBuiltin::HelveticaBold,
        StandardFont::TimesRoman => PdfFontBuiltin::TimesRoman,
        StandardFont::TimesBold => PdfFontBuiltin::TimesBold,
        StandardFont::Courier => PdfFontBuiltin::Courier,
        StandardFont::CourierBold => PdfFontBuiltin::CourierBold,
    }
}

fn pdfium_err(stage: &'static str) -> impl Fn(PdfiumError) -> StampError {
    move |e| StampError::engine(stage, format!("{:?}", e))
}
