//! In-memory document engine for integration tests.
//!
//! Pages are glyph lists, form fields are a name set, and every primitive
//! call is recorded so tests can assert what the pipeline did and in which
//! order. `save` appends the call log to the input bytes.

#![allow(dead_code)]

use edgequake_pdfstamp::pipeline::{placement, raster};
use edgequake_pdfstamp::{
    find_last_match, DocumentEngine, FontRegistry, Glyph, Rect, StampDocument, StampError,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

pub const PAGE_WIDTH: f32 = 595.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search {
        page: usize,
        keyword: String,
    },
    Field {
        name: String,
        value: String,
        read_only: bool,
        found: bool,
    },
    Text {
        page: usize,
        x: f32,
        y: f32,
        text: String,
        font: String,
        size: f32,
    },
    Image {
        page: usize,
        x: f32,
        y: f32,
        width: u32,
        height: u32,
        opacity: f32,
    },
    Save,
}

pub struct FakeEngine {
    pages: Vec<Vec<Glyph>>,
    fields: BTreeSet<String>,
    fonts: FontRegistry,
    calls: Mutex<Vec<Call>>,
    open_delay: Option<Duration>,
}

impl FakeEngine {
    pub fn new(pages: Vec<Vec<Glyph>>) -> Self {
        Self {
            pages,
            fields: BTreeSet::new(),
            fonts: FontRegistry::standard(),
            calls: Mutex::new(Vec::new()),
            open_delay: None,
        }
    }

    /// Block for `delay` in every `open`, like a slow parse of a large file.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    pub fn with_fields<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.fields = names.into_iter().map(str::to_string).collect();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Search { keyword, .. } => Some(keyword),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl DocumentEngine for FakeEngine {
    type Document<'a>
        = FakeDocument<'a>
    where
        Self: 'a;

    fn name(&self) -> &'static str {
        "fake"
    }

    fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<FakeDocument<'a>, StampError> {
        if let Some(delay) = self.open_delay {
            std::thread::sleep(delay);
        }
        if !bytes.starts_with(b"%PDF") {
            return Err(StampError::engine("open document", "not a PDF"));
        }
        Ok(FakeDocument {
            engine: self,
            source: bytes,
        })
    }
}

pub struct FakeDocument<'a> {
    engine: &'a FakeEngine,
    source: &'a [u8],
}

impl StampDocument for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.engine.pages.len()
    }

    fn page_width(&self, _page: usize) -> Result<f32, StampError> {
        Ok(PAGE_WIDTH)
    }

    fn find_last_keyword_rect(
        &self,
        page: usize,
        keyword: &str,
    ) -> Result<Option<Rect>, StampError> {
        self.engine.record(Call::Search {
            page,
            keyword: keyword.to_string(),
        });
        let glyphs = self
            .engine
            .pages
            .get(page)
            .ok_or_else(|| StampError::engine("search", "page out of range"))?;
        Ok(find_last_match(glyphs, keyword))
    }

    fn draw_image(
        &mut self,
        page: usize,
        anchor: Rect,
        image: &[u8],
        vertical_offset: f32,
        opacity: f32,
    ) -> Result<(), StampError> {
        let decoded = raster::decode_stamp_image(image, opacity)?;
        let (x, y) = placement::image_origin(anchor, decoded.height() as f32, vertical_offset);
        self.engine.record(Call::Image {
            page,
            x,
            y,
            width: decoded.width(),
            height: decoded.height(),
            opacity,
        });
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
        if !self.engine.fonts.contains(font) {
            return Err(StampError::engine(
                "draw text",
                format!("font '{font}' is not registered"),
            ));
        }
        let (x, y) = placement::text_origin(anchor, self.page_width(page)?);
        self.engine.record(Call::Text {
            page,
            x,
            y,
            text: text.to_string(),
            font: font.to_string(),
            size: font_size,
        });
        Ok(())
    }

    fn set_form_field(
        &mut self,
        name: &str,
        value: &str,
        read_only: bool,
    ) -> Result<bool, StampError> {
        let found = self.engine.fields.contains(name);
        self.engine.record(Call::Field {
            name: name.to_string(),
            value: value.to_string(),
            read_only,
            found,
        });
        Ok(found)
    }

    fn save(&self) -> Result<Vec<u8>, StampError> {
        self.engine.record(Call::Save);
        let mut out = self.source.to_vec();
        out.extend_from_slice(b"\n%%STAMPED");
        Ok(out)
    }
}

/// Lay `text` out on one line, 10pt per glyph, 12pt tall, from `(x, y)`.
pub fn line(text: &str, x: f32, y: f32) -> Vec<Glyph> {
    text.chars()
        .enumerate()
        .map(|(i, ch)| Glyph {
            ch,
            bounds: Rect::new(x + i as f32 * 10.0, y, 10.0, 12.0),
        })
        .collect()
}

/// A solid `width`×`height` PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([20, 40, 160, 255]),
    ));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Three pages; the last carries a signature block.
///
/// Last page: `Signed:` at (100, 50), `Date:` at (300, 90), and an earlier
/// `Date:` at (50, 700) that must not be used.
pub fn contract() -> FakeEngine {
    let mut last = line("Date: see above", 50.0, 700.0);
    last.extend(line("Signed:", 100.0, 50.0));
    last.extend(line("Date:", 300.0, 90.0));
    FakeEngine::new(vec![
        line("Page one", 50.0, 700.0),
        line("Signed: nobody", 50.0, 700.0),
        last,
    ])
}

pub const PDF: &[u8] = b"%PDF-1.7 fake";
