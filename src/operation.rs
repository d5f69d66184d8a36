//! Stamping operations and their construction from a decoded request.

use crate::config::StampStyle;
use crate::wire::StampRequest;
use bytes::Bytes;
use std::collections::BTreeMap;
use tracing::debug;

/// One stamping action.
///
/// The variant set is closed; [`crate::pipeline::apply`] dispatches on it in
/// a single `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Set form fields by name and mark them read-only.
    FormFill(BTreeMap<String, String>),
    /// Draw an image just right of the last occurrence of `keyword`.
    ImageAtKeyword {
        image: Bytes,
        keyword: String,
        /// Points added to the image's vertical position (positive moves up).
        vertical_offset: f32,
        /// Blending applies only for values strictly between 0 and 1.
        opacity: f32,
    },
    /// Draw text just right of the last occurrence of `keyword`.
    TextAtKeyword {
        text: String,
        keyword: String,
        font: String,
        font_size: f32,
    },
}

impl Operation {
    /// The anchor keyword, or `None` for operations that need no anchor.
    pub fn keyword(&self) -> Option<&str> {
        match self {
            Operation::FormFill(_) => None,
            Operation::ImageAtKeyword { keyword, .. } | Operation::TextAtKeyword { keyword, .. } => {
                Some(keyword.as_str())
            }
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::FormFill(_) => "form",
            Operation::ImageAtKeyword { .. } => "image",
            Operation::TextAtKeyword { .. } => "text",
        }
    }
}

/// Project a request onto the canonical operation list:
/// form fill, date text, signature image, seal image.
///
/// Later operations draw over earlier ones. A value without its keyword (or
/// a keyword without its value) produces nothing.
pub fn build_operations(request: &StampRequest, style: &StampStyle) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(4);

    if !request.form_fields.is_empty() {
        ops.push(Operation::FormFill(request.form_fields.clone()));
    }

    match (&request.date, &request.date_keyword) {
        (Some(text), Some(keyword)) => ops.push(Operation::TextAtKeyword {
            text: text.clone(),
            keyword: keyword.clone(),
            font: style.date_font.clone(),
            font_size: style.date_font_size,
        }),
        (None, None) => {}
        _ => debug!("Dropping date: value and keyword must both be present"),
    }

    match (&request.signature, &request.signature_keyword) {
        (Some(image), Some(keyword)) => ops.push(Operation::ImageAtKeyword {
            image: image.clone(),
            keyword: keyword.clone(),
            vertical_offset: style.signature_offset,
            opacity: style.signature_opacity,
        }),
        (None, None) => {}
        _ => debug!("Dropping signature: image and keyword must both be present"),
    }

    match (&request.seal, &request.seal_keyword) {
        (Some(image), Some(keyword)) => ops.push(Operation::ImageAtKeyword {
            image: image.clone(),
            keyword: keyword.clone(),
            vertical_offset: style.seal_offset,
            opacity: style.seal_opacity,
        }),
        (None, None) => {}
        _ => debug!("Dropping seal: image and keyword must both be present"),
    }

    ops
}
