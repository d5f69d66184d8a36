//! Process-wide font table.
//!
//! Built once at startup and never mutated afterwards, so it is shared
//! between request workers behind an `Arc` without locking. Text operations
//! name their font; the engine looks the name up here.

use crate::error::StampError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The standard Type 1 faces every PDF viewer provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    pub const ALL: [StandardFont; 6] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::TimesRoman,
        StandardFont::TimesBold,
        StandardFont::Courier,
        StandardFont::CourierBold,
    ];

    /// PostScript name the face is registered under.
    pub fn name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
        }
    }
}

/// Where a registered font comes from.
#[derive(Debug, Clone)]
pub enum FontFace {
    Standard(StandardFont),
    /// TrueType program bytes, embedded into each document that uses it.
    TrueType(Arc<[u8]>),
}

/// Read-only name → face table.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    faces: BTreeMap<String, FontFace>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FontRegistry {
    /// A registry holding only the standard faces.
    pub fn standard() -> Self {
        let faces = StandardFont::ALL
            .iter()
            .map(|f| (f.name().to_string(), FontFace::Standard(*f)))
            .collect();
        Self { faces }
    }

    /// Register TrueType bytes under `name`, replacing any previous entry.
    pub fn register_true_type(&mut self, name: impl Into<String>, program: impl Into<Arc<[u8]>>) {
        self.faces
            .insert(name.into(), FontFace::TrueType(program.into()));
    }

    /// Load a `.ttf` file from disk and register it under `name`.
    pub fn load_true_type(&mut self, name: &str, path: &Path) -> Result<(), StampError> {
        let program = std::fs::read(path).map_err(|e| {
            StampError::InvalidConfig(format!("cannot read font '{name}' from {}: {e}", path.display()))
        })?;
        info!("Registered font '{}' ({} bytes) from {}", name, program.len(), path.display());
        self.register_true_type(name, program);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FontFace> {
        self.faces.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.faces.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.faces.keys().map(String::as_str)
    }
}
