//! Configuration for the stamping service.
//!
//! Everything the server needs at startup lives in [`StampConfig`], built via
//! [`StampConfigBuilder`]. Per-operation drawing parameters that are not part
//! of the wire format (image offsets, opacity, the date font) are grouped in
//! [`StampStyle`], which is shared read-only by every request.
//!
//! # Design choice: builder over constructor
//! The CLI, tests and library users each set a different handful of knobs.
//! The builder lets them set only those and rely on documented defaults.

use crate::error::StampError;
use crate::fonts::FontRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Drawing parameters applied to every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampStyle {
    /// Registered font name used for the date text. Default: `Helvetica`.
    pub date_font: String,
    /// Date text size in points. Default: 12.
    pub date_font_size: f32,
    /// Vertical shift of the signature image in points (positive moves up). Default: 0.
    pub signature_offset: f32,
    /// Signature opacity; only values strictly between 0 and 1 blend. Default: 1.
    pub signature_opacity: f32,
    /// Vertical shift of the seal image in points. Default: 0.
    pub seal_offset: f32,
    /// Seal opacity; only values strictly between 0 and 1 blend. Default: 1.
    pub seal_opacity: f32,
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            date_font: "Helvetica".to_string(),
            date_font_size: 12.0,
            signature_offset: 0.0,
            signature_opacity: 1.0,
            seal_offset: 0.0,
            seal_opacity: 1.0,
        }
    }
}

/// Configuration for the stamping server and engine.
///
/// # Example
/// ```rust
/// use edgequake_pdfstamp::StampConfig;
///
/// let config = StampConfig::builder()
///     .port(9000)
///     .seal_opacity(0.8)
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 9000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampConfig {
    /// Bind address. Default: `0.0.0.0`.
    pub host: String,

    /// Listening port. Default: 8080. `0` asks the OS for a free port.
    pub port: u16,

    /// Whole-request timeout in seconds, enforced at the HTTP layer. Default: 60.
    ///
    /// A timed-out request still runs its blocking stamping job to
    /// completion; the job owns its buffers and frees them when it returns.
    pub request_timeout_secs: u64,

    /// Largest accepted request body in bytes. Default: 64 MiB.
    pub max_body_bytes: usize,

    /// Directory holding the pdfium shared library. If None, the system
    /// loader's search path is used.
    pub pdfium_library_path: Option<PathBuf>,

    /// Extra TrueType fonts, name → `.ttf` path, registered on top of the
    /// standard PDF faces.
    pub fonts: BTreeMap<String, PathBuf>,

    /// Drawing parameters.
    pub style: StampStyle,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 60,
            max_body_bytes: 64 * 1024 * 1024,
            pdfium_library_path: None,
            fonts: BTreeMap::new(),
            style: StampStyle::default(),
        }
    }
}

impl StampConfig {
    /// Create a new builder for `StampConfig`.
    pub fn builder() -> StampConfigBuilder {
        StampConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build the font table: standard faces plus every configured TrueType file.
    pub fn load_fonts(&self) -> Result<FontRegistry, StampError> {
        let mut registry = FontRegistry::standard();
        for (name, path) in &self.fonts {
            registry.load_true_type(name, path)?;
        }
        if !registry.contains(&self.style.date_font) {
            return Err(StampError::InvalidConfig(format!(
                "date font '{}' is neither a standard font nor configured with --font",
                self.style.date_font
            )));
        }
        Ok(registry)
    }
}

/// Builder for [`StampConfig`].
#[derive(Debug)]
pub struct StampConfigBuilder {
    config: StampConfig,
}

impl StampConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_body_bytes(mut self, n: usize) -> Self {
        self.config.max_body_bytes = n;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn font(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.config.fonts.insert(name.into(), path.into());
        self
    }

    pub fn date_font(mut self, name: impl Into<String>) -> Self {
        self.config.style.date_font = name.into();
        self
    }

    pub fn date_font_size(mut self, size: f32) -> Self {
        self.config.style.date_font_size = size;
        self
    }

    pub fn signature_offset(mut self, points: f32) -> Self {
        self.config.style.signature_offset = points;
        self
    }

    pub fn signature_opacity(mut self, opacity: f32) -> Self {
        self.config.style.signature_opacity = opacity;
        self
    }

    pub fn seal_offset(mut self, points: f32) -> Self {
        self.config.style.seal_offset = points;
        self
    }

    pub fn seal_opacity(mut self, opacity: f32) -> Self {
        self.config.style.seal_opacity = opacity;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StampConfig, StampError> {
        let c = &self.config;
        let s = &c.style;
        if !(s.date_font_size.is_finite() && s.date_font_size > 0.0) {
            return Err(StampError::InvalidConfig(format!(
                "date font size must be a positive number, got {}",
                s.date_font_size
            )));
        }
        for (what, v) in [
            ("signature offset", s.signature_offset),
            ("signature opacity", s.signature_opacity),
            ("seal offset", s.seal_offset),
            ("seal opacity", s.seal_opacity),
        ] {
            if !v.is_finite() {
                return Err(StampError::InvalidConfig(format!(
                    "{what} must be finite, got {v}"
                )));
            }
        }
        if s.date_font.is_empty() {
            return Err(StampError::InvalidConfig("date font must not be empty".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(StampError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_body_bytes < 4 {
            return Err(StampError::InvalidConfig(format!(
                "max body size {} cannot hold a request",
                c.max_body_bytes
            )));
        }
        Ok(self.config)
    }
}
