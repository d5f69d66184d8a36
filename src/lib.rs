//! # edgequake-pdfstamp
//!
//! Stamp signature images, seal images, date text and form values onto PDF
//! documents, positioned by keywords found on the document's last page.
//!
//! ## Why keywords?
//!
//! Contract templates move their signature block around between versions,
//! so fixed coordinates break. A label such as `Signed:` or `Date:` moves
//! with the block. Each stamp is placed just to the right of the last
//! occurrence of its keyword on the final page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request body
//!  │
//!  ├─ 1. Decode   length-prefixed binary fields → StampRequest
//!  ├─ 2. Plan     StampRequest → ordered operations (form, date, signature, seal)
//!  ├─ 3. Anchor   resolve each keyword once on the last page
//!  ├─ 4. Apply    fill fields, draw text and images (spawn_blocking)
//!  └─ 5. Save     serialise the stamped document
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfstamp::{stamp, PdfiumEngine, StampConfig, StampRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StampConfig::default();
//!     let engine = Arc::new(PdfiumEngine::bind(None, config.load_fonts()?)?);
//!
//!     let request = StampRequest::new(std::fs::read("contract.pdf")?)
//!         .with_signature(std::fs::read("signature.png")?, "Signed:")
//!         .with_date("2024-05-01", "Date:")
//!         .with_field("name", "Alice");
//!
//!     let pdf = stamp(engine, request, &config.style).await?;
//!     std::fs::write("contract-signed.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfstamp` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when embedding the library:
//! ```toml
//! edgequake-pdfstamp = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod anchor;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod fonts;
pub mod operation;
pub mod pipeline;
pub mod server;
pub mod stamp;
pub mod wire;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use anchor::{find_last_match, AnchorResolver, Glyph, Rect};
pub use config::{StampConfig, StampConfigBuilder, StampStyle};
pub use engine::pdfium::PdfiumEngine;
pub use engine::{DocumentEngine, StampDocument};
pub use error::{StampError, WireError};
pub use fonts::{FontFace, FontRegistry, StandardFont};
pub use operation::{build_operations, Operation};
pub use server::build_router;
pub use stamp::{stamp, stamp_body, stamp_to_file};
pub use wire::{decode, encode, StampRequest};
