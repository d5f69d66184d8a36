//! Error types for the edgequake-pdfstamp library.
//!
//! Two error types mirror the two layers of a request:
//!
//! * [`WireError`]: the request body could not be decoded. Always the
//!   client's fault; nothing has touched the document yet.
//!
//! * [`StampError`]: the request as a whole failed: bad body, a keyword
//!   anchor missing from the document, the document engine refusing the
//!   input, or an unexpected internal failure. Every variant aborts the
//!   request; there is no partially stamped output.
//!
//! [`StampError::status_code`] is the single place that classifies a failure
//! as a client or server error for the HTTP layer.

use thiserror::Error;

/// A malformed or truncated request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// A length prefix or payload runs past the end of the body.
    #[error("Truncated request: field '{field}' needs {needed} bytes but only {remaining} remain")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// A length that must be non-negative was negative.
    #[error("Negative length {len} for field '{field}'")]
    NegativeLength { field: &'static str, len: i32 },

    /// The required document field was absent (length zero).
    #[error("Request carries no document")]
    MissingDocument,

    /// A text field is not valid UTF-8.
    #[error("Field '{field}' is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// Bytes left over after the form block.
    #[error("{count} trailing bytes after the form block")]
    TrailingBytes { count: usize },

    /// A field or count does not fit the 32-bit length prefix (encode only).
    #[error("Field '{field}' is {len} long, above the {} limit", i32::MAX)]
    TooLarge { field: &'static str, len: usize },
}

/// All errors that abort a stamping request.
#[derive(Debug, Error)]
pub enum StampError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The request body could not be decoded.
    #[error("Malformed request: {0}")]
    Decode(#[from] WireError),

    /// A keyword anchor does not occur on the document's last page.
    #[error("Keyword not found on last page: '{keyword}'")]
    KeywordNotFound { keyword: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The document engine failed to open, search, mutate or save.
    #[error("Document engine failed to {stage}: {detail}")]
    Engine { stage: &'static str, detail: String },

    // ── Startup errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set --pdfium-lib (PDFSTAMP_PDFIUM_LIB) to the directory containing libpdfium,\n\
or install it where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Client errors ─────────────────────────────────────────────────────
    /// Sending a request to a remote stamping service failed.
    #[error("Failed to reach '{url}': {reason}\nCheck that the service is running.")]
    RemoteFailed { url: String, reason: String },

    /// The remote service did not answer in time.
    #[error("Request to '{url}' timed out after {secs}s")]
    RemoteTimeout { url: String, secs: u64 },

    /// The remote service answered with an error status.
    #[error("'{url}' rejected the request (HTTP {status}): {message}")]
    RemoteRejected {
        url: String,
        status: u16,
        message: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the stamped output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StampError {
    /// Shorthand for an [`StampError::Engine`] failure at `stage`.
    pub fn engine(stage: &'static str, detail: impl ToString) -> Self {
        StampError::Engine {
            stage,
            detail: detail.to_string(),
        }
    }

    /// HTTP status code for this error.
    ///
    /// Bad bodies are `400`, unusable documents and missing anchors are
    /// `422`, failures talking to another stamping service are `502`, and
    /// everything else is a `500`.
    pub fn status_code(&self) -> u16 {
        match self {
            StampError::Decode(_) => 400,
            StampError::KeywordNotFound { .. } | StampError::Engine { .. } => 422,
            StampError::InvalidConfig(_)
            | StampError::PdfiumBindingFailed(_)
            | StampError::OutputWriteFailed { .. }
            | StampError::Internal(_) => 500,
            StampError::RemoteFailed { .. }
            | StampError::RemoteTimeout { .. }
            | StampError::RemoteRejected { .. } => 502,
        }
    }

    /// `true` when the caller sent something this service cannot stamp.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_not_found_names_the_keyword() {
        let e = StampError::KeywordNotFound {
            keyword: "Date:".into(),
        };
        assert!(e.to_string().contains("'Date:'"), "got: {e}");
        assert_eq!(e.status_code(), 422);
        assert!(e.is_client_error());
    }

    #[test]
    fn decode_error_is_bad_request() {
        let e: StampError = WireError::MissingDocument.into();
        assert_eq!(e.status_code(), 400);
        assert!(e.to_string().contains("no document"));
    }

    #[test]
    fn truncated_display() {
        let e = WireError::Truncated {
            field: "seal",
            needed: 10,
            remaining: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("seal"), "got: {msg}");
        assert!(msg.contains("10"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn engine_error_display() {
        let e = StampError::engine("save", "disk full");
        assert_eq!(e.to_string(), "Document engine failed to save: disk full");
        assert!(e.is_client_error());
    }

    #[test]
    fn internal_is_server_error() {
        let e = StampError::Internal("worker panicked".into());
        assert_eq!(e.status_code(), 500);
        assert!(!e.is_client_error());
    }
}
