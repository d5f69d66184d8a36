//! Top-level stamping entry points.
//!
//! These turn a decoded [`StampRequest`] into an ordered operation list and
//! run the blocking pipeline on tokio's blocking pool. The engine is shared
//! behind an `Arc`; everything else a job needs is moved into it, so the
//! request's buffers are released when the job returns, whether or not the
//! caller is still waiting.

use crate::config::StampStyle;
use crate::engine::DocumentEngine;
use crate::error::StampError;
use crate::operation::{build_operations, Operation};
use crate::pipeline;
use crate::wire::{self, StampRequest};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Stamp one request and return the modified document.
///
/// # Errors
/// Any [`StampError`] from the pipeline, or [`StampError::Internal`] if the
/// blocking job panicked.
pub async fn stamp<E>(
    engine: Arc<E>,
    request: StampRequest,
    style: &StampStyle,
) -> Result<Vec<u8>, StampError>
where
    E: DocumentEngine + 'static,
{
    let start = Instant::now();
    let operations = build_operations(&request, style);
    let kinds: Vec<&str> = operations.iter().map(Operation::kind).collect();
    info!(
        "Stamping {} byte document: [{}]",
        request.document.len(),
        kinds.join(", ")
    );

    let document = request.document;
    let stamped = tokio::task::spawn_blocking(move || {
        pipeline::apply(engine.as_ref(), &document, &operations)
    })
    .await
    .map_err(|e| StampError::Internal(format!("Stamp task panicked: {}", e)))??;

    info!(
        "Stamp complete: {} bytes in {}ms",
        stamped.len(),
        start.elapsed().as_millis()
    );
    Ok(stamped)
}

/// Decode a raw request body and stamp it.
pub async fn stamp_body<E>(
    engine: Arc<E>,
    body: Bytes,
    style: &StampStyle,
) -> Result<Vec<u8>, StampError>
where
    E: DocumentEngine + 'static,
{
    let request = wire::decode(body)?;
    stamp(engine, request, style).await
}

/// Stamp `request` and write the result to `output_path`.
///
/// The file is written to a sibling temp file first and renamed into place,
/// so a failed run never leaves a truncated PDF behind. Returns the number of
/// bytes written.
pub async fn stamp_to_file<E>(
    engine: Arc<E>,
    request: StampRequest,
    style: &StampStyle,
    output_path: impl AsRef<Path>,
) -> Result<usize, StampError>
where
    E: DocumentEngine + 'static,
{
    let stamped = stamp(engine, request, style).await?;
    let path = output_path.as_ref();
    let write_err = |e| StampError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &stamped)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    Ok(stamped.len())
}
