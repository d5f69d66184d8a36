//! Client for a running stamping service.
//!
//! Encodes a [`StampRequest`] into the binary body, posts it to
//! `<base>/sign`, and returns the stamped PDF.

use crate::error::StampError;
use crate::wire::{self, StampRequest};
use std::time::Duration;
use tracing::{debug, info};

/// Post `request` to the service at `base_url` and return the stamped document.
///
/// `base_url` may be given with or without the `/sign` path.
///
/// # Errors
/// [`StampError::RemoteTimeout`] after `timeout_secs`,
/// [`StampError::RemoteRejected`] for a non-2xx answer (the service's error
/// text is carried along), [`StampError::RemoteFailed`] otherwise.
/// [`StampError::Decode`] if a field is too large for the wire format.
pub async fn send(
    base_url: &str,
    request: &StampRequest,
    timeout_secs: u64,
) -> Result<Vec<u8>, StampError> {
    let url = sign_url(base_url);
    let body = wire::encode(request)?;
    debug!("Posting {} byte request to {}", body.len(), url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| StampError::RemoteFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;

    let transport_err = |e: reqwest::Error| {
        if e.is_timeout() {
            StampError::RemoteTimeout {
                url: url.clone(),
                secs: timeout_secs,
            }
        } else {
            StampError::RemoteFailed {
                url: url.clone(),
                reason: e.to_string(),
            }
        }
    };

    let response = client
        .post(&url)
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(body)
        .send()
        .await
        .map_err(transport_err)?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(StampError::RemoteRejected {
            url: url.clone(),
            status: status.as_u16(),
            message,
        });
    }

    let pdf = response.bytes().await.map_err(transport_err)?;
    info!("Received {} byte stamped document from {}", pdf.len(), url);
    Ok(pdf.to_vec())
}

fn sign_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/sign") {
        base.to_string()
    } else {
        format!("{base}/sign")
    }
}
