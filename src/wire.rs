//! Length-prefixed binary request format.
//!
//! A request body is a fixed sequence of fields, each preceded by its length
//! as a 4-byte little-endian signed integer:
//!
//! ```text
//! [len][document bytes]            required
//! [len][signature image bytes]     optional
//! [len][signature keyword utf8]    optional
//! [len][seal image bytes]          optional
//! [len][seal keyword utf8]         optional
//! [len][date string utf8]          optional
//! [len][date keyword utf8]         optional
//! [count][count × ([len][key utf8][len][value utf8])]   count <= 0: no form
//! ```
//!
//! For optional fields a length `<= 0` means "absent"; there is no way to
//! send an empty string. The encoder writes `-1` for absent fields.
//!
//! This is the only revision accepted. Older clients that sent a font field
//! before the form block, or omitted the form block, are rejected rather than
//! guessed at.

use crate::error::WireError;
use bytes::{BufMut, Bytes};
use std::collections::BTreeMap;

/// Length written for an absent optional field.
pub const ABSENT: i32 = -1;

/// A decoded stamping request.
///
/// Binary fields are zero-copy slices of the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StampRequest {
    pub document: Bytes,
    pub signature: Option<Bytes>,
    pub signature_keyword: Option<String>,
    pub seal: Option<Bytes>,
    pub seal_keyword: Option<String>,
    pub date: Option<String>,
    pub date_keyword: Option<String>,
    /// Form values by field name. Empty means no form block.
    pub form_fields: BTreeMap<String, String>,
}

impl StampRequest {
    /// Request for `document` with no stamping instructions yet.
    pub fn new(document: impl Into<Bytes>) -> Self {
        Self {
            document: document.into(),
            ..Self::default()
        }
    }

    pub fn with_signature(mut self, image: impl Into<Bytes>, keyword: impl Into<String>) -> Self {
        self.signature = Some(image.into());
        self.signature_keyword = Some(keyword.into());
        self
    }

    pub fn with_seal(mut self, image: impl Into<Bytes>, keyword: impl Into<String>) -> Self {
        self.seal = Some(image.into());
        self.seal_keyword = Some(keyword.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>, keyword: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self.date_keyword = Some(keyword.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_fields.insert(name.into(), value.into());
        self
    }
}

/// Decode a request body.
///
/// # Errors
/// Any [`WireError`]; decoding never truncates a field silently.
pub fn decode(body: Bytes) -> Result<StampRequest, WireError> {
    let mut r = Reader::new(body);

    let document = match r.length("document")? {
        len if len < 0 => return Err(WireError::NegativeLength { field: "document", len }),
        0 => return Err(WireError::MissingDocument),
        len => r.take("document", len as usize)?,
    };

    let signature = r.optional_bytes("signature")?;
    let signature_keyword = r.optional_text("signature_keyword")?;
    let seal = r.optional_bytes("seal")?;
    let seal_keyword = r.optional_text("seal_keyword")?;
    let date = r.optional_text("date")?;
    let date_keyword = r.optional_text("date_keyword")?;

    let mut form_fields = BTreeMap::new();
    let count = r.length("form_count")?;
    for _ in 0..count.max(0) {
        let key = r.required_text("form_key")?;
        let value = r.required_text("form_value")?;
        form_fields.insert(key, value);
    }

    if r.remaining() > 0 {
        return Err(WireError::TrailingBytes {
            count: r.remaining(),
        });
    }

    Ok(StampRequest {
        document,
        signature,
        signature_keyword,
        seal,
        seal_keyword,
        date,
        date_keyword,
        form_fields,
    })
}

/// Encode a request body.
///
/// Present-but-empty optional values are indistinguishable from absent ones
/// on the wire and decode as `None`.
///
/// # Errors
/// [`WireError::TooLarge`] when a field or the form count exceeds
/// `i32::MAX`; nothing is written past that point.
pub fn encode(request: &StampRequest) -> Result<Vec<u8>, WireError> {
    let form_len: usize = request
        .form_fields
        .iter()
        .map(|(k, v)| 8 + k.len() + v.len())
        .sum();
    let mut out = Vec::with_capacity(
        32 + request.document.len()
            + request.signature.as_ref().map_or(0, Bytes::len)
            + request.seal.as_ref().map_or(0, Bytes::len)
            + form_len,
    );

    put_field(&mut out, "document", &request.document)?;
    put_optional(&mut out, "signature", request.signature.as_deref())?;
    put_optional(
        &mut out,
        "signature_keyword",
        request.signature_keyword.as_deref().map(str::as_bytes),
    )?;
    put_optional(&mut out, "seal", request.seal.as_deref())?;
    put_optional(
        &mut out,
        "seal_keyword",
        request.seal_keyword.as_deref().map(str::as_bytes),
    )?;
    put_optional(&mut out, "date", request.date.as_deref().map(str::as_bytes))?;
    put_optional(
        &mut out,
        "date_keyword",
        request.date_keyword.as_deref().map(str::as_bytes),
    )?;

    out.put_i32_le(length_prefix("form_count", request.form_fields.len())?);
    for (key, value) in &request.form_fields {
        put_field(&mut out, "form_key", key.as_bytes())?;
        put_field(&mut out, "form_value", value.as_bytes())?;
    }
    Ok(out)
}

fn length_prefix(field: &'static str, len: usize) -> Result<i32, WireError> {
    i32::try_from(len).map_err(|_| WireError::TooLarge { field, len })
}

fn put_field(out: &mut Vec<u8>, field: &'static str, data: &[u8]) -> Result<(), WireError> {
    out.put_i32_le(length_prefix(field, data.len())?);
    out.put_slice(data);
    Ok(())
}

fn put_optional(
    out: &mut Vec<u8>,
    field: &'static str,
    data: Option<&[u8]>,
) -> Result<(), WireError> {
    match data {
        Some(d) if !d.is_empty() => put_field(out, field, d),
        _ => {
            out.put_i32_le(ABSENT);
            Ok(())
        }
    }
}

/// Sequential cursor over the body.
struct Reader {
    buf: Bytes,
    pos: usize,
}

impl Reader {
    fn new(buf: Bytes) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn length(&mut self, field: &'static str) -> Result<i32, WireError> {
        let raw = self.take(field, 4)?;
        Ok(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn take(&mut self, field: &'static str, n: usize) -> Result<Bytes, WireError> {
        if n > self.remaining() {
            return Err(WireError::Truncated {
                field,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = self.buf.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(slice)
    }

    fn optional_bytes(&mut self, field: &'static str) -> Result<Option<Bytes>, WireError> {
        match self.length(field)? {
            len if len <= 0 => Ok(None),
            len => self.take(field, len as usize).map(Some),
        }
    }

    fn optional_text(&mut self, field: &'static str) -> Result<Option<String>, WireError> {
        self.optional_bytes(field)?
            .map(|b| utf8(field, b))
            .transpose()
    }

    fn required_text(&mut self, field: &'static str) -> Result<String, WireError> {
        let len = self.length(field)?;
        if len < 0 {
            return Err(WireError::NegativeLength { field, len });
        }
        let raw = self.take(field, len as usize)?;
        utf8(field, raw)
    }
}

fn utf8(field: &'static str, raw: Bytes) -> Result<String, WireError> {
    String::from_utf8(raw.to_vec()).map_err(|_| WireError::InvalidUtf8 { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> StampRequest {
        StampRequest::new(&b"%PDF-1.7 fake"[..])
            .with_signature(&b"\x89PNGsig"[..], "甲方（签字）:")
            .with_seal(&b"\x89PNGseal"[..], "Seal")
            .with_date("2023年9月8日", "双方签订日期：")
            .with_field("name", "Alice")
            .with_field("city", "")
    }

    #[test]
    fn round_trip_full_request() {
        let req = full_request();
        let decoded = decode(Bytes::from(encode(&req).unwrap())).expect("decode");
        assert_eq!(decoded, req);
    }

    #[test]
    fn round_trip_document_only() {
        let req = StampRequest::new(&b"%PDF"[..]);
        let bytes = encode(&req).unwrap();
        // document (4 + 4) + six absent fields + form count
        assert_eq!(bytes.len(), 8 + 6 * 4 + 4);
        assert_eq!(decode(Bytes::from(bytes)).unwrap(), req);
    }

    #[test]
    fn zero_and_negative_lengths_mean_absent() {
        let mut body = Vec::new();
        put_field(&mut body, "document", b"%PDF").unwrap();
        for len in [0, -1, 0, -7, 0, -1] {
            body.put_i32_le(len);
        }
        body.put_i32_le(-3);
        let req = decode(Bytes::from(body)).unwrap();
        assert_eq!(req.signature, None);
        assert_eq!(req.signature_keyword, None);
        assert_eq!(req.seal, None);
        assert_eq!(req.date_keyword, None);
        assert!(req.form_fields.is_empty());
    }

    #[test]
    fn empty_optional_value_decodes_as_absent() {
        let mut req = StampRequest::new(&b"%PDF"[..]);
        req.date = Some(String::new());
        let decoded = decode(Bytes::from(encode(&req).unwrap())).unwrap();
        assert_eq!(decoded.date, None);
    }

    #[test]
    fn truncation_at_every_position_is_rejected() {
        let bytes = encode(&full_request()).unwrap();
        for cut in 0..bytes.len() {
            let err = decode(Bytes::copy_from_slice(&bytes[..cut]))
                .expect_err(&format!("cut at {cut} must fail"));
            assert!(
                matches!(err, WireError::Truncated { .. }),
                "cut at {cut}: {err:?}"
            );
        }
    }

    #[test]
    fn truncated_reports_field_name() {
        let mut body = Vec::new();
        put_field(&mut body, "document", b"%PDF").unwrap();
        body.put_i32_le(100);
        body.put_slice(b"short");
        match decode(Bytes::from(body)) {
            Err(WireError::Truncated {
                field,
                needed,
                remaining,
            }) => {
                assert_eq!(field, "signature");
                assert_eq!(needed, 100);
                assert_eq!(remaining, 5);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn negative_document_length_is_rejected() {
        let mut body = Vec::new();
        body.put_i32_le(-5);
        assert_eq!(
            decode(Bytes::from(body)),
            Err(WireError::NegativeLength {
                field: "document",
                len: -5
            })
        );
    }

    #[test]
    fn zero_document_length_is_missing_document() {
        let mut body = Vec::new();
        body.put_i32_le(0);
        assert_eq!(decode(Bytes::from(body)), Err(WireError::MissingDocument));
    }

    #[test]
    fn negative_form_key_length_is_rejected() {
        let mut body = encode(&StampRequest::new(&b"%PDF"[..])).unwrap();
        body.truncate(body.len() - 4);
        body.put_i32_le(1);
        body.put_i32_le(-2);
        assert_eq!(
            decode(Bytes::from(body)),
            Err(WireError::NegativeLength {
                field: "form_key",
                len: -2
            })
        );
    }

    #[test]
    fn huge_form_count_fails_without_allocating() {
        let mut body = encode(&StampRequest::new(&b"%PDF"[..])).unwrap();
        body.truncate(body.len() - 4);
        body.put_i32_le(i32::MAX);
        assert!(matches!(
            decode(Bytes::from(body)),
            Err(WireError::Truncated {
                field: "form_key",
                ..
            })
        ));
    }

    #[test]
    fn duplicate_form_keys_keep_last_value() {
        let mut body = encode(&StampRequest::new(&b"%PDF"[..])).unwrap();
        body.truncate(body.len() - 4);
        body.put_i32_le(2);
        for (k, v) in [("name", "Alice"), ("name", "Bob")] {
            put_field(&mut body, "form_key", k.as_bytes()).unwrap();
            put_field(&mut body, "form_value", v.as_bytes()).unwrap();
        }
        let req = decode(Bytes::from(body)).unwrap();
        assert_eq!(req.form_fields.len(), 1);
        assert_eq!(req.form_fields["name"], "Bob");
    }

    #[test]
    fn invalid_utf8_keyword_is_rejected() {
        let mut body = Vec::new();
        put_field(&mut body, "document", b"%PDF").unwrap();
        body.put_i32_le(ABSENT);
        put_field(&mut body, "signature_keyword", &[0xff, 0xfe]).unwrap();
        assert_eq!(
            decode(Bytes::from(body)),
            Err(WireError::InvalidUtf8 {
                field: "signature_keyword"
            })
        );
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut body = encode(&StampRequest::new(&b"%PDF"[..])).unwrap();
        body.extend_from_slice(b"Helvetica");
        assert_eq!(
            decode(Bytes::from(body)),
            Err(WireError::TrailingBytes { count: 9 })
        );
    }

    #[test]
    fn decoded_fields_share_the_body_allocation() {
        let body = Bytes::from(encode(&full_request()).unwrap());
        let req = decode(body.clone()).unwrap();
        let doc_ptr = req.document.as_ptr() as usize;
        let start = body.as_ptr() as usize;
        assert!(doc_ptr >= start && doc_ptr < start + body.len());
    }

    #[test]
    fn oversized_length_is_an_error_not_a_wrap() {
        assert_eq!(length_prefix("document", i32::MAX as usize), Ok(i32::MAX));
        assert_eq!(
            length_prefix("document", i32::MAX as usize + 1),
            Err(WireError::TooLarge {
                field: "document",
                len: i32::MAX as usize + 1,
            })
        );
    }
}
