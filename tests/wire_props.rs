//! Property tests for the request codec.

use bytes::Bytes;
use edgequake_pdfstamp::{decode, encode, StampRequest, WireError};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn present_bytes() -> impl Strategy<Value = Option<Bytes>> {
    proptest::option::of(proptest::collection::vec(any::<u8>(), 1..64).prop_map(Bytes::from))
}

fn present_text() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("\\PC{1,24}")
}

prop_compose! {
    fn request()(
        document in proptest::collection::vec(any::<u8>(), 1..256),
        signature in present_bytes(),
        signature_keyword in present_text(),
        seal in present_bytes(),
        seal_keyword in present_text(),
        date in present_text(),
        date_keyword in present_text(),
        form_fields in proptest::collection::btree_map("\\PC{0,12}", "\\PC{0,12}", 0..6),
    ) -> StampRequest {
        StampRequest {
            document: Bytes::from(document),
            signature,
            signature_keyword,
            seal,
            seal_keyword,
            date,
            date_keyword,
            form_fields: form_fields.into_iter().collect::<BTreeMap<_, _>>(),
        }
    }
}

proptest! {
    #[test]
    fn encode_then_decode_is_identity(req in request()) {
        let decoded = decode(Bytes::from(encode(&req).unwrap())).unwrap();
        prop_assert_eq!(decoded, req);
    }

    #[test]
    fn every_strict_prefix_is_rejected(req in request(), cut in any::<prop::sample::Index>()) {
        let body = encode(&req).unwrap();
        let len = cut.index(body.len());
        let err = decode(Bytes::copy_from_slice(&body[..len])).unwrap_err();
        prop_assert!(
            matches!(err, WireError::Truncated { .. } | WireError::MissingDocument),
            "prefix {} of {}: {:?}", len, body.len(), err
        );
    }

    #[test]
    fn appended_bytes_are_rejected(req in request(), extra in proptest::collection::vec(any::<u8>(), 1..16)) {
        let mut body = encode(&req).unwrap();
        body.extend_from_slice(&extra);
        let err = decode(Bytes::from(body)).unwrap_err();
        prop_assert_eq!(err, WireError::TrailingBytes { count: extra.len() });
    }

    #[test]
    fn arbitrary_bytes_never_panic(body in proptest::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode(Bytes::from(body));
    }
}
