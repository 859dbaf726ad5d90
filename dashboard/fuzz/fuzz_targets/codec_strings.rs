//! Fuzz target for the length-prefixed string codec
//!
//! Run with: cargo test --release -p opclw-dashboard-fuzz codec_strings

use opclw_codec::{encode_string, encode_string_vec, read_string, read_string_vec, CodecError};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn fuzz_string_survives_encoding(value in "\\PC{0,64}", offset in 0usize..16) {
        let mut buf = vec![0xAAu8; offset];
        buf.extend(encode_string(&value).expect("short string encodes"));

        let (decoded, next) = read_string(&buf, offset).expect("must decode");
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(next, buf.len());
    }

    #[test]
    fn fuzz_string_vec_preserves_order(items in prop::collection::vec("[a-z,]{0,12}", 0..8)) {
        let encoded = encode_string_vec(&items).expect("short list encodes");
        let (decoded, next) = read_string_vec(&encoded, 0).expect("must decode");
        prop_assert_eq!(decoded, items);
        prop_assert_eq!(next, encoded.len());
    }

    #[test]
    fn fuzz_oversized_prefix_is_eof(declared in 1u32..u32::MAX, body in prop::collection::vec(any::<u8>(), 0..32)) {
        prop_assume!(declared as usize > body.len());
        let mut buf = declared.to_le_bytes().to_vec();
        buf.extend_from_slice(&body);

        let err = read_string(&buf, 0);
        prop_assert!(matches!(err, Err(CodecError::UnexpectedEof { .. })), "{:?}", err);
    }

    #[test]
    fn fuzz_read_string_never_panics(data in prop::collection::vec(any::<u8>(), 0..128), offset in 0usize..160) {
        let _ = read_string(&data, offset);
        let _ = read_string_vec(&data, offset);
    }
}
