//! Base64 helpers for the text-based wire formats.
//!
//! Binary payloads travel as standard, padded Base64. Lengths are computed
//! up front so the text format can announce the encoded length and the
//! decoders can reject payloads whose padding disagrees with their size.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::pool::BufferPool;
use crate::sink::OutputSink;

// Input consumed per encoding step; a multiple of 3 so only the final chunk
// can carry padding.
const ENCODE_CHUNK: usize = 3 * 256;
const ENCODED_CHUNK: usize = 4 * 256;

/// Length of the padded Base64 encoding of `len` bytes.
pub fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Exact decoded length of `encoded`, accounting for 0, 1 or 2 trailing `=`.
pub fn decoded_len(encoded: &[u8]) -> Result<usize> {
    if encoded.len() % 4 != 0 {
        return Err(FrameError::malformed(format!(
            "invalid base64 payload length {}",
            encoded.len()
        )));
    }
    let padding = match encoded {
        [.., b'=', b'='] => 2,
        [.., b'='] => 1,
        _ => 0,
    };
    Ok(encoded.len() / 4 * 3 - padding)
}

/// Encode `input` straight into `sink` without an intermediate allocation.
pub fn encode_to_sink<S: OutputSink + ?Sized>(input: &[u8], sink: &mut S) -> bool {
    let mut scratch = [0u8; ENCODED_CHUNK];
    for chunk in input.chunks(ENCODE_CHUNK) {
        let Ok(written) = STANDARD.encode_slice(chunk, &mut scratch) else {
            return false;
        };
        if !sink.try_write(&scratch[..written]) {
            return false;
        }
    }
    true
}

/// Decode `encoded` into `out`, replacing its contents.
pub fn decode_into(encoded: &[u8], out: &mut BytesMut) -> Result<()> {
    let expected = decoded_len(encoded)?;

    out.clear();
    out.resize(encoded.len() / 4 * 3, 0);
    let written = STANDARD
        .decode_slice(encoded, &mut out[..])
        .map_err(|err| FrameError::malformed(format!("invalid base64 payload: {err}")))?;

    if written != expected {
        return Err(FrameError::malformed(format!(
            "base64 payload decoded to {written} bytes, expected {expected}"
        )));
    }
    out.truncate(written);
    Ok(())
}

/// Decode a complete Base64 payload through `pool`, enforcing `max` on the
/// decoded size. `raw` goes back to the pool either way.
pub(crate) fn decode_pooled(pool: &mut BufferPool, raw: BytesMut, max: usize) -> Result<Bytes> {
    let size = match decoded_len(&raw) {
        Ok(size) => size,
        Err(err) => {
            pool.give_back(raw);
            return Err(err);
        }
    };
    if size > max {
        pool.give_back(raw);
        return Err(FrameError::CapacityExceeded {
            size: size as u64,
            max,
        });
    }

    let mut decoded = pool.rent(size);
    let result = decode_into(&raw, &mut decoded);
    pool.give_back(raw);
    if let Err(err) = result {
        pool.give_back(decoded);
        return Err(err);
    }
    let payload = decoded.split().freeze();
    pool.give_back(decoded);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn encoded_len_matches_padding_rule() {
        assert_eq!(encoded_len(0), 0);
        assert_eq!(encoded_len(1), 4);
        assert_eq!(encoded_len(2), 4);
        assert_eq!(encoded_len(3), 4);
        assert_eq!(encoded_len(4), 8);
    }

    #[test]
    fn decoded_len_strips_padding() {
        assert_eq!(decoded_len(b"").unwrap(), 0);
        assert_eq!(decoded_len(b"QQ==").unwrap(), 1);
        assert_eq!(decoded_len(b"QUI=").unwrap(), 2);
        assert_eq!(decoded_len(b"QUJD").unwrap(), 3);
        assert!(decoded_len(b"QUJ").is_err());
    }

    #[test]
    fn decode_rejects_bad_alphabet() {
        let mut out = BytesMut::new();
        let err = decode_into(b"Q!==", &mut out).unwrap_err();
        assert!(matches!(err, FrameError::MalformedFrame { .. }));
    }

    #[test]
    fn decode_rejects_misplaced_padding() {
        let mut out = BytesMut::new();
        assert!(decode_into(b"Q===", &mut out).is_err());
        assert!(decode_into(b"=QUJ", &mut out).is_err());
    }

    #[test]
    fn encodes_across_chunk_boundary() {
        let input: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        let mut sink = Vec::new();
        assert!(encode_to_sink(&input, &mut sink));
        assert_eq!(sink, STANDARD.encode(&input).into_bytes());
    }

    #[test]
    fn pooled_decode_caps_decoded_size() {
        let mut pool = BufferPool::default();
        let payload = decode_pooled(&mut pool, BytesMut::from(&b"QUI="[..]), 2).unwrap();
        assert_eq!(payload.as_ref(), b"AB");

        let err = decode_pooled(&mut pool, BytesMut::from(&b"QUI="[..]), 1).unwrap_err();
        assert!(matches!(err, FrameError::CapacityExceeded { size: 2, max: 1 }));
    }

    proptest! {
        #[test]
        fn base64_roundtrip(payload in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut encoded = Vec::new();
            prop_assert!(encode_to_sink(&payload, &mut encoded));
            prop_assert_eq!(encoded.len(), encoded_len(payload.len()));

            let mut decoded = BytesMut::new();
            decode_into(&encoded, &mut decoded).unwrap();
            prop_assert_eq!(decoded.as_ref(), payload.as_slice());
        }
    }
}
