//! Base64 encoder built on the `base64` crate.

use base64::{Engine, engine::general_purpose};
use bytes::Bytes;

use super::Encoder;
use crate::error::ChunkError;

/// Number of input bytes per base64 group.
pub const BASE64_UNIT: usize = 3;

/// Standard-alphabet base64 with padding.
///
/// Only the final chunk of a stream can produce padding when the target
/// size is a multiple of [`BASE64_UNIT`], so concatenating the encoded
/// chunks yields a valid base64 document.
///
/// # Example
///
/// ```
/// use rechunk::{Base64Encoder, Encoder};
///
/// let encoded = Base64Encoder.encode(b"hello")?;
/// assert_eq!(encoded, "aGVsbG8=");
/// # Ok::<(), rechunk::ChunkError>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Base64Encoder;

impl Encoder for Base64Encoder {
    fn unit(&self) -> usize {
        BASE64_UNIT
    }

    fn encode(&self, chunk: &[u8]) -> Result<Bytes, ChunkError> {
        Ok(Bytes::from(general_purpose::STANDARD.encode(chunk)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkConfig, Chunker};
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn test_empty_input() {
        assert_eq!(Base64Encoder.encode(b"").unwrap(), "");
    }

    #[test]
    fn test_aligned_chunks_concatenate_to_whole_encoding() {
        let data: Vec<u8> = (0..=255).collect();
        let chunker = Chunker::new(ChunkConfig::aligned(BASE64_UNIT, 5).unwrap().with_read_size(7))
            .unwrap();

        let body: Vec<u8> = chunker
            .chunk(Cursor::new(&data))
            .encode(Base64Encoder)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .concat();

        assert_eq!(body, general_purpose::STANDARD.encode(&data).into_bytes());
    }

    proptest! {
        #[test]
        fn prop_chunked_base64_decodes_to_input(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            groups in 1usize..64,
            read_size in 1usize..512,
        ) {
            let config = ChunkConfig::aligned(BASE64_UNIT, groups).unwrap().with_read_size(read_size);
            let body: Vec<u8> = Chunker::new(config)
                .unwrap()
                .chunk(Cursor::new(&data))
                .encode(Base64Encoder)
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap()
                .concat();

            let decoded = general_purpose::STANDARD.decode(&body).unwrap();
            prop_assert_eq!(decoded, data);
        }
    }
}
