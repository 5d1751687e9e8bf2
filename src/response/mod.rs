//! Chunked download responses.
//!
//! - [`Attachment`] - File name and content type of a served attachment
//! - [`Base64Response`] - Response headers plus a lazily encoded body
//! - [`base64_response`] - Serves a reader as a chunked base64 body (feature `base64`)
//! - `base64_response_async` - Same for an async reader (features `base64` and `async-io`)
//!
//! The body is meant to be written with chunked transfer encoding, one
//! encoded chunk per write. Routing, status codes and the HTTP framework
//! itself are left to the caller.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use rechunk::{Attachment, ChunkConfig, base64_response};
//!
//! let attachment = Attachment::new("exam answers.pdf", "application/pdf");
//! let response = base64_response(&attachment, Cursor::new(b"%PDF-1.7"), ChunkConfig::default())?;
//!
//! assert!(response.headers.contains(&(
//!     "Content-Disposition",
//!     "attachment; filename*=UTF-8''exam%20answers.pdf".to_string(),
//! )));
//!
//! let body: Vec<_> = response.body.collect::<Result<_, _>>()?;
//! assert_eq!(body, ["JVBERi0xLjc="]);
//! # Ok::<(), rechunk::ChunkError>(())
//! ```

use crate::util::encode_ext_value;

#[cfg(feature = "base64")]
use std::io::Read;

#[cfg(feature = "base64")]
use tracing::debug;

#[cfg(feature = "base64")]
use crate::{
    ChunkConfig, ChunkError, ChunkIter, Chunker,
    encode::{Base64Encoder, Encoded},
    source::ReaderSource,
};

#[cfg(all(feature = "base64", feature = "async-io"))]
use crate::{
    async_stream::{ChunkStream, ReadFragments, chunk_async},
    encode::EncodedStream,
};

/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";

/// `Content-Disposition` header name.
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// `Transfer-Encoding` header name.
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";

/// Content type used when none is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Metadata of an attachment served for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    file_name: String,
    content_type: String,
}

impl Attachment {
    /// Creates attachment metadata.
    ///
    /// An empty content type falls back to [`OCTET_STREAM`].
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        Self {
            file_name: file_name.into(),
            content_type: if content_type.is_empty() {
                OCTET_STREAM.to_string()
            } else {
                content_type
            },
        }
    }

    /// Returns the file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the `Content-Disposition` value, with the file name
    /// percent-encoded as UTF-8 (RFC 5987 extended notation).
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename*=UTF-8''{}",
            encode_ext_value(&self.file_name)
        )
    }

    /// Returns the response headers for a chunked download of this attachment.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (CONTENT_TYPE, self.content_type.clone()),
            (CONTENT_DISPOSITION, self.content_disposition()),
            (TRANSFER_ENCODING, "chunked".to_string()),
        ]
    }
}

/// Headers and body of a chunked download.
#[derive(Debug)]
pub struct Base64Response<B> {
    /// Header name/value pairs.
    pub headers: Vec<(&'static str, String)>,
    /// Encoded body, one item per transfer chunk.
    pub body: B,
}

/// Serves `reader` as a base64-encoded chunked body.
///
/// # Errors
///
/// Returns [`ChunkError::InvalidConfig`] if `config` is invalid or its
/// target size is not a multiple of three.
#[cfg(feature = "base64")]
pub fn base64_response<R: Read>(
    attachment: &Attachment,
    reader: R,
    config: ChunkConfig,
) -> Result<Base64Response<Encoded<ChunkIter<ReaderSource<R>>, Base64Encoder>>, ChunkError> {
    let body = Chunker::new(config)?.chunk(reader).encode(Base64Encoder)?;
    debug!(
        file_name = attachment.file_name(),
        target_size = config.target_size(),
        "serving attachment as base64 stream"
    );

    Ok(Base64Response {
        headers: attachment.headers(),
        body,
    })
}

/// Serves an async `reader` as a base64-encoded chunked body.
///
/// # Errors
///
/// Returns [`ChunkError::InvalidConfig`] if `config` is invalid or its
/// target size is not a multiple of three.
#[cfg(all(feature = "base64", feature = "async-io"))]
pub fn base64_response_async<R>(
    attachment: &Attachment,
    reader: R,
    config: ChunkConfig,
) -> Result<
    Base64Response<EncodedStream<ChunkStream<ReadFragments<R>>, Base64Encoder>>,
    ChunkError,
>
where
    R: futures_io::AsyncRead + Unpin,
{
    let body = chunk_async(reader, config)?.encode(Base64Encoder)?;
    debug!(
        file_name = attachment.file_name(),
        target_size = config.target_size(),
        "serving attachment as base64 stream"
    );

    Ok(Base64Response {
        headers: attachment.headers(),
        body,
    })
}
