//! JSON document codec for the engine stream
//!
//! The engine speaks bare JSON documents over a stream socket with no
//! length prefix. Decoding yields a document as soon as one is complete;
//! encoding writes one document followed by a newline.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

/// Maximum buffered document size (16 MB)
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Stream closed mid-document ({buffered} bytes buffered)")]
    Incomplete { buffered: usize },
}

/// Codec for newline-tolerant streams of JSON documents
#[derive(Debug, Default)]
pub struct JsonDocumentCodec;

impl JsonDocumentCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for JsonDocumentCodec {
    type Item = Value;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Drop inter-document whitespace
        let leading = src
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        src.advance(leading);

        if src.is_empty() {
            return Ok(None);
        }

        if src.len() > MAX_MESSAGE_SIZE {
            return Err(CodecError::MessageTooLarge {
                size: src.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let (value, consumed) = {
            let mut documents = serde_json::Deserializer::from_slice(&src[..]).into_iter::<Value>();
            match documents.next() {
                Some(Ok(value)) => (value, documents.byte_offset()),
                // Partial document, wait for more bytes
                Some(Err(e)) if e.is_eof() => return Ok(None),
                Some(Err(e)) => return Err(CodecError::Json(e)),
                None => return Ok(None),
            }
        };

        src.advance(consumed);
        Ok(Some(value))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(value) => Ok(Some(value)),
            None if src.is_empty() => Ok(None),
            None => Err(CodecError::Incomplete {
                buffered: src.len(),
            }),
        }
    }
}

impl<T: Serialize> Encoder<T> for JsonDocumentCodec {
    type Error = CodecError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let data = serde_json::to_vec(&item)?;

        if data.len() > MAX_MESSAGE_SIZE {
            return Err(CodecError::MessageTooLarge {
                size: data.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        dst.reserve(data.len() + 1);
        dst.put_slice(&data);
        dst.put_u8(b'\n');
        Ok(())
    }
}
