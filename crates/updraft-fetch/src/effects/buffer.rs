use bytes::{Bytes, BytesMut};

use super::handler::ResponseHandler;
use super::transport::{Body, Response};
use crate::core::content_length;
use crate::data::DownloadOptions;
use crate::error::{Error, Result};

/// Collects a response body in memory, up to `limit` bytes.
///
/// With a declared content length the buffer is allocated once and the body
/// must fill it exactly. Without one, chunks accumulate until the limit is
/// crossed.
#[derive(Debug, Clone, Copy)]
pub struct BufferSink {
    limit: u64,
}

impl BufferSink {
    pub fn new(limit: u64) -> Self { Self { limit } }

    async fn read_sized(&self, body: &mut Body, size: u64) -> Result<Bytes> {
        if size > self.limit {
            return Err(Error::PayloadTooLarge {
                size,
                limit: self.limit,
            });
        }

        let mut buffer = vec![0u8; size as usize];
        let mut offset = 0usize;
        while let Some(chunk) = body.chunk().await? {
            let end = offset + chunk.len();
            if end > buffer.len() {
                return Err(Error::LengthMismatch {
                    received: end as u64,
                    expected: size,
                });
            }
            buffer[offset..end].copy_from_slice(&chunk);
            offset = end;
        }

        if offset as u64 != size {
            return Err(Error::LengthMismatch {
                received: offset as u64,
                expected: size,
            });
        }
        Ok(Bytes::from(buffer))
    }

    async fn read_unsized(&self, body: &mut Body) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.chunk().await? {
            buffer.extend_from_slice(&chunk);
            if buffer.len() as u64 > self.limit {
                return Err(Error::PayloadTooLarge {
                    size:  buffer.len() as u64,
                    limit: self.limit,
                });
            }
        }
        Ok(buffer.freeze())
    }
}

impl ResponseHandler for BufferSink {
    type Output = Bytes;

    async fn handle(self, mut response: Response, _options: &DownloadOptions) -> Result<Bytes> {
        match content_length(&response.headers) {
            Some(size) if size > 0 => self.read_sized(&mut response.body, size).await,
            _ => self.read_unsized(&mut response.body).await,
        }
    }
}
