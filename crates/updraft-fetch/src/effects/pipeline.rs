use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use updraft_verify::DigestTransform;

use super::progress::ProgressStage;
use super::transport::Body;
use crate::core::{CHECKSUM_HEADER, check_checksum_header, content_length};
use crate::data::{DownloadOptions, Headers};
use crate::error::{Error, Result};

/// One step between the response body and the sink.
///
/// Stages are strict pass-through: `process` must hand back exactly the
/// bytes it received.
pub trait Stage: Send {
    fn process(&mut self, chunk: Bytes) -> Result<Bytes>;

    /// Called once after the last chunk.
    fn finish(&mut self) -> Result<()>;
}

impl Stage for DigestTransform {
    fn process(&mut self, chunk: Bytes) -> Result<Bytes> {
        self.update(&chunk);
        Ok(chunk)
    }

    fn finish(&mut self) -> Result<()> {
        DigestTransform::finish(self).map_err(|e| {
            warn!(algorithm = %self.algorithm(), error = %e, "digest verification failed");
            Error::from(e)
        })
    }
}

/// Ordered stages feeding a sink.
///
/// [`run`](Self::run) consumes the pipeline, so every download produces
/// exactly one outcome.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    token:  CancellationToken,
}

impl Pipeline {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            stages: Vec::new(),
            token,
        }
    }

    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Assembles the stages a file download needs.
    ///
    /// Fails before anything is opened when the server's `X-Checksum-Sha2`
    /// header contradicts the expected sha256. Progress is reported only when
    /// the content length is known; sha512 wins over sha256 for the digest
    /// check.
    pub fn for_response(headers: &Headers, options: &DownloadOptions) -> Result<Self> {
        check_checksum_header(headers.get(CHECKSUM_HEADER), options.sha2.as_deref())?;

        let mut pipeline = Self::new(options.cancellation_token.clone());

        if let (Some(on_progress), Some(total)) = (&options.on_progress, content_length(headers)) {
            pipeline = pipeline.stage(ProgressStage::new(
                total,
                options.cancellation_token.clone(),
                on_progress.clone(),
            ));
        }

        if let Some(sha512) = &options.sha512 {
            pipeline = pipeline.stage(DigestTransform::sha512(sha512.as_str()));
        } else if let Some(sha2) = &options.sha2 {
            pipeline = pipeline.stage(DigestTransform::sha256(sha2.as_str()));
        }

        Ok(pipeline)
    }

    pub fn len(&self) -> usize { self.stages.len() }

    pub fn is_empty(&self) -> bool { self.stages.is_empty() }

    /// Streams `body` through every stage into `sink`, returning the byte
    /// count written.
    ///
    /// Once the token is cancelled, any failure is reported as
    /// [`Error::Cancelled`]: stage errors raised during teardown are noise.
    pub async fn run<W>(mut self, body: &mut Body, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        match self.drive(body, sink).await {
            Err(e) if self.token.is_cancelled() => {
                debug!(error = %e, "pipeline error after cancellation");
                Err(Error::Cancelled)
            }
            outcome => outcome,
        }
    }

    async fn drive<W>(&mut self, body: &mut Body, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut written = 0u64;
        while let Some(mut chunk) = body.chunk().await? {
            for stage in self.stages.iter_mut() {
                chunk = stage.process(chunk)?;
            }
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        for stage in self.stages.iter_mut() {
            stage.finish()?;
        }
        sink.flush().await?;
        Ok(written)
    }
}
