use std::path::{Path, PathBuf};

use tracing::debug;

use super::handler::ResponseHandler;
use super::pipeline::Pipeline;
use super::transport::Response;
use crate::data::DownloadOptions;
use crate::error::Result;

const STAGING_PREFIX: &str = ".updraft-";

/// Streams a response body into a file.
///
/// Bytes go to a staging file in the destination's directory, which is moved
/// over the destination only after every stage finished cleanly. A failed or
/// cancelled download leaves the destination untouched.
#[derive(Debug, Clone)]
pub struct FileSink {
    destination: PathBuf,
}

impl FileSink {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &Path { &self.destination }

    fn staging_dir(&self) -> PathBuf {
        match self.destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl ResponseHandler for FileSink {
    type Output = PathBuf;

    async fn handle(self, mut response: Response, options: &DownloadOptions) -> Result<PathBuf> {
        // header conflicts fail before anything touches the disk
        let pipeline = Pipeline::for_response(&response.headers, options)?;

        let dir = self.staging_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&dir)?;

        let mut file = tokio::fs::File::from_std(staging.as_file().try_clone()?);
        let written = pipeline.run(&mut response.body, &mut file).await?;
        file.sync_all().await?;
        drop(file);

        staging.persist(&self.destination).map_err(|e| e.error)?;
        debug!(destination = %self.destination.display(), bytes = written, "download stored");
        Ok(self.destination)
    }
}
