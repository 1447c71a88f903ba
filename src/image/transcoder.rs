//! External transcoder capability.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::ImageError;

// == Transcoder ==
/// Turns the image at `input` into the target format at `output`,
/// scaled to `width` pixels wide.
///
/// Implementations must leave `output` absent or complete; the caller owns
/// cleanup of `input`.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &Path, output: &Path, width: u32) -> Result<(), ImageError>;
}

// == Vips Transcoder ==
/// Runs libvips' `vips thumbnail` as a child process.
///
/// The output format follows the extension of the output path.
#[derive(Debug, Clone)]
pub struct VipsTranscoder {
    binary: PathBuf,
    timeout: Duration,
}

impl VipsTranscoder {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Transcoder for VipsTranscoder {
    async fn transcode(&self, input: &Path, output: &Path, width: u32) -> Result<(), ImageError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("thumbnail")
            .arg(input)
            .arg(output)
            .arg(width.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // Child is killed if the timeout drops the future
            .kill_on_drop(true);

        debug!("Running {:?}", cmd);

        let result = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                ImageError::Transcode(format!("timed out after {}s", self.timeout.as_secs()))
            })?;
        let out = result.map_err(|e| {
            ImageError::Transcode(format!("failed to start {}: {}", self.binary.display(), e))
        })?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ImageError::Transcode(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                out.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
