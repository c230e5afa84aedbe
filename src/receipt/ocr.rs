//! OCR through the Tesseract command-line tool.

use crate::{
    config::settings::OcrSettings,
    errors::{Error, Result},
};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, instrument};

/// Turns image bytes into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Reads all text in the image.
    async fn extract_text(&self, image: &[u8]) -> Result<String>;

    /// Engine version, when it can be determined.
    async fn version(&self) -> Option<String>;
}

/// Runs `tesseract stdin stdout <args>` with the image on stdin.
#[derive(Debug, Clone)]
pub struct Tesseract {
    binary: String,
    args: Vec<String>,
}

impl Tesseract {
    /// Creates an extractor from settings.
    #[must_use]
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            binary: settings.tesseract_path.clone(),
            args: settings.args.clone(),
        }
    }

    fn spawn_error(&self, e: &std::io::Error) -> Error {
        Error::Ocr {
            message: if e.kind() == std::io::ErrorKind::NotFound {
                format!("'{}' is not installed or not on PATH", self.binary)
            } else {
                format!("could not start '{}': {e}", self.binary)
            },
        }
    }
}

#[async_trait]
impl TextExtractor for Tesseract {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn extract_text(&self, image: &[u8]) -> Result<String> {
        let mut child = Command::new(&self.binary)
            .arg("stdin")
            .arg("stdout")
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(&e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image).await?;
            // Dropping stdin closes the pipe so tesseract sees EOF.
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(Error::Ocr {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(chars = text.len(), "OCR finished");
        Ok(text)
    }

    async fn version(&self) -> Option<String> {
        let output = Command::new(&self.binary).arg("--version").output().await.ok()?;
        if !output.status.success() {
            return None;
        }
        // Older releases print the version on stderr.
        let text = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        String::from_utf8_lossy(&text)
            .lines()
            .next()
            .map(|line| line.trim().to_string())
    }
}
