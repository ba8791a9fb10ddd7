//! HTML-to-document rendering through an external binary

use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no document renderer configured")]
    NotConfigured,

    #[error("renderer not found at {0}")]
    MissingBinary(PathBuf),

    #[error("failed to run renderer: {0}")]
    Io(#[from] std::io::Error),

    #[error("renderer failed: {0}")]
    Failed(String),
}

/// Turns an HTML file into a document file
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, html: &Path, output: &Path) -> Result<(), RenderError>;
}

/// Renders PDF with `wkhtmltopdf`
pub struct WkhtmltopdfRenderer {
    binary: PathBuf,
}

impl WkhtmltopdfRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl DocumentRenderer for WkhtmltopdfRenderer {
    async fn render(&self, html: &Path, output: &Path) -> Result<(), RenderError> {
        // Bare names are resolved through PATH by the OS
        if self.binary.components().count() > 1 && !self.binary.exists() {
            return Err(RenderError::MissingBinary(self.binary.clone()));
        }

        let result = tokio::process::Command::new(&self.binary)
            .arg("--quiet")
            .arg("--encoding")
            .arg("utf-8")
            .arg(html)
            .arg(output)
            .output()
            .await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(RenderError::Failed(format!(
                "{}: {}",
                result.status,
                stderr.trim()
            )));
        }

        tracing::debug!(output = %output.display(), "document rendered");
        Ok(())
    }
}
