//! Report artifacts
//!
//! The final step's text is written under `<output_dir>/<run_id>/` as
//! `stock_report.txt` (verbatim) and `stock_report.html` (markdown rendered to
//! HTML), then handed to a [`DocumentRenderer`] for `stock_report.pdf`.
//!
//! A failed document render does not fail the write; the error is kept in
//! [`ReportArtifacts::render_error`] for the caller to show.

pub mod renderer;

pub use renderer::{DocumentRenderer, RenderError, WkhtmltopdfRenderer};

use crate::types::{AppError, Result};
use crate::workflows::RunResult;
use pulldown_cmark::{html, Options, Parser};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub const TEXT_FILE: &str = "stock_report.txt";
pub const HTML_FILE: &str = "stock_report.html";
pub const DOCUMENT_FILE: &str = "stock_report.pdf";

/// Files produced for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportArtifacts {
    pub dir: PathBuf,
    pub text: PathBuf,
    pub html: PathBuf,
    /// Set only when the document was rendered
    pub document: Option<PathBuf>,
    pub render_error: Option<String>,
}

/// Render markdown into a standalone HTML page
pub fn markdown_to_html(title: &str, markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut body = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut body, Parser::new_ext(markdown, options));

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        body
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub struct ReportWriter {
    output_dir: PathBuf,
    renderer: Option<Arc<dyn DocumentRenderer>>,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, renderer: Option<Arc<dyn DocumentRenderer>>) -> Self {
        Self {
            output_dir: output_dir.into(),
            renderer,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn run_dir(&self, run_id: Uuid) -> PathBuf {
        self.output_dir.join(run_id.to_string())
    }

    /// Where the rendered document of `run_id` lives, if it was produced
    pub fn document_path(&self, run_id: Uuid) -> PathBuf {
        self.run_dir(run_id).join(DOCUMENT_FILE)
    }

    pub async fn write(&self, run_id: Uuid, result: &RunResult) -> Result<ReportArtifacts> {
        let dir = self.run_dir(run_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Report(format!("cannot create {}: {}", dir.display(), e)))?;

        let text = dir.join(TEXT_FILE);
        write_file(&text, &result.report).await?;

        let html = dir.join(HTML_FILE);
        let title = format!("Stock Analysis Report: {}", result.company);
        write_file(&html, &markdown_to_html(&title, &result.report)).await?;

        let mut artifacts = ReportArtifacts {
            dir,
            text,
            html,
            document: None,
            render_error: None,
        };

        match &self.renderer {
            Some(renderer) => {
                let document = artifacts.dir.join(DOCUMENT_FILE);
                match renderer.render(&artifacts.html, &document).await {
                    Ok(()) => artifacts.document = Some(document),
                    Err(e) => {
                        tracing::warn!(run_id = %run_id, error = %e, "document rendering failed");
                        artifacts.render_error = Some(e.to_string());
                    }
                }
            }
            None => {
                artifacts.render_error = Some(RenderError::NotConfigured.to_string());
            }
        }

        tracing::info!(run_id = %run_id, dir = %artifacts.dir.display(), "report written");
        Ok(artifacts)
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| AppError::Report(format!("cannot write {}: {}", path.display(), e)))
}
