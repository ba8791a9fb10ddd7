//! Report generation service
//!
//! Wires the pipeline, its agent, the report writer and the mailer together
//! once, so the CLI and the HTTP API share a single code path. Nothing here
//! holds per-run state: each call gets its own [`RunContext`].

use crate::agents::{Agent, ToolCallingAgent};
use crate::llm::{LLMClient, Provider};
use crate::mail::{EmailRequest, MailError, Mailer, ReportMailer};
use crate::report::{DocumentRenderer, ReportArtifacts, ReportWriter, WkhtmltopdfRenderer};
use crate::tools::yahoo::YahooFinanceClient;
use crate::tools;
use crate::types::{AppError, Result};
use crate::utils::toml_config::Settings;
use crate::workflows::{stock_analysis_pipeline, Pipeline, PipelineRunner, RunContext, RunResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one generation request
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    pub run_id: Uuid,
    pub result: RunResult,
    pub artifacts: ReportArtifacts,
}

pub struct ReportService {
    pipeline: Pipeline,
    runner: PipelineRunner,
    writer: ReportWriter,
    mailer: Arc<dyn Mailer>,
}

impl ReportService {
    pub fn new(
        pipeline: Pipeline,
        agent: Arc<dyn Agent>,
        context_warn_chars: usize,
        writer: ReportWriter,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            pipeline,
            runner: PipelineRunner::new(agent, context_warn_chars),
            writer,
            mailer,
        }
    }

    /// Build every collaborator from resolved settings. Fails when a step
    /// binds a tool that is not registered.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = &settings.config;

        let market = YahooFinanceClient::new(&config.market_data)
            .map_err(|e| AppError::Configuration(format!("market data client: {}", e)))?;
        let registry = Arc::new(tools::stock_tools(Arc::new(market), config));

        let pipeline = stock_analysis_pipeline()?;
        pipeline.validate_tools(&registry)?;

        let provider = Provider::from_settings(settings);
        let llm: Arc<dyn LLMClient> = Arc::from(provider.create_client(&config.llm)?);
        tracing::info!(provider = provider.name(), model = llm.model_name(), "LLM client ready");

        let agent = ToolCallingAgent::new(llm, registry, config.pipeline.max_iterations);

        let renderer = config.report.renderer.as_ref().map(|binary| {
            Arc::new(WkhtmltopdfRenderer::new(binary.clone())) as Arc<dyn DocumentRenderer>
        });
        let writer = ReportWriter::new(config.report.output_dir.clone(), renderer);

        let mailer = ReportMailer::new(config.email.clone(), settings.email.clone());

        Ok(Self::new(
            pipeline,
            Arc::new(agent),
            config.pipeline.context_warn_chars,
            writer,
            Arc::new(mailer),
        ))
    }

    /// Skip document rendering; text and HTML artifacts are still written
    pub fn without_document(mut self) -> Self {
        self.writer = ReportWriter::new(self.writer.output_dir().to_path_buf(), None);
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn writer(&self) -> &ReportWriter {
        &self.writer
    }

    /// Run the pipeline for `ctx` and write its artifacts
    pub async fn generate(&self, ctx: &RunContext) -> Result<GeneratedReport> {
        let result = self.runner.run(&self.pipeline, ctx).await?;
        let artifacts = self.writer.write(ctx.run_id, &result).await?;

        Ok(GeneratedReport {
            run_id: ctx.run_id,
            result,
            artifacts,
        })
    }

    /// Email the rendered document of an earlier run
    pub async fn email_run(&self, run_id: Uuid, company: &str, recipient: &str) -> Result<PathBuf> {
        let document = self.writer.document_path(run_id);
        if !document.exists() {
            return Err(AppError::NotFound(format!(
                "no rendered document for run {}",
                run_id
            )));
        }

        self.email_document(&document, company, recipient).await?;
        Ok(document)
    }

    /// Email an existing document file
    pub async fn email_document(&self, document: &Path, company: &str, recipient: &str) -> Result<()> {
        send(self.mailer.as_ref(), document, company, recipient).await
    }
}

/// Validate inputs and hand the document to `mailer`
pub async fn send(mailer: &dyn Mailer, document: &Path, company: &str, recipient: &str) -> Result<()> {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(AppError::InvalidInput("recipient email must not be empty".to_string()));
    }
    let company = company.trim();
    if company.is_empty() {
        return Err(AppError::InvalidInput(
            "company identifier must not be empty".to_string(),
        ));
    }

    let request = EmailRequest {
        recipient: recipient.to_string(),
        company: company.to_string(),
        document: document.to_path_buf(),
    };

    mailer.send_report(&request).await.map_err(|e| {
        tracing::warn!(recipient, error = %e, "email dispatch failed");
        match e {
            MailError::InvalidAddress { .. } => AppError::InvalidInput(e.to_string()),
            MailError::Attachment { .. } => AppError::NotFound(e.to_string()),
            _ => AppError::Email(e.to_string()),
        }
    })
}
