//! Subcommand implementations
//!
//! Each handler prints through [`Output`] and returns a crate [`Result`];
//! `main` decides the exit code.

use super::output::Output;
use crate::mail::ReportMailer;
use crate::service::{self, ReportService};
use crate::types::Result;
use crate::utils::toml_config::Settings;
use crate::workflows::{stock_analysis_pipeline, RunContext};
use std::path::{Path, PathBuf};

/// Options for `tickerwise generate`
pub struct GenerateOptions {
    pub company: String,
    pub email: Option<String>,
    pub trace: bool,
    pub no_document: bool,
}

/// Run the pipeline once and print the final report
pub async fn generate(settings: &Settings, options: GenerateOptions, output: &Output) -> Result<()> {
    let ctx = RunContext::new(&options.company)?;

    let mut service = ReportService::from_settings(settings)?;
    if options.no_document {
        service = service.without_document();
    }

    output.banner();
    output.kv("company", &ctx.company);
    output.kv("model", &settings.model);
    output.kv("run", &ctx.run_id.to_string());

    output.header("Pipeline");
    let total = service.pipeline().len();
    for (i, step) in service.pipeline().steps().iter().enumerate() {
        output.step(i + 1, total, &step.name);
    }
    output.info("Running steps, this can take a few minutes");

    let generated = service.generate(&ctx).await?;

    output.subheader("Steps");
    for step in &generated.result.steps {
        output.step_result(step);
    }

    if options.trace {
        output.header("Chain of thought");
        for step in &generated.result.steps {
            output.subheader(&step.step);
            output.block(&step.output);
            if let Some(usage) = &step.usage {
                output.kv("tokens", &usage.to_string());
            }
        }
        output.kv("total tokens", &generated.result.usage.to_string());
    }

    output.header(&format!("Report for {}", generated.result.company));
    output.block(&generated.result.report);

    let failed: Vec<&str> = generated
        .result
        .failed_steps()
        .map(|s| s.step.as_str())
        .collect();
    if !failed.is_empty() {
        output.warning(&format!("Steps with errors: {}", failed.join(", ")));
    }

    let artifacts = &generated.artifacts;
    output.subheader("Artifacts");
    output.kv("text", &artifacts.text.display().to_string());
    output.kv("html", &artifacts.html.display().to_string());
    match (&artifacts.document, &artifacts.render_error) {
        (Some(document), _) => output.kv("document", &document.display().to_string()),
        (None, Some(reason)) if options.no_document => output.info(reason),
        (None, Some(reason)) => {
            output.warning(&format!("Document not rendered: {}", reason));
            output.hint("Install wkhtmltopdf or point report.renderer at it in tickerwise.toml");
        }
        (None, None) => {}
    }

    if let Some(recipient) = options.email.as_deref() {
        if artifacts.document.is_none() {
            output.warning("No document to email, skipping");
            return Ok(());
        }
        let outcome = service
            .email_run(ctx.run_id, &ctx.company, recipient)
            .await;
        email_notice(&outcome, recipient, output);
    }

    Ok(())
}

/// Report an email attempt made after the report was written. A failure is a
/// notice, not an error: the artifacts are already on disk. Returns whether
/// the email went out.
fn email_notice(outcome: &Result<PathBuf>, recipient: &str, output: &Output) -> bool {
    match outcome {
        Ok(sent) => {
            output.success(&format!("Emailed {} to {}", sent.display(), recipient.trim()));
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "report email failed");
            output.warning(&format!("Email not sent: {}", e));
            false
        }
    }
}

/// Email an existing document without running the pipeline
pub async fn email(
    settings: &Settings,
    company: &str,
    recipient: &str,
    document: &Path,
    output: &Output,
) -> Result<()> {
    let mailer = ReportMailer::new(settings.config.email.clone(), settings.email.clone());
    service::send(&mailer, document, company, recipient).await?;

    output.success(&format!("Emailed {} to {}", document.display(), recipient.trim()));
    Ok(())
}

/// List the pipeline's steps, their tools and the context they read
pub fn steps(output: &Output) -> Result<()> {
    let pipeline = stock_analysis_pipeline()?;

    output.header(&format!("Pipeline '{}'", pipeline.name()));
    let total = pipeline.len();
    for (i, step) in pipeline.steps().iter().enumerate() {
        output.step(i + 1, total, &step.name);
        output.kv("role", &step.persona.role);
        output.kv("tools", &list_or_none(&step.tools));
        output.kv("context", &list_or_none(&step.context));
    }

    Ok(())
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Print the resolved configuration. Secrets are reported as set or unset.
pub fn config(settings: &Settings, path: &Path, validate: bool, output: &Output) -> Result<()> {
    if validate {
        output.success(&format!("Configuration is valid ({})", path.display()));
        return Ok(());
    }

    let config = &settings.config;
    let presence = |value: bool| if value { "set" } else { "unset" }.to_string();

    output.header("Configuration");
    output.kv("file", &path.display().to_string());

    output.subheader("LLM");
    output.kv("provider", &config.llm.provider.to_string());
    output.kv("model", &settings.model);
    output.kv(
        "api base",
        config.llm.api_base.as_deref().unwrap_or("(provider default)"),
    );
    output.kv(
        &format!("api key ({})", config.llm.api_key_env),
        &presence(!settings.llm_api_key.is_empty()),
    );
    output.kv("temperature", &config.llm.temperature.to_string());

    output.subheader("Pipeline");
    output.kv("max iterations", &config.pipeline.max_iterations.to_string());
    output.kv(
        "context warning (chars)",
        &config.pipeline.context_warn_chars.to_string(),
    );

    output.subheader("Market data");
    output.kv("base url", &config.market_data.base_url);
    output.kv("history range", &config.market_data.history_range);
    output.kv("news limit", &config.market_data.news_limit.to_string());
    output.kv("search results", &config.search.num_results.to_string());

    output.subheader("Report");
    output.kv("output dir", &config.report.output_dir.display().to_string());
    output.kv(
        "renderer",
        &config
            .report
            .renderer
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "disabled".to_string()),
    );

    output.subheader("Email");
    output.kv(
        "smtp",
        &format!("{}:{}", config.email.smtp_host, config.email.smtp_port),
    );
    output.kv(
        &format!("sender ({})", config.email.sender_env),
        settings.email.sender.as_deref().unwrap_or("unset"),
    );
    output.kv(
        &format!("password ({})", config.email.password_env),
        &presence(settings.email.password.is_some()),
    );

    output.subheader("Server");
    output.kv(
        "listen",
        &format!("{}:{}", config.server.host, config.server.port),
    );
    output.kv("log level", &config.server.log_level);

    Ok(())
}
