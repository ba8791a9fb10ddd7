use crate::{
    service::GeneratedReport,
    types::{EmailReportRequest, EmailReportResponse, ReportRequest, Result},
    workflows::RunContext,
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

/// Run the pipeline for one company and write its artifacts.
///
/// The returned `run_id` is the handle for emailing the document later.
pub async fn generate_report(
    State(state): State<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<GeneratedReport>> {
    let ctx = RunContext::new(&payload.company)?;
    tracing::info!(run_id = %ctx.run_id, company = %ctx.company, "report requested");

    let report = state.service.generate(&ctx).await?;
    Ok(Json(report))
}

/// Email the rendered document of an earlier run
pub async fn email_report(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
    Json(payload): Json<EmailReportRequest>,
) -> Result<Json<EmailReportResponse>> {
    state
        .service
        .email_run(run_id, &payload.company, &payload.email)
        .await?;

    Ok(Json(EmailReportResponse {
        sent: true,
        recipient: payload.email.trim().to_string(),
    }))
}
