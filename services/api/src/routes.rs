use crate::infra::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde_json::json;
use task_reports::error::AppError;
use task_reports::export::document_for;
use task_reports::reporting::{ReportOutput, ReportService, TaskStore};
use task_reports::request::{ReportParams, RequestError};
use tracing::info;

pub(crate) fn report_routes<S>(service: ReportService<S>) -> Router
where
    S: TaskStore + 'static,
{
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/reports", get(reports_endpoint::<S>))
        .route("/api/v1/reports/export", get(export_endpoint::<S>))
        .with_state(service)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn reports_endpoint<S>(
    State(service): State<ReportService<S>>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ReportOutput>, AppError>
where
    S: TaskStore + 'static,
{
    let action = params.action()?;
    let filter = params.filter()?;
    let now = params.now(Utc::now())?;

    let output = service.run(action, &filter, now)?;
    Ok(Json(output))
}

pub(crate) async fn export_endpoint<S>(
    State(service): State<ReportService<S>>,
    Query(params): Query<ReportParams>,
) -> Result<Response, AppError>
where
    S: TaskStore + 'static,
{
    let action = params.action()?;
    if !action.is_exportable() {
        return Err(RequestError::NotExportable { action }.into());
    }
    let format = params.format()?;
    let filter = params.filter()?;
    let now = params.now(Utc::now())?;

    let output = service.run(action, &filter, now)?;
    let document = document_for(&output, now.date_naive())?;
    let bytes = format.render(&document)?;
    let file_name = document.file_name(format);
    info!(%action, %format, file = %file_name, bytes = bytes.len(), "report exported");

    let content_type = mime_guess::from_ext(format.extension())
        .first_or_octet_stream()
        .to_string();
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_str(&content_type)
                    .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
