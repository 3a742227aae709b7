use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    ColumnAliases, ExpanderConfig, ExpansionSummary, ExportFormat, ExtractError, ProcessError,
    ScheduleTable, dates, pipeline,
};

/// Largest upload accepted, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    config: Arc<ExpanderConfig>,
}

impl AppState {
    pub fn new(config: ExpanderConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    fn config(&self) -> Arc<ExpanderConfig> {
        self.config.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    UnsupportedMediaType(String),
    Unprocessable(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<ProcessError> for ApiError {
    fn from(value: ProcessError) -> Self {
        let message = value.to_string();
        match value {
            ProcessError::UnsupportedFileType(_) => ApiError::UnsupportedMediaType(message),
            ProcessError::InvalidFilterDate(_) => ApiError::Invalid(message),
            ProcessError::MissingRequiredColumns(_)
            | ProcessError::EmptyResult
            | ProcessError::NoRowsForDate(_)
            | ProcessError::Extraction(ExtractError::Spreadsheet(_))
            | ProcessError::Extraction(ExtractError::Tool(_)) => ApiError::Unprocessable(message),
            ProcessError::Extraction(_) | ProcessError::DataFrame(_) | ProcessError::Export(_) => {
                error!(error = %message, "upload processing failed");
                ApiError::Internal(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::UnsupportedMediaType(message) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                message,
            ),
            ApiError::Unprocessable(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", message)
            }
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleQuery {
    date: Option<String>,
    /// Write the `Data de Execução` column; on unless `false`.
    execution_date: Option<bool>,
}

#[derive(Debug, Serialize)]
struct DatesResponse {
    dates: Vec<String>,
    summary: ExpansionSummary,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/aliases", get(get_aliases))
        .route("/schedule", post(expand_schedule))
        .route("/schedule/dates", post(list_execution_dates))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, config: ExpanderConfig) -> std::io::Result<()> {
    let state = AppState::new(config);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_aliases(State(state): State<AppState>) -> Json<ColumnAliases> {
    Json(state.config().aliases.clone())
}

fn declared_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Extraction shells out and builds dataframes, so it runs off the reactor.
async fn process(state: &AppState, headers: &HeaderMap, body: Bytes) -> Result<ScheduleTable, ApiError> {
    let config = state.config();
    let declared = declared_type(headers);
    info!(declared = %declared, bytes = body.len(), "upload received");
    tokio::task::spawn_blocking(move || pipeline::process_upload(&body, &declared, &config))
        .await
        .map_err(|err| ApiError::internal(format!("processing task failed: {err}")))?
        .map_err(ApiError::from)
}

async fn expand_schedule(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let filter = query
        .date
        .as_deref()
        .map(pipeline::parse_filter_date)
        .transpose()?;

    let table = process(&state, &headers, body).await?;
    let config = state.config();
    let download = pipeline::render_download(
        &table,
        filter,
        ExportFormat::Xlsx,
        query.execution_date.unwrap_or(true),
        &config,
    )?;

    let disposition = format!("attachment; filename=\"{}\"", download.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, download.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}

async fn list_execution_dates(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DatesResponse>, ApiError> {
    let table = process(&state, &headers, body).await?;
    let dates = table
        .execution_dates()
        .map_err(|err| ApiError::internal(err.to_string()))?
        .into_iter()
        .map(dates::format_date)
        .collect();
    Ok(Json(DatesResponse {
        dates,
        summary: table.summary().clone(),
    }))
}
