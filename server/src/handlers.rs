use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use logvault_service::LogService;
use logvault_state::LogRecord;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct CreateLogRequest {
    #[serde(default)]
    flag: Option<String>,
    #[serde(default)]
    message: String,
}

type PathSegment = Result<Path<String>, PathRejection>;

fn path_segment(segment: PathSegment) -> Result<String, ApiError> {
    segment
        .map(|Path(value)| value)
        .map_err(|rejection| ApiError::bad_request(format!("bad path parameter: {rejection}")))
}

pub(crate) async fn handle_root() -> &'static str {
    "logvault is up. Send logs to /api/create."
}

pub(crate) async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "healthy" }))
}

pub(crate) async fn handle_create(
    State(service): State<LogService>,
    payload: Result<Json<CreateLogRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LogRecord>), ApiError> {
    let Json(request) = payload
        .map_err(|rejection| ApiError::bad_request(format!("bad request body: {rejection}")))?;
    let record = service
        .create(request.flag.as_deref(), &request.message)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn handle_list(
    State(service): State<LogService>,
) -> Result<Json<Vec<LogRecord>>, ApiError> {
    Ok(Json(service.list().await?))
}

pub(crate) async fn handle_fetch_id(
    State(service): State<LogService>,
    id: PathSegment,
) -> Result<Json<LogRecord>, ApiError> {
    Ok(Json(service.fetch_by_id(&path_segment(id)?).await?))
}

pub(crate) async fn handle_fetch_timestamp(
    State(service): State<LogService>,
    timestamp: PathSegment,
) -> Result<Json<LogRecord>, ApiError> {
    Ok(Json(service.fetch_at_or_before(&path_segment(timestamp)?).await?))
}

pub(crate) async fn handle_fetch_flag(
    State(service): State<LogService>,
    flag: PathSegment,
) -> Result<Json<Vec<LogRecord>>, ApiError> {
    Ok(Json(service.fetch_by_flag(&path_segment(flag)?).await?))
}

pub(crate) async fn handle_delete(
    State(service): State<LogService>,
    id: PathSegment,
) -> Result<Json<Value>, ApiError> {
    let record = service.delete(&path_segment(id)?).await?;
    Ok(Json(json!({
        "message": format!("log {} deleted", record.id),
    })))
}
