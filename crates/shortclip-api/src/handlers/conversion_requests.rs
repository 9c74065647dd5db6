//! Conversion request handlers.
//!
//! Create, list, point lookup and the worker-facing status update. The
//! status update is the only handler with branching rules: it derives
//! `completed_at` and the progress default from the new status.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use tracing::info;
use validator::Validate;

use shortclip_models::{
    ConversionRequest, ConversionStatus, CreateConversionRequestInput,
    ListConversionRequestsQuery, UpdateConversionStatusInput,
};
use shortclip_store::{NewConversionRequest, RequestFilter, RequestPatch};

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

/// Create a new conversion request.
///
/// The URL is validated before any store access; no metadata is fetched
/// from it. The row starts as pending with progress 0.
pub async fn create_conversion_request(
    State(state): State<AppState>,
    Json(input): Json<CreateConversionRequestInput>,
) -> ApiResult<(StatusCode, Json<ConversionRequest>)> {
    input.validate()?;

    let draft = NewConversionRequest {
        original_url: input.original_url,
        title: non_empty(input.title),
        description: non_empty(input.description),
    };

    let row = state.store.insert(&draft).await?;
    metrics::record_request_created();

    info!(id = row.id, url = %row.original_url, "Created conversion request");

    Ok((StatusCode::CREATED, Json(row)))
}

/// List conversion requests, newest first, optionally filtered by status.
pub async fn list_conversion_requests(
    State(state): State<AppState>,
    Query(query): Query<ListConversionRequestsQuery>,
) -> ApiResult<Json<Vec<ConversionRequest>>> {
    query.validate()?;

    let filter = RequestFilter {
        status: query.status,
        limit: query.effective_limit(),
        offset: query.effective_offset(),
    };

    let rows = state.store.list(&filter).await?;
    Ok(Json(rows))
}

/// Get a single conversion request by id.
///
/// A missing row is an expected lookup outcome, so the response is a JSON
/// `null` rather than a 404.
pub async fn get_conversion_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Option<ConversionRequest>>> {
    let row = state.store.get(id).await?;
    Ok(Json(row))
}

/// Update a request's status.
///
/// Called by the conversion worker as it advances through the lifecycle.
/// Transitions are unrestricted; an unknown id is a 404.
pub async fn update_conversion_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateConversionStatusInput>,
) -> ApiResult<Json<ConversionRequest>> {
    input.validate()?;

    let patch = build_status_patch(&input);
    let row = state.store.update(id, &patch).await?;
    metrics::record_status_update(input.status.as_str());

    info!(
        id,
        status = %row.status,
        progress = row.progress_percentage,
        "Updated conversion request status"
    );

    Ok(Json(row))
}

/// Derive the store patch from a status-update input.
///
/// Progress policy: `completed` forces 100 regardless of input; `failed`
/// without an explicit progress resets to 0; otherwise an explicit value
/// is applied and absence leaves the stored value unchanged.
fn build_status_patch(input: &UpdateConversionStatusInput) -> RequestPatch {
    let mut patch = RequestPatch {
        status: Some(input.status),
        progress_percentage: input.progress_percentage,
        error_message: input.error_message.clone(),
        short_video_url: input.short_video_url.clone(),
        download_url: input.download_url.clone(),
        completed_at: None,
    };

    match input.status {
        ConversionStatus::Completed => {
            patch.progress_percentage = Some(100);
            patch.completed_at = Some(Utc::now());
        }
        ConversionStatus::Failed if input.progress_percentage.is_none() => {
            patch.progress_percentage = Some(0);
        }
        _ => {}
    }

    patch
}

/// Treat an empty string the same as an absent field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
