use crate::error::{AppError, Result};
use crate::model::{BatchResponseItem, ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use burrow_core::{BatchItem, SaveOutcome, ShortCode, ShortenerError};

fn status_for(outcome: &SaveOutcome) -> StatusCode {
    if outcome.already_existed() {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    }
}

/// `POST /` with the URL as a `text/plain` body.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let is_text = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/plain"));
    if !is_text {
        return Err(AppError::BadRequest("Content-Type is not text/plain".to_string()));
    }

    let url = String::from_utf8(body.to_vec())
        .map_err(|e| AppError::BadRequest(format!("body is not utf-8: {e}")))?;

    let outcome = state.shortener().shorten(&url).await?;
    Ok((status_for(&outcome), state.short_url(outcome.code())).into_response())
}

/// `POST /api/shorten` with `{"url": "..."}`.
pub async fn shorten_json_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let outcome = state.shortener().shorten(&request.url).await?;
    let response = ShortenResponse {
        result: state.short_url(outcome.code()),
    };
    Ok((status_for(&outcome), Json(response)).into_response())
}

/// `POST /api/shorten/batch` with `[{"correlation_id", "original_url"}]`.
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Vec<BatchItem>>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<BatchResponseItem>>)> {
    let Json(items) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let results = state.shortener().shorten_batch(items).await?;
    let body = results
        .into_iter()
        .map(|result| BatchResponseItem {
            short_url: state.short_url(&result.short_code),
            correlation_id: result.correlation_id,
        })
        .collect();

    Ok((StatusCode::CREATED, Json(body)))
}

/// `GET /{short_code}` redirects to the original URL.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<Redirect> {
    let code = ShortCode::new(short_code).map_err(ShortenerError::from)?;
    let url = state.shortener().resolve(&code).await?;
    Ok(Redirect::temporary(&url))
}
