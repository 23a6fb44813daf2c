use crate::error::Result;
use crate::state::AppState;
use axum::extract::State;

/// `GET /ping` probes the mapping store.
pub async fn ping_handler(State(state): State<AppState>) -> Result<&'static str> {
    state.shortener().health_check().await?;
    Ok("OK")
}
