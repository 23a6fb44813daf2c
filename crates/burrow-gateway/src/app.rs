use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    ping_handler, redirect_handler, shorten_batch_handler, shorten_json_handler,
    shorten_text_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", post(shorten_text_handler))
            .route("/ping", get(ping_handler))
            .route("/api/shorten", post(shorten_json_handler))
            .route("/api/shorten/batch", post(shorten_batch_handler))
            .route("/{short_code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
