//! HTTP front door for the Burrow mapping store.

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
