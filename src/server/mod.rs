//! HTTP server: application state and route handlers.

mod http;
mod state;

pub use http::create_router;
pub use state::AppState;
