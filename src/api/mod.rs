//! API server module: chat page plus the session REST/SSE API

pub mod handlers;
pub mod page;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::app;
pub use server::serve_api;
