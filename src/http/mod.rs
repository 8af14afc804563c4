//! HTTP API standing in for the presentation layer
//!
//! - GET /session - Current session snapshot
//! - POST /session/{start,pause,resume,stop} - Capture control
//! - POST /session/upload - Commit the stopped recording
//! - POST /session/discard - Delete the stopped recording
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ApiError, ErrorResponse, StopResponse, UploadRequest};
pub use routes::create_router;
pub use state::AppState;
