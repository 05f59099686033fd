mod auth;
mod error_handler;
mod trace;

pub use auth::{CurrentSession, require_auth, require_permission, resolve_session};
pub use error_handler::log_errors;
pub use trace::{TRACE_ID_HEADER, trace_requests};
