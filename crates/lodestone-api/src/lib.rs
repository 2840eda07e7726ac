//! HTTP API (spec §6): read-side analytics, admin/user routes, signed
//! session cookies, and a per-IP rate limiter.

pub mod auth;
pub mod config;
pub mod debug_handle;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ApiConfig;
pub use debug_handle::{DebugCommand, DebugHandle, SystemHealth};
pub use error::{ApiError, Result};
pub use state::AppState;
