pub mod applications;
pub mod auth;
pub mod authz;
pub mod companies;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod repository;
pub mod router;
pub mod service;

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Run blocking storage work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Parse an id taken from a path or body, rejecting anything that is not a UUID.
pub(crate) fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid {} id", what)))
}
