use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::warn;

use hirelane_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

fn unauthenticated() -> ApiError {
    ApiError::Unauthorized("User not authenticated".to_string())
}

/// Extract and validate the bearer JWT, then hand its `Claims` to the handler
/// as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(unauthenticated)?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("Rejected access token: {}", e);
        unauthenticated()
    })?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
