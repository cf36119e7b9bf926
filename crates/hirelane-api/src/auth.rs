use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use hirelane_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use hirelane_types::models::Role;

use crate::error::{ApiError, ApiResult};
use crate::repository::Repository;
use crate::run_blocking;
use crate::service::ApplicationService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub repo: Arc<dyn Repository>,
    pub applications: ApplicationService,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

impl AppStateInner {
    pub fn new(
        repo: Arc<dyn Repository>,
        jwt_secret: String,
        token_ttl: chrono::Duration,
    ) -> AppState {
        Arc::new(Self {
            applications: ApplicationService::new(repo.clone()),
            repo,
            jwt_secret,
            token_ttl,
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    // Validate input
    let fullname = req.fullname.trim().to_string();
    let email = req.email.trim().to_lowercase();
    if fullname.is_empty() || email.is_empty() {
        return Err(ApiError::bad_request("Full name and email are required"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }
    let role: Role = req.role.parse().map_err(|_| {
        ApiError::bad_request("Role must be 'applicant' or 'recruiter'")
    })?;

    // Check if email is taken
    let repo = state.repo.clone();
    let lookup = email.clone();
    if run_blocking(move || Ok(repo.find_user_by_email(&lookup)?)).await?.is_some() {
        return Err(email_taken());
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    // The unique email index catches a concurrent registration.
    let repo = state.repo.clone();
    let user = run_blocking(move || Ok(repo.create_user(&fullname, &email, &password_hash, role)?))
        .await?
        .ok_or_else(email_taken)?;

    let token = create_token(&state.jwt_secret, user.id, user.role, state.token_ttl)?;
    info!("Registered {} {}", user.role, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user,
            token,
            success: true,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let rejected = || ApiError::Unauthorized("Incorrect email or password".to_string());

    let repo = state.repo.clone();
    let email = req.email.trim().to_lowercase();
    let stored = run_blocking(move || Ok(repo.find_user_by_email(&email)?))
        .await?
        .ok_or_else(rejected)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&stored.password_hash)
        .map_err(|e| anyhow::anyhow!("stored password hash is unreadable: {}", e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| rejected())?;

    let token = create_token(&state.jwt_secret, stored.user.id, stored.user.role, state.token_ttl)?;

    Ok(Json(AuthResponse {
        user: stored.user,
        token,
        success: true,
    }))
}

fn email_taken() -> ApiError {
    ApiError::conflict("User already exists with this email")
}

pub fn create_token(
    secret: &str,
    user_id: Uuid,
    role: Role,
    ttl: chrono::Duration,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
