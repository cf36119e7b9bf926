use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{applications, companies, jobs};

/// Build the full HTTP surface. The server binary and the integration tests
/// share this so both exercise the same middleware stack.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/v1/user/register", post(auth::register))
        .route("/api/v1/user/login", post(auth::login));

    let application_routes = Router::new()
        .route("/apply/{job_id}", get(applications::apply_job))
        .route("/get", get(applications::get_applied_jobs))
        .route("/{job_id}/applicants", get(applications::get_applicants))
        .route("/status/{application_id}/update", post(applications::update_status))
        .route("/chat/send", post(applications::send_chat_message))
        .route("/chat/{application_id}", get(applications::get_chat_messages));

    let company_routes = Router::new()
        .route("/register", post(companies::register_company))
        .route("/get/{company_id}", get(companies::get_company));

    let job_routes = Router::new()
        .route("/post", post(jobs::post_job))
        .route("/get/{job_id}", get(jobs::get_job));

    let protected_routes = Router::new()
        .nest("/api/v1/application", application_routes)
        .nest("/api/v1/company", company_routes)
        .nest("/api/v1/job", job_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "success": true }))
}
