use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use hirelane_types::api::{
    AckResponse, ApplicantsResponse, AppliedJobsResponse, ChatMessageResponse, ChatThreadResponse,
    Claims, SendChatMessageRequest, UpdateStatusRequest,
};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::service::MISSING_CHAT_FIELDS;
use crate::{parse_id, run_blocking};

/// GET /application/apply/{job_id}
pub async fn apply_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let job_id = parse_id(&job_id, "job")?;

    let service = state.applications.clone();
    run_blocking(move || service.apply(job_id, claims.sub)).await?;

    Ok((
        StatusCode::CREATED,
        Json(AckResponse::ok("Job applied successfully.")),
    ))
}

/// GET /application/get — the caller's own applications.
pub async fn get_applied_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let service = state.applications.clone();
    let application = run_blocking(move || service.list_applied(claims.sub)).await?;

    Ok(Json(AppliedJobsResponse {
        application,
        success: true,
    }))
}

/// GET /application/{job_id}/applicants
pub async fn get_applicants(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let job_id = parse_id(&job_id, "job")?;

    let service = state.applications.clone();
    let job = run_blocking(move || service.list_applicants(job_id, claims.sub)).await?;

    Ok(Json(ApplicantsResponse { job, success: true }))
}

/// POST /application/status/{application_id}/update
pub async fn update_status(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let application_id = parse_id(&application_id, "application")?;
    let Json(req) = payload?;

    let service = state.applications.clone();
    run_blocking(move || service.update_status(application_id, req.status.as_deref(), claims.sub))
        .await?;

    Ok(Json(AckResponse::ok("Status updated successfully.")))
}

/// GET /application/chat/{application_id}
pub async fn get_chat_messages(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let application_id = parse_id(&application_id, "application")?;

    let service = state.applications.clone();
    let messages = run_blocking(move || service.chat_messages(application_id, claims.sub)).await?;

    Ok(Json(ChatThreadResponse {
        messages,
        success: true,
    }))
}

/// POST /application/chat/send
pub async fn send_chat_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SendChatMessageRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    let present = |field: Option<String>| field.filter(|v| !v.trim().is_empty());
    let (Some(application_id), Some(content), Some(receiver_id)) = (
        present(req.application_id),
        present(req.content),
        present(req.receiver_id),
    ) else {
        return Err(ApiError::bad_request(MISSING_CHAT_FIELDS));
    };
    let application_id = parse_id(&application_id, "application")?;

    let service = state.applications.clone();
    let message = run_blocking(move || {
        service.send_chat_message(application_id, &content, &receiver_id, claims.sub)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ChatMessageResponse {
            message,
            success: true,
        }),
    ))
}
