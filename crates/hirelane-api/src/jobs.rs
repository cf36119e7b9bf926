use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use hirelane_types::api::{Claims, JobResponse, PostJobRequest};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::{parse_id, run_blocking};

/// POST /job/post — the caller must own the company the job is posted under.
pub async fn post_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<PostJobRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    let title = req.title.trim().to_string();
    let company_id = req.company_id.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() || company_id.is_empty() {
        return Err(ApiError::bad_request("Title and company id are required"));
    }
    let company_id = parse_id(company_id, "company")?;
    let description = req.description.trim().to_string();

    let repo = state.repo.clone();
    let job = run_blocking(move || {
        let company = repo
            .find_company(company_id)?
            .ok_or_else(|| ApiError::not_found("Company not found"))?;
        if company.user_id != claims.sub {
            return Err(ApiError::forbidden("You do not own this company"));
        }
        Ok(repo.create_job(&title, &description, company.id, claims.sub)?)
    })
    .await?;

    info!("Job {} posted under company {}", job.id, job.company_id);
    Ok((StatusCode::CREATED, Json(JobResponse { job, success: true })))
}

/// GET /job/get/{job_id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let job_id = parse_id(&job_id, "job")?;

    let repo = state.repo.clone();
    let job = run_blocking(move || Ok(repo.find_job(job_id)?))
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(JobResponse { job, success: true }))
}
