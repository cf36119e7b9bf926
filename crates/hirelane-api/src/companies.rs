use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use hirelane_types::api::{Claims, CompanyResponse, RegisterCompanyRequest};
use hirelane_types::models::Role;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::{parse_id, run_blocking};

/// POST /company/register — recruiters only.
pub async fn register_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<RegisterCompanyRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    if claims.role != Role::Recruiter {
        return Err(ApiError::forbidden("Only recruiters can register a company"));
    }
    let name = req.company_name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Company name is required"));
    }

    let repo = state.repo.clone();
    let company = run_blocking(move || {
        let duplicate = || ApiError::conflict("You can't register the same company");
        if repo.find_company_by_name(&name)?.is_some() {
            return Err(duplicate());
        }
        // The unique name index catches a concurrent registration.
        repo.create_company(&name, claims.sub)?.ok_or_else(duplicate)
    })
    .await?;

    info!("Company {} registered by {}", company.id, claims.sub);
    Ok((
        StatusCode::CREATED,
        Json(CompanyResponse {
            company,
            success: true,
        }),
    ))
}

/// GET /company/get/{company_id}
pub async fn get_company(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let company_id = parse_id(&company_id, "company")?;

    let repo = state.repo.clone();
    let company = run_blocking(move || Ok(repo.find_company(company_id)?))
        .await?
        .ok_or_else(|| ApiError::not_found("Company not found"))?;

    Ok(Json(CompanyResponse {
        company,
        success: true,
    }))
}
