use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    AppliedApplication, ChatMessage, Company, Job, JobWithApplicants, Role, User,
};

// -- JWT Claims --

/// Claims carried by every access token. Verified by the auth middleware and
/// handed to handlers as a request extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

// -- Generic bodies --

/// `{message, success}` body used for acknowledgements.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub message: String,
    pub success: bool,
}

impl AckResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub success: bool,
}

// -- Companies & jobs --

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterCompanyRequest {
    pub company_name: String,
}

#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub company: Company,
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostJobRequest {
    pub title: String,
    pub description: String,
    pub company_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job: Job,
    pub success: bool,
}

// -- Applications --

#[derive(Debug, Serialize)]
pub struct AppliedJobsResponse {
    pub application: Vec<AppliedApplication>,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ApplicantsResponse {
    pub job: JobWithApplicants,
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

// -- Chat --

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendChatMessageRequest {
    pub application_id: Option<String>,
    pub content: Option<String>,
    pub receiver_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatThreadResponse {
    pub messages: Vec<ChatMessage>,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub message: ChatMessage,
    pub success: bool,
}
