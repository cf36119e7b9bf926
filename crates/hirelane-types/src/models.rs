use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Only recruiters may register companies and post jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Applicant,
    Recruiter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::Recruiter => "recruiter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "applicant" => Ok(Self::Applicant),
            "recruiter" => Ok(Self::Recruiter),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Public view of an account. The password hash never leaves the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    /// The recruiter who owns the company.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company_id: Uuid,
    pub created_by: Uuid,
    /// Application ids in the order they were submitted.
    pub applications: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub application_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// -- Expanded views --

/// An application with every reference needed to decide who may talk about it:
/// the job, the job's company, the company's owning user and the applicant.
#[derive(Debug, Clone)]
pub struct ApplicationDetail {
    pub application: Application,
    pub job: Job,
    pub company: Company,
    pub owner: User,
    pub applicant: User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobWithCompany {
    #[serde(flatten)]
    pub job: Job,
    pub company: Company,
}

/// One entry of the caller's "my applications" list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedApplication {
    pub id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub job: JobWithCompany,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantEntry {
    pub id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub applicant: User,
}

/// A job with its applications expanded, newest application first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobWithApplicants {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub applications: Vec<ApplicantEntry>,
}

impl JobWithApplicants {
    pub fn new(job: Job, applications: Vec<ApplicantEntry>) -> Self {
        Self {
            id: job.id,
            title: job.title,
            description: job.description,
            company_id: job.company_id,
            created_by: job.created_by,
            created_at: job.created_at,
            applications,
        }
    }
}

/// Sender/receiver summary embedded in chat messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub fullname: String,
    pub role: Option<Role>,
}

impl From<&User> for Participant {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname.clone(),
            role: Some(user.role),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub application_id: Uuid,
    pub sender: Participant,
    pub receiver: Participant,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub sender_name: String,
}
