/// Database row types — these map directly to SQLite rows.
/// Distinct from hirelane-types models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CompanyRow {
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub company_id: String,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: String,
    pub job_id: String,
    pub applicant_id: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub application_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}
