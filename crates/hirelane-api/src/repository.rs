use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use hirelane_db::Database;
use hirelane_db::models::{ApplicationRow, CompanyRow, JobRow, MessageRow, UserRow};
use hirelane_types::models::{Application, Company, Job, Message, Role, User};

/// A user together with the stored password hash, for login only.
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

/// Storage operations the services depend on. Identifiers are assigned by the
/// store on create. All methods block.
pub trait Repository: Send + Sync {
    // -- Users --
    /// `None` if the email is already registered.
    fn create_user(
        &self,
        fullname: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Option<User>>;
    fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<StoredUser>>;

    // -- Companies --
    /// `None` if a company with that name exists.
    fn create_company(&self, name: &str, owner_id: Uuid) -> Result<Option<Company>>;
    fn find_company(&self, id: Uuid) -> Result<Option<Company>>;
    fn find_company_by_name(&self, name: &str) -> Result<Option<Company>>;

    // -- Jobs --
    fn create_job(
        &self,
        title: &str,
        description: &str,
        company_id: Uuid,
        created_by: Uuid,
    ) -> Result<Job>;
    /// The job with its application id list populated, in append order.
    fn find_job(&self, id: Uuid) -> Result<Option<Job>>;
    /// Append an application id to a job's application list.
    fn link_application(&self, job_id: Uuid, application_id: Uuid) -> Result<()>;

    // -- Applications --
    /// `None` if the applicant already has an application for the job.
    fn create_application(&self, job_id: Uuid, applicant_id: Uuid) -> Result<Option<Application>>;
    fn find_application(&self, id: Uuid) -> Result<Option<Application>>;
    fn find_application_for(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
    ) -> Result<Option<Application>>;
    /// Newest first.
    fn applications_by_applicant(&self, applicant_id: Uuid) -> Result<Vec<Application>>;
    /// Returns false if the application does not exist.
    fn set_application_status(&self, id: Uuid, status: &str) -> Result<bool>;

    // -- Messages --
    fn create_message(
        &self,
        application_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message>;
    /// Chronological.
    fn messages_for_application(&self, application_id: Uuid) -> Result<Vec<Message>>;
}

impl Repository for Database {
    fn create_user(
        &self,
        fullname: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Option<User>> {
        let id = Uuid::new_v4().to_string();
        Database::create_user(self, &id, fullname, email, password_hash, role.as_str())?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        self.get_user_by_id(&id.to_string())?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<StoredUser>> {
        self.get_user_by_email(email)?
            .map(|row| {
                Ok(StoredUser {
                    user: user_from_row(&row)?,
                    password_hash: row.password,
                })
            })
            .transpose()
    }

    fn create_company(&self, name: &str, owner_id: Uuid) -> Result<Option<Company>> {
        let id = Uuid::new_v4().to_string();
        Database::create_company(self, &id, name, &owner_id.to_string())?
            .map(|row| company_from_row(&row))
            .transpose()
    }

    fn find_company(&self, id: Uuid) -> Result<Option<Company>> {
        self.get_company_by_id(&id.to_string())?
            .map(|row| company_from_row(&row))
            .transpose()
    }

    fn find_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        self.get_company_by_name(name)?
            .map(|row| company_from_row(&row))
            .transpose()
    }

    fn create_job(
        &self,
        title: &str,
        description: &str,
        company_id: Uuid,
        created_by: Uuid,
    ) -> Result<Job> {
        let id = Uuid::new_v4().to_string();
        let row = Database::create_job(
            self,
            &id,
            title,
            description,
            &company_id.to_string(),
            &created_by.to_string(),
        )?;
        job_from_row(&row, Vec::new())
    }

    fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        let job_id = id.to_string();
        let Some(row) = self.get_job_by_id(&job_id)? else {
            return Ok(None);
        };
        let applications = self
            .get_job_application_ids(&job_id)?
            .iter()
            .map(|raw| parse_id(raw))
            .collect::<Result<Vec<_>>>()?;
        job_from_row(&row, applications).map(Some)
    }

    fn link_application(&self, job_id: Uuid, application_id: Uuid) -> Result<()> {
        self.append_job_application(&job_id.to_string(), &application_id.to_string())
    }

    fn create_application(&self, job_id: Uuid, applicant_id: Uuid) -> Result<Option<Application>> {
        let id = Uuid::new_v4().to_string();
        self.insert_application(&id, &job_id.to_string(), &applicant_id.to_string())?
            .map(|row| application_from_row(&row))
            .transpose()
    }

    fn find_application(&self, id: Uuid) -> Result<Option<Application>> {
        self.get_application_by_id(&id.to_string())?
            .map(|row| application_from_row(&row))
            .transpose()
    }

    fn find_application_for(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
    ) -> Result<Option<Application>> {
        self.get_application_by_job_and_applicant(&job_id.to_string(), &applicant_id.to_string())?
            .map(|row| application_from_row(&row))
            .transpose()
    }

    fn applications_by_applicant(&self, applicant_id: Uuid) -> Result<Vec<Application>> {
        self.get_applications_by_applicant(&applicant_id.to_string())?
            .iter()
            .map(application_from_row)
            .collect()
    }

    fn set_application_status(&self, id: Uuid, status: &str) -> Result<bool> {
        self.update_application_status(&id.to_string(), status)
    }

    fn create_message(
        &self,
        application_id: Uuid,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message> {
        let id = Uuid::new_v4().to_string();
        let row = self.insert_message(
            &id,
            &application_id.to_string(),
            &sender_id.to_string(),
            &receiver_id.to_string(),
            content,
        )?;
        message_from_row(&row)
    }

    fn messages_for_application(&self, application_id: Uuid) -> Result<Vec<Message>> {
        self.get_messages_by_application(&application_id.to_string())?
            .iter()
            .map(message_from_row)
            .collect()
    }
}

// -- Row conversion --

fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("corrupt id '{}'", raw))
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by the column default use SQLite's "YYYY-MM-DD HH:MM:SS".
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}

fn user_from_row(row: &UserRow) -> Result<User> {
    Ok(User {
        id: parse_id(&row.id)?,
        fullname: row.fullname.clone(),
        email: row.email.clone(),
        role: row.role.parse().map_err(anyhow::Error::msg)?,
        created_at: parse_time(&row.created_at)?,
    })
}

fn company_from_row(row: &CompanyRow) -> Result<Company> {
    Ok(Company {
        id: parse_id(&row.id)?,
        name: row.name.clone(),
        user_id: parse_id(&row.user_id)?,
        created_at: parse_time(&row.created_at)?,
    })
}

fn job_from_row(row: &JobRow, applications: Vec<Uuid>) -> Result<Job> {
    Ok(Job {
        id: parse_id(&row.id)?,
        title: row.title.clone(),
        description: row.description.clone(),
        company_id: parse_id(&row.company_id)?,
        created_by: parse_id(&row.created_by)?,
        applications,
        created_at: parse_time(&row.created_at)?,
    })
}

fn application_from_row(row: &ApplicationRow) -> Result<Application> {
    Ok(Application {
        id: parse_id(&row.id)?,
        job_id: parse_id(&row.job_id)?,
        applicant_id: parse_id(&row.applicant_id)?,
        status: row.status.clone(),
        created_at: parse_time(&row.created_at)?,
    })
}

fn message_from_row(row: &MessageRow) -> Result<Message> {
    Ok(Message {
        id: parse_id(&row.id)?,
        application_id: parse_id(&row.application_id)?,
        sender_id: parse_id(&row.sender_id)?,
        receiver_id: parse_id(&row.receiver_id)?,
        content: row.content.clone(),
        is_read: row.is_read,
        created_at: parse_time(&row.created_at)?,
    })
}
