use crate::models::{ApplicationRow, CompanyRow, JobRow, MessageRow, UserRow};
use crate::{Database, now_timestamp};
use anyhow::Result;
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str = "id, fullname, email, password, role, created_at";
const COMPANY_COLUMNS: &str = "id, name, user_id, created_at";
const JOB_COLUMNS: &str = "id, title, description, company_id, created_by, created_at";
const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, status, created_at";
const MESSAGE_COLUMNS: &str =
    "id, application_id, sender_id, receiver_id, content, is_read, created_at";

impl Database {
    // -- Users --

    /// Returns `None` when the email is already registered.
    pub fn create_user(
        &self,
        id: &str,
        fullname: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<Option<UserRow>> {
        let created_at = now_timestamp();
        let inserted = self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO users (id, fullname, email, password, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, fullname, email, password_hash, role, created_at],
            )?;
            Ok(changed == 1)
        })?;

        if !inserted {
            return Ok(None);
        }
        Ok(Some(UserRow {
            id: id.to_string(),
            fullname: fullname.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            role: role.to_string(),
            created_at,
        }))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                email,
                user_from_row,
            )
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                id,
                user_from_row,
            )
        })
    }

    // -- Companies --

    /// Returns `None` when a company with that name exists.
    pub fn create_company(
        &self,
        id: &str,
        name: &str,
        user_id: &str,
    ) -> Result<Option<CompanyRow>> {
        let created_at = now_timestamp();
        let inserted = self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO companies (id, name, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, name, user_id, created_at],
            )?;
            Ok(changed == 1)
        })?;

        if !inserted {
            return Ok(None);
        }
        Ok(Some(CompanyRow {
            id: id.to_string(),
            name: name.to_string(),
            user_id: user_id.to_string(),
            created_at,
        }))
    }

    pub fn get_company_by_id(&self, id: &str) -> Result<Option<CompanyRow>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1"),
                id,
                company_from_row,
            )
        })
    }

    pub fn get_company_by_name(&self, name: &str) -> Result<Option<CompanyRow>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE name = ?1"),
                name,
                company_from_row,
            )
        })
    }

    // -- Jobs --

    pub fn create_job(
        &self,
        id: &str,
        title: &str,
        description: &str,
        company_id: &str,
        created_by: &str,
    ) -> Result<JobRow> {
        let created_at = now_timestamp();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO jobs (id, title, description, company_id, created_by, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, title, description, company_id, created_by, created_at],
            )?;
            Ok(())
        })?;

        Ok(JobRow {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            company_id: company_id.to_string(),
            created_by: created_by.to_string(),
            created_at,
        })
    }

    pub fn get_job_by_id(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                id,
                job_from_row,
            )
        })
    }

    /// Application ids linked from a job, in append order.
    pub fn get_job_application_ids(&self, job_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT application_id FROM job_applications WHERE job_id = ?1 ORDER BY seq",
            )?;
            let ids = stmt
                .query_map([job_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(ids)
        })
    }

    pub fn append_job_application(&self, job_id: &str, application_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO job_applications (job_id, application_id) VALUES (?1, ?2)",
                (job_id, application_id),
            )?;
            Ok(())
        })
    }

    // -- Applications --

    /// Insert an application with the default `pending` status.
    /// Returns `None` when the (job, applicant) pair already has one.
    pub fn insert_application(
        &self,
        id: &str,
        job_id: &str,
        applicant_id: &str,
    ) -> Result<Option<ApplicationRow>> {
        let created_at = now_timestamp();
        let inserted = self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO applications (id, job_id, applicant_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, job_id, applicant_id, created_at],
            )?;
            Ok(changed == 1)
        })?;

        if !inserted {
            return Ok(None);
        }
        self.get_application_by_id(id)
    }

    pub fn get_application_by_id(&self, id: &str) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| {
            query_one(
                conn,
                &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
                id,
                application_from_row,
            )
        })
    }

    pub fn get_application_by_job_and_applicant(
        &self,
        job_id: &str,
        applicant_id: &str,
    ) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = ?1 AND applicant_id = ?2"
            ))?;
            let row = stmt
                .query_row((job_id, applicant_id), application_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Newest first.
    pub fn get_applications_by_applicant(&self, applicant_id: &str) -> Result<Vec<ApplicationRow>> {
        self.with_conn(|conn| {
            query_many(
                conn,
                &format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications
                     WHERE applicant_id = ?1
                     ORDER BY created_at DESC, rowid DESC"
                ),
                applicant_id,
                application_from_row,
            )
        })
    }

    /// Returns false when no application has that id.
    pub fn update_application_status(&self, id: &str, status: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE applications SET status = ?1 WHERE id = ?2",
                (status, id),
            )?;
            Ok(changed == 1)
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        application_id: &str,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
    ) -> Result<MessageRow> {
        let created_at = now_timestamp();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, application_id, sender_id, receiver_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, application_id, sender_id, receiver_id, content, created_at],
            )?;
            Ok(())
        })?;

        Ok(MessageRow {
            id: id.to_string(),
            application_id: application_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            is_read: false,
            created_at,
        })
    }

    /// Oldest first; rows sharing a timestamp keep insertion order.
    pub fn get_messages_by_application(&self, application_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_many(
                conn,
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages
                     WHERE application_id = ?1
                     ORDER BY created_at ASC, rowid ASC"
                ),
                application_id,
                message_from_row,
            )
        })
    }
}

fn query_one<T>(
    conn: &Connection,
    sql: &str,
    key: &str,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let row = stmt.query_row([key], map).optional()?;
    Ok(row)
}

fn query_many<T>(
    conn: &Connection,
    sql: &str,
    key: &str,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([key], map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        fullname: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<CompanyRow> {
    Ok(CompanyRow {
        id: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        company_id: row.get(3)?,
        created_by: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        applicant_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        application_id: row.get(1)?,
        sender_id: row.get(2)?,
        receiver_id: row.get(3)?,
        content: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u-applicant", "Ada Applicant", "ada@example.com", "hash", "applicant")
            .unwrap()
            .unwrap();
        db.create_user("u-recruiter", "Rex Recruiter", "rex@example.com", "hash", "recruiter")
            .unwrap()
            .unwrap();
        db.create_company("c-1", "Acme", "u-recruiter").unwrap().unwrap();
        db.create_job("j-1", "Engineer", "Builds things", "c-1", "u-recruiter")
            .unwrap();
        db
    }

    #[test]
    fn duplicate_application_is_ignored() {
        let db = seeded();

        let first = db.insert_application("a-1", "j-1", "u-applicant").unwrap();
        assert_eq!(first.unwrap().status, "pending");

        let second = db.insert_application("a-2", "j-1", "u-applicant").unwrap();
        assert!(second.is_none());
        assert!(db.get_application_by_id("a-2").unwrap().is_none());
    }

    #[test]
    fn job_application_ids_keep_append_order() {
        let db = seeded();
        db.create_user("u-other", "Olive Other", "olive@example.com", "hash", "applicant")
            .unwrap()
            .unwrap();
        db.insert_application("a-1", "j-1", "u-applicant").unwrap();
        db.insert_application("a-2", "j-1", "u-other").unwrap();
        db.append_job_application("j-1", "a-1").unwrap();
        db.append_job_application("j-1", "a-2").unwrap();

        assert_eq!(db.get_job_application_ids("j-1").unwrap(), vec!["a-1", "a-2"]);
    }

    #[test]
    fn messages_come_back_in_send_order() {
        let db = seeded();
        db.insert_application("a-1", "j-1", "u-applicant").unwrap();
        for (i, text) in ["first", "second", "third"].iter().enumerate() {
            db.insert_message(&format!("m-{i}"), "a-1", "u-applicant", "u-recruiter", text)
                .unwrap();
        }

        let contents: Vec<String> = db
            .get_messages_by_application("a-1")
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn status_update_reports_missing_rows() {
        let db = seeded();
        db.insert_application("a-1", "j-1", "u-applicant").unwrap();

        assert!(db.update_application_status("a-1", "accepted").unwrap());
        assert!(!db.update_application_status("missing", "accepted").unwrap());
        assert_eq!(db.get_application_by_id("a-1").unwrap().unwrap().status, "accepted");
    }

    #[test]
    fn duplicate_email_and_company_name_are_ignored() {
        let db = seeded();

        let again = db
            .create_user("u-again", "Ada Again", "ada@example.com", "hash", "applicant")
            .unwrap();
        assert!(again.is_none());
        assert!(db.get_user_by_id("u-again").unwrap().is_none());

        let rival = db.create_company("c-2", "Acme", "u-applicant").unwrap();
        assert!(rival.is_none());
        assert_eq!(db.get_company_by_name("Acme").unwrap().unwrap().id, "c-1");
    }

    #[test]
    fn applications_by_applicant_are_newest_first() {
        let db = seeded();
        db.create_job("j-2", "Designer", "Draws things", "c-1", "u-recruiter")
            .unwrap();
        db.insert_application("a-1", "j-1", "u-applicant").unwrap();
        db.insert_application("a-2", "j-2", "u-applicant").unwrap();

        let ids: Vec<String> = db
            .get_applications_by_applicant("u-applicant")
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["a-2", "a-1"]);
    }
}
