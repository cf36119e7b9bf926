use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            fullname    TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL CHECK (role IN ('applicant', 'recruiter')),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS companies (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS jobs (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            company_id  TEXT NOT NULL REFERENCES companies(id),
            created_by  TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS applications (
            id              TEXT PRIMARY KEY,
            job_id          TEXT NOT NULL REFERENCES jobs(id),
            applicant_id    TEXT NOT NULL REFERENCES users(id),
            status          TEXT NOT NULL DEFAULT 'pending',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(job_id, applicant_id)
        );

        CREATE INDEX IF NOT EXISTS idx_applications_applicant
            ON applications(applicant_id, created_at);

        -- A job's ordered list of application references; seq is the append order
        CREATE TABLE IF NOT EXISTS job_applications (
            seq             INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id          TEXT NOT NULL REFERENCES jobs(id),
            application_id  TEXT NOT NULL REFERENCES applications(id)
        );

        CREATE INDEX IF NOT EXISTS idx_job_applications_job
            ON job_applications(job_id, seq);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            application_id  TEXT NOT NULL REFERENCES applications(id),
            sender_id       TEXT NOT NULL REFERENCES users(id),
            receiver_id     TEXT NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL,
            is_read         INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_application
            ON messages(application_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
