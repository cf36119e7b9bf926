use std::sync::Arc;

use anyhow::anyhow;
use tracing::{info, warn};
use uuid::Uuid;

use hirelane_types::models::{
    ApplicantEntry, Application, ApplicationDetail, AppliedApplication, ChatMessage,
    JobWithApplicants, JobWithCompany, Message, Participant,
};

use crate::authz::{counterpart, participant_roles};
use crate::error::{ApiError, ApiResult};
use crate::repository::Repository;

pub(crate) const MISSING_CHAT_FIELDS: &str =
    "Application ID, content, and receiver ID are required";

/// Apply / review / status / chat operations over an injected repository.
///
/// Every method blocks on storage; async callers run them through
/// `spawn_blocking`.
#[derive(Clone)]
pub struct ApplicationService {
    repo: Arc<dyn Repository>,
}

impl ApplicationService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Create an application for `caller` and append it to the job's list.
    ///
    /// The insert and the append are two separate writes. If the second one
    /// fails the application exists but is not linked from its job.
    pub fn apply(&self, job_id: Uuid, caller: Uuid) -> ApiResult<Application> {
        let job = self
            .repo
            .find_job(job_id)?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;

        if self.repo.find_application_for(job.id, caller)?.is_some() {
            return Err(already_applied());
        }

        // The unique (job, applicant) index catches a concurrent duplicate.
        let application = self
            .repo
            .create_application(job.id, caller)?
            .ok_or_else(already_applied)?;

        self.repo.link_application(job.id, application.id)?;

        info!("User {} applied to job {} ({})", caller, job.id, application.id);
        Ok(application)
    }

    /// The caller's applications, newest first, each with its job and company.
    pub fn list_applied(&self, caller: Uuid) -> ApiResult<Vec<AppliedApplication>> {
        let applications = self.repo.applications_by_applicant(caller)?;

        let mut applied = Vec::with_capacity(applications.len());
        for application in applications {
            let Some(job) = self.repo.find_job(application.job_id)? else {
                warn!(
                    "Application {} references missing job {}",
                    application.id, application.job_id
                );
                continue;
            };
            let Some(company) = self.repo.find_company(job.company_id)? else {
                warn!("Job {} references missing company {}", job.id, job.company_id);
                continue;
            };

            applied.push(AppliedApplication {
                id: application.id,
                status: application.status,
                created_at: application.created_at,
                job: JobWithCompany { job, company },
            });
        }

        Ok(applied)
    }

    /// A job with its applicants, newest application first. Only the user
    /// owning the job's company may look.
    pub fn list_applicants(&self, job_id: Uuid, caller: Uuid) -> ApiResult<JobWithApplicants> {
        let job = self
            .repo
            .find_job(job_id)?
            .ok_or_else(|| ApiError::not_found("Job not found."))?;
        let company = self
            .repo
            .find_company(job.company_id)?
            .ok_or_else(|| {
                anyhow!("job {} references missing company {}", job.id, job.company_id)
            })?;

        if company.user_id != caller {
            warn!("User {} tried to list applicants of job {}", caller, job.id);
            return Err(ApiError::forbidden("Access denied"));
        }

        // Follow the job's own reference list; an unlinked application is not listed.
        let mut entries = Vec::with_capacity(job.applications.len());
        for &application_id in &job.applications {
            let Some(application) = self.repo.find_application(application_id)? else {
                warn!("Job {} references missing application {}", job.id, application_id);
                continue;
            };
            let Some(applicant) = self.repo.find_user(application.applicant_id)? else {
                warn!(
                    "Application {} references missing applicant {}",
                    application.id, application.applicant_id
                );
                continue;
            };
            entries.push(ApplicantEntry {
                id: application.id,
                status: application.status,
                created_at: application.created_at,
                applicant,
            });
        }

        // Newest first; later links win ties.
        entries.reverse();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(JobWithApplicants::new(job, entries))
    }

    /// Store a new status, lower-cased. Any non-empty string is accepted.
    pub fn update_status(
        &self,
        application_id: Uuid,
        status: Option<&str>,
        caller: Uuid,
    ) -> ApiResult<Application> {
        let status = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::bad_request("status is required"))?
            .to_lowercase();

        let detail = self.application_detail(application_id)?;
        if detail.company.user_id != caller {
            warn!("User {} tried to update status of application {}", caller, application_id);
            return Err(ApiError::forbidden("Access denied"));
        }

        if !self.repo.set_application_status(application_id, &status)? {
            return Err(ApiError::not_found("Application not found."));
        }

        info!("Application {} status set to '{}'", application_id, status);
        Ok(Application {
            status,
            ..detail.application
        })
    }

    /// The whole conversation for an application, oldest message first.
    pub fn chat_messages(&self, application_id: Uuid, caller: Uuid) -> ApiResult<Vec<ChatMessage>> {
        let detail = self.application_detail(application_id)?;

        if !participant_roles(&detail, caller).is_participant() {
            warn!("User {} denied access to chat of application {}", caller, application_id);
            return Err(ApiError::forbidden("Access denied"));
        }

        self.repo
            .messages_for_application(application_id)?
            .into_iter()
            .map(|message| self.annotate(&detail, message))
            .collect()
    }

    /// Send a message from `sender` to the other party of the application.
    /// `receiver_id` must name that other party.
    pub fn send_chat_message(
        &self,
        application_id: Uuid,
        content: &str,
        receiver_id: &str,
        sender: Uuid,
    ) -> ApiResult<ChatMessage> {
        let content = content.trim();
        if content.is_empty() || receiver_id.trim().is_empty() {
            return Err(ApiError::bad_request(MISSING_CHAT_FIELDS));
        }

        let detail = self.application_detail(application_id)?;

        let roles = participant_roles(&detail, sender);
        if !roles.is_participant() {
            warn!("User {} denied sending to chat of application {}", sender, application_id);
            return Err(ApiError::forbidden("Access denied"));
        }

        let expected = counterpart(&detail, roles);
        if receiver_id.trim().parse::<Uuid>().ok() != Some(expected) {
            return Err(ApiError::bad_request("Invalid receiver"));
        }

        let message = self
            .repo
            .create_message(application_id, sender, expected, content)?;
        self.annotate(&detail, message)
    }

    /// Follow application -> job -> company -> owner and application -> applicant.
    fn application_detail(&self, application_id: Uuid) -> ApiResult<ApplicationDetail> {
        let application = self
            .repo
            .find_application(application_id)?
            .ok_or_else(|| ApiError::not_found("Application not found"))?;

        let job = self
            .repo
            .find_job(application.job_id)?
            .ok_or_else(|| dangling(&application, "job", application.job_id))?;
        let company = self
            .repo
            .find_company(job.company_id)?
            .ok_or_else(|| dangling(&application, "company", job.company_id))?;
        let owner = self
            .repo
            .find_user(company.user_id)?
            .ok_or_else(|| dangling(&application, "company owner", company.user_id))?;
        let applicant = self
            .repo
            .find_user(application.applicant_id)?
            .ok_or_else(|| dangling(&application, "applicant", application.applicant_id))?;

        Ok(ApplicationDetail {
            application,
            job,
            company,
            owner,
            applicant,
        })
    }

    fn annotate(&self, detail: &ApplicationDetail, message: Message) -> ApiResult<ChatMessage> {
        let sender = self.participant(detail, message.sender_id)?;
        let receiver = self.participant(detail, message.receiver_id)?;

        Ok(ChatMessage {
            id: message.id,
            application_id: message.application_id,
            sender_name: sender.fullname.clone(),
            sender,
            receiver,
            content: message.content,
            is_read: message.is_read,
            created_at: message.created_at,
        })
    }

    fn participant(&self, detail: &ApplicationDetail, user_id: Uuid) -> ApiResult<Participant> {
        if user_id == detail.applicant.id {
            return Ok((&detail.applicant).into());
        }
        if user_id == detail.owner.id {
            return Ok((&detail.owner).into());
        }

        // Not one of the current parties.
        Ok(match self.repo.find_user(user_id)? {
            Some(user) => (&user).into(),
            None => Participant {
                id: user_id,
                fullname: "unknown".to_string(),
                role: None,
            },
        })
    }
}

fn already_applied() -> ApiError {
    ApiError::conflict("You have already applied for this job")
}

fn dangling(application: &Application, what: &str, id: Uuid) -> ApiError {
    ApiError::Internal(anyhow!(
        "application {} references missing {} {}",
        application.id,
        what,
        id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hirelane_db::Database;
    use hirelane_types::models::{Company, Job, Role, User};

    struct Fixture {
        db: Arc<Database>,
        service: ApplicationService,
        applicant: User,
        owner: User,
        outsider: User,
        company: Company,
        job: Job,
    }

    impl Fixture {
        fn repo(&self) -> &dyn Repository {
            &*self.db
        }
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let repo: Arc<dyn Repository> = db.clone();

        let user = |name: &str, email: &str, role| {
            repo.create_user(name, email, "hash", role).unwrap().unwrap()
        };
        let owner = user("Rex Recruiter", "rex@example.com", Role::Recruiter);
        let applicant = user("Ada Applicant", "ada@example.com", Role::Applicant);
        let outsider = user("Otto Outsider", "otto@example.com", Role::Applicant);
        let company = repo.create_company("Acme", owner.id).unwrap().unwrap();
        let job = repo
            .create_job("Engineer", "Builds things", company.id, owner.id)
            .unwrap();

        Fixture {
            db,
            service: ApplicationService::new(repo),
            applicant,
            owner,
            outsider,
            company,
            job,
        }
    }

    #[test]
    fn applying_twice_conflicts_and_keeps_one_application() {
        let f = fixture();
        let first = f.service.apply(f.job.id, f.applicant.id).unwrap();

        let err = f.service.apply(f.job.id, f.applicant.id).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let mine = f.db.applications_by_applicant(f.applicant.id).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, first.id);
        assert_eq!(first.status, "pending");
    }

    #[test]
    fn applying_to_missing_job_creates_nothing() {
        let f = fixture();
        let missing = Uuid::new_v4();

        let err = f.service.apply(missing, f.applicant.id).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(f.db.find_application_for(missing, f.applicant.id).unwrap().is_none());
        assert!(f.db.applications_by_applicant(f.applicant.id).unwrap().is_empty());
    }

    #[test]
    fn apply_appends_exactly_one_reference_to_the_job() {
        let f = fixture();
        let before = f.db.find_job(f.job.id).unwrap().unwrap().applications.len();

        let application = f.service.apply(f.job.id, f.applicant.id).unwrap();

        let after = f.db.find_job(f.job.id).unwrap().unwrap().applications;
        assert_eq!(after.len(), before + 1);
        assert!(after.contains(&application.id));
    }

    #[test]
    fn list_applied_expands_job_and_company() {
        let f = fixture();
        f.service.apply(f.job.id, f.applicant.id).unwrap();

        let applied = f.service.list_applied(f.applicant.id).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].job.job.id, f.job.id);
        assert_eq!(applied[0].job.company.user_id, f.owner.id);

        assert!(f.service.list_applied(f.outsider.id).unwrap().is_empty());
    }

    #[test]
    fn list_applied_is_newest_first() {
        let f = fixture();
        let second_job = f.repo().create_job("Designer", "", f.company.id, f.owner.id).unwrap();

        f.service.apply(f.job.id, f.applicant.id).unwrap();
        f.service.apply(second_job.id, f.applicant.id).unwrap();

        let applied = f.service.list_applied(f.applicant.id).unwrap();
        let titles: Vec<&str> = applied.iter().map(|a| a.job.job.title.as_str()).collect();
        assert_eq!(titles, vec!["Designer", "Engineer"]);
    }

    #[test]
    fn unlinked_application_is_not_listed_for_the_job() {
        let f = fixture();
        f.service.apply(f.job.id, f.outsider.id).unwrap();
        // Inserted but never appended to the job's list.
        f.db.create_application(f.job.id, f.applicant.id).unwrap().unwrap();

        let job = f.service.list_applicants(f.job.id, f.owner.id).unwrap();
        assert_eq!(job.applications.len(), 1);
        assert_eq!(job.applications[0].applicant.id, f.outsider.id);
    }

    #[test]
    fn lists_skip_rows_with_missing_references() {
        let f = fixture();
        let repo = f.repo();
        let other_company = repo.create_company("Orphan Co", f.owner.id).unwrap().unwrap();
        let orphan_job = repo.create_job("Ghost", "", other_company.id, f.owner.id).unwrap();

        f.service.apply(f.job.id, f.applicant.id).unwrap();
        f.service.apply(orphan_job.id, f.applicant.id).unwrap();
        f.service.apply(f.job.id, f.outsider.id).unwrap();

        let company_id = other_company.id.to_string();
        let outsider_id = f.outsider.id.to_string();
        f.db.with_conn(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = OFF")?;
            conn.execute("DELETE FROM companies WHERE id = ?1", [&company_id])?;
            conn.execute("DELETE FROM users WHERE id = ?1", [&outsider_id])?;
            conn.execute_batch("PRAGMA foreign_keys = ON")?;
            Ok(())
        })
        .unwrap();

        let applied = f.service.list_applied(f.applicant.id).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].job.job.id, f.job.id);

        let job = f.service.list_applicants(f.job.id, f.owner.id).unwrap();
        assert_eq!(job.applications.len(), 1);
        assert_eq!(job.applications[0].applicant.id, f.applicant.id);
    }

    #[test]
    fn list_applicants_is_newest_first_and_owner_only() {
        let f = fixture();
        f.service.apply(f.job.id, f.applicant.id).unwrap();
        f.service.apply(f.job.id, f.outsider.id).unwrap();

        let job = f.service.list_applicants(f.job.id, f.owner.id).unwrap();
        let names: Vec<&str> = job
            .applications
            .iter()
            .map(|a| a.applicant.fullname.as_str())
            .collect();
        assert_eq!(names, vec!["Otto Outsider", "Ada Applicant"]);

        let err = f.service.list_applicants(f.job.id, f.applicant.id).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = f.service.list_applicants(Uuid::new_v4(), f.owner.id).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn status_is_stored_lower_case() {
        let f = fixture();
        let application = f.service.apply(f.job.id, f.applicant.id).unwrap();

        let updated = f
            .service
            .update_status(application.id, Some("ACCEPTED"), f.owner.id)
            .unwrap();
        assert_eq!(updated.status, "accepted");
        assert_eq!(
            f.db.find_application(application.id).unwrap().unwrap().status,
            "accepted"
        );
    }

    #[test]
    fn missing_status_leaves_application_unchanged() {
        let f = fixture();
        let application = f.service.apply(f.job.id, f.applicant.id).unwrap();

        for status in [None, Some(""), Some("   ")] {
            let err = f
                .service
                .update_status(application.id, status, f.owner.id)
                .unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)));
        }
        assert_eq!(
            f.db.find_application(application.id).unwrap().unwrap().status,
            "pending"
        );
    }

    #[test]
    fn status_update_checks_existence_and_ownership() {
        let f = fixture();
        let application = f.service.apply(f.job.id, f.applicant.id).unwrap();

        let err = f
            .service
            .update_status(Uuid::new_v4(), Some("accepted"), f.owner.id)
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = f
            .service
            .update_status(application.id, Some("accepted"), f.applicant.id)
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn only_participants_read_the_chat() {
        let f = fixture();
        let application = f.service.apply(f.job.id, f.applicant.id).unwrap();

        assert!(f.service.chat_messages(application.id, f.applicant.id).is_ok());
        assert!(f.service.chat_messages(application.id, f.owner.id).is_ok());

        let err = f.service.chat_messages(application.id, f.outsider.id).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = f.service.chat_messages(Uuid::new_v4(), f.owner.id).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn wrong_receiver_is_rejected_and_not_stored() {
        let f = fixture();
        let application = f.service.apply(f.job.id, f.applicant.id).unwrap();

        let receivers = [
            f.outsider.id.to_string(),
            f.applicant.id.to_string(),
            "nobody".to_string(),
        ];
        for receiver in receivers {
            let err = f
                .service
                .send_chat_message(application.id, "hello", &receiver, f.applicant.id)
                .unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Invalid receiver"));
        }
        assert!(f.db.messages_for_application(application.id).unwrap().is_empty());
    }

    #[test]
    fn outsiders_cannot_send_and_blank_content_is_rejected() {
        let f = fixture();
        let application = f.service.apply(f.job.id, f.applicant.id).unwrap();

        let err = f
            .service
            .send_chat_message(application.id, "hi", &f.applicant.id.to_string(), f.outsider.id)
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = f
            .service
            .send_chat_message(application.id, "  \n ", &f.owner.id.to_string(), f.applicant.id)
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(f.db.messages_for_application(application.id).unwrap().is_empty());
    }

    #[test]
    fn conversation_round_trip_keeps_send_order() {
        let f = fixture();
        let application = f.service.apply(f.job.id, f.applicant.id).unwrap();

        let sent = f
            .service
            .send_chat_message(
                application.id,
                "  Hi, any news?  ",
                &f.owner.id.to_string(),
                f.applicant.id,
            )
            .unwrap();
        assert_eq!(sent.content, "Hi, any news?");
        assert_eq!(sent.sender_name, "Ada Applicant");
        assert_eq!(sent.receiver.id, f.owner.id);
        assert!(!sent.is_read);

        f.service
            .send_chat_message(
                application.id,
                "Yes, interview Monday",
                &f.applicant.id.to_string(),
                f.owner.id,
            )
            .unwrap();

        let thread = f.service.chat_messages(application.id, f.applicant.id).unwrap();
        let lines: Vec<(&str, &str)> = thread
            .iter()
            .map(|m| (m.sender_name.as_str(), m.content.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("Ada Applicant", "Hi, any news?"),
                ("Rex Recruiter", "Yes, interview Monday"),
            ]
        );
        assert!(thread.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }
}
