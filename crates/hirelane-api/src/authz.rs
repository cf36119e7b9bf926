use uuid::Uuid;

use hirelane_types::models::ApplicationDetail;

/// How a caller relates to an application's conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantRoles {
    pub is_applicant: bool,
    pub is_company_owner: bool,
}

impl ParticipantRoles {
    pub fn is_participant(&self) -> bool {
        self.is_applicant || self.is_company_owner
    }
}

/// Compare the caller against the two legitimate parties of an application:
/// the applicant, and the user owning the company that posted the job.
pub fn participant_roles(detail: &ApplicationDetail, caller: Uuid) -> ParticipantRoles {
    ParticipantRoles {
        is_applicant: detail.applicant.id == caller,
        is_company_owner: detail.company.user_id == caller,
    }
}

/// The party a participant is allowed to address.
pub fn counterpart(detail: &ApplicationDetail, roles: ParticipantRoles) -> Uuid {
    if roles.is_applicant {
        detail.company.user_id
    } else {
        detail.applicant.id
    }
}
