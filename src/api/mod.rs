// Typed wrappers over the club recruitment endpoints

pub mod accounts;
pub mod applicants;
pub mod apply;
pub mod clubs;

pub use accounts::{IdentityLookup, LoginOutcome};
pub use applicants::ApplicantOrdering;
pub use apply::{AnswerDraft, ApplicantRow, ApplicationDraft, ApplyReceipt, AnsweredQuestion};

/// Relative API paths
pub mod paths {
    pub const LOGIN: &str = "login/";
    pub const REGISTER: &str = "register/";
    pub const USERS: &str = "users/";
    pub const CLUBS: &str = "club";
    pub const APPLICANTS: &str = "applicant";
    pub const APPLICANT_SIGNUP: &str = "applicants/";
    pub const SUBMISSIONS: &str = "submission";

    pub fn applications(club: i64) -> String {
        format!("club/{}/application", club)
    }

    pub fn application(club: i64, form: i64) -> String {
        format!("club/{}/application/{}", club, form)
    }

    pub fn questions(club: i64, form: i64) -> String {
        format!("club/{}/application/{}/question", club, form)
    }

    pub fn question(club: i64, form: i64, question: i64) -> String {
        format!("club/{}/application/{}/question/{}", club, form, question)
    }

    pub fn applicant(id: i64) -> String {
        format!("applicant/{}", id)
    }

    pub fn answers(submission: i64) -> String {
        format!("submission/{}/answers", submission)
    }

}
