// Data models for the club recruitment API

pub mod account;
pub mod applicant;
pub mod club;

pub use account::{NewAccount, UserRecord};
pub use applicant::{Answer, Applicant, NewApplicant, NewSubmission, NewTextAnswer, Submission};
pub use club::{
    ApplicationForm, Club, NewApplicationForm, NewClub, NewQuestion, Question, QuestionType,
};
