use serde::{Deserialize, Serialize};

// ==================================================================================================
// Applicants
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub year: String,
    #[serde(default)]
    pub pass_apps: bool,
    #[serde(default)]
    pub pass_first: bool,
    #[serde(default)]
    pub pass_second: bool,
    pub club_association: i64,
    #[serde(default)]
    pub application_id: Option<i64>,
    #[serde(default)]
    pub submission: Option<Submission>,
}

impl Applicant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Applicant details collected by the public apply flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplicant {
    pub first_name: String,
    pub last_name: String,
    pub year: String,
    pub club_association: i64,
    /// Application form id
    pub application: i64,
}

// ==================================================================================================
// Submissions and answers
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub form: i64,
    pub applicant: i64,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSubmission {
    pub form: i64,
    pub applicant: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub submission: i64,
    pub question: i64,
    #[serde(default)]
    pub answer_text: Option<String>,
    /// URL of the uploaded file
    #[serde(default)]
    pub answer_file: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTextAnswer {
    pub submission: i64,
    pub question: i64,
    pub answer_text: String,
}
