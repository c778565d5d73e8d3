// Applicants, submissions and answers

use bytes::Bytes;

use super::paths;
use crate::error::Result;
use crate::http_client::{ApiClient, MultipartField};
use crate::models::{Answer, Applicant, NewApplicant, NewSubmission, NewTextAnswer, Submission};

/// Server-side ordering for the applicant listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicantOrdering {
    pub field: String,
    pub descending: bool,
}

impl ApplicantOrdering {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parse the `ordering` query syntax, where a leading `-` means descending
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.strip_prefix('-') {
            Some(field) if !field.is_empty() => Some(Self::descending(field)),
            Some(_) => None,
            None if !s.is_empty() => Some(Self::ascending(s)),
            None => None,
        }
    }

    /// Value of the `ordering` query parameter
    pub fn as_param(&self) -> String {
        if self.descending {
            format!("-{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

impl ApiClient {
    pub async fn list_applicants(&self, ordering: Option<&ApplicantOrdering>) -> Result<Vec<Applicant>> {
        match ordering {
            Some(ordering) => {
                let param = ordering.as_param();
                self.get_json_with_query(paths::APPLICANTS, &[("ordering", param.as_str())])
                    .await
            }
            None => self.get_json(paths::APPLICANTS).await,
        }
    }

    pub async fn get_applicant(&self, id: i64) -> Result<Applicant> {
        self.get_json(&paths::applicant(id)).await
    }

    /// Delete an applicant together with their submission and answers
    pub async fn delete_applicant(&self, id: i64) -> Result<()> {
        self.delete(&paths::applicant(id)).await
    }

    /// Public applicant creation used by the apply flow
    pub async fn create_applicant(&self, applicant: &NewApplicant) -> Result<Applicant> {
        self.post_json(paths::APPLICANT_SIGNUP, applicant).await
    }

    pub async fn list_submissions(&self) -> Result<Vec<Submission>> {
        self.get_json(paths::SUBMISSIONS).await
    }

    pub async fn create_submission(&self, form: i64, applicant: i64) -> Result<Submission> {
        self.post_json(paths::SUBMISSIONS, &NewSubmission { form, applicant })
            .await
    }

    pub async fn post_text_answer(
        &self,
        submission: i64,
        question: i64,
        text: &str,
    ) -> Result<Answer> {
        let answer = NewTextAnswer {
            submission,
            question,
            answer_text: text.to_string(),
        };
        self.post_json(&paths::answers(submission), &answer).await
    }

    pub async fn post_file_answer(
        &self,
        submission: i64,
        question: i64,
        file_name: &str,
        data: Bytes,
    ) -> Result<Answer> {
        let fields = vec![
            MultipartField::text("submission", submission.to_string()),
            MultipartField::text("question", question.to_string()),
            MultipartField::file("answer_file", file_name, data),
        ];
        self.post_multipart(&paths::answers(submission), fields)
            .await
    }
}
