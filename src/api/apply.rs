// Public application flow and the per-form applicant overview

use bytes::Bytes;
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashMap;

use super::applicants::ApplicantOrdering;
use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{Answer, Applicant, NewApplicant, Question, Submission};

/// One answer to post with an application
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerDraft {
    Text { question: i64, text: String },
    File {
        question: i64,
        file_name: String,
        data: Bytes,
    },
}

impl AnswerDraft {
    pub fn question(&self) -> i64 {
        match self {
            AnswerDraft::Text { question, .. } | AnswerDraft::File { question, .. } => *question,
        }
    }
}

/// Everything the applicant filled in
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationDraft {
    pub applicant: NewApplicant,
    pub answers: Vec<AnswerDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyReceipt {
    pub applicant: Applicant,
    pub submission: Submission,
    /// An existing submission for this form and applicant was reused
    pub reused_submission: bool,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnsweredQuestion {
    pub answer: Answer,
    pub question: Option<Question>,
}

/// A submission for one form joined with its applicant and questions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantRow {
    pub applicant: Option<Applicant>,
    pub submission: Submission,
    pub answers: Vec<AnsweredQuestion>,
}

impl ApiClient {
    /// Create the applicant, its submission and all answers
    ///
    /// Answers are posted concurrently; the first failure fails the flow.
    pub async fn submit_application(&self, draft: &ApplicationDraft) -> Result<ApplyReceipt> {
        let applicant = self.create_applicant(&draft.applicant).await?;
        let form = draft.applicant.application;

        let (submission, reused_submission) = self.ensure_submission(form, applicant.id).await?;
        tracing::info!(
            applicant = applicant.id,
            submission = submission.id,
            reused = reused_submission,
            answers = draft.answers.len(),
            "Submitting application answers"
        );

        let submission_id = submission.id;
        let answers = try_join_all(draft.answers.iter().map(|answer| async move {
            match answer {
                AnswerDraft::Text { question, text } => {
                    self.post_text_answer(submission_id, *question, text).await
                }
                AnswerDraft::File {
                    question,
                    file_name,
                    data,
                } => {
                    self.post_file_answer(submission_id, *question, file_name, data.clone())
                        .await
                }
            }
        }))
        .await?;

        Ok(ApplyReceipt {
            applicant,
            submission,
            reused_submission,
            answers,
        })
    }

    /// Create a submission, reusing the existing one when the API reports a duplicate
    async fn ensure_submission(&self, form: i64, applicant: i64) -> Result<(Submission, bool)> {
        match self.create_submission(form, applicant).await {
            Ok(submission) => Ok((submission, false)),
            Err(e) if e.status() == Some(400) => {
                tracing::debug!(form, applicant, "Submission rejected, looking for an existing one");
                let existing = self
                    .list_submissions()
                    .await?
                    .into_iter()
                    .find(|s| s.form == form && s.applicant == applicant);

                match existing {
                    Some(submission) => Ok((submission, true)),
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Submissions for one form with their applicants and questions
    ///
    /// Rows follow the server's applicant ordering; submissions whose applicant
    /// is missing from the listing come last.
    pub async fn applicant_overview(
        &self,
        club: i64,
        form: i64,
        ordering: Option<&ApplicantOrdering>,
    ) -> Result<Vec<ApplicantRow>> {
        let (submissions, applicants, questions) = futures::try_join!(
            self.list_submissions(),
            self.list_applicants(ordering),
            self.list_questions(club, form)
        )?;

        Ok(join_overview(form, submissions, applicants, questions))
    }
}

fn join_overview(
    form: i64,
    submissions: Vec<Submission>,
    applicants: Vec<Applicant>,
    questions: Vec<Question>,
) -> Vec<ApplicantRow> {
    let position: HashMap<i64, usize> = applicants
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id, i))
        .collect();
    let mut by_id: HashMap<i64, Applicant> = applicants.into_iter().map(|a| (a.id, a)).collect();
    let questions: HashMap<i64, Question> = questions.into_iter().map(|q| (q.id, q)).collect();

    let mut rows: Vec<ApplicantRow> = submissions
        .into_iter()
        .filter(|s| s.form == form)
        .map(|mut submission| {
            let answers = std::mem::take(&mut submission.answers)
                .into_iter()
                .map(|answer| AnsweredQuestion {
                    question: questions.get(&answer.question).cloned(),
                    answer,
                })
                .collect();

            ApplicantRow {
                applicant: by_id.remove(&submission.applicant),
                submission,
                answers,
            }
        })
        .collect();

    rows.sort_by_key(|row| {
        row.applicant
            .as_ref()
            .and_then(|a| position.get(&a.id).copied())
            .unwrap_or(usize::MAX)
    });

    rows
}
