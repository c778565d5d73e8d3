// Clubs, application forms and questions

use super::paths;
use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{
    ApplicationForm, Club, NewApplicationForm, NewClub, NewQuestion, Question, QuestionType,
};

impl ApiClient {
    pub async fn list_clubs(&self) -> Result<Vec<Club>> {
        self.get_json(paths::CLUBS).await
    }

    pub async fn create_club(&self, club: &NewClub) -> Result<Club> {
        self.post_json(paths::CLUBS, club).await
    }

    pub async fn list_applications(&self, club: i64) -> Result<Vec<ApplicationForm>> {
        self.get_json(&paths::applications(club)).await
    }

    pub async fn get_application(&self, club: i64, form: i64) -> Result<ApplicationForm> {
        self.get_json(&paths::application(club, form)).await
    }

    pub async fn create_application(&self, club: i64, title: &str) -> Result<ApplicationForm> {
        let form = NewApplicationForm {
            club,
            title: title.to_string(),
        };
        self.post_json(&paths::applications(club), &form).await
    }

    pub async fn delete_application(&self, club: i64, form: i64) -> Result<()> {
        self.delete(&paths::application(club, form)).await
    }

    pub async fn list_questions(&self, club: i64, form: i64) -> Result<Vec<Question>> {
        self.get_json(&paths::questions(club, form)).await
    }

    pub async fn create_question(
        &self,
        club: i64,
        form: i64,
        prompt: &str,
        question_type: QuestionType,
        required: bool,
    ) -> Result<Question> {
        let question = NewQuestion {
            form,
            prompt: prompt.to_string(),
            question_type,
            required,
        };
        self.post_json(&paths::questions(club, form), &question).await
    }

    pub async fn delete_question(&self, club: i64, form: i64, question: i64) -> Result<()> {
        self.delete(&paths::question(club, form, question)).await
    }
}
