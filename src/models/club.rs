use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==================================================================================================
// Clubs
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: i64,
    pub name: String,
    /// Free-form external identifier, not always present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club_id: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewClub {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<String>,
}

// ==================================================================================================
// Application forms
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationForm {
    pub id: i64,
    pub club: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewApplicationForm {
    pub club: i64,
    pub title: String,
}

// ==================================================================================================
// Questions
// ==================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestionType {
    #[default]
    Short,
    Long,
    #[serde(rename = "Multi-Select")]
    MultiSelect,
    File,
}

impl QuestionType {
    /// Parse the API spelling, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "short" => Some(QuestionType::Short),
            "long" => Some(QuestionType::Long),
            "multi-select" | "multiselect" | "multi_select" => Some(QuestionType::MultiSelect),
            "file" => Some(QuestionType::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub form: i64,
    pub prompt: String,
    pub question_type: QuestionType,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewQuestion {
    pub form: i64,
    pub prompt: String,
    pub question_type: QuestionType,
    pub required: bool,
}
