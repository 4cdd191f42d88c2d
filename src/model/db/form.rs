use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::question::{QuestionType, Validation},
    mongodb::Id,
};

/// Core form data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormCore {
    /// The user who authored the form.
    pub owner_id: Id,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Only published forms accept responses.
    pub is_published: bool,
    /// Anyone may see the aggregated results.
    pub allow_public_responses_view: bool,
    /// A signed-in respondent may submit more than once.
    pub allow_multiple_submissions: bool,
    /// Questions in authored order.
    pub questions: Vec<Question>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl FormCore {
    /// Get the question with the given ID, if it is on this form.
    pub fn question(&self, question_id: Id) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// A form without an ID.
pub type NewForm = FormCore;

/// A form from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub form: FormCore,
}

impl Deref for Form {
    type Target = FormCore;

    fn deref(&self) -> &Self::Target {
        &self.form
    }
}

impl DerefMut for Form {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.form
    }
}

/// A single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable for the lifetime of the form, including across edits.
    pub id: Id,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Only non-empty for choice questions.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Validation::is_empty")]
    pub validation: Validation,
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use super::*;

    impl Question {
        pub fn example(question_type: QuestionType, label: &str) -> Self {
            let options = if question_type.is_choice() {
                vec!["A".to_string(), "B".to_string(), "C".to_string()]
            } else {
                Vec::new()
            };
            Self {
                id: Id::new(),
                question_type,
                label: label.to_string(),
                help_text: None,
                required: false,
                options,
                validation: Validation::default(),
            }
        }
    }

    impl FormCore {
        /// A published form with one question of every type.
        pub fn example(owner_id: Id) -> Self {
            let now = Utc::now();
            Self {
                owner_id,
                title: "Team Lunch Survey".to_string(),
                description: "Help us plan the next team lunch.".to_string(),
                is_published: true,
                allow_public_responses_view: false,
                allow_multiple_submissions: true,
                questions: vec![
                    Question::example(QuestionType::ShortText, "Name"),
                    Question::example(QuestionType::LongText, "Dietary requirements"),
                    Question::example(QuestionType::MultipleChoice, "Cuisine"),
                    Question::example(QuestionType::Checkboxes, "Available days"),
                    Question::example(QuestionType::Dropdown, "Office"),
                    Question::example(QuestionType::Date, "Preferred date"),
                    Question::example(QuestionType::Number, "Budget"),
                    Question::example(QuestionType::Email, "Contact email"),
                ],
                created_at: now,
                updated_at: now,
            }
        }
    }

    impl Form {
        pub fn example() -> Self {
            Self {
                id: Id::new(),
                form: FormCore::example(Id::new()),
            }
        }
    }
}
