use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::answer::AnswerValue, mongodb::Id};

/// Core response data, as stored in the database. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCore {
    /// The form this responds to.
    pub form_id: Id,
    /// The signed-in user who submitted this, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent_id: Option<Id>,
    /// At most one answer per question.
    pub answers: Vec<Answer>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub submitted_at: DateTime<Utc>,
}

impl ResponseCore {
    /// Get the answer to the given question, if there is one.
    ///
    /// Uniqueness is enforced on submission; should a stored response ever
    /// hold duplicates, the last one wins.
    pub fn answer(&self, question_id: Id) -> Option<&Answer> {
        self.answers
            .iter()
            .rev()
            .find(|answer| answer.question_id == question_id)
    }
}

/// A response without an ID.
pub type NewResponse = ResponseCore;

/// A response from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub response: ResponseCore,
}

impl Deref for Response {
    type Target = ResponseCore;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

impl DerefMut for Response {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.response
    }
}

/// One response's value for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Id,
    #[serde(default)]
    pub value: Option<AnswerValue>,
}

impl Answer {
    pub fn new(question_id: Id, value: impl Into<Option<AnswerValue>>) -> Self {
        Self {
            question_id,
            value: value.into(),
        }
    }
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use super::*;

    impl Response {
        /// A response to the given form with the given answers.
        pub fn example(form_id: Id, answers: Vec<Answer>) -> Self {
            Self {
                id: Id::new(),
                response: ResponseCore {
                    form_id,
                    respondent_id: None,
                    answers,
                    submitted_at: Utc::now(),
                },
            }
        }
    }
}
