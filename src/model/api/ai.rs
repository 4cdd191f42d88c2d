use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::common::question::QuestionType;

/// Ask for a title and description for a form about `topic`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetailsRequest {
    #[serde(default)]
    pub topic: String,
}

/// A suggested form title and description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FormDetails {
    pub title: String,
    pub description: String,
}

impl FormDetails {
    /// What to show when the model could not be reached.
    pub fn fallback(topic: &str) -> Self {
        Self {
            title: topic.to_string(),
            description: "Automated description generation failed.".to_string(),
        }
    }
}

/// Ask for questions to put on a form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuestionsRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A question proposed by the model, ready to be edited into a form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SuggestedQuestion {
    pub label: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

/// A question exactly as the model returned it. The type is free text since
/// the model may name types the forms do not support.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSuggestion {
    pub label: String,
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl TryFrom<RawSuggestion> for SuggestedQuestion {
    type Error = String;

    /// Fails with the type name if it is not a supported question type.
    fn try_from(raw: RawSuggestion) -> Result<Self, Self::Error> {
        let question_type: QuestionType =
            serde_json::from_value(Value::String(raw.question_type.clone()))
                .map_err(|_| raw.question_type)?;
        let options = if question_type.is_choice() {
            raw.options
        } else {
            Vec::new()
        };
        Ok(Self {
            label: raw.label,
            question_type,
            options,
            required: raw.required,
        })
    }
}
