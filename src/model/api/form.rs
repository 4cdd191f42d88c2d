use std::collections::HashSet;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    api::id::ApiId,
    common::question::{QuestionType, Validation},
    db::form::{Form, FormCore, NewForm, Question},
    mongodb::Id,
};

/// A form as authored by its owner: everything except the ID, owner,
/// publication state and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub allow_public_responses_view: bool,
    #[serde(default)]
    pub allow_multiple_submissions: bool,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
}

/// A question as authored. Questions re-submitted with their `id` keep it;
/// new questions get one on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ApiId>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub validation: Validation,
}

/// Why a [`FormSpec`] was rejected.
#[derive(Debug, Error)]
pub enum FormSpecError {
    #[error("Form title must not be empty")]
    EmptyTitle,
    #[error("Question {0} has an empty label")]
    EmptyLabel(usize),
    #[error("Question {0:?} needs at least one option")]
    MissingOptions(String),
    #[error("Question {0:?} cannot have options")]
    UnexpectedOptions(String),
    #[error("Question {0:?} has an empty option")]
    EmptyOption(String),
    #[error("Question {0:?} lists an option more than once")]
    DuplicateOption(String),
    #[error("Question ID {0} appears more than once")]
    DuplicateQuestionId(ApiId),
    #[error("Question {label:?} has an invalid pattern: {source}")]
    InvalidPattern { label: String, source: regex::Error },
    #[error("Question {0:?} has a minimum greater than its maximum")]
    InvalidRange(String),
}

impl FormSpec {
    /// Check that this describes a well-formed form.
    pub fn validate(&self) -> Result<(), FormSpecError> {
        if self.title.trim().is_empty() {
            return Err(FormSpecError::EmptyTitle);
        }

        let mut ids = HashSet::new();
        for (i, question) in self.questions.iter().enumerate() {
            if let Some(id) = question.id {
                if !ids.insert(id) {
                    return Err(FormSpecError::DuplicateQuestionId(id));
                }
            }
            question.validate(i + 1)?;
        }
        Ok(())
    }

    /// Convert into a new, unpublished form owned by `owner_id`.
    pub fn into_new_form(self, owner_id: Id) -> Result<NewForm, FormSpecError> {
        self.validate()?;
        let now = Utc::now();
        Ok(NewForm {
            owner_id,
            title: self.title.trim().to_string(),
            description: self.description,
            is_published: false,
            allow_public_responses_view: self.allow_public_responses_view,
            allow_multiple_submissions: self.allow_multiple_submissions,
            questions: self.questions.into_iter().map(QuestionSpec::into_question).collect(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the authored parts of `form` with these, bumping
    /// `updated_at`. Ownership, publication state and creation time are kept.
    pub fn apply_to(self, form: &mut FormCore) -> Result<(), FormSpecError> {
        self.validate()?;
        form.title = self.title.trim().to_string();
        form.description = self.description;
        form.allow_public_responses_view = self.allow_public_responses_view;
        form.allow_multiple_submissions = self.allow_multiple_submissions;
        form.questions = self.questions.into_iter().map(QuestionSpec::into_question).collect();
        form.updated_at = Utc::now();
        Ok(())
    }
}

impl QuestionSpec {
    /// `position` is 1-based, for error messages.
    fn validate(&self, position: usize) -> Result<(), FormSpecError> {
        let label = self.label.trim();
        if label.is_empty() {
            return Err(FormSpecError::EmptyLabel(position));
        }

        if self.question_type.is_choice() {
            if self.options.is_empty() {
                return Err(FormSpecError::MissingOptions(label.to_string()));
            }
            let mut seen = HashSet::new();
            for option in &self.options {
                if option.trim().is_empty() {
                    return Err(FormSpecError::EmptyOption(label.to_string()));
                }
                if !seen.insert(option.as_str()) {
                    return Err(FormSpecError::DuplicateOption(label.to_string()));
                }
            }
        } else if !self.options.is_empty() {
            return Err(FormSpecError::UnexpectedOptions(label.to_string()));
        }

        if let Some(pattern) = &self.validation.pattern {
            Regex::new(pattern).map_err(|source| FormSpecError::InvalidPattern {
                label: label.to_string(),
                source,
            })?;
        }
        if let (Some(min), Some(max)) = (self.validation.min, self.validation.max) {
            if min > max {
                return Err(FormSpecError::InvalidRange(label.to_string()));
            }
        }
        Ok(())
    }

    fn into_question(self) -> Question {
        Question {
            id: self.id.map_or_else(Id::new, Into::into),
            question_type: self.question_type,
            label: self.label.trim().to_string(),
            help_text: self.help_text.filter(|text| !text.trim().is_empty()),
            required: self.required,
            options: self.options,
            validation: self.validation,
        }
    }
}

/// An API-friendly form description, for the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDescription {
    pub id: ApiId,
    pub owner_id: ApiId,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub allow_public_responses_view: bool,
    pub allow_multiple_submissions: bool,
    pub questions: Vec<QuestionDescription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Form> for FormDescription {
    fn from(form: Form) -> Self {
        Self {
            id: form.id.into(),
            owner_id: form.form.owner_id.into(),
            title: form.form.title,
            description: form.form.description,
            is_published: form.form.is_published,
            allow_public_responses_view: form.form.allow_public_responses_view,
            allow_multiple_submissions: form.form.allow_multiple_submissions,
            questions: form.form.questions.into_iter().map(Into::into).collect(),
            created_at: form.form.created_at,
            updated_at: form.form.updated_at,
        }
    }
}

/// A form as shown to respondents. Owner details are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicFormDescription {
    pub id: ApiId,
    pub title: String,
    pub description: String,
    pub allow_public_responses_view: bool,
    pub questions: Vec<QuestionDescription>,
}

impl From<Form> for PublicFormDescription {
    fn from(form: Form) -> Self {
        Self {
            id: form.id.into(),
            title: form.form.title,
            description: form.form.description,
            allow_public_responses_view: form.form.allow_public_responses_view,
            questions: form.form.questions.into_iter().map(Into::into).collect(),
        }
    }
}

/// A summary of a form for the owner's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSummary {
    pub id: ApiId,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub question_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Form> for FormSummary {
    fn from(form: Form) -> Self {
        Self {
            id: form.id.into(),
            question_count: form.questions.len(),
            title: form.form.title,
            description: form.form.description,
            is_published: form.form.is_published,
            created_at: form.form.created_at,
            updated_at: form.form.updated_at,
        }
    }
}

/// An API-friendly question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDescription {
    pub id: ApiId,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub required: bool,
    pub options: Vec<String>,
    #[serde(default)]
    pub validation: Validation,
}

impl From<Question> for QuestionDescription {
    fn from(question: Question) -> Self {
        Self {
            id: question.id.into(),
            question_type: question.question_type,
            label: question.label,
            help_text: question.help_text,
            required: question.required,
            options: question.options,
            validation: question.validation,
        }
    }
}

impl From<QuestionDescription> for QuestionSpec {
    fn from(question: QuestionDescription) -> Self {
        Self {
            id: Some(question.id),
            question_type: question.question_type,
            label: question.label,
            help_text: question.help_text,
            required: question.required,
            options: question.options,
            validation: question.validation,
        }
    }
}
