use serde::{Deserialize, Serialize};

/// The kinds of field a form can ask for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    ShortText,
    LongText,
    MultipleChoice,
    Checkboxes,
    Dropdown,
    Date,
    Number,
    Email,
}

impl QuestionType {
    /// Answers to these questions are listed verbatim rather than tallied.
    pub fn is_free_text(&self) -> bool {
        matches!(self, Self::ShortText | Self::LongText | Self::Email)
    }

    /// These questions pick from a fixed list of options.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::MultipleChoice | Self::Checkboxes | Self::Dropdown)
    }

    /// Only checkbox answers are lists; everything else is a single scalar.
    pub fn expects_list(&self) -> bool {
        matches!(self, Self::Checkboxes)
    }
}

/// Optional constraints on an answer.
///
/// `min`/`max` bound the value of `NUMBER` answers; `pattern` is a regex that
/// text answers must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Validation {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.pattern.is_none()
    }
}
