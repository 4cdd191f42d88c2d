use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The value submitted for a single question.
///
/// Checkbox answers are lists of the selected options; every other question
/// type takes a single scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    List(Vec<String>),
    Scalar(Scalar),
}

/// A single submitted value. Dates travel as `YYYY-MM-DD` text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Self::Scalar(Scalar::Number(value))
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Whether this counts as "not answered" for required questions.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::List(values) => values.is_empty(),
            Self::Scalar(scalar) => scalar.is_blank(),
        }
    }
}

impl Scalar {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(text) => text.trim().is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Lists render with a comma-and-space separator.
impl Display for AnswerValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List(values) => f.write_str(&values.join(", ")),
            Self::Scalar(scalar) => scalar.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rocket::serde::json::serde_json;

    #[test]
    fn deserialise_shapes() {
        let list: AnswerValue = serde_json::from_str(r#"["A", "B"]"#).unwrap();
        assert_eq!(list, AnswerValue::list(["A", "B"]));

        let text: AnswerValue = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(text, AnswerValue::text("hello"));

        let integer: AnswerValue = serde_json::from_str("42").unwrap();
        assert_eq!(integer, AnswerValue::number(42.0));

        let float: AnswerValue = serde_json::from_str("2.5").unwrap();
        assert_eq!(float, AnswerValue::number(2.5));

        assert!(serde_json::from_str::<AnswerValue>(r#"{"nested": true}"#).is_err());
    }

    #[test]
    fn natural_string_forms() {
        assert_eq!(AnswerValue::list(["A", "B", "C"]).to_string(), "A, B, C");
        assert_eq!(AnswerValue::list(Vec::<String>::new()).to_string(), "");
        assert_eq!(AnswerValue::number(42.0).to_string(), "42");
        assert_eq!(AnswerValue::number(-0.5).to_string(), "-0.5");
        assert_eq!(AnswerValue::text("2024-02-29").to_string(), "2024-02-29");
    }

    #[test]
    fn blank_values() {
        assert!(AnswerValue::text("").is_blank());
        assert!(AnswerValue::text("   ").is_blank());
        assert!(AnswerValue::list(Vec::<String>::new()).is_blank());
        assert!(!AnswerValue::number(0.0).is_blank());
        assert!(!AnswerValue::list(["A"]).is_blank());
    }
}
