use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    api::id::ApiId,
    common::{
        answer::{AnswerValue, Scalar},
        question::QuestionType,
    },
    db::{
        form::{Form, Question},
        response::{Answer, NewResponse, Response},
    },
    mongodb::Id,
};

/// A submission to a published form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSpec {
    #[serde(default)]
    pub answers: Vec<AnswerSpec>,
}

/// One submitted answer. A missing or `null` value leaves the question
/// unanswered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSpec {
    pub question_id: ApiId,
    #[serde(default)]
    pub value: Option<AnswerValue>,
}

/// Why a submission was rejected.
#[derive(Debug, PartialEq, Error)]
pub enum AnswerError {
    #[error("No question with ID {0} on this form")]
    UnknownQuestion(ApiId),
    #[error("Question {0:?} was answered more than once")]
    DuplicateAnswer(String),
    #[error("Question {0:?} expects a list of selected options")]
    ExpectedList(String),
    #[error("Question {0:?} expects a single value")]
    ExpectedSingle(String),
    #[error("{value:?} is not an option for question {label:?}")]
    InvalidOption { label: String, value: String },
    #[error("Option {value:?} was selected more than once for question {label:?}")]
    RepeatedSelection { label: String, value: String },
    #[error("Question {0:?} expects a number")]
    NotANumber(String),
    #[error("Answer to question {0:?} is out of range")]
    OutOfRange(String),
    #[error("Question {0:?} expects an email address")]
    InvalidEmail(String),
    #[error("Question {0:?} expects a date in YYYY-MM-DD format")]
    InvalidDate(String),
    #[error("Answer to question {0:?} does not match the required format")]
    PatternMismatch(String),
    #[error("Question {0:?} is required")]
    Required(String),
}

impl ResponseSpec {
    /// Check every answer against the form's questions and build the response
    /// to store. `submitted_at` is set here.
    ///
    /// Numeric text submitted to a `NUMBER` question is stored as a number.
    pub fn into_new_response(
        self,
        form: &Form,
        respondent_id: Option<Id>,
    ) -> Result<NewResponse, AnswerError> {
        let mut answered = HashSet::new();
        let mut answers = Vec::with_capacity(self.answers.len());

        for answer in self.answers {
            let question_id: Id = answer.question_id.into();
            let question = form
                .question(question_id)
                .ok_or(AnswerError::UnknownQuestion(answer.question_id))?;
            if !answered.insert(question_id) {
                return Err(AnswerError::DuplicateAnswer(question.label.clone()));
            }
            let value = match answer.value {
                Some(value) => check_answer(question, value)?,
                None => None,
            };
            answers.push(Answer::new(question_id, value));
        }

        for question in form.questions.iter().filter(|q| q.required) {
            let is_answered = answers
                .iter()
                .find(|answer| answer.question_id == question.id)
                .and_then(|answer| answer.value.as_ref())
                .map_or(false, |value| !value.is_blank());
            if !is_answered {
                return Err(AnswerError::Required(question.label.clone()));
            }
        }

        Ok(NewResponse {
            form_id: form.id,
            respondent_id,
            answers,
            submitted_at: Utc::now(),
        })
    }
}

/// Check one value against its question, normalising where needed.
/// Blank values are accepted here; whether they may be blank is a question of
/// `required`. A blank value only survives for free-text questions; any other
/// type stores it as unanswered.
fn check_answer(
    question: &Question,
    value: AnswerValue,
) -> Result<Option<AnswerValue>, AnswerError> {
    let label = || question.label.clone();

    let scalar = match (question.question_type.expects_list(), value) {
        (true, AnswerValue::List(selected)) => {
            let mut seen = HashSet::new();
            for option in &selected {
                if !question.options.contains(option) {
                    return Err(AnswerError::InvalidOption {
                        label: label(),
                        value: option.clone(),
                    });
                }
                if !seen.insert(option) {
                    return Err(AnswerError::RepeatedSelection {
                        label: label(),
                        value: option.clone(),
                    });
                }
            }
            return Ok(Some(AnswerValue::List(selected)));
        }
        (true, AnswerValue::Scalar(_)) => return Err(AnswerError::ExpectedList(label())),
        (false, AnswerValue::List(_)) => return Err(AnswerError::ExpectedSingle(label())),
        (false, AnswerValue::Scalar(scalar)) => scalar,
    };

    if scalar.is_blank() {
        let kept = question.question_type.is_free_text();
        return Ok(kept.then_some(AnswerValue::Scalar(scalar)));
    }

    let scalar = match question.question_type {
        QuestionType::Number => Scalar::Number(check_number(question, &scalar)?),
        QuestionType::MultipleChoice | QuestionType::Dropdown => {
            let value = scalar.to_string();
            if !question.options.contains(&value) {
                return Err(AnswerError::InvalidOption {
                    label: label(),
                    value,
                });
            }
            Scalar::Text(value)
        }
        QuestionType::Date => {
            let text = scalar.as_text().ok_or_else(|| AnswerError::InvalidDate(label()))?;
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .map_err(|_| AnswerError::InvalidDate(label()))?;
            Scalar::Text(text.trim().to_string())
        }
        QuestionType::Email => {
            let text = scalar.as_text().ok_or_else(|| AnswerError::InvalidEmail(label()))?;
            if !text.contains('@') {
                return Err(AnswerError::InvalidEmail(label()));
            }
            check_pattern(question, text)?;
            scalar
        }
        QuestionType::ShortText | QuestionType::LongText => {
            let text = scalar.to_string();
            check_pattern(question, &text)?;
            Scalar::Text(text)
        }
        QuestionType::Checkboxes => scalar,
    };
    Ok(Some(AnswerValue::Scalar(scalar)))
}

fn check_number(question: &Question, scalar: &Scalar) -> Result<f64, AnswerError> {
    let number = match scalar {
        Scalar::Number(number) => *number,
        Scalar::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| AnswerError::NotANumber(question.label.clone()))?,
    };
    if !number.is_finite() {
        return Err(AnswerError::NotANumber(question.label.clone()));
    }
    let validation = &question.validation;
    if validation.min.map_or(false, |min| number < min)
        || validation.max.map_or(false, |max| number > max)
    {
        return Err(AnswerError::OutOfRange(question.label.clone()));
    }
    Ok(number)
}

/// Patterns must match the whole answer.
fn check_pattern(question: &Question, text: &str) -> Result<(), AnswerError> {
    let Some(pattern) = &question.validation.pattern else {
        return Ok(());
    };
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(regex) if regex.is_match(text) => Ok(()),
        Ok(_) => Err(AnswerError::PatternMismatch(question.label.clone())),
        Err(err) => {
            // Patterns are checked when the form is saved.
            warn!("Ignoring invalid pattern on question {}: {err}", question.id);
            Ok(())
        }
    }
}

/// An API-friendly stored response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDescription {
    pub id: ApiId,
    pub form_id: ApiId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent_id: Option<ApiId>,
    pub answers: Vec<AnswerDescription>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerDescription {
    pub question_id: ApiId,
    pub value: Option<AnswerValue>,
}

impl From<Response> for ResponseDescription {
    fn from(response: Response) -> Self {
        Self {
            id: response.id.into(),
            form_id: response.response.form_id.into(),
            respondent_id: response.response.respondent_id.map(Into::into),
            answers: response
                .response
                .answers
                .into_iter()
                .map(|answer| AnswerDescription {
                    question_id: answer.question_id.into(),
                    value: answer.value,
                })
                .collect(),
            submitted_at: response.response.submitted_at,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl AnswerSpec {
        pub fn new(question: &Question, value: impl Into<Option<AnswerValue>>) -> Self {
            Self {
                question_id: question.id.into(),
                value: value.into(),
            }
        }
    }

    impl ResponseSpec {
        /// A full, valid submission to [`Form::example`]-shaped forms.
        pub fn example(form: &Form) -> Self {
            let answers = form
                .questions
                .iter()
                .map(|question| {
                    let value = match question.question_type {
                        QuestionType::ShortText => AnswerValue::text("Ada"),
                        QuestionType::LongText => AnswerValue::text("No nuts, please."),
                        QuestionType::MultipleChoice | QuestionType::Dropdown => {
                            AnswerValue::text(question.options[0].clone())
                        }
                        QuestionType::Checkboxes => AnswerValue::list(question.options[..2].to_vec()),
                        QuestionType::Date => AnswerValue::text("2024-05-01"),
                        QuestionType::Number => AnswerValue::number(25.0),
                        QuestionType::Email => AnswerValue::text("ada@example.org"),
                    };
                    AnswerSpec::new(question, value)
                })
                .collect();
            Self { answers }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::common::question::Validation;

    fn form_with(question: Question) -> Form {
        let mut form = Form::example();
        form.questions = vec![question];
        form
    }

    fn submit(form: &Form, value: AnswerValue) -> Result<NewResponse, AnswerError> {
        ResponseSpec {
            answers: vec![AnswerSpec::new(&form.questions[0], value)],
        }
        .into_new_response(form, None)
    }

    #[test]
    fn example_submission_is_accepted() {
        let form = Form::example();
        let respondent = Id::new();
        let response = ResponseSpec::example(&form)
            .into_new_response(&form, Some(respondent))
            .unwrap();
        assert_eq!(response.form_id, form.id);
        assert_eq!(response.respondent_id, Some(respondent));
        assert_eq!(response.answers.len(), form.questions.len());
    }

    #[test]
    fn empty_submission_to_optional_form_is_accepted() {
        let form = Form::example();
        let response = ResponseSpec { answers: vec![] }
            .into_new_response(&form, None)
            .unwrap();
        assert!(response.answers.is_empty());
    }

    #[test]
    fn unknown_and_duplicate_answers_are_rejected() {
        let form = Form::example();
        let stranger = ApiId::from(Id::new());
        let spec = ResponseSpec {
            answers: vec![AnswerSpec {
                question_id: stranger,
                value: Some(AnswerValue::text("hi")),
            }],
        };
        assert_eq!(
            spec.into_new_response(&form, None).unwrap_err(),
            AnswerError::UnknownQuestion(stranger)
        );

        let question = &form.questions[0];
        let spec = ResponseSpec {
            answers: vec![
                AnswerSpec::new(question, AnswerValue::text("one")),
                AnswerSpec::new(question, AnswerValue::text("two")),
            ],
        };
        assert!(matches!(
            spec.into_new_response(&form, None),
            Err(AnswerError::DuplicateAnswer(_))
        ));
    }

    #[test]
    fn shapes_must_match_types() {
        let form = form_with(Question::example(QuestionType::Checkboxes, "Days"));
        assert!(matches!(
            submit(&form, AnswerValue::text("A")),
            Err(AnswerError::ExpectedList(_))
        ));

        let form = form_with(Question::example(QuestionType::Dropdown, "Office"));
        assert!(matches!(
            submit(&form, AnswerValue::list(["A"])),
            Err(AnswerError::ExpectedSingle(_))
        ));
    }

    #[test]
    fn choices_must_be_options() {
        let form = form_with(Question::example(QuestionType::MultipleChoice, "Cuisine"));
        assert!(submit(&form, AnswerValue::text("B")).is_ok());
        assert!(matches!(
            submit(&form, AnswerValue::text("D")),
            Err(AnswerError::InvalidOption { .. })
        ));

        let form = form_with(Question::example(QuestionType::Checkboxes, "Days"));
        assert!(submit(&form, AnswerValue::list(["A", "C"])).is_ok());
        assert!(submit(&form, AnswerValue::list(Vec::<String>::new())).is_ok());
        assert!(matches!(
            submit(&form, AnswerValue::list(["A", "Z"])),
            Err(AnswerError::InvalidOption { .. })
        ));
        assert!(matches!(
            submit(&form, AnswerValue::list(["A", "A"])),
            Err(AnswerError::RepeatedSelection { .. })
        ));
    }

    #[test]
    fn numbers_are_parsed_and_bounded() {
        let mut question = Question::example(QuestionType::Number, "Budget");
        question.validation = Validation {
            min: Some(0.0),
            max: Some(100.0),
            pattern: None,
        };
        let form = form_with(question);

        let response = submit(&form, AnswerValue::text(" 42 ")).unwrap();
        assert_eq!(response.answers[0].value, Some(AnswerValue::number(42.0)));
        assert!(submit(&form, AnswerValue::number(100.0)).is_ok());
        assert!(matches!(
            submit(&form, AnswerValue::number(100.5)),
            Err(AnswerError::OutOfRange(_))
        ));
        assert!(matches!(
            submit(&form, AnswerValue::number(-1.0)),
            Err(AnswerError::OutOfRange(_))
        ));
        assert!(matches!(
            submit(&form, AnswerValue::text("lots")),
            Err(AnswerError::NotANumber(_))
        ));
        assert!(matches!(
            submit(&form, AnswerValue::text("NaN")),
            Err(AnswerError::NotANumber(_))
        ));
    }

    #[test]
    fn emails_and_dates_are_checked() {
        let form = form_with(Question::example(QuestionType::Email, "Email"));
        assert!(submit(&form, AnswerValue::text("a@b.c")).is_ok());
        assert!(matches!(
            submit(&form, AnswerValue::text("nope")),
            Err(AnswerError::InvalidEmail(_))
        ));

        let form = form_with(Question::example(QuestionType::Date, "When"));
        assert!(submit(&form, AnswerValue::text("2024-02-29")).is_ok());
        assert!(matches!(
            submit(&form, AnswerValue::text("2023-02-29")),
            Err(AnswerError::InvalidDate(_))
        ));
        assert!(matches!(
            submit(&form, AnswerValue::text("01/05/2024")),
            Err(AnswerError::InvalidDate(_))
        ));
    }

    #[test]
    fn patterns_match_whole_answer() {
        let mut question = Question::example(QuestionType::ShortText, "Code");
        question.validation.pattern = Some("[A-Z]{3}".to_string());
        let form = form_with(question);

        assert!(submit(&form, AnswerValue::text("ABC")).is_ok());
        assert!(matches!(
            submit(&form, AnswerValue::text("ABCD")),
            Err(AnswerError::PatternMismatch(_))
        ));
        // Blank optional answers skip format checks.
        assert!(submit(&form, AnswerValue::text("")).is_ok());
    }

    #[test]
    fn blank_values_to_typed_questions_are_unanswered() {
        for question_type in [QuestionType::Number, QuestionType::Date, QuestionType::Dropdown] {
            let form = form_with(Question::example(question_type, "Typed"));
            for blank in [AnswerValue::text("   "), AnswerValue::text("")] {
                let response = submit(&form, blank).unwrap();
                assert_eq!(response.answers[0].value, None, "{question_type:?}");
            }
        }

        // Nothing reaches the number tally.
        let form = form_with(Question::example(QuestionType::Number, "Age"));
        let stored = Response {
            id: Id::new(),
            response: submit(&form, AnswerValue::text("   ")).unwrap(),
        };
        let stats = crate::results::aggregate(&form.questions, &[stored]);
        assert!(stats[0].is_empty());

        // Free text keeps what was typed.
        let form = form_with(Question::example(QuestionType::ShortText, "Name"));
        let response = submit(&form, AnswerValue::text("")).unwrap();
        assert_eq!(response.answers[0].value, Some(AnswerValue::text("")));
    }

    #[test]
    fn required_questions_need_non_blank_answers() {
        let mut question = Question::example(QuestionType::ShortText, "Name");
        question.required = true;
        let form = form_with(question);

        assert!(submit(&form, AnswerValue::text("Ada")).is_ok());
        for blank in [AnswerValue::text("   "), AnswerValue::text("")] {
            assert!(matches!(
                submit(&form, blank),
                Err(AnswerError::Required(_))
            ));
        }
        let unanswered = ResponseSpec {
            answers: vec![AnswerSpec::new(&form.questions[0], None)],
        };
        assert!(matches!(
            unanswered.into_new_response(&form, None),
            Err(AnswerError::Required(_))
        ));

        let mut question = Question::example(QuestionType::Checkboxes, "Days");
        question.required = true;
        let form = form_with(question);
        assert!(matches!(
            submit(&form, AnswerValue::list(Vec::<String>::new())),
            Err(AnswerError::Required(_))
        ));
    }

    #[test]
    fn description_uses_string_ids() {
        let form = Form::example();
        let response = Response::example(
            form.id,
            vec![Answer::new(form.questions[0].id, AnswerValue::text("Ada"))],
        );
        let description = ResponseDescription::from(response.clone());
        assert_eq!(*description.id, response.id);
        assert_eq!(*description.form_id, form.id);
        assert_eq!(description.respondent_id, None);
        assert_eq!(*description.answers[0].question_id, form.questions[0].id);
    }
}
