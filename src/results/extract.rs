use thiserror::Error;

use crate::model::{
    common::{answer::AnswerValue, question::QuestionType},
    db::{form::Question, response::ResponseCore},
    mongodb::Id,
};

/// A single stored answer that cannot be used. These are skipped individually;
/// the rest of the response is still processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedAnswer {
    #[error("Answer references question {question_id}, which is not on the form")]
    UnknownQuestion { question_id: Id },
    #[error("Answer to {question_type:?} question {question_id} should be a list of options")]
    ExpectedList {
        question_id: Id,
        question_type: QuestionType,
    },
    #[error("Answer to {question_type:?} question {question_id} should be a single value")]
    ExpectedScalar {
        question_id: Id,
        question_type: QuestionType,
    },
}

/// Get the value the response submitted for the given question.
///
/// `Ok(None)` means the question was not answered, including an answer whose
/// value is absent.
pub fn extract_answer<'a>(
    question: &Question,
    response: &'a ResponseCore,
) -> Result<Option<&'a AnswerValue>, MalformedAnswer> {
    let value = match response
        .answer(question.id)
        .and_then(|answer| answer.value.as_ref())
    {
        Some(value) => value,
        None => return Ok(None),
    };

    match (question.question_type.expects_list(), value.is_list()) {
        (true, false) => Err(MalformedAnswer::ExpectedList {
            question_id: question.id,
            question_type: question.question_type,
        }),
        (false, true) => Err(MalformedAnswer::ExpectedScalar {
            question_id: question.id,
            question_type: question.question_type,
        }),
        _ => Ok(Some(value)),
    }
}

/// Answers in the response whose question is not in `questions`, e.g. because
/// it was deleted after the response was submitted.
pub fn orphaned_answers<'a>(
    questions: &'a [Question],
    response: &'a ResponseCore,
) -> impl Iterator<Item = MalformedAnswer> + 'a {
    response
        .answers
        .iter()
        .filter(move |answer| !questions.iter().any(|q| q.id == answer.question_id))
        .map(|answer| MalformedAnswer::UnknownQuestion {
            question_id: answer.question_id,
        })
}

/// [`extract_answer`], logging and discarding a malformed answer.
pub(super) fn usable_answer<'a>(
    question: &Question,
    response: &'a ResponseCore,
) -> Option<&'a AnswerValue> {
    match extract_answer(question, response) {
        Ok(value) => value,
        Err(e) => {
            debug!("Skipping answer: {e}");
            None
        }
    }
}
