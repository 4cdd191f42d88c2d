use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::answer::AnswerValue,
    db::{form::Question, response::Response},
};

use super::extract::{orphaned_answers, usable_answer};

/// Aggregated view of every answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QuestionStats {
    /// Free-text answers, verbatim, in response order.
    Raw {
        question_id: ApiId,
        values: Vec<String>,
    },
    /// Occurrence counts of each distinct answer.
    Tally { question_id: ApiId, counts: Tally },
}

impl QuestionStats {
    pub fn question_id(&self) -> ApiId {
        match self {
            Self::Raw { question_id, .. } | Self::Tally { question_id, .. } => *question_id,
        }
    }

    /// Nothing to chart; the consumer should show a placeholder.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw { values, .. } => values.is_empty(),
            Self::Tally { counts, .. } => counts.is_empty(),
        }
    }
}

/// Counts per distinct value, kept in order of first occurrence so that
/// chart colours stay stable for the same data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tally(IndexMap<String, u64>);

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `value`.
    pub fn increment(&mut self, value: &str) {
        match self.0.get_mut(value) {
            Some(count) => *count += 1,
            None => {
                self.0.insert(value.to_string(), 1);
            }
        }
    }

    pub fn get(&self, value: &str) -> u64 {
        self.0.get(value).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(value, count)| (value.as_str(), *count))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Tally {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Aggregate the answers to each question across all responses.
///
/// Returns exactly one [`QuestionStats`] per question, in question order.
/// Answers to questions not in `questions`, and answers whose shape does not
/// fit their question, are skipped.
pub fn aggregate(questions: &[Question], responses: &[Response]) -> Vec<QuestionStats> {
    for response in responses {
        for orphan in orphaned_answers(questions, response) {
            debug!("Response {}: skipping answer: {orphan}", response.id);
        }
    }

    questions
        .iter()
        .map(|question| aggregate_question(question, responses))
        .collect()
}

fn aggregate_question(question: &Question, responses: &[Response]) -> QuestionStats {
    let question_id = question.id.into();
    let answers = responses
        .iter()
        .filter_map(|response| usable_answer(question, response));

    if question.question_type.is_free_text() {
        let values = answers
            .map(ToString::to_string)
            .filter(|value| !value.is_empty())
            .collect();
        QuestionStats::Raw {
            question_id,
            values,
        }
    } else {
        let mut counts = Tally::new();
        for answer in answers {
            match answer {
                AnswerValue::List(selected) => {
                    for option in selected {
                        counts.increment(option);
                    }
                }
                AnswerValue::Scalar(scalar) => counts.increment(&scalar.to_string()),
            }
        }
        QuestionStats::Tally {
            question_id,
            counts,
        }
    }
}
