use serde::{Deserialize, Serialize};

use crate::{
    model::{
        api::{form::FormDescription, id::ApiId},
        db::form::Question,
    },
    results::{header_row, QuestionStats, Row},
};

/// Aggregated results for a form's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormResults {
    pub form: FormDescription,
    pub response_count: u64,
    /// One entry per question, in question order.
    pub stats: Vec<QuestionStats>,
}

/// Aggregated results shown publicly. Carries no owner details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicResults {
    pub title: String,
    pub response_count: u64,
    pub questions: Vec<QuestionHeading>,
    pub stats: Vec<QuestionStats>,
}

/// Enough of a question to label its chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionHeading {
    pub id: ApiId,
    pub label: String,
}

impl From<&Question> for QuestionHeading {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.into(),
            label: question.label.clone(),
        }
    }
}

/// The flat responses table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// `"Submitted At"`, `"Response ID"`, then each question label.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(questions: &[Question], rows: Vec<Row>) -> Self {
        Self {
            columns: header_row(questions),
            rows,
        }
    }
}
