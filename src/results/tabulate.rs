use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    db::{form::Question, response::Response},
};

use super::extract::usable_answer;

/// One table cell: the rendered answer, or a marker that there was none.
///
/// An empty string is a real submitted value and is distinct from
/// [`Cell::NoResponse`]. On the wire the marker is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Cell {
    Answered(String),
    NoResponse,
}

impl Cell {
    pub fn as_answer(&self) -> Option<&str> {
        match self {
            Self::Answered(text) => Some(text),
            Self::NoResponse => None,
        }
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::NoResponse, Self::Answered)
    }
}

impl From<Cell> for Option<String> {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Answered(text) => Some(text),
            Cell::NoResponse => None,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Answered(text) => f.write_str(text),
            Self::NoResponse => f.write_str("No response"),
        }
    }
}

/// One response flattened against a fixed question column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub submitted_at: DateTime<Utc>,
    pub response_id: ApiId,
    /// `cells[i]` belongs to `questions[i]`.
    pub cells: Vec<Cell>,
}

/// Render one [`Row`] per response, in the given response order.
pub fn tabulate(questions: &[Question], responses: &[Response]) -> Vec<Row> {
    responses
        .iter()
        .map(|response| Row {
            submitted_at: response.submitted_at,
            response_id: response.id.into(),
            cells: questions
                .iter()
                .map(|question| {
                    usable_answer(question, response)
                        .map_or(Cell::NoResponse, |value| Cell::Answered(value.to_string()))
                })
                .collect(),
        })
        .collect()
}
