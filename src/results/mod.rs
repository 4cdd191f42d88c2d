//! Derived views over a form's responses: per-question statistics for charts,
//! a flat table, and a spreadsheet export of that table.
//!
//! Everything here is a pure function of a `(questions, responses)` snapshot
//! that the caller has already fetched. Nothing is cached; views are
//! recomputed on every read.

mod aggregate;
mod export;
mod extract;
mod tabulate;

pub use aggregate::{aggregate, QuestionStats, Tally};
pub use export::{
    export, export_filename, format_timestamp, header_row, sheet_rows, ExportError,
    RESPONSE_ID_HEADER, SHEET_NAME, SUBMITTED_AT_HEADER, XLSX_MIME_TYPE,
};
pub use extract::{extract_answer, orphaned_answers, MalformedAnswer};
pub use tabulate::{tabulate, Cell, Row};
