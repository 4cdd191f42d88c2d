use chrono::{DateTime, Utc};
use rust_xlsxwriter::{DocProperties, Format, Workbook, XlsxError};
use thiserror::Error;

use crate::model::db::form::{FormCore, Question};

use super::tabulate::{Cell, Row};

/// Name of the single worksheet in an export.
pub const SHEET_NAME: &str = "Responses";
pub const SUBMITTED_AT_HEADER: &str = "Submitted At";
pub const RESPONSE_ID_HEADER: &str = "Response ID";
/// MIME type of the exported workbook.
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("There are no responses to export")]
    Empty,
    #[error("Failed to write spreadsheet: {0}")]
    Workbook(#[from] XlsxError),
}

/// Column headings: submission time, response ID, then one per question.
/// Duplicate labels are kept as separate columns.
pub fn header_row(questions: &[Question]) -> Vec<String> {
    [SUBMITTED_AT_HEADER, RESPONSE_ID_HEADER]
        .into_iter()
        .map(str::to_string)
        .chain(questions.iter().map(|q| q.label.clone()))
        .collect()
}

/// The cells written below the header, one line per row. `None` is left as an
/// empty cell.
pub fn sheet_rows(rows: &[Row]) -> Vec<Vec<Option<String>>> {
    rows.iter()
        .map(|row| {
            [
                Some(format_timestamp(&row.submitted_at)),
                Some(row.response_id.to_string()),
            ]
            .into_iter()
            .chain(row.cells.iter().map(|cell| match cell {
                Cell::Answered(text) => Some(text.clone()),
                Cell::NoResponse => None,
            }))
            .collect()
        })
        .collect()
}

/// Serialise tabulated rows into an `.xlsx` workbook.
///
/// `rows` must have been tabulated against `questions`; cells are placed by
/// position, never looked up by label.
pub fn export(form: &FormCore, questions: &[Question], rows: &[Row]) -> Result<Vec<u8>, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut workbook = Workbook::new();
    let properties = DocProperties::new().set_title(&form.title);
    workbook.set_properties(&properties);

    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, heading) in header_row(questions).iter().enumerate() {
        worksheet.write_string_with_format(0, column(col)?, heading, &bold)?;
    }
    for (i, line) in sheet_rows(rows).iter().enumerate() {
        let row = u32::try_from(i + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, value) in line.iter().enumerate() {
            match value {
                Some(text) if !text.is_empty() => {
                    worksheet.write_string(row, column(col)?, text)?;
                }
                _ => {}
            }
        }
    }
    worksheet.set_freeze_panes(1, 0)?;

    Ok(workbook.save_to_buffer()?)
}

fn column(index: usize) -> Result<u16, XlsxError> {
    u16::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Locale-independent timestamp used in exports.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Suggested download name: the title with each whitespace run replaced by a
/// single underscore.
pub fn export_filename(title: &str) -> String {
    let mut name = String::with_capacity(title.len() + 15);
    let mut in_whitespace = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                name.push('_');
            }
            in_whitespace = true;
        } else {
            name.push(c);
            in_whitespace = false;
        }
    }
    name.push_str("_Responses.xlsx");
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use chrono::TimeZone;

    use crate::model::{
        api::id::ApiId,
        common::question::QuestionType,
        db::form::Form,
        mongodb::Id,
    };

    fn row(cells: Vec<Cell>) -> Row {
        Row {
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            response_id: ApiId::from(Id::new()),
            cells,
        }
    }

    #[test]
    fn empty_export_is_rejected() {
        let form = Form::example();
        let result = export(&form, &form.questions, &[]);
        assert!(matches!(result, Err(ExportError::Empty)));
    }

    #[test]
    fn export_produces_workbook() {
        let form = Form::example();
        let rows = vec![row(vec![Cell::NoResponse; form.questions.len()])];
        let bytes = export(&form, &form.questions, &rows).unwrap();
        // xlsx files are zip archives.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn workbook_cells_match_rows() {
        let form = Form::example();
        let mut cells = vec![Cell::NoResponse; form.questions.len()];
        cells[0] = Cell::Answered("Ada".to_string());
        cells[3] = Cell::Answered("A, B".to_string());
        let rows = vec![row(cells.clone())];

        let bytes = export(&form, &form.questions, &rows).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let sheet = workbook.worksheet_range(SHEET_NAME).unwrap();

        let text = |row: u32, col: u32| match sheet.get_value((row, col)) {
            Some(Data::String(value)) => Some(value.clone()),
            None | Some(Data::Empty) => None,
            Some(other) => panic!("Unexpected cell {other:?}"),
        };
        assert_eq!(text(0, 0).as_deref(), Some(SUBMITTED_AT_HEADER));
        assert_eq!(text(0, 2).as_deref(), Some(form.questions[0].label.as_str()));
        assert_eq!(text(1, 0).as_deref(), Some("2024-03-09 14:05:07 UTC"));
        assert_eq!(text(1, 1), Some(rows[0].response_id.to_string()));
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(text(1, 2 + i as u32).as_deref(), cell.as_answer(), "column {i}");
        }
    }

    #[test]
    fn headers_keep_duplicate_labels() {
        let questions = vec![
            Question::example(QuestionType::ShortText, "Name"),
            Question::example(QuestionType::ShortText, "Name"),
        ];
        assert_eq!(
            header_row(&questions),
            vec!["Submitted At", "Response ID", "Name", "Name"]
        );
    }

    #[test]
    fn sentinel_cells_export_empty() {
        let answered = row(vec![
            Cell::Answered("Ada".to_string()),
            Cell::NoResponse,
            Cell::Answered(String::new()),
        ]);
        let lines = sheet_rows(&[answered.clone()]);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.len(), 2 + answered.cells.len());
        assert_eq!(line[0].as_deref(), Some("2024-03-09 14:05:07 UTC"));
        assert_eq!(line[1], Some(answered.response_id.to_string()));

        // Positional: each exported cell matches its row cell, sentinel aside.
        for (exported, cell) in line[2..].iter().zip(&answered.cells) {
            match cell {
                Cell::NoResponse => assert_eq!(exported, &None),
                Cell::Answered(text) => assert_eq!(exported.as_deref(), Some(text.as_str())),
            }
        }
    }

    #[test]
    fn filename_collapses_whitespace() {
        assert_eq!(export_filename("Team Lunch Survey"), "Team_Lunch_Survey_Responses.xlsx");
        assert_eq!(export_filename("a \t\n b"), "a_b_Responses.xlsx");
        assert_eq!(export_filename(" padded "), "_padded__Responses.xlsx");
        assert_eq!(export_filename(""), "_Responses.xlsx");
    }
}
