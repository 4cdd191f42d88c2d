use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, http::Header, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            pagination::{Paginated, PaginationRequest},
            response::ResponseDescription,
            results::{FormResults, Table},
        },
        db::{form::Form, response::Response},
        mongodb::{Coll, Id},
    },
    results::{aggregate, export, export_filename, tabulate},
};

use super::common::{form_responses, owned_form};

pub fn routes() -> Vec<Route> {
    routes![list_responses, form_results, response_table, export_responses]
}

#[get("/forms/<form_id>/responses?<pagination..>")]
async fn list_responses(
    token: AuthToken,
    form_id: Id,
    pagination: PaginationRequest,
    forms: Coll<Form>,
    responses: Coll<Response>,
) -> Result<Json<Paginated<ResponseDescription>>> {
    owned_form(&forms, &token, form_id).await?;

    let filter = doc! { "form_id": form_id };
    let page_options = FindOptions::builder()
        .sort(doc! { "submitted_at": -1, "_id": -1 })
        .skip(pagination.skip())
        .limit(i64::from(pagination.page_size()))
        .build();
    let page = responses
        .find(filter.clone(), page_options)
        .await?
        .map_ok(ResponseDescription::from)
        .try_collect::<Vec<_>>()
        .await?;
    let total = responses.count_documents(filter, None).await?;

    Ok(Json(pagination.to_paginated(total, page)))
}

#[get("/forms/<form_id>/results")]
async fn form_results(
    token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
    responses: Coll<Response>,
) -> Result<Json<FormResults>> {
    let form = owned_form(&forms, &token, form_id).await?;
    let responses = form_responses(&responses, form_id).await?;

    let stats = aggregate(&form.questions, &responses);
    Ok(Json(FormResults {
        response_count: responses.len() as u64,
        stats,
        form: form.into(),
    }))
}

#[get("/forms/<form_id>/table")]
async fn response_table(
    token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
    responses: Coll<Response>,
) -> Result<Json<Table>> {
    let form = owned_form(&forms, &token, form_id).await?;
    let responses = form_responses(&responses, form_id).await?;

    let rows = tabulate(&form.questions, &responses);
    Ok(Json(Table::new(&form.questions, rows)))
}

/// A downloadable `.xlsx` workbook.
#[derive(Responder)]
#[response(content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")]
pub struct Spreadsheet {
    bytes: Vec<u8>,
    disposition: Header<'static>,
}

impl Spreadsheet {
    pub fn new(bytes: Vec<u8>, filename: &str) -> Self {
        Self {
            bytes,
            disposition: Header::new("Content-Disposition", content_disposition(filename)),
        }
    }
}

#[get("/forms/<form_id>/export")]
async fn export_responses(
    token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
    responses: Coll<Response>,
) -> Result<Spreadsheet> {
    let form = owned_form(&forms, &token, form_id).await?;
    let responses = form_responses(&responses, form_id).await?;

    let rows = tabulate(&form.questions, &responses);
    let bytes = export(&form.form, &form.questions, &rows)?;
    debug!("Exported {} responses for form {form_id}", rows.len());
    Ok(Spreadsheet::new(bytes, &export_filename(&form.title)))
}

/// An `attachment` disposition with an ASCII fallback name plus the exact
/// name percent-encoded.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded: String = filename
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
