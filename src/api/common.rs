use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    api::auth::AuthToken,
    db::{form::Form, response::Response},
    mongodb::{Coll, Id},
};

/// Filter matching the given form only if the token's user owns it.
pub fn owner_filter(token: &AuthToken, form_id: Id) -> Document {
    doc! {
        "_id": form_id,
        "owner_id": token.id,
    }
}

/// Get a form owned by the token's user. Someone else's form is reported as
/// missing.
pub async fn owned_form(forms: &Coll<Form>, token: &AuthToken, form_id: Id) -> Result<Form> {
    forms
        .find_one(owner_filter(token, form_id), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))
}

/// Get a published form.
pub async fn published_form(forms: &Coll<Form>, form_id: Id) -> Result<Form> {
    let filter = doc! {
        "_id": form_id,
        "is_published": true,
    };
    forms
        .find_one(filter, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Published form {form_id}")))
}

/// Every response to a form, newest first.
pub async fn form_responses(responses: &Coll<Response>, form_id: Id) -> Result<Vec<Response>> {
    let newest_first = FindOptions::builder()
        .sort(doc! { "submitted_at": -1, "_id": -1 })
        .build();
    let all = responses
        .find(doc! { "form_id": form_id }, newest_first)
        .await?
        .try_collect()
        .await?;
    Ok(all)
}
