use chrono::Utc;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Client,
};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            form::{FormDescription, FormSpec, FormSummary},
        },
        db::{
            form::{Form, NewForm},
            response::Response,
        },
        mongodb::{Coll, Id},
    },
};

use super::common::{owned_form, owner_filter};

pub fn routes() -> Vec<Route> {
    routes![
        list_forms,
        create_form,
        get_form,
        update_form,
        publish_form,
        unpublish_form,
        delete_form,
    ]
}

#[get("/forms")]
async fn list_forms(token: AuthToken, forms: Coll<Form>) -> Result<Json<Vec<FormSummary>>> {
    let newest_first = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
    let summaries = forms
        .find(doc! { "owner_id": token.id }, newest_first)
        .await?
        .map_ok(FormSummary::from)
        .try_collect()
        .await?;
    Ok(Json(summaries))
}

#[post("/forms", data = "<spec>", format = "json")]
async fn create_form(
    token: AuthToken,
    spec: Json<FormSpec>,
    new_forms: Coll<NewForm>,
    forms: Coll<Form>,
) -> Result<(Status, Json<FormDescription>)> {
    let form = spec
        .0
        .into_new_form(token.id)
        .map_err(|err| Error::bad_request(err.to_string()))?;

    let new_id: Id = new_forms
        .insert_one(&form, None)
        .await?
        .inserted_id
        .as_object_id()
        .ok_or_else(|| Error::Status(Status::InternalServerError, "Bad form ID".to_string()))?
        .into();
    let form = owned_form(&forms, &token, new_id).await?;

    info!("User {} created form {}", token.id, form.id);
    Ok((Status::Created, Json(form.into())))
}

#[get("/forms/<form_id>")]
async fn get_form(
    token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    let form = owned_form(&forms, &token, form_id).await?;
    Ok(Json(form.into()))
}

#[put("/forms/<form_id>", data = "<spec>", format = "json")]
async fn update_form(
    token: AuthToken,
    form_id: Id,
    spec: Json<FormSpec>,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    let mut form = owned_form(&forms, &token, form_id).await?;
    spec.0
        .apply_to(&mut form)
        .map_err(|err| Error::bad_request(err.to_string()))?;

    let result = forms
        .replace_one(owner_filter(&token, form_id), &form, None)
        .await?;
    if result.matched_count == 0 {
        // Deleted in the meantime.
        return Err(Error::not_found(format!("Form {form_id}")));
    }
    Ok(Json(form.into()))
}

#[post("/forms/<form_id>/publish")]
async fn publish_form(
    token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    set_published(&forms, &token, form_id, true).await
}

#[post("/forms/<form_id>/unpublish")]
async fn unpublish_form(
    token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
) -> Result<Json<FormDescription>> {
    set_published(&forms, &token, form_id, false).await
}

#[delete("/forms/<form_id>")]
async fn delete_form(
    token: AuthToken,
    form_id: Id,
    forms: Coll<Form>,
    responses: Coll<Response>,
    db_client: &State<Client>,
) -> Result<()> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let deleted = forms
        .delete_one_with_session(owner_filter(&token, form_id), None, &mut session)
        .await?;
    if deleted.deleted_count == 0 {
        session.abort_transaction().await?;
        return Err(Error::not_found(format!("Form {form_id}")));
    }
    let cascaded = responses
        .delete_many_with_session(doc! { "form_id": form_id }, None, &mut session)
        .await?;

    session.commit_transaction().await?;
    info!(
        "User {} deleted form {form_id} and {} responses",
        token.id, cascaded.deleted_count
    );
    Ok(())
}

async fn set_published(
    forms: &Coll<Form>,
    token: &AuthToken,
    form_id: Id,
    is_published: bool,
) -> Result<Json<FormDescription>> {
    let update = doc! {
        "$set": {
            "is_published": is_published,
            "updated_at": BsonDateTime::from_chrono(Utc::now()),
        }
    };
    let return_new = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let form = forms
        .find_one_and_update(owner_filter(token, form_id), update, return_new)
        .await?
        .ok_or_else(|| Error::not_found(format!("Form {form_id}")))?;
    Ok(Json(form.into()))
}
