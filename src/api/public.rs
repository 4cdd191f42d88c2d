use mongodb::bson::doc;
use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            form::PublicFormDescription,
            response::{ResponseDescription, ResponseSpec},
            results::PublicResults,
        },
        db::{
            form::Form,
            response::{NewResponse, Response},
        },
        mongodb::{Coll, Id},
    },
    results::aggregate,
};

use super::common::{form_responses, published_form};

pub fn routes() -> Vec<Route> {
    routes![public_form, submit_response, public_results]
}

/// The questions of a published form, for respondents.
#[get("/public/forms/<form_id>")]
async fn public_form(form_id: Id, forms: Coll<Form>) -> Result<Json<PublicFormDescription>> {
    let form = published_form(&forms, form_id).await?;
    Ok(Json(form.into()))
}

#[post("/public/forms/<form_id>/responses", data = "<spec>", format = "json")]
async fn submit_response(
    token: Option<AuthToken>,
    form_id: Id,
    spec: Json<ResponseSpec>,
    forms: Coll<Form>,
    new_responses: Coll<NewResponse>,
    responses: Coll<Response>,
) -> Result<(Status, Json<ResponseDescription>)> {
    let form = published_form(&forms, form_id).await?;
    let respondent_id = token.map(|token| token.id);

    if let Some(respondent_id) = respondent_id.filter(|_| !form.allow_multiple_submissions) {
        let filter = doc! {
            "form_id": form_id,
            "respondent_id": respondent_id,
        };
        if responses.count_documents(filter, None).await? > 0 {
            return Err(Error::bad_request(
                "This form only accepts one response per user",
            ));
        }
    }

    let response = spec
        .0
        .into_new_response(&form, respondent_id)
        .map_err(|err| Error::bad_request(err.to_string()))?;

    let new_id: Id = new_responses
        .insert_one(&response, None)
        .await?
        .inserted_id
        .as_object_id()
        .ok_or_else(|| Error::Status(Status::InternalServerError, "Bad response ID".to_string()))?
        .into();

    debug!("Recorded response {new_id} to form {form_id}");
    let stored = Response {
        id: new_id,
        response,
    };
    Ok((Status::Created, Json(stored.into())))
}

/// Aggregated results, if the owner has made them public.
#[get("/public/forms/<form_id>/results")]
async fn public_results(
    form_id: Id,
    forms: Coll<Form>,
    responses: Coll<Response>,
) -> Result<Json<PublicResults>> {
    let form = published_form(&forms, form_id).await?;
    if !form.allow_public_responses_view {
        return Err(Error::not_found(format!("Public results for form {form_id}")));
    }
    let responses = form_responses(&responses, form_id).await?;

    Ok(Json(PublicResults {
        title: form.title.clone(),
        response_count: responses.len() as u64,
        questions: form.questions.iter().map(Into::into).collect(),
        stats: aggregate(&form.questions, &responses),
    }))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::ContentType,
        local::asynchronous::Client,
        serde::json::{json, serde_json},
    };

    use crate::{
        model::{
            api::response::AnswerSpec,
            common::answer::AnswerValue,
            db::{form::NewForm, user::User},
        },
        results::QuestionStats,
    };

    use super::*;

    async fn insert_form(new_forms: &Coll<NewForm>, form: NewForm) -> Form {
        let id: Id = new_forms
            .insert_one(&form, None)
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap()
            .into();
        Form { id, form }
    }

    async fn submit(client: &Client, form: &Form, spec: &ResponseSpec) -> Status {
        client
            .post(uri!("/api", submit_response(form.id)))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await
            .status()
    }

    #[backend_test]
    async fn published_forms_are_public(client: Client, new_forms: Coll<NewForm>) {
        let form = insert_form(&new_forms, NewForm::example(Id::new())).await;

        let response = client
            .get(uri!("/api", public_form(form.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let body = response.into_string().await.unwrap();
        assert!(!body.contains("owner_id"));
        let public: PublicFormDescription = serde_json::from_str(&body).unwrap();
        assert_eq!(public.title, form.title);
        assert_eq!(public.questions.len(), form.questions.len());
    }

    #[backend_test]
    async fn unpublished_forms_are_hidden(client: Client, new_forms: Coll<NewForm>) {
        let mut draft = NewForm::example(Id::new());
        draft.is_published = false;
        let form = insert_form(&new_forms, draft).await;

        let response = client
            .get(uri!("/api", public_form(form.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
        assert_eq!(
            submit(&client, &form, &ResponseSpec::example(&form)).await,
            Status::NotFound
        );

        let response = client
            .get(uri!("/api", public_form(Id::new())))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn anonymous_submission_is_stored(
        client: Client,
        new_forms: Coll<NewForm>,
        responses: Coll<Response>,
    ) {
        let form = insert_form(&new_forms, NewForm::example(Id::new())).await;

        let response = client
            .post(uri!("/api", submit_response(form.id)))
            .header(ContentType::JSON)
            .body(json!(ResponseSpec::example(&form)).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let created: ResponseDescription =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(*created.form_id, form.id);
        assert_eq!(created.respondent_id, None);

        let stored = responses
            .find_one(created.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.answers.len(), form.questions.len());
    }

    #[backend_test]
    async fn invalid_submissions_are_rejected(
        client: Client,
        new_forms: Coll<NewForm>,
        responses: Coll<Response>,
    ) {
        let mut form = NewForm::example(Id::new());
        form.questions[0].required = true;
        let form = insert_form(&new_forms, form).await;

        // Missing required answer.
        let spec = ResponseSpec { answers: vec![] };
        assert_eq!(submit(&client, &form, &spec).await, Status::BadRequest);

        // Unknown option.
        let mut spec = ResponseSpec::example(&form);
        spec.answers[2] = AnswerSpec::new(&form.questions[2], AnswerValue::text("Z"));
        assert_eq!(submit(&client, &form, &spec).await, Status::BadRequest);

        // Answer to a question on another form.
        let mut spec = ResponseSpec::example(&form);
        spec.answers.push(AnswerSpec {
            question_id: Id::new().into(),
            value: Some(AnswerValue::text("stray")),
        });
        assert_eq!(submit(&client, &form, &spec).await, Status::BadRequest);

        let stored = responses
            .count_documents(doc! { "form_id": form.id }, None)
            .await
            .unwrap();
        assert_eq!(stored, 0);
    }

    #[backend_test(user)]
    async fn single_submission_per_user(
        client: Client,
        new_forms: Coll<NewForm>,
        users: Coll<User>,
        responses: Coll<Response>,
    ) {
        let mut form = NewForm::example(Id::new());
        form.allow_multiple_submissions = false;
        let form = insert_form(&new_forms, form).await;
        let spec = ResponseSpec::example(&form);

        assert_eq!(submit(&client, &form, &spec).await, Status::Created);
        assert_eq!(submit(&client, &form, &spec).await, Status::BadRequest);

        let user = users.find_one(None, None).await.unwrap().unwrap();
        let stored = responses
            .find_one(doc! { "form_id": form.id }, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.respondent_id, Some(user.id));
        let count = responses
            .count_documents(doc! { "form_id": form.id }, None)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[backend_test]
    async fn anonymous_repeats_are_allowed(client: Client, new_forms: Coll<NewForm>) {
        let mut form = NewForm::example(Id::new());
        form.allow_multiple_submissions = false;
        let form = insert_form(&new_forms, form).await;
        let spec = ResponseSpec::example(&form);

        assert_eq!(submit(&client, &form, &spec).await, Status::Created);
        assert_eq!(submit(&client, &form, &spec).await, Status::Created);
    }

    #[backend_test]
    async fn public_results_need_opt_in(client: Client, new_forms: Coll<NewForm>) {
        let private = insert_form(&new_forms, NewForm::example(Id::new())).await;
        let response = client
            .get(uri!("/api", public_results(private.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        let mut form = NewForm::example(Id::new());
        form.allow_public_responses_view = true;
        let form = insert_form(&new_forms, form).await;
        let spec = ResponseSpec::example(&form);
        assert_eq!(submit(&client, &form, &spec).await, Status::Created);
        assert_eq!(submit(&client, &form, &spec).await, Status::Created);

        let response = client
            .get(uri!("/api", public_results(form.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let results: PublicResults =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(results.response_count, 2);
        assert_eq!(results.questions[0].label, "Name");
        match &results.stats[2] {
            QuestionStats::Tally { counts, .. } => assert_eq!(counts.get("A"), 2),
            other => panic!("Expected tally, got {other:?}"),
        }
    }
}
