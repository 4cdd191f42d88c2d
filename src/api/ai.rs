use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    ai::{AiClient, AiError, AI_LOG_TARGET},
    error::{Error, Result},
    model::api::{
        ai::{DetailsRequest, FormDetails, QuestionsRequest, SuggestedQuestion},
        auth::AuthToken,
    },
};

pub fn routes() -> Vec<Route> {
    routes![suggest_details, suggest_questions]
}

#[post("/ai/suggest-details", data = "<request>", format = "json")]
async fn suggest_details(
    _token: AuthToken,
    request: Json<DetailsRequest>,
    ai: &State<AiClient>,
) -> Result<(Status, Json<FormDetails>)> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(Error::bad_request("A topic is required"));
    }

    let reply = ai.suggest_details(topic).await;
    or_fallback(reply, || FormDetails::fallback(topic))
}

#[post("/ai/suggest-questions", data = "<request>", format = "json")]
async fn suggest_questions(
    _token: AuthToken,
    request: Json<QuestionsRequest>,
    ai: &State<AiClient>,
) -> Result<(Status, Json<Vec<SuggestedQuestion>>)> {
    let title = request.title.trim();
    let description = request.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(Error::bad_request("A title and description are required"));
    }

    let reply = ai.suggest_questions(title, description).await;
    or_fallback(reply, Vec::new)
}

/// A disabled client is an error; any other failure still answers, with a
/// placeholder body and a gateway status.
fn or_fallback<T>(
    reply: std::result::Result<T, AiError>,
    fallback: impl FnOnce() -> T,
) -> Result<(Status, Json<T>)> {
    match reply {
        Ok(value) => Ok((Status::Ok, Json(value))),
        Err(AiError::Disabled) => Err(Error::Ai(AiError::Disabled)),
        Err(err) => {
            log::warn!(target: AI_LOG_TARGET, "Suggestion failed: {err}");
            Ok((err.status(), Json(fallback())))
        }
    }
}
