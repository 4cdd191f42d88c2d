//! Client for the generative-language API that drafts form details and
//! questions.
//!
//! Every outbound payload and raw reply is logged under the `ai` target.

use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use rocket::http::Status;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::model::api::ai::{FormDetails, RawSuggestion, SuggestedQuestion};

/// Log target for model traffic.
pub const AI_LOG_TARGET: &str = "ai";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const QUESTION_TYPE_NAMES: [&str; 9] = [
    "SHORT_TEXT",
    "LONG_TEXT",
    "MULTIPLE_CHOICE",
    "EMAIL",
    "NUMBER",
    "CHECKBOXES",
    "DROPDOWN",
    "DATE",
    "TIME",
];

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI suggestions are not configured")]
    Disabled,
    #[error("Failed to reach the AI service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("AI service answered with status {0}")]
    Upstream(StatusCode),
    #[error("AI service returned no text")]
    EmptyReply,
    #[error("AI service returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl AiError {
    pub fn status(&self) -> Status {
        match self {
            Self::Disabled => Status::ServiceUnavailable,
            _ => Status::BadGateway,
        }
    }
}

/// Handle on the model API. Held in managed state.
pub struct AiClient {
    http: HttpClient,
    endpoint: String,
    model: String,
    api_key: String,
}

impl AiClient {
    pub fn new(endpoint: String, model: String, api_key: String) -> Result<Self, reqwest::Error> {
        let http = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// A client without a key never calls out.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Suggest a title and description for a form about `topic`.
    pub async fn suggest_details(&self, topic: &str) -> Result<FormDetails, AiError> {
        let prompt =
            format!("I want to create a form about: {topic}. Give me a title and a description.");
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "description": { "type": "STRING" },
            },
            "required": ["title", "description"],
        });
        self.generate("suggest-details", prompt, schema).await
    }

    /// Suggest questions for a form. Suggestions of unsupported types are
    /// dropped.
    pub async fn suggest_questions(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Vec<SuggestedQuestion>, AiError> {
        let prompt = format!(
            "Create 5 relevant form questions for a form titled \"{title}\" with description \
             \"{description}\". Include varied types like short text, multiple choice, and email."
        );
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "label": { "type": "STRING" },
                    "type": { "type": "STRING", "enum": QUESTION_TYPE_NAMES },
                    "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "required": { "type": "BOOLEAN" },
                },
                "required": ["label", "type", "required"],
            },
        });
        let raw: Vec<RawSuggestion> = self.generate("suggest-questions", prompt, schema).await?;
        Ok(supported_suggestions(raw))
    }

    /// Ask the model for JSON matching `schema` and parse it.
    async fn generate<T: DeserializeOwned>(
        &self,
        kind: &str,
        prompt: String,
        schema: Value,
    ) -> Result<T, AiError> {
        if !self.is_enabled() {
            return Err(AiError::Disabled);
        }

        let payload = request_payload(prompt, schema);
        log::info!(target: AI_LOG_TARGET, "REQUEST [{kind}] model={}\n{payload:#}", self.model);

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!(target: AI_LOG_TARGET, "RESPONSE [{kind}] status={status}\n{body}");
            return Err(AiError::Upstream(status));
        }

        let reply: GenerateContentResponse = response.json().await?;
        let text = reply.text().ok_or(AiError::EmptyReply)?;
        log::info!(target: AI_LOG_TARGET, "RESPONSE [{kind}] raw text:\n{text}");

        Ok(serde_json::from_str(&text)?)
    }
}

/// Body of a `generateContent` call asking for JSON output.
fn request_payload(prompt: String, schema: Value) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema,
        },
    })
}

fn supported_suggestions(raw: Vec<RawSuggestion>) -> Vec<SuggestedQuestion> {
    raw.into_iter()
        .filter_map(|suggestion| match SuggestedQuestion::try_from(suggestion) {
            Ok(question) => Some(question),
            Err(question_type) => {
                log::debug!(target: AI_LOG_TARGET, "Dropping suggestion of unsupported type {question_type}");
                None
            }
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
