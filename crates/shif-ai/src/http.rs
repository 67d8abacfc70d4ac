//! HTTP classifier speaking the Anthropic Messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::{Classify, ClassifierFields, ClassifyError, parse_fields};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 256;

const SYSTEM_PROMPT: &str = "You read single lines from a health insurance benefits \
and tariff document. Identify the medical service, the facility level (1 to 6) and \
the tariff amount in Kenyan shillings if present. Respond with JSON only, no prose: \
{\"service_name\": string|null, \"facility_level\": integer|null, \"amount\": integer|null, \
\"confidence\": number between 0 and 1}. Use null for anything the line does not state.";

/// Classifier backed by a remote Messages endpoint.
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl HttpClassifier {
    /// `base_url` like `https://api.anthropic.com`; a trailing slash is dropped.
    pub fn new(base_url: &str, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

fn request_error(e: reqwest::Error) -> ClassifyError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        ClassifyError::Transient(e.to_string())
    } else {
        ClassifyError::Permanent(e.to_string())
    }
}

fn status_error(status: u16, body: String) -> ClassifyError {
    let message = format!("server returned {status}: {body}");
    if status == 429 || status >= 500 {
        ClassifyError::Transient(message)
    } else {
        ClassifyError::Permanent(message)
    }
}

#[async_trait]
impl Classify for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(&self, text: &str) -> Result<ClassifierFields, ClassifyError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: text,
            }],
        };

        debug!(url = %self.endpoint(), model = %self.model, "classifying snippet");
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), body));
        }

        let body: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| ClassifyError::BadResponse(e.to_string()))?;
        let answer = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if answer.is_empty() {
            return Err(ClassifyError::BadResponse("no text content".into()));
        }

        let fields = parse_fields(&answer)?;
        info!(
            service = fields.service_name.as_deref().unwrap_or(""),
            confidence = fields.confidence,
            "classifier answer"
        );
        Ok(fields)
    }
}
