//! Generative-language API client for the stock assistant
//!
//! Integrates with the Gemini `generateContent` endpoint.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AssistantConfig;
use crate::error::{AppError, AppResult};

/// Models the assistant may be asked to use
pub const SUPPORTED_MODELS: &[&str] = &["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"];

/// Reply when no API key is configured
pub const NOT_CONFIGURED_REPLY: &str =
    "IA não configurada. Defina BSM__ASSISTANT__API_KEY para habilitar o assistente.";

const EMPTY_REPLY: &str = "Não consegui gerar uma resposta. Tente reformular sua pergunta.";

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    default_model: String,
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: ChatRole,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Create a new GeminiClient
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
            default_model: config.model.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Resolve a requested model against the supported list
    pub fn model_or_default(&self, requested: Option<&str>) -> AppResult<String> {
        match requested {
            None => Ok(self.default_model.clone()),
            Some(model) if SUPPORTED_MODELS.contains(&model) => Ok(model.to_string()),
            Some(model) => Err(AppError::InvalidInput(format!("Unsupported model: {}", model))),
        }
    }

    /// Ask the model a question, primed with `context`
    pub async fn generate(
        &self,
        model: &str,
        context: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> AppResult<String> {
        let Some(api_key) = &self.api_key else {
            return Ok(NOT_CONFIGURED_REPLY.to_string());
        };

        let request = build_request(context, history, message);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Gemini API error: {} - {}",
                status, body
            )));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse Gemini response: {}", e)))?;

        Ok(first_text(data).unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }
}

/// Context goes first as a user turn acknowledged by the model, then the
/// prior conversation, then the new message
fn build_request<'a>(context: &'a str, history: &'a [ChatTurn], message: &'a str) -> GenerateRequest<'a> {
    let mut contents = Vec::with_capacity(history.len() + 3);
    contents.push(Content {
        role: ChatRole::User,
        parts: vec![Part { text: context }],
    });
    contents.push(Content {
        role: ChatRole::Model,
        parts: vec![Part {
            text: "Entendido! Estou pronto para ajudar com o estoque do bar. Como posso ajudar?",
        }],
    });
    contents.extend(history.iter().map(|turn| Content {
        role: turn.role,
        parts: vec![Part { text: &turn.text }],
    }));
    contents.push(Content {
        role: ChatRole::User,
        parts: vec![Part { text: message }],
    });

    GenerateRequest {
        contents,
        generation_config: GenerationConfig {
            temperature: 0.7,
            max_output_tokens: 2048,
        },
    }
}

fn first_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|p| p.text)
        .filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> AssistantConfig {
        AssistantConfig {
            api_endpoint: "https://generativelanguage.googleapis.com/v1beta/".into(),
            api_key: api_key.map(String::from),
            model: "gemini-2.0-flash".into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_model_selection() {
        let client = GeminiClient::new(&config(None));
        assert_eq!(client.model_or_default(None).unwrap(), "gemini-2.0-flash");
        assert_eq!(client.model_or_default(Some("gemini-1.5-pro")).unwrap(), "gemini-1.5-pro");
        assert!(client.model_or_default(Some("gpt-4")).is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_reply() {
        let client = GeminiClient::new(&config(Some("")));
        assert!(!client.is_configured());
        let reply = client.generate("gemini-2.0-flash", "ctx", &[], "oi").await.unwrap();
        assert_eq!(reply, NOT_CONFIGURED_REPLY);
    }

    #[test]
    fn test_request_layout() {
        let history = vec![ChatTurn { role: ChatRole::User, text: "antes".into() }];
        let request = build_request("ctx", &history, "agora");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"].as_array().unwrap().len(), 4);
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["contents"][3]["parts"][0]["text"], "agora");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_first_text() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Repor vodka"}]}}]
        }))
        .unwrap();
        assert_eq!(first_text(response).as_deref(), Some("Repor vodka"));

        let empty: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(first_text(empty), None);
    }
}
