use std::time::Duration;

use async_trait::async_trait;
use autostream_core::config::LlmConfig;
use autostream_core::Intent;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classifies one utterance into one of the three intents.
///
/// Implementations are black boxes to the controller; failures propagate to
/// the caller and abort the turn. There is no silent fallback.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, utterance: &str) -> Result<Intent, ClassifyError>;
}

#[async_trait]
impl<T: IntentClassifier + ?Sized> IntentClassifier for std::sync::Arc<T> {
    async fn classify(&self, utterance: &str) -> Result<Intent, ClassifyError> {
        (**self).classify(utterance).await
    }
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("llm api key is not configured")]
    MissingCredential,
    #[error("intent request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("intent endpoint returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("intent response contained no candidate text")]
    EmptyResponse,
}

/// Remote classifier backed by the Gemini `generateContent` REST endpoint.
#[derive(Clone, Debug)]
pub struct GeminiClassifier {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClassifier {
    pub fn from_config(llm: &LlmConfig) -> Result<Self, ClassifyError> {
        let api_key = llm.api_key.clone().ok_or(ClassifyError::MissingCredential)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            model: llm.model.clone(),
            api_key,
        })
    }

    fn prompt(utterance: &str) -> String {
        format!(
            "You are an intent classification engine for AutoStream, a video editing SaaS product.\n\
             Classify the user message into exactly ONE intent from this list:\n\
             - greeting: Casual greetings like 'hi', 'hello', 'hey'\n\
             - product_inquiry: Questions about pricing, features, plans, refunds, support, or general product information\n\
             - high_intent: Expressions of strong interest in signing up, purchasing, or getting started, such as 'I want to sign up', 'I'm interested', 'let me try'\n\n\
             User message: {utterance}\n\n\
             Respond with ONLY the intent word (greeting, product_inquiry, or high_intent)."
        )
    }
}

#[async_trait]
impl IntentClassifier for GeminiClassifier {
    async fn classify(&self, utterance: &str) -> Result<Intent, ClassifyError> {
        let url =
            format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: Self::prompt(utterance) }] }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api { status: status.as_u16(), body });
        }

        let payload = response.json::<GenerateResponse>().await?;
        let label = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ClassifyError::EmptyResponse)?;

        Ok(Intent::from_label(&label))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
