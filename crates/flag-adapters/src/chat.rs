//! Razonador HTTP contra un endpoint estilo chat-completions.

use std::time::Duration;

use flag_core::{AssessmentRequest, ExternalReasoner, ReasonerError};
use log::debug;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::ReasonerConfig;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 1000;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

/// Cliente construido una vez y compartido entre hilos; `reqwest::blocking::Client`
/// ya es `Send + Sync` y reutiliza conexiones.
pub struct ChatCompletionsReasoner {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl ChatCompletionsReasoner {
    pub fn new(endpoint: impl Into<String>,
               model: impl Into<String>,
               api_key: impl Into<String>,
               timeout: Duration)
               -> Result<Self, ReasonerError> {
        let client = Client::builder().timeout(timeout)
                                      .user_agent(concat!("flaggate/", env!("CARGO_PKG_VERSION")))
                                      .build()
                                      .map_err(|e| ReasonerError::Unavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client,
                  endpoint: endpoint.into(),
                  model: model.into(),
                  api_key: api_key.into(),
                  timeout })
    }

    pub fn from_config(cfg: &ReasonerConfig) -> Result<Self, ReasonerError> {
        let key = cfg.api_key
                     .clone()
                     .ok_or_else(|| ReasonerError::Unavailable("no API key configured".to_string()))?;
        Self::new(cfg.endpoint.clone(), cfg.model.clone(), key, cfg.timeout)
    }

    fn map_transport(&self, e: reqwest::Error) -> ReasonerError {
        if e.is_timeout() {
            ReasonerError::Timeout(self.timeout)
        } else {
            ReasonerError::Unavailable(e.to_string())
        }
    }
}

/// Extrae `choices[0].message.content` de la respuesta.
pub fn extract_content(body: &Value) -> Result<String, ReasonerError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ReasonerError::Malformed("response has no choices[0].message.content".to_string()))
}

impl ExternalReasoner for ChatCompletionsReasoner {
    fn name(&self) -> &str {
        "chat-completions"
    }

    fn assess(&self, request: &AssessmentRequest) -> Result<String, ReasonerError> {
        let prompt = build_prompt(request);
        let body = ChatRequest { model: &self.model,
                                 messages: [ChatMessage { role: "system",
                                                          content: SYSTEM_PROMPT },
                                            ChatMessage { role: "user",
                                                          content: &prompt }],
                                 temperature: TEMPERATURE,
                                 max_tokens: MAX_TOKENS };
        let response = self.client
                           .post(&self.endpoint)
                           .bearer_auth(&self.api_key)
                           .json(&body)
                           .send()
                           .map_err(|e| self.map_transport(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReasonerError::Unavailable(format!("reasoner returned HTTP {status}")));
        }
        let json: Value = response.json().map_err(|e| {
                                             if e.is_timeout() {
                                                 ReasonerError::Timeout(self.timeout)
                                             } else {
                                                 ReasonerError::Malformed(format!("response is not JSON: {e}"))
                                             }
                                         })?;
        let content = extract_content(&json)?;
        debug!("reasoner '{}' replied {} bytes for '{}'", self.model, content.len(), request.name);
        Ok(content)
    }
}
