//! HTTP chat-completions backend.
//!
//! Speaks the OpenAI-style `/chat/completions` shape over a blocking
//! client with a hard request timeout. Exactly one attempt per request;
//! no retry loop here, the orchestrator's fallback policy handles
//! failures. The request body never contains raw note text, only the
//! already de-identified prompt.

use serde::{Deserialize, Serialize};

use super::{prompt, ModelClient, ModelError, ModelRequest};

const ENV_API_URL: &str = "CLINSCRIBE_API_URL";
const ENV_API_KEY: &str = "CLINSCRIBE_API_KEY";
const ENV_MODEL: &str = "CLINSCRIBE_MODEL";

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 500;

pub struct ChatCompletionsClient {
    api_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        api_url: String,
        api_key: String,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, ModelError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ModelError::Connection(e.to_string()))?;
        Ok(Self {
            api_url,
            api_key,
            model,
            timeout_secs,
            client,
        })
    }

    /// Read endpoint configuration from the environment.
    pub fn from_env() -> Result<Self, ModelError> {
        let api_url = std::env::var(ENV_API_URL)
            .map_err(|_| ModelError::NotConfigured(format!("{ENV_API_URL} not set")))?;
        let api_key = std::env::var(ENV_API_KEY)
            .map_err(|_| ModelError::NotConfigured(format!("{ENV_API_KEY} not set")))?;
        let model = std::env::var(ENV_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_url, api_key, model, DEFAULT_TIMEOUT_SECS)
    }
}

/// Chat transcript: the request's directive as the system message,
/// few-shot pairs as prior user/assistant turns, the real prompt last.
fn build_messages<'a>(request: &'a ModelRequest, user_prompt: &'a str) -> Vec<ChatMessage<'a>> {
    let mut messages = vec![ChatMessage {
        role: "system",
        content: &request.directive,
    }];
    for example in &request.few_shot {
        messages.push(ChatMessage {
            role: "user",
            content: &example.note,
        });
        messages.push(ChatMessage {
            role: "assistant",
            content: &example.summary,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: user_prompt,
    });
    messages
}

impl ModelClient for ChatCompletionsClient {
    fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let user_prompt = prompt::build_summary_prompt(&request.note, &request.sections);
        let body = ChatRequest {
            model: &self.model,
            messages: build_messages(request, &user_prompt),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        tracing::debug!(model = %self.model, "Sending summarization request");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    ModelError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let truncated: String = body.chars().take(200).collect();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: truncated,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ModelError::ResponseParsing(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        tracing::debug!(chars = content.len(), "Summarization response received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_serializes_to_chat_completions_shape() {
        let body = ChatRequest {
            model: "test-model",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "usr",
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
    }

    #[test]
    fn few_shot_examples_become_prior_turns() {
        use crate::model::FewShotExample;
        use crate::pipeline::types::SectionSet;

        let mut request = ModelRequest::new("the note".into(), SectionSet::default());
        request.few_shot.push(FewShotExample {
            note: "example note".into(),
            summary: "example summary".into(),
        });
        let messages = build_messages(&request, "final prompt");
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[0].content, request.directive);
        assert_eq!(messages[1].content, "example note");
        assert_eq!(messages[2].content, "example summary");
        assert_eq!(messages[3].content, "final prompt");
    }

    #[test]
    fn response_with_content_parses() {
        let raw = r#"{"choices":[{"message":{"content":"A summary."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("A summary.")
        );
    }

    #[test]
    fn response_with_null_content_is_tolerated() {
        let raw = r#"{"choices":[{"message":{"content":null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn from_env_requires_endpoint_configuration() {
        // Only meaningful when the variables are absent, as in CI.
        if std::env::var(ENV_API_URL).is_err() {
            assert!(matches!(
                ChatCompletionsClient::from_env(),
                Err(ModelError::NotConfigured(_))
            ));
        }
    }
}
