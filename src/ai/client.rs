use backoff::future::retry_notify;
use backoff::Error as BackoffError;
use backoff::ExponentialBackoff;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use utoipa::ToSchema;

use crate::config::AiCredentials;
use crate::error::AppError;

const API_VERSION: &str = "2024-06-01";
const MAX_PROMPT_CHARS: usize = 8000;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Completion {
    pub text: String,
    pub model: String,
    /// True when no model was called and the text is a canned stand-in
    pub simulated: bool,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize, Debug)]
struct ChatMessage {
    content: String,
}

#[derive(Clone)]
pub struct AiClient {
    http: Client,
    credentials: Option<AiCredentials>,
    deployment: String,
}

fn retry_notify_handler<E>(err: E, duration: Duration)
where
    E: std::fmt::Display,
{
    tracing::warn!(
        "AI request failed: {}. Retrying in {:.1}s...",
        err,
        duration.as_secs_f32()
    );
}

impl AiClient {
    pub fn new(credentials: Option<AiCredentials>, deployment: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(Duration::from_secs(90)).build()?;
        Ok(Self {
            http,
            credentials,
            deployment: deployment.into(),
        })
    }

    pub fn is_simulated(&self) -> bool {
        self.credentials.is_none()
    }

    /// Ask the model to answer `prompt` in the role described by `system`.
    ///
    /// Without credentials this returns a simulated completion instead of failing.
    #[tracing::instrument(skip_all, fields(deployment = %self.deployment))]
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, AppError> {
        let Some(creds) = &self.credentials else {
            return Ok(simulated_completion(system, prompt));
        };

        // Truncate long prompts to keep request payloads bounded
        let prompt: String = prompt.chars().take(MAX_PROMPT_CHARS).collect();
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            creds.endpoint.trim_end_matches('/'),
            self.deployment,
            API_VERSION
        );
        let body = json!({
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": 1200,
            "temperature": 0.3,
        });

        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let response = retry_notify(
            backoff,
            || async {
                match self
                    .http
                    .post(&url)
                    .header("api-key", &creds.api_key)
                    .header(header::CONTENT_TYPE, "application/json")
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(resp) => {
                        let status = resp.status();
                        if status.is_success() {
                            Ok(resp)
                        } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                            tracing::debug!("Retrying on status: {}", status);
                            Err(BackoffError::transient(AppError::Upstream(format!(
                                "model endpoint returned retryable status: {}",
                                status
                            ))))
                        } else {
                            let text = resp.text().await.unwrap_or_else(|_| "Failed to read error body".to_string());
                            tracing::error!("AI API error: Status {}, Body: {}", status, text);
                            Err(BackoffError::permanent(AppError::Upstream(format!(
                                "model endpoint returned status: {}",
                                status
                            ))))
                        }
                    }
                    Err(err) if err.is_timeout() || err.is_connect() => {
                        tracing::debug!("Retrying on reqwest error: {}", err);
                        Err(BackoffError::transient(AppError::from(err)))
                    }
                    Err(err) => Err(BackoffError::permanent(AppError::from(err))),
                }
            },
            retry_notify_handler,
        )
        .await?;

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Upstream("model returned no choices".to_string()))?;

        tracing::info!("Received completion. Content length: {}", text.len());
        Ok(Completion {
            text,
            model: self.deployment.clone(),
            simulated: false,
        })
    }
}

fn simulated_completion(system: &str, prompt: &str) -> Completion {
    let role = system.split('.').next().unwrap_or(system).trim();
    let preview: String = prompt.chars().take(160).collect();
    let ellipsis = if prompt.chars().count() > 160 { "..." } else { "" };
    Completion {
        text: format!(
            "[simulated] {}. No model credentials are configured, so this is a placeholder answer to: \"{}{}\"",
            role, preview, ellipsis
        ),
        model: "simulated".to_string(),
        simulated: true,
    }
}

/// Pull a JSON object out of a model answer, tolerating Markdown code fences and surrounding prose.
pub fn extract_json(answer: &str) -> Option<Value> {
    let trimmed = answer.trim();
    let unfenced = if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    };

    if let Ok(v) = serde_json::from_str::<Value>(unfenced) {
        if v.is_object() {
            return Some(v);
        }
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&unfenced[start..=end]).ok().filter(Value::is_object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulates_without_credentials() {
        let client = AiClient::new(None, "gpt-4o").unwrap();
        assert!(client.is_simulated());
        let completion = client
            .complete("You are a cybersecurity market analyst. Be brief.", "Summarize identity funding")
            .await
            .unwrap();
        assert!(completion.simulated);
        assert_eq!(completion.model, "simulated");
        assert!(completion.text.starts_with("[simulated] You are a cybersecurity market analyst."));
        assert!(completion.text.contains("Summarize identity funding"));
    }

    #[test]
    fn extracts_json_from_fenced_or_wrapped_answers() {
        let fenced = "```json\n{\"trend\": \"up\"}\n```";
        assert_eq!(extract_json(fenced), Some(json!({"trend": "up"})));

        let wrapped = "Here you go: {\"risks\": [\"churn\"]} hope that helps";
        assert_eq!(extract_json(wrapped), Some(json!({"risks": ["churn"]})));

        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("[1, 2]"), None);
    }
}
