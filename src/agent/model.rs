//! Resolver backed by an OpenAI-compatible chat-completions endpoint
//! (OpenRouter by default). The model only chooses the operation and scrapes
//! arguments; schema validation and identity injection happen at binding.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{QueryResolver, ResolveError, ResolveRequest, ToolChoice};
use crate::tools::{CATALOG_JSON, ToolName};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

pub struct ModelResolver {
    client: Client,
    config: ModelConfig,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

impl ModelResolver {
    pub fn new(config: ModelConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("building HTTP client for the model resolver")?;
        Ok(Self { client, config })
    }

    fn system_prompt() -> String {
        let today = Local::now().date_naive();
        format!(
            r#"You are a leave management assistant. Today is {today}.
Decide which one of the operations below answers the user's query and reply
with a single JSON object: {{"tool": "<name>", "arguments": {{...}}}}.
If no operation fits the query, reply {{"tool": null}}.

Rules:
- Employee operations are for everyone. Manager operations are only for the
  'manager' role, but prefer choosing the operation and letting its built-in
  check return the access error.
- When a manager wants to approve or reject, extract the request_id and the
  action ('approved' or 'rejected').
- Identity arguments (user_id, manager_id) are filled in by the server from
  the authenticated session; omit them.

Operations:
{catalog}"#,
            catalog = *CATALOG_JSON,
        )
    }
}

#[async_trait]
impl QueryResolver for ModelResolver {
    async fn resolve(&self, request: &ResolveRequest<'_>) -> Result<ToolChoice, ResolveError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            temperature: 0.0,
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "User ID: {}\nUser Role: {}\nQuery: {}",
                        request.user_id, request.role, request.query
                    ),
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("model request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(ResolveError::Transport(anyhow!(
                "model endpoint returned {status}: {text}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("model response was not valid JSON")?;
        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ResolveError::Transport(anyhow!("model returned no choices")))?;
        debug!(content, "model resolver output");

        parse_choice(content, request.query)
    }
}

fn parse_choice(content: &str, query: &str) -> Result<ToolChoice, ResolveError> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| ResolveError::Transport(anyhow!("model output was not JSON: {e}")))?;
    let tool = match value.get("tool") {
        Some(Value::String(name)) => name,
        // An explicit null is the model signalling it cannot resolve.
        _ => return Err(ResolveError::Unresolved(query.to_string())),
    };
    let tool = ToolName::from_str(tool).map_err(|_| {
        ResolveError::Transport(anyhow!("model chose unknown operation '{tool}'"))
    })?;
    let arguments = value
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));
    Ok(ToolChoice { tool, arguments })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_a_tool_choice() {
        let choice = parse_choice(
            r#"{"tool": "apply_for_leave", "arguments": {"leave_type": "sick_leave"}}"#,
            "q",
        )
        .unwrap();
        assert_eq!(choice.tool, ToolName::ApplyForLeave);
        assert_eq!(choice.arguments, json!({"leave_type": "sick_leave"}));
    }

    #[test]
    fn null_tool_means_unresolved() {
        let err = parse_choice(r#"{"tool": null}"#, "gibberish").unwrap_err();
        assert!(matches!(err, ResolveError::Unresolved(_)));
    }

    #[test]
    fn unknown_tool_and_bad_json_are_transport_errors() {
        assert!(matches!(
            parse_choice(r#"{"tool": "fire_everyone"}"#, "q").unwrap_err(),
            ResolveError::Transport(_)
        ));
        assert!(matches!(
            parse_choice("not json at all", "q").unwrap_err(),
            ResolveError::Transport(_)
        ));
    }

    #[test]
    fn system_prompt_lists_every_operation() {
        let prompt = ModelResolver::system_prompt();
        for name in [
            "get_leave_balance",
            "apply_for_leave",
            "check_leave_status",
            "get_all_pending_requests",
            "manage_leave_request",
        ] {
            assert!(prompt.contains(name), "missing {name}");
        }
    }
}
