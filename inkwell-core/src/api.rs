// inkwell-core/src/api.rs

//! Handles interactions with OpenAI-compatible chat completion APIs.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::{json, to_value, Value};
use tracing::{debug, error, trace};
use uuid::Uuid;

use crate::models::chat::{ApiResponse, ChatMessage, CompletionOptions};
use crate::models::tools::ToolDefinition;

/// Sends one chat completion request. There is no retry and no timeout:
/// a failed call is reported to the caller as-is.
#[allow(clippy::too_many_arguments)]
pub async fn call_chat_completion_api(
    http_client: &Client,
    endpoint: &str,
    api_key: &str,
    model_name: &str,
    messages: Vec<ChatMessage>,
    tools: Option<&[ToolDefinition]>,
    parameters: Option<&toml::Value>,
    options: &CompletionOptions,
) -> Result<ApiResponse> {
    trace!(endpoint = %endpoint, model = %model_name, num_messages = messages.len(), "Entering call_chat_completion_api");

    let request_body = build_openai_request(model_name, messages, tools, parameters, options)?;

    debug!(
        "Request URL: {}\nRequest JSON: {}",
        endpoint,
        serde_json::to_string_pretty(&request_body)?
    );

    let response = http_client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .bearer_auth(api_key)
        .json(&request_body)
        .send()
        .await
        .with_context(|| format!("HTTP request execution failed for endpoint: {}", endpoint))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .context("Failed to read API error response body")?;
        error!(status = %status, response_body = %error_text, "API request failed");
        return Err(anyhow!("API error: {} - {}", status, error_text));
    }

    let response_value: Value = response
        .json()
        .await
        .context("Failed to read API response body as JSON")?;
    trace!(response = %response_value, "Full received API response");

    parse_api_response(response_value)
}

/// Builds the JSON payload for an OpenAI-compatible endpoint. Tools are
/// omitted entirely when `tools` is `None` or empty.
pub fn build_openai_request(
    model_name: &str,
    messages: Vec<ChatMessage>,
    tools: Option<&[ToolDefinition]>,
    parameters: Option<&toml::Value>,
    options: &CompletionOptions,
) -> Result<Value> {
    let mut request_map = serde_json::Map::new();
    request_map.insert("model".to_string(), json!(model_name));
    request_map.insert("messages".to_string(), to_value(messages)?);

    let tools_json: Vec<Value> = tools
        .unwrap_or_default()
        .iter()
        .map(|tool_def| {
            json!({
                "type": "function",
                "function": tool_def
            })
        })
        .collect();

    if !tools_json.is_empty() {
        request_map.insert("tools".to_string(), Value::Array(tools_json));
    }

    if let Some(parameters) = parameters.and_then(|p| p.as_table()) {
        for (key, value) in parameters {
            let json_value = to_value(value.clone())
                .with_context(|| format!("Failed to convert TOML parameter '{}' to JSON", key))?;
            request_map.insert(key.clone(), json_value);
        }
    }

    if let Some(max_tokens) = options.max_tokens {
        request_map.insert("max_tokens".to_string(), json!(max_tokens));
    }
    if let Some(temperature) = options.temperature {
        request_map.insert("temperature".to_string(), json!(temperature));
    }

    Ok(Value::Object(request_map))
}

fn parse_api_response(response_value: Value) -> Result<ApiResponse> {
    let mut response_json_obj = match response_value {
        Value::Object(map) => map,
        other => {
            return Err(anyhow!("API response was not a JSON object: {:?}", other));
        }
    };

    if !response_json_obj.contains_key("id") {
        let new_id = format!("chatcmpl-{}", Uuid::new_v4());
        debug!(
            "Added missing 'id' field to API response with value: {}",
            new_id
        );
        response_json_obj.insert("id".to_string(), json!(new_id));
    }

    let api_response: ApiResponse = serde_json::from_value(Value::Object(response_json_obj))
        .map_err(|e| anyhow!("Failed to deserialize API response").context(e))?;

    match api_response.choices.first() {
        Some(choice) => match &choice.message.tool_calls {
            Some(tool_calls) => debug!("Tool calls: {:#?}", tool_calls),
            None => debug!("No tool calls"),
        },
        None => debug!("Response has empty 'choices' array"),
    }

    Ok(api_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tools::{ToolParameter, ToolParameterType, ToolParametersDefinition};
    use httpmock::prelude::*;
    use std::collections::HashMap;

    fn create_mock_tool_definitions() -> Vec<ToolDefinition> {
        let mut properties = HashMap::new();
        properties.insert(
            "email_id".to_string(),
            ToolParameter {
                param_type: ToolParameterType::String,
                description: "The ID of the email".to_string(),
            },
        );
        vec![ToolDefinition {
            name: "read_email".to_string(),
            description: "Read an email".to_string(),
            parameters: ToolParametersDefinition {
                param_type: "object".to_string(),
                properties,
                required: vec!["email_id".to_string()],
            },
        }]
    }

    fn user_messages(text: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(text)]
    }

    #[test]
    fn test_build_openai_request_wraps_tools() {
        let tools = create_mock_tool_definitions();
        let value = build_openai_request(
            "gpt-test",
            user_messages("Hello"),
            Some(tools.as_slice()),
            None,
            &CompletionOptions::default(),
        )
        .unwrap();
        assert_eq!(value["model"], json!("gpt-test"));
        assert_eq!(value["messages"], json!(user_messages("Hello")));
        assert_eq!(value["tools"][0]["type"], json!("function"));
        assert_eq!(value["tools"][0]["function"]["name"], json!("read_email"));
        assert_eq!(
            value["tools"][0]["function"]["parameters"]["required"],
            json!(["email_id"])
        );
    }

    #[test]
    fn test_build_openai_request_no_tools() {
        let value = build_openai_request(
            "gpt-test",
            user_messages("Hi"),
            None,
            None,
            &CompletionOptions::default(),
        )
        .unwrap();
        assert!(value.get("tools").is_none());

        let value = build_openai_request(
            "gpt-test",
            user_messages("Hi"),
            Some(&[][..]),
            None,
            &CompletionOptions::default(),
        )
        .unwrap();
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_build_openai_request_options_override_parameters() {
        let mut params = toml::value::Table::new();
        params.insert("temperature".to_string(), toml::Value::Float(0.2));
        params.insert("top_p".to_string(), toml::Value::Float(0.9));
        let params = toml::Value::Table(params);
        let options = CompletionOptions {
            max_tokens: Some(300),
            temperature: Some(0.7),
        };
        let value =
            build_openai_request("gpt-test", user_messages("x"), None, Some(&params), &options)
                .unwrap();
        assert_eq!(value["temperature"], json!(0.7));
        assert_eq!(value["top_p"], json!(0.9));
        assert_eq!(value["max_tokens"], json!(300));
    }

    #[tokio::test]
    async fn test_call_chat_completion_api_success() {
        let server = MockServer::start_async().await;
        let tools = create_mock_tool_definitions();
        let expected_body = build_openai_request(
            "gpt-test",
            user_messages("Ping"),
            Some(tools.as_slice()),
            None,
            &CompletionOptions::default(),
        )
        .unwrap();

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("Authorization", "Bearer test-key")
                    .json_body(expected_body);
                then.status(200).json_body(json!({
                    "id": "chatcmpl-123",
                    "choices": [{"index": 0, "message": {"role": "assistant", "content": "Pong"}, "finish_reason": "stop"}]
                }));
            })
            .await;

        let client = Client::new();
        let result = call_chat_completion_api(
            &client,
            &server.url("/v1/chat/completions"),
            "test-key",
            "gpt-test",
            user_messages("Ping"),
            Some(tools.as_slice()),
            None,
            &CompletionOptions::default(),
        )
        .await;
        mock.assert_async().await;
        let response = result.expect("call should succeed");
        assert_eq!(response.id, "chatcmpl-123");
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("Pong")
        );
    }

    #[tokio::test]
    async fn test_call_chat_completion_api_fills_missing_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat");
                then.status(200).json_body(json!({
                    "choices": [{"index": 0, "message": {"role": "assistant", "content": "ok"}}]
                }));
            })
            .await;

        let client = Client::new();
        let response = call_chat_completion_api(
            &client,
            &server.url("/chat"),
            "k",
            "m",
            user_messages("hi"),
            None,
            None,
            &CompletionOptions::default(),
        )
        .await
        .unwrap();
        assert!(response.id.starts_with("chatcmpl-"));
    }

    #[tokio::test]
    async fn test_call_chat_completion_api_error_status_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat");
                then.status(500).body("Server error");
            })
            .await;

        let client = Client::new();
        let result = call_chat_completion_api(
            &client,
            &server.url("/chat"),
            "k",
            "m",
            user_messages("hi"),
            None,
            None,
            &CompletionOptions::default(),
        )
        .await;
        assert_eq!(mock.hits(), 1);
        let err = result.expect_err("expected an API error");
        assert!(err.to_string().contains("API error: 500"));
    }
}
