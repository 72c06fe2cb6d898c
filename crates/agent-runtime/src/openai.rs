//! OpenAI-Compatible Provider
//!
//! Implementation of `LlmProvider` for any backend speaking the
//! `/chat/completions` wire format. Each backend lists one or more equivalent
//! endpoint URLs; they are tried in order and the first usable response wins.
//!
//! A 2xx body carrying an `error` member is returned as
//! [`ProviderResponse::Error`]. When no endpoint yields a usable response the
//! backend is unavailable and `send` fails with
//! [`AgentError::ProviderUnavailable`].

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        validate_request, Completion, FinishReason, GenerationOptions, LlmProvider,
        ProviderResponse, TokenUsage,
    },
    tool::{ToolCall, ToolDefinition},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Backend descriptor: credential, endpoints and capabilities
#[derive(Clone)]
pub struct BackendConfig {
    /// Name used in logs and failure reports
    pub name: String,

    /// Bearer credential
    pub api_key: String,

    /// Equivalent chat-completions URLs, in the order they are tried
    pub endpoints: Vec<String>,

    /// Whether tool definitions are sent
    pub supports_tools: bool,

    /// Per-request timeout
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(name: impl Into<String>, api_key: impl Into<String>, endpoints: Vec<String>) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.into(),
            endpoints,
            supports_tools: false,
            timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub const fn with_tools(mut self, supports_tools: bool) -> Self {
        self.supports_tools = supports_tools;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .field("endpoints", &self.endpoints)
            .field("supports_tools", &self.supports_tools)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    /// Usually a JSON-encoded string; some backends send an object
    #[serde(default)]
    arguments: Value,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireReply,
    #[serde(default)]
    finish_reason: Option<FinishReason>,
}

#[derive(Deserialize)]
struct WireReply {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl<'a> From<&'a Message> for WireMessage<'a> {
    fn from(m: &'a Message) -> Self {
        // Assistant turns that only carry tool calls send null content.
        let content = if m.role == Role::Assistant && m.has_tool_calls() && m.content.is_empty() {
            None
        } else {
            Some(m.content.as_str())
        };
        Self {
            role: m.role,
            content,
            tool_calls: m
                .tool_calls
                .iter()
                .map(|c| WireToolCall {
                    id: c.id.clone(),
                    kind: function_kind(),
                    function: WireFunction {
                        name: c.function_name.clone(),
                        arguments: Value::String(c.arguments.clone()),
                    },
                })
                .collect(),
            tool_call_id: m.tool_call_id.as_deref(),
            name: m.name.as_deref(),
        }
    }
}

fn arguments_text(arguments: Value) -> String {
    match arguments {
        Value::String(s) => s,
        Value::Null => "{}".into(),
        other => other.to_string(),
    }
}

fn describe_api_error(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| error.to_string(), str::to_string)
}

// ============================================================================
// Provider
// ============================================================================

/// Chat-completions client for one backend
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    config: BackendConfig,
}

impl OpenAiCompatProvider {
    /// Create from configuration
    pub fn from_config(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client for {}: {e}", config.name)))?;

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Build the JSON request body
    fn build_body(
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &GenerationOptions,
    ) -> Result<Value> {
        let wire: Vec<WireMessage<'_>> = messages.iter().map(WireMessage::from).collect();

        let mut body = json!({
            "model": options.model,
            "messages": serde_json::to_value(wire)?,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        if !tools.is_empty() {
            let specs: Vec<Value> = tools.iter().map(ToolDefinition::to_openai).collect();
            body["tools"] = Value::Array(specs);
            body["tool_choice"] = json!("auto");
        }

        Ok(body)
    }

    /// POST to one endpoint; `Err` describes why the endpoint is unusable
    async fn post(&self, endpoint: &str, body: &Value) -> std::result::Result<Value, String> {
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request to {endpoint} failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(format!("HTTP {status} from {endpoint}: {snippet}"));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| format!("malformed response from {endpoint}: {e}"))
    }

    /// Convert a response body into a completion
    fn parse_completion(data: Value, requested_model: &str) -> std::result::Result<Completion, String> {
        let response: WireResponse =
            serde_json::from_value(data).map_err(|e| format!("unexpected response shape: {e}"))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "response contained no choices".to_string())?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, call)| {
                let id = if call.id.is_empty() {
                    format!("call_{i}")
                } else {
                    call.id
                };
                ToolCall::new(id, call.function.name, arguments_text(call.function.arguments))
            })
            .collect();

        let message = Message::assistant(choice.message.content.unwrap_or_default())
            .with_tool_calls(tool_calls);

        Ok(Completion {
            message,
            model: response.model.unwrap_or_else(|| requested_model.to_string()),
            finish_reason: choice.finish_reason,
            usage: response.usage,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn supports_tools(&self) -> bool {
        self.config.supports_tools
    }

    async fn send(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &GenerationOptions,
    ) -> Result<ProviderResponse> {
        validate_request(messages, options)?;

        let tools = if self.config.supports_tools { tools } else { &[] };
        let body = Self::build_body(messages, tools, options)?;

        let mut last_failure = String::from("no endpoints configured");

        for endpoint in &self.config.endpoints {
            tracing::debug!(backend = %self.config.name, endpoint = %endpoint, "Calling chat completions");

            let data = match self.post(endpoint, &body).await {
                Ok(data) => data,
                Err(failure) => {
                    tracing::warn!(backend = %self.config.name, %failure, "Endpoint failed");
                    last_failure = failure;
                    continue;
                }
            };

            if let Some(error) = data.get("error") {
                let description = describe_api_error(error);
                tracing::warn!(backend = %self.config.name, error = %description, "Backend returned an API error");
                return Ok(ProviderResponse::error(description));
            }

            match Self::parse_completion(data, &options.model) {
                Ok(completion) => {
                    if let Some(usage) = &completion.usage {
                        tracing::debug!(
                            backend = %self.config.name,
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            "Token usage"
                        );
                    }
                    return Ok(ProviderResponse::Completion(completion));
                }
                Err(failure) => {
                    tracing::warn!(backend = %self.config.name, endpoint = %endpoint, %failure, "Unusable response");
                    last_failure = failure;
                }
            }
        }

        Err(AgentError::ProviderUnavailable(last_failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn answer_body(content: &str) -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content, "tool_calls": null},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 15, "total_tokens": 27}
        })
    }

    fn provider(endpoints: Vec<String>, tools: bool) -> OpenAiCompatProvider {
        let config = BackendConfig::new("test", "test-key", endpoints)
            .with_tools(tools)
            .with_timeout(Duration::from_secs(5));
        OpenAiCompatProvider::from_config(config).unwrap()
    }

    fn messages() -> Vec<Message> {
        vec![Message::system("You are helpful."), Message::user("Hello?")]
    }

    fn search_tool() -> ToolDefinition {
        ToolDefinition {
            name: "web_search".into(),
            description: "Search the web".into(),
            parameters: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        }
    }

    fn completion(response: ProviderResponse) -> Completion {
        match response {
            ProviderResponse::Completion(c) => c,
            ProviderResponse::Error { error } => panic!("expected completion, got error: {error}"),
        }
    }

    #[tokio::test]
    async fn test_complete_basic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"tool_choice": "auto", "max_tokens": 2048})))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("Hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(vec![format!("{}/v1/chat/completions", server.uri())], true);
        let response = provider
            .send(&messages(), &[search_tool()], &GenerationOptions::default())
            .await
            .unwrap();

        let c = completion(response);
        assert_eq!(c.message.content, "Hi there");
        assert_eq!(c.message.role, Role::Assistant);
        assert_eq!(c.finish_reason, Some(FinishReason::Stop));
        assert_eq!(c.usage.unwrap().total_tokens, 27);
        assert_eq!(c.model, "test-model");
    }

    #[tokio::test]
    async fn test_tool_calls_are_parsed() {
        let server = MockServer::start().await;
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_a", "type": "function",
                         "function": {"name": "web_search", "arguments": "{\"query\":\"rust\"}"}},
                        {"id": "call_b", "type": "function",
                         "function": {"name": "web_search", "arguments": {"query": "tokio"}}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let provider = provider(vec![server.uri()], true);
        let c = completion(
            provider
                .send(&messages(), &[search_tool()], &GenerationOptions::default())
                .await
                .unwrap(),
        );

        assert_eq!(c.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(c.message.content, "");
        assert_eq!(c.message.tool_calls.len(), 2);
        assert_eq!(c.message.tool_calls[0].id, "call_a");
        assert_eq!(c.message.tool_calls[0].arguments, "{\"query\":\"rust\"}");
        let second: Value = c.message.tool_calls[1].parse_arguments().unwrap();
        assert_eq!(second["query"], "tokio");
        assert_eq!(c.model, GenerationOptions::default().model);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_endpoint() {
        let server = MockServer::start().await;
        Mock::given(path("/primary"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/mirror"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("from mirror")))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(
            vec![format!("{}/primary", server.uri()), format!("{}/mirror", server.uri())],
            true,
        );
        let c = completion(provider.send(&messages(), &[], &GenerationOptions::default()).await.unwrap());
        assert_eq!(c.message.content, "from mirror");
    }

    #[tokio::test]
    async fn test_malformed_body_tries_next_endpoint() {
        let server = MockServer::start().await;
        Mock::given(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        Mock::given(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("fine")))
            .mount(&server)
            .await;

        let provider = provider(
            vec![format!("{}/broken", server.uri()), format!("{}/ok", server.uri())],
            true,
        );
        let c = completion(provider.send(&messages(), &[], &GenerationOptions::default()).await.unwrap());
        assert_eq!(c.message.content, "fine");
    }

    #[tokio::test]
    async fn test_all_endpoints_failing_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(2)
            .mount(&server)
            .await;

        let provider = provider(
            vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())],
            true,
        );
        let err = provider
            .send(&messages(), &[], &GenerationOptions::default())
            .await
            .unwrap_err();

        match err {
            AgentError::ProviderUnavailable(failure) => {
                assert!(failure.contains("HTTP 500"));
                assert!(failure.contains("/b"));
            }
            other => panic!("expected ProviderUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_error_body_stops_immediately() {
        let server = MockServer::start().await;
        Mock::given(path("/a"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": {"message": "model overloaded"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("unused")))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider(
            vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())],
            true,
        );
        let response = provider.send(&messages(), &[], &GenerationOptions::default()).await.unwrap();
        assert!(matches!(response, ProviderResponse::Error { ref error } if error == "model overloaded"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoints_are_unavailable() {
        let provider = provider(
            vec![
                "http://127.0.0.1:1/v1/chat/completions".into(),
                "http://127.0.0.1:2/v1/chat/completions".into(),
            ],
            true,
        );
        let err = provider
            .send(&messages(), &[], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(ref f) if f.contains("127.0.0.1:2")));
    }

    #[tokio::test]
    async fn test_no_endpoints_is_unavailable() {
        let provider = provider(Vec::new(), true);
        let err = provider
            .send(&messages(), &[], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(answer_body("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = BackendConfig::new("slow", "k", vec![server.uri()])
            .with_timeout(Duration::from_millis(200));
        let provider = OpenAiCompatProvider::from_config(config).unwrap();
        let err = provider
            .send(&messages(), &[], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_toolless_backend_omits_tool_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("plain")))
            .mount(&server)
            .await;

        let provider = provider(vec![server.uri()], false);
        provider
            .send(&messages(), &[search_tool()], &GenerationOptions::default())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = requests[0].body_json().unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello?");
    }

    #[tokio::test]
    async fn test_round_trip_wire_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("ok")))
            .mount(&server)
            .await;

        let call = ToolCall::new("call_1", "web_search", "{\"query\":\"x\"}");
        let mut conversation = messages();
        conversation.push(Message::assistant("").with_tool_calls(vec![call.clone()]));
        conversation.push(Message::tool(&call, "results"));

        let provider = provider(vec![server.uri()], true);
        provider
            .send(&conversation, &[search_tool()], &GenerationOptions::default())
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = requests[0].body_json().unwrap();
        let sent = body["messages"].as_array().unwrap();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2]["role"], "assistant");
        assert!(sent[2]["content"].is_null());
        assert_eq!(sent[2]["tool_calls"][0]["function"]["arguments"], "{\"query\":\"x\"}");
        assert_eq!(sent[3]["role"], "tool");
        assert_eq!(sent[3]["tool_call_id"], "call_1");
        assert_eq!(sent[3]["name"], "web_search");
    }

    #[tokio::test]
    async fn test_preconditions_are_raised() {
        let provider = provider(vec!["http://127.0.0.1:1".into()], true);
        let err = provider
            .send(&[Message::user("no system")], &[], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidConversation(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = BackendConfig::new("b", "secret-key-123", vec![]);
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret-key-123"));
    }
}
