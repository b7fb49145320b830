//! OpenAI-compatible Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Talks to any server exposing the Chat Completions API; `ChatOpenAI::ollama` points it at
//! Ollama's `/v1` endpoint. Tools set with `with_tools` are sent on every request, so the
//! response may carry `tool_calls`. Token usage is read from the response when present.
//!
//! **Interaction**: Implements `LlmClient`; used by the reasoning node like `MockLlm`.
//! Depends on `async_openai` (feature `openai`).

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::{Message, Usage};
use crate::state::ToolCall;
use crate::tool_source::ToolSpec;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionTools,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
    },
    Client,
};

/// Chat Completions client implementing `LlmClient`.
///
/// Build with `ChatOpenAI::ollama` for a local Ollama server, or `with_config` for any
/// OpenAI-compatible endpoint.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    tools: Option<Vec<ToolSpec>>,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            tools: None,
            temperature: None,
        }
    }

    /// Client for an Ollama server at `host:port` (OpenAI-compatible API under `/v1`).
    /// Ollama ignores the API key but the client requires one.
    pub fn ollama(host: &str, port: u16, model: impl Into<String>) -> Self {
        Self::with_config(ollama_config(host, port), model)
    }

    /// Set tools for this completion (enables tool_calls in response).
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Convert our `Message` list to request messages, including assistant tool calls and
    /// tool results so the model sees the whole tool loop.
    fn messages_to_request(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        let build_err =
            |e: async_openai::error::OpenAIError| AgentError::ExecutionFailed(e.to_string());
        messages
            .iter()
            .map(|m| {
                Ok(match m {
                    Message::System(s) => ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessage::from(s.as_str()),
                    ),
                    Message::User(s) => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessage::from(s.as_str()),
                    ),
                    Message::Assistant(a) => {
                        let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                        args.content(a.content.as_str());
                        if a.has_tool_calls() {
                            let calls: Vec<ChatCompletionMessageToolCalls> = a
                                .tool_calls
                                .iter()
                                .enumerate()
                                .map(|(i, tc)| {
                                    ChatCompletionMessageToolCalls::Function(
                                        ChatCompletionMessageToolCall {
                                            id: tc.call_id(i),
                                            function: FunctionCall {
                                                name: tc.name.clone(),
                                                arguments: tc.arguments.clone(),
                                            },
                                        },
                                    )
                                })
                                .collect();
                            args.tool_calls(calls);
                        }
                        ChatCompletionRequestMessage::Assistant(args.build().map_err(build_err)?)
                    }
                    Message::Tool(t) => ChatCompletionRequestMessage::Tool(
                        ChatCompletionRequestToolMessageArgs::default()
                            .content(t.content.as_str())
                            .tool_call_id(t.call_id.clone().unwrap_or_default())
                            .build()
                            .map_err(build_err)?,
                    ),
                })
            })
            .collect()
    }
}

fn ollama_config(host: &str, port: u16) -> OpenAIConfig {
    OpenAIConfig::new()
        .with_api_base(format!("http://{}:{}/v1", host, port))
        .with_api_key("ollama")
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let openai_messages = Self::messages_to_request(messages)?;
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(openai_messages);

        if let Some(ref tools) = self.tools {
            let chat_tools: Vec<ChatCompletionTools> = tools
                .iter()
                .map(|t| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: Some(t.input_schema.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            args.tools(chat_tools);
        }

        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        let request = args.build().map_err(|e| {
            AgentError::ExecutionFailed(format!("chat request build failed: {}", e))
        })?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::InferenceUnavailable(e.to_string()))?;

        let usage = response
            .usage
            .as_ref()
            .map(|u| Usage::new(u.prompt_tokens as u64, u.completion_tokens as u64));

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AgentError::InferenceUnavailable("chat completion returned no choices".to_string())
        })?;

        let msg = choice.message;
        let content = msg.content.unwrap_or_default();
        let tool_calls: Vec<ToolCall> = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| {
                if let ChatCompletionMessageToolCalls::Function(f) = tc {
                    Some(ToolCall {
                        name: f.function.name,
                        arguments: f.function.arguments,
                        id: Some(f.id),
                    })
                } else {
                    None
                }
            })
            .collect();

        Ok(LlmResponse {
            content,
            tool_calls,
            usage,
        })
    }
}

#[cfg(all(test, feature = "openai"))]
mod tests {
    use super::*;
    use crate::message::{AssistantMessage, ToolMessage};

    /// **Scenario**: Builder chain with_tools and with_temperature builds.
    #[test]
    fn chat_openai_builder_chain() {
        let tools = vec![ToolSpec {
            name: "search_manual".into(),
            description: None,
            input_schema: serde_json::json!({}),
        }];
        let _ = ChatOpenAI::ollama("localhost", 11434, "llama3.2")
            .with_tools(tools)
            .with_temperature(0.0);
    }

    /// **Scenario**: The Ollama config points at the /v1 API of the given host and port.
    #[test]
    fn ollama_config_api_base() {
        use async_openai::config::Config;
        let config = ollama_config("gpu-box", 8080);
        assert_eq!(config.api_base(), "http://gpu-box:8080/v1");
    }

    /// **Scenario**: The whole tool loop converts: assistant tool calls and tool results keep ids.
    #[test]
    fn messages_to_request_includes_tool_loop() {
        let messages = vec![
            Message::system("sys"),
            Message::user("what is fuse 33 for?"),
            Message::Assistant(AssistantMessage::new(
                "",
                vec![ToolCall {
                    name: "search_manual".into(),
                    arguments: r#"{"question":"fuse 33"}"#.into(),
                    id: Some("call_a".into()),
                }],
                None,
            )),
            Message::Tool(ToolMessage {
                call_id: Some("call_a".into()),
                name: "search_manual".into(),
                content: "Fuse 33: trailer brake".into(),
                is_error: false,
            }),
        ];
        let request = ChatOpenAI::messages_to_request(&messages).unwrap();
        assert_eq!(request.len(), 4);
        match &request[2] {
            ChatCompletionRequestMessage::Assistant(a) => {
                let calls = a.tool_calls.as_ref().expect("tool calls");
                assert_eq!(calls.len(), 1);
            }
            other => panic!("expected assistant, got {:?}", other),
        }
        match &request[3] {
            ChatCompletionRequestMessage::Tool(t) => assert_eq!(t.tool_call_id, "call_a"),
            other => panic!("expected tool, got {:?}", other),
        }
    }

    /// **Scenario**: A call without a provider id is sent as call_0 on both the request and
    /// the result.
    #[test]
    fn messages_to_request_pairs_missing_ids() {
        let call = ToolCall {
            name: "search_web".into(),
            arguments: r#"{"query":"f-150 recall"}"#.into(),
            id: None,
        };
        let messages = vec![
            Message::Assistant(AssistantMessage::new("", vec![call.clone()], None)),
            Message::Tool(ToolMessage {
                call_id: Some(call.call_id(0)),
                name: "search_web".into(),
                content: "no recalls".into(),
                is_error: false,
            }),
        ];
        let request = ChatOpenAI::messages_to_request(&messages).unwrap();
        let sent_id = match &request[0] {
            ChatCompletionRequestMessage::Assistant(a) => {
                match &a.tool_calls.as_ref().expect("tool calls")[0] {
                    ChatCompletionMessageToolCalls::Function(f) => f.id.clone(),
                    other => panic!("expected function call, got {:?}", other),
                }
            }
            other => panic!("expected assistant, got {:?}", other),
        };
        match &request[1] {
            ChatCompletionRequestMessage::Tool(t) => assert_eq!(t.tool_call_id, sent_id),
            other => panic!("expected tool, got {:?}", other),
        }
        assert_eq!(sent_id, "call_0");
    }
}
