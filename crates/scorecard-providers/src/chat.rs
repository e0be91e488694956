//! OpenAI-compatible chat completions client, shared by every provider kind.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use scorecard_core::error::ProviderError;
use scorecard_core::traits::{ChatProvider, ChatRequest, ChatResponse};

use crate::kind::ProviderKind;

/// Default hard timeout for one chat request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Chat completions provider for DeepSeek, OpenAI and Zhipu.
pub struct ChatCompletionsProvider {
    kind: ProviderKind,
    api_key: String,
    endpoint: String,
    model: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl ChatCompletionsProvider {
    pub fn new(
        kind: ProviderKind,
        api_key: &str,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        let base_url = base_url.unwrap_or_else(|| kind.default_base_url().to_string());
        Ok(Self {
            kind,
            api_key: api_key.to_string(),
            endpoint: format!(
                "{}{}",
                base_url.trim_end_matches('/'),
                kind.completions_path()
            ),
            model: model.unwrap_or_else(|| kind.default_model().to_string()),
            timeout_secs: timeout.as_secs(),
            client,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull `choices[0].message.content` (and the reported model) out of a body.
fn extract_content(raw: &str) -> Option<(String, Option<String>)> {
    let parsed: CompletionResponse = serde_json::from_str(raw).ok()?;
    let content = parsed.choices.into_iter().next()?.message?.content?;
    Some((content, parsed.model))
}

#[async_trait]
impl ChatProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        match self.kind {
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Zhipu => "zhipu",
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(provider = %self.kind, model = %self.model))]
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        request.validate()?;
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredential(self.kind.to_string()).into());
        }

        let start = Instant::now();
        let body = CompletionRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system_prompt,
                },
                Message {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout_secs)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let raw = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let Some((content, model)) = extract_content(&raw) else {
            warn!(body = %raw, "chat response has no choices[0].message.content");
            return Err(ProviderError::ResponseShape { body: raw }.into());
        };

        Ok(ChatResponse {
            content,
            model: model.unwrap_or_else(|| self.model.clone()),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorecard_core::traits::DEFAULT_SYSTEM_PROMPT;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, key: &str) -> ChatCompletionsProvider {
        ChatCompletionsProvider::new(
            ProviderKind::DeepSeek,
            key,
            Some(server.uri()),
            None,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request(prompt: &str) -> ChatRequest {
        ChatRequest::new(DEFAULT_SYSTEM_PROMPT, prompt)
    }

    fn provider_error(err: &anyhow::Error) -> &ProviderError {
        err.downcast_ref::<ProviderError>()
            .unwrap_or_else(|| panic!("expected ProviderError, got {err:#}"))
    }

    #[tokio::test]
    async fn successful_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "stream": false,
                "messages": [
                    {"role": "system", "content": DEFAULT_SYSTEM_PROMPT},
                    {"role": "user", "content": "写一份反馈"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "整体表现良好。"}}],
                "model": "deepseek-chat-v3"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server, "test-key")
            .complete(&request("写一份反馈"))
            .await
            .unwrap();
        assert_eq!(response.content, "整体表现良好。");
        assert_eq!(response.model, "deepseek-chat-v3");
    }

    #[tokio::test]
    async fn empty_credential_never_reaches_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(&server, "  ")
            .complete(&request("prompt"))
            .await
            .unwrap_err();
        assert!(matches!(
            provider_error(&err),
            ProviderError::MissingCredential(p) if p == "deepseek"
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_prompt_never_reaches_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(&server, "key")
            .complete(&request(""))
            .await
            .unwrap_err();
        assert!(matches!(provider_error(&err), ProviderError::EmptyPrompt));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(&server, "key")
            .complete(&request("prompt"))
            .await
            .unwrap_err();
        match provider_error(&err) {
            ProviderError::ApiError { status, message } => {
                assert_eq!(*status, 500);
                assert_eq!(message, "internal error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_is_authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = provider(&server, "wrong")
            .complete(&request("prompt"))
            .await
            .unwrap_err();
        assert!(matches!(
            provider_error(&err),
            ProviderError::AuthenticationFailed(body) if body == "bad key"
        ));
    }

    #[tokio::test]
    async fn missing_content_is_a_shape_error_with_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = provider(&server, "key")
            .complete(&request("prompt"))
            .await
            .unwrap_err();
        match provider_error(&err) {
            ProviderError::ResponseShape { body } => assert!(body.contains("choices")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(serde_json::json!({
                        "choices": [{"message": {"content": "late"}}]
                    })),
            )
            .mount(&server)
            .await;

        let provider = ChatCompletionsProvider::new(
            ProviderKind::DeepSeek,
            "key",
            Some(server.uri()),
            None,
            Duration::from_millis(200),
        )
        .unwrap();
        let err = provider.complete(&request("prompt")).await.unwrap_err();
        assert!(matches!(provider_error(&err), ProviderError::Timeout(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_a_network_error() {
        // Bind and drop a listener so the port is known to be closed.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let provider = ChatCompletionsProvider::new(
            ProviderKind::DeepSeek,
            "key",
            Some(format!("http://{addr}")),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        let err = provider.complete(&request("prompt")).await.unwrap_err();
        let provider_err = provider_error(&err);
        assert!(
            matches!(provider_err, ProviderError::NetworkError(_)),
            "expected NetworkError, got {provider_err:?}"
        );
        assert!(provider_err.is_transport());
        assert!(!provider_err.is_validation());
    }

    #[test]
    fn endpoints_per_kind() {
        let make = |kind| {
            ChatCompletionsProvider::new(kind, "k", None, None, Duration::from_secs(1)).unwrap()
        };
        assert_eq!(
            make(ProviderKind::DeepSeek).endpoint(),
            "https://api.deepseek.com/chat/completions"
        );
        assert_eq!(
            make(ProviderKind::OpenAi).endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
        let zhipu = make(ProviderKind::Zhipu);
        assert_eq!(
            zhipu.endpoint(),
            "https://open.bigmodel.cn/api/paas/v4/chat/completions"
        );
        assert_eq!(zhipu.model(), "glm-4-flash");
    }

    #[test]
    fn extract_content_handles_partial_bodies() {
        assert!(extract_content("not json").is_none());
        assert!(extract_content(r#"{"choices": [{"message": {}}]}"#).is_none());
        assert!(extract_content(r#"{"choices": [{"message": {"content": null}}]}"#).is_none());
        assert_eq!(
            extract_content(r#"{"choices": [{"message": {"content": "hi"}}]}"#),
            Some(("hi".to_string(), None))
        );
    }
}
