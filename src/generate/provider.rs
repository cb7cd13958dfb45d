use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::{
    config::TextConfig,
    error::{Error, Result},
};

const PROVIDER: &str = "text-generation";

/// 文本生成服务
pub trait TextProvider {
    /// 发送系统指令和用户指令，返回原始文本响应
    fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> impl std::future::Future<Output = Result<String>>;
}

/// OpenAI 兼容的 chat completions 接口
#[derive(Clone)]
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl ChatCompletionsProvider {
    /// 根据 [`TextConfig`] 创建客户端
    ///
    /// API key 无法作为请求头时返回配置错误。
    pub fn new(config: &TextConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| Error::Configuration("TEXT_API_KEY is not a valid header value".into()))?,
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .timeout(Duration::from_secs(180))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl TextProvider for ChatCompletionsProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest {
                model: &self.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: system,
                    },
                    ChatMessage {
                        role: "user",
                        content: user,
                    },
                ],
                temperature: 0.7,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::ProviderStatus {
                provider: PROVIDER,
                status,
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let body: ChatResponse = resp.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::ProviderResponse {
                provider: PROVIDER,
                reason: "no message content in response".to_string(),
            })
    }
}
