use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{AspectHint, ImageReference, ImageSource, ImageTier};
use crate::{
    config::ProviderConfig,
    error::{Error, Result},
};

const PROVIDER: &str = "image-generation";

/// 文生图层级
///
/// 请求体为 `{"inputs": prompt, "parameters": {"width", "height"}}`。响应为图片字节时
/// 编码为 data URI；响应为带 `url` 字段的 JSON 时直接返回该 URL。
pub struct GenerativeTier {
    client: reqwest::Client,
    endpoint: String,
}

impl GenerativeTier {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(|_| {
                Error::Configuration("IMAGE_API_KEY is not a valid header value".into())
            })?,
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[derive(Serialize)]
struct RequestBody<'a> {
    inputs: &'a str,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Parameters {
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct UrlResponse {
    url: String,
}

#[async_trait]
impl ImageTier for GenerativeTier {
    fn name(&self) -> &'static str {
        "generative"
    }

    async fn try_resolve(&self, prompt: &str, aspect: AspectHint) -> Result<ImageReference> {
        let (width, height) = aspect.dimensions();

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&RequestBody {
                inputs: prompt,
                parameters: Parameters { width, height },
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

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        if content_type.starts_with("application/json") {
            let body: UrlResponse = resp.json().await?;
            return Ok(ImageReference {
                url: body.url,
                source: ImageSource::Generative,
            });
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::ProviderResponse {
                provider: PROVIDER,
                reason: "empty image body".to_string(),
            });
        }

        Ok(ImageReference {
            url: data_uri(&content_type, &bytes),
            source: ImageSource::Generative,
        })
    }
}

/// 将图片字节编码为 `data:<mime>;base64,...`
fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    let mime = content_type.split(';').next().unwrap_or(content_type).trim();
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
