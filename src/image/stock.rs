use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;

use super::{AspectHint, ImageReference, ImageSource, ImageTier};
use crate::{
    config::ProviderConfig,
    error::{Error, Result},
};

const PROVIDER: &str = "stock-photo";

/// 构造搜索词时丢弃的填充词和连接词
const STOP_WORDS: &[&str] = &[
    "create", "generate", "modern", "professional", "banner", "image", "illustration", "design",
    "style", "theme", "clean", "composition", "minimalist", "background", "featuring", "showing",
    "with", "about", "from", "into", "that", "this", "your", "blog", "post", "cover", "text",
    "high", "quality", "detailed",
];

/// 附加在搜索词末尾的领域限定词
const DOMAIN_QUALIFIER: &str = "technology";

/// 搜索词最多保留的有效词数
const MAX_TERMS: usize = 3;

/// 从图片提示词中提取图库搜索词
///
/// 保留长度大于 3 且不在停用词表中的词，最多 3 个，再追加领域限定词。
pub fn search_query(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    let mut terms: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
        .take(MAX_TERMS)
        .collect();
    terms.push(DOMAIN_QUALIFIER);
    terms.join(" ")
}

/// 图库搜索层级
///
/// `GET <endpoint>?query=..&per_page=1`，取第一张结果的 `src.large`。
pub struct StockTier {
    client: reqwest::Client,
    endpoint: String,
}

impl StockTier {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&config.api_key).map_err(|_| {
                Error::Configuration("STOCK_API_KEY is not a valid header value".into())
            })?,
        );

        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Deserialize)]
struct Photo {
    src: PhotoSrc,
}

#[derive(Deserialize)]
struct PhotoSrc {
    large: String,
}

#[async_trait]
impl ImageTier for StockTier {
    fn name(&self) -> &'static str {
        "stock"
    }

    async fn try_resolve(&self, prompt: &str, aspect: AspectHint) -> Result<ImageReference> {
        let query = search_query(prompt);
        let orientation = match aspect {
            AspectHint::Wide => "landscape",
            AspectHint::Square => "square",
        };

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query.as_str()),
                ("per_page", "1"),
                ("orientation", orientation),
            ])
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

        let body: SearchResponse = resp.json().await?;
        let photo = body
            .photos
            .into_iter()
            .next()
            .ok_or_else(|| Error::ProviderResponse {
                provider: PROVIDER,
                reason: format!("no results for `{query}`"),
            })?;

        Ok(ImageReference {
            url: photo.src.large,
            source: ImageSource::Stock,
        })
    }
}
