mod fallback;
mod generative;
mod stock;

pub use self::{
    fallback::{STATIC_POOL, prompt_hash},
    generative::GenerativeTier,
    stock::{StockTier, search_query},
};

use async_trait::async_trait;
use serde::Serialize;

use crate::{config::ImageConfig, error::Result};

/// 图片比例
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectHint {
    /// 封面横图
    Wide,
    /// 卡片方图
    Square,
}

impl AspectHint {
    /// 生成图片时使用的像素尺寸 `(width, height)`
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AspectHint::Wide => (1344, 768),
            AspectHint::Square => (1024, 1024),
        }
    }
}

/// 图片来自哪一层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Generative,
    Stock,
    StaticPool,
}

/// 可直接展示的图片引用（URL 或 data URI）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    pub url: String,
    pub source: ImageSource,
}

/// 回退链中的一个层级
#[async_trait]
pub trait ImageTier: Send + Sync {
    /// 日志中使用的层级标识
    fn name(&self) -> &'static str;

    async fn try_resolve(&self, prompt: &str, aspect: AspectHint) -> Result<ImageReference>;
}

/// 分层回退的图片解析器
///
/// 依次尝试每个层级，前一层失败才尝试下一层；全部失败时从静态图片池中
/// 按提示词哈希取一张，因此 [`ImageResolver::resolve`] 总能返回结果。
#[derive(Default)]
pub struct ImageResolver {
    tiers: Vec<Box<dyn ImageTier>>,
}

impl ImageResolver {
    /// 只有静态图片池的解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 在回退链末尾（静态图片池之前）追加一个层级
    pub fn with_tier(mut self, tier: impl ImageTier + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    /// 根据配置组装回退链：生成图 → 图库搜索 → 静态图片池
    pub fn from_config(config: &ImageConfig) -> Result<Self> {
        let mut resolver = Self::new();

        match &config.generative {
            Some(c) => resolver = resolver.with_tier(GenerativeTier::new(c)?),
            None => tracing::info!(tier = "generative", "image tier disabled, no api key"),
        }
        match &config.stock {
            Some(c) => resolver = resolver.with_tier(StockTier::new(c)?),
            None => tracing::info!(tier = "stock", "image tier disabled, no api key"),
        }

        Ok(resolver)
    }

    /// 已启用的层级标识，不含静态图片池
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// 解析图片，从不失败
    pub async fn resolve(&self, prompt: &str, aspect: AspectHint) -> ImageReference {
        for tier in &self.tiers {
            match tier.try_resolve(prompt, aspect).await {
                Ok(image) => {
                    tracing::debug!(tier = tier.name(), "image resolved");
                    return image;
                }
                Err(e) => tracing::warn!(tier = tier.name(), error = %e, "image tier failed"),
            }
        }

        fallback::pick(prompt)
    }
}

/// 根据文章标题和分类构造封面图提示词
pub fn cover_prompt(title: &str, category: &str) -> String {
    format!(
        "Create a modern professional blog banner illustration about {title}, {category} theme, clean composition, no text"
    )
}
