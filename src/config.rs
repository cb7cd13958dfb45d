use std::{env, time::Duration};

use crate::error::{Error, Result};

const DEFAULT_TEXT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_IMAGE_API_URL: &str =
    "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-schnell";
const DEFAULT_STOCK_API_URL: &str = "https://api.pexels.com/v1/search";
const DEFAULT_DELAY_SECS: u64 = 5;
const DEFAULT_AUTHOR_NAME: &str = "Editorial Bot";

/// 文本生成服务配置
#[derive(Debug, Clone)]
pub struct TextConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

/// 单个图片服务配置
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: String,
}

/// 图片服务配置，未配置 key 的层级被禁用
#[derive(Debug, Clone, Default)]
pub struct ImageConfig {
    pub generative: Option<ProviderConfig>,
    pub stock: Option<ProviderConfig>,
}

/// 运行配置
#[derive(Debug, Clone)]
pub struct Config {
    /// 试运行时可以为空
    pub database_url: Option<String>,
    pub text: TextConfig,
    pub image: ImageConfig,
    /// 相邻主题之间的固定等待时间
    pub delay: Duration,
    /// 默认作者的展示名
    pub author_name: String,
}

impl Config {
    /// 从环境变量读取配置
    ///
    /// - `DATABASE_URL`：`require_database` 为真时必需
    /// - `TEXT_API_KEY`：必需
    /// - `TEXT_API_URL`、`TEXT_MODEL`：可选
    /// - `IMAGE_API_URL`、`IMAGE_API_KEY`：可选，无 key 时禁用生成图层级
    /// - `STOCK_API_URL`、`STOCK_API_KEY`：可选，无 key 时禁用图库层级
    /// - `AUTOPUB_DELAY_SECS`：可选，默认 5 秒
    /// - `AUTOPUB_AUTHOR_NAME`：可选
    pub fn from_env(require_database: bool) -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), require_database)
    }

    /// 从任意键值来源读取配置
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        require_database: bool,
    ) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| Error::Configuration(format!("`{key}` is not set")))
        };

        let database_url = if require_database {
            Some(required("DATABASE_URL")?)
        } else {
            get("DATABASE_URL")
        };

        let text = TextConfig {
            endpoint: get("TEXT_API_URL").unwrap_or_else(|| DEFAULT_TEXT_API_URL.to_string()),
            api_key: required("TEXT_API_KEY")?,
            model: get("TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
        };

        let provider = |url_key: &str, key_key: &str, default_url: &str| {
            get(key_key).map(|api_key| ProviderConfig {
                endpoint: get(url_key).unwrap_or_else(|| default_url.to_string()),
                api_key,
            })
        };

        let image = ImageConfig {
            generative: provider("IMAGE_API_URL", "IMAGE_API_KEY", DEFAULT_IMAGE_API_URL),
            stock: provider("STOCK_API_URL", "STOCK_API_KEY", DEFAULT_STOCK_API_URL),
        };

        let delay = match get("AUTOPUB_DELAY_SECS") {
            Some(v) => v.trim().parse::<u64>().map_err(|_| {
                Error::Configuration(format!("`AUTOPUB_DELAY_SECS` is not a number: {v}"))
            })?,
            None => DEFAULT_DELAY_SECS,
        };

        Ok(Self {
            database_url,
            text,
            image,
            delay: Duration::from_secs(delay),
            author_name: get("AUTOPUB_AUTHOR_NAME")
                .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
        })
    }
}
