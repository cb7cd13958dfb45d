use std::io;

use reqwest::StatusCode;
use serde::Serialize;

pub type Result<T> = core::result::Result<T, Error>;

/// 生成结果解析失败
///
/// 两个变体都保留了原始响应文本，便于排查供应商输出质量问题。
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("malformed structured response: {reason}")]
    Malformed { reason: String, raw: String },

    #[error("required field `{field}` is missing or empty")]
    MissingField { field: &'static str, raw: String },
}

impl ExtractionError {
    /// 原始响应文本
    pub fn raw(&self) -> &str {
        match self {
            ExtractionError::Malformed { raw, .. } | ExtractionError::MissingField { raw, .. } => raw,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("{provider} responded with {status}: {body}")]
    ProviderStatus {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{provider} returned an unusable response: {reason}")]
    ProviderResponse {
        provider: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Persistence(#[from] sqlx::Error),

    #[error("slug already taken: {0}")]
    SlugTaken(String),

    #[error("no free slug left for `{0}`")]
    SlugExhausted(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// 错误分类，写入运行报告
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Extraction,
    Persistence,
    Configuration,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) | Error::ProviderStatus { .. } | Error::ProviderResponse { .. } => {
                ErrorKind::Transport
            }
            Error::Extraction(_) => ErrorKind::Extraction,
            Error::Persistence(_) | Error::SlugTaken(_) | Error::SlugExhausted(_) => {
                ErrorKind::Persistence
            }
            Error::Configuration(_) | Error::Toml(_) | Error::Io(_) => ErrorKind::Configuration,
        }
    }

    /// 是否为致命错误
    ///
    /// 配置错误在处理任何主题之前就应终止整个批次。
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}
