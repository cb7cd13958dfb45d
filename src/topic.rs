use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 一个待生成内容的主题
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Topic {
    pub title: String,
    /// 分类名，自由文本
    pub category: String,
    /// 关键词，仅用于提示词强调
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Topic {
    pub fn new<I, K>(title: impl Into<String>, category: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            title: title.into(),
            category: category.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// 以逗号拼接的关键词
    pub fn keyword_line(&self) -> String {
        self.keywords.join(", ")
    }
}

#[derive(Deserialize)]
struct TopicFile {
    #[serde(default)]
    topics: Vec<Topic>,
}

/// 从 TOML 文件读取主题列表
///
/// ```toml
/// [[topics]]
/// title = "Getting started with Rust async"
/// category = "Programming"
/// keywords = ["rust", "tokio", "async"]
/// ```
pub fn load_topics(path: impl AsRef<Path>) -> Result<Vec<Topic>> {
    let content = std::fs::read_to_string(path)?;
    parse_topics(&content)
}

/// 解析 TOML 文本形式的主题列表
///
/// 标题为空的主题视为配置错误。
pub fn parse_topics(content: &str) -> Result<Vec<Topic>> {
    let file: TopicFile = toml::from_str(content)?;

    for (i, topic) in file.topics.iter().enumerate() {
        if topic.title.trim().is_empty() {
            return Err(Error::Configuration(format!("topic #{} has an empty title", i + 1)));
        }
    }

    Ok(file.topics)
}
