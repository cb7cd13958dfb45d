mod prompt;
mod provider;

pub use self::{
    prompt::{SYSTEM_CONTRACT, user_prompt},
    provider::{ChatCompletionsProvider, TextProvider},
};

use crate::{
    error::Result,
    extract::{self, GeneratedContent},
    topic::Topic,
};

/// 按固定系统指令为主题生成内容
///
/// 每个主题只调用一次供应商，不做重试。
pub struct ContentGenerator<P> {
    provider: P,
}

impl<P: TextProvider> ContentGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// 生成并解析内容
    ///
    /// 传输错误和 [`crate::error::ExtractionError`] 原样返回。
    pub async fn generate(&self, topic: &Topic) -> Result<GeneratedContent> {
        let raw = self
            .provider
            .complete(SYSTEM_CONTRACT, &user_prompt(topic))
            .await?;

        tracing::debug!(bytes = raw.len(), "received generation response");

        extract::extract(&raw).map_err(|e| {
            tracing::warn!(error = %e, raw = %truncate(e.raw(), 200), "failed to extract content");
            e.into()
        })
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
