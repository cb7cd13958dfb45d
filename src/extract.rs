use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// 关键词数量下限（去重后）
pub const MIN_KEYWORDS: usize = 5;
/// 关键词数量上限
pub const MAX_KEYWORDS: usize = 12;
/// 标签数量上限
pub const MAX_TAGS: usize = 5;

/// 从生成结果中提取出的结构化内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedContent {
    pub title: String,
    /// 供应商建议的 slug
    pub slug_hint: Option<String>,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    /// 正文，不校验格式，只要求非空
    pub body_markup: String,
}

/// 供应商输出的原始结构，字段全部可选，缺失由 [`RawContent::validate`] 报告
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContent {
    title: Option<String>,
    #[serde(alias = "slugHint")]
    slug: Option<String>,
    #[serde(alias = "meta_description")]
    meta_description: Option<String>,
    keywords: Option<Vec<String>>,
    tags: Option<Vec<String>>,
    #[serde(alias = "bodyMarkup", alias = "body")]
    content: Option<String>,
}

/// 将原始响应文本解析为 [`GeneratedContent`]
///
/// 依次尝试：
/// 1. 去掉首尾的 ``` 代码块标记后严格解析
/// 2. 截取第一个 `{` 到最后一个 `}` 之间的内容再严格解析
///
/// 都失败时返回 [`ExtractionError`]，绝不构造占位内容。
pub fn extract(raw: &str) -> Result<GeneratedContent, ExtractionError> {
    let parsed = match serde_json::from_str::<RawContent>(strip_code_fence(raw)) {
        Ok(parsed) => parsed,
        Err(fenced_err) => outermost_object(raw)
            .and_then(|object| serde_json::from_str::<RawContent>(object).ok())
            .ok_or_else(|| ExtractionError::Malformed {
                reason: fenced_err.to_string(),
                raw: raw.to_string(),
            })?,
    };

    parsed.validate(raw)
}

/// 去掉首尾的代码块标记（可带语言标识，例如 ```json）
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();

    let text = match text.strip_prefix("```") {
        Some(rest) => match rest.find('\n') {
            Some(i) if is_fence_tag(&rest[..i]) => &rest[i + 1..],
            _ => rest,
        },
        None => text,
    };

    let text = text.trim_end();
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn is_fence_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// 第一个 `{` 到最后一个 `}` 之间的子串（含括号）
pub fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

impl RawContent {
    fn validate(self, raw: &str) -> Result<GeneratedContent, ExtractionError> {
        let missing = |field: &'static str| ExtractionError::MissingField {
            field,
            raw: raw.to_string(),
        };

        let title = non_empty(self.title).ok_or_else(|| missing("title"))?;
        let meta_description =
            non_empty(self.meta_description).ok_or_else(|| missing("metaDescription"))?;
        let body_markup = non_empty(self.content).ok_or_else(|| missing("content"))?;

        let keywords = dedup(self.keywords.unwrap_or_default(), MAX_KEYWORDS);
        if keywords.is_empty() {
            return Err(missing("keywords"));
        }
        if keywords.len() < MIN_KEYWORDS {
            return Err(ExtractionError::Malformed {
                reason: format!(
                    "expected {MIN_KEYWORDS}-{MAX_KEYWORDS} distinct keywords, got {}",
                    keywords.len()
                ),
                raw: raw.to_string(),
            });
        }

        let tags = dedup(self.tags.unwrap_or_default(), MAX_TAGS);
        if tags.is_empty() {
            return Err(missing("tags"));
        }

        Ok(GeneratedContent {
            title,
            slug_hint: non_empty(self.slug),
            meta_description,
            keywords,
            tags,
            body_markup,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 去除空白项与大小写不敏感的重复项，保持原有顺序，最多保留 `limit` 个
fn dedup(values: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    let mut out = Vec::new();

    for value in values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let key = value.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(value.to_string());
        if out.len() == limit {
            break;
        }
    }

    out
}
