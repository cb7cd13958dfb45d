use crate::error::{Error, Result};

/// 规范化结果为空时使用的占位 slug
pub const PLACEHOLDER: &str = "untitled";

/// 同一基础 slug 最多尝试的候选数（含基础 slug 本身）
pub const MAX_CANDIDATES: u32 = 1000;

/// 将任意文本规范化为 URL 安全的 slug
///
/// - 转为小写
/// - 丢弃 `[a-z0-9]`、空白、`-` 以外的字符（包括 `_`）
/// - 连续的空白与 `-` 合并为单个 `-`
/// - 去掉首尾的 `-`
///
/// 结果可能为空字符串，需要非空结果时使用 [`base_slug`]。
pub fn normalize(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_sep = true;
        }
    }

    slug
}

/// 规范化后的基础 slug，保证非空
pub fn base_slug(text: &str) -> String {
    let slug = normalize(text);
    if slug.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        slug
    }
}

/// 依次产出 `base`、`base-2`、`base-3` ……
fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string())
        .chain((2..=MAX_CANDIDATES).map(move |n| format!("{base}-{n}")))
}

/// 解析出一个不与已有 slug 冲突的唯一 slug
///
/// `exists` 判断某个 slug 是否已被占用，解析器本身不访问任何存储。
///
/// ```ignore
/// let slug = slug::resolve("Hello World", |s| s == "hello-world")?;
/// assert_eq!(slug, "hello-world-2");
/// ```
pub fn resolve(candidate: &str, mut exists: impl FnMut(&str) -> bool) -> Result<String> {
    let base = base_slug(candidate);
    let found = candidates(&base).find(|slug| !exists(slug));
    found.ok_or(Error::SlugExhausted(base))
}

/// [`resolve`] 的异步版本，`exists` 可以查询数据库
pub async fn resolve_with<F>(candidate: &str, mut exists: F) -> Result<String>
where
    F: AsyncFnMut(&str) -> Result<bool>,
{
    let base = base_slug(candidate);
    for slug in candidates(&base) {
        if !exists(&slug).await? {
            return Ok(slug);
        }
    }
    Err(Error::SlugExhausted(base))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn is_well_formed(slug: &str) -> bool {
        !slug.is_empty()
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && !slug.contains("--")
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Hello World"), "hello-world");
        assert_eq!(normalize("  Rust & WebAssembly: 2025!  "), "rust-webassembly-2025");
        assert_eq!(normalize("kebab--and  spaces"), "kebab-and-spaces");
        assert_eq!(normalize("AI Tools"), "ai-tools");
        assert_eq!(normalize("C++ vs. Go"), "c-vs-go");
    }

    #[test]
    fn test_normalize_drops_non_ascii() {
        assert_eq!(normalize("Café Ünïcode"), "caf-ncode");
        assert_eq!(normalize("人工智能"), "");
    }

    #[test]
    fn test_underscore_is_dropped() {
        assert_eq!(normalize("snake_case"), "snakecase");
        assert_eq!(normalize("snake_case__and--dashes"), "snakecaseand-dashes");
        assert_eq!(base_slug("___"), PLACEHOLDER);
    }

    #[test]
    fn test_placeholder_for_punctuation_only() {
        assert_eq!(base_slug("!!! ???"), PLACEHOLDER);
        assert_eq!(resolve("---", |_| false).unwrap(), PLACEHOLDER);
    }

    #[test]
    fn test_resolve_appends_suffix() {
        let taken: HashSet<&str> = ["hello-world", "hello-world-2"].into_iter().collect();
        let slug = resolve("Hello, World", |s| taken.contains(s)).unwrap();
        assert_eq!(slug, "hello-world-3");
    }

    #[test]
    fn test_resolve_output_is_well_formed_and_free() {
        let inputs = [
            "Hello World",
            "  --Leading and trailing--  ",
            "tabs\tand\nnewlines",
            "Ünïcode only ü",
            "@@@",
            "2025: The Year of Rust",
        ];
        let taken: HashSet<String> = ["hello-world".to_string()].into_iter().collect();

        for input in inputs {
            let slug = resolve(input, |s| taken.contains(s)).unwrap();
            assert!(is_well_formed(&slug), "slug `{slug}` 格式不正确 (输入 `{input}`)");
            assert!(!taken.contains(&slug), "slug `{slug}` 已存在");
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let a = resolve("Same Input", |s| s == "same-input").unwrap();
        let b = resolve("Same Input", |s| s == "same-input").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_exhausted() {
        let result = resolve("busy", |_| true);
        assert!(matches!(result, Err(Error::SlugExhausted(base)) if base == "busy"));
    }

    #[tokio::test]
    async fn test_resolve_with_async_predicate() {
        let taken = vec!["async-slug".to_string()];
        let slug = resolve_with("Async Slug", async |s: &str| Ok(taken.iter().any(|t| t == s)))
            .await
            .unwrap();
        assert_eq!(slug, "async-slug-2");
    }

    #[tokio::test]
    async fn test_resolve_with_propagates_errors() {
        let result = resolve_with("x", async |_: &str| {
            Err(Error::Configuration("store offline".to_string()))
        })
        .await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
