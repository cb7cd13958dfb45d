use crate::topic::Topic;

/// 固定的系统指令，约束输出为单个 JSON 对象
pub const SYSTEM_CONTRACT: &str = r#"You are a senior technical writer producing SEO-friendly blog articles.

Respond with exactly ONE JSON object and nothing else: no prose before or after it, no code fences.
The object MUST contain these fields:

- "title": string, the article title (non-empty)
- "slug": string, a short lowercase URL slug using hyphens
- "metaDescription": string, 140-160 characters summarizing the article
- "keywords": array of 5 to 12 strings, SEO keywords
- "tags": array of 1 to 5 strings, short topical tags
- "content": string, the full article body as semantic HTML (h2/h3/p/ul/ol/pre/code), at least 1200 words

Do not include any other top-level fields. Escape all quotes and newlines inside strings so the object is valid JSON."#;

/// 根据主题构造用户指令
pub fn user_prompt(topic: &Topic) -> String {
    let mut prompt = format!(
        "Write a comprehensive blog article.\n\nTitle: {}\nCategory: {}\n",
        topic.title, topic.category
    );

    if !topic.keywords.is_empty() {
        prompt.push_str(&format!(
            "Focus keywords (use them naturally): {}\n",
            topic.keyword_line()
        ));
    }

    prompt.push_str("\nReturn only the JSON object described in the instructions.");
    prompt
}
