use chrono::{DateTime, Local};
use serde::Serialize;

/// 文章状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "DRAFT",
            PostStatus::Published => "PUBLISHED",
        }
    }
}

/// 待写入的文章
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    /// 全局唯一，首次写入后不再变化
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub status: PostStatus,
    /// 仅在进入 [`PostStatus::Published`] 时设置
    pub published_at: Option<DateTime<Local>>,
    pub author_id: i64,
    pub category_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
    pub reading_time_minutes: i32,
    pub cover_image_url: String,
}

/// 已持久化的文章
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Local>>,
    pub author_id: i64,
    pub category_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
    pub reading_time_minutes: i32,
    pub cover_image_url: String,
    pub created_at: DateTime<Local>,
}

impl Post {
    /// 由 [`NewPost`] 和存储层分配的 id、创建时间组装
    pub fn from_new(id: i64, created_at: DateTime<Local>, post: NewPost) -> Self {
        Self {
            id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            body: post.body,
            meta_description: post.meta_description,
            keywords: post.keywords,
            status: post.status,
            published_at: post.published_at,
            author_id: post.author_id,
            category_ids: post.category_ids,
            tag_ids: post.tag_ids,
            reading_time_minutes: post.reading_time_minutes,
            cover_image_url: post.cover_image_url,
            created_at,
        }
    }
}
