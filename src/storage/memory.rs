use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::Local;

use crate::{
    error::{Error, Result},
    storage::{NewPost, Post, Store},
    taxonomy::{EntityRef, TaxonomyKind},
};

/// 进程内的 [`Store`] 实现
///
/// 约束语义与 [`super::PgStore`] 一致：分类/标签、文章、作者都以 slug 或 key 唯一。
/// 用于试运行（不写数据库）和测试。
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    taxonomy: HashMap<(TaxonomyKind, String), EntityRef>,
    posts: Vec<Post>,
    authors: HashMap<String, i64>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // 锁内不会 panic，中毒时直接沿用内部数据
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 已写入的文章，按写入顺序
    pub fn posts(&self) -> Vec<Post> {
        self.lock().posts.clone()
    }

    /// 按 slug 查找文章
    pub fn post(&self, slug: &str) -> Option<Post> {
        self.lock().posts.iter().find(|p| p.slug == slug).cloned()
    }

    /// 某一种类下的全部分类/标签，按 id 排序
    pub fn taxonomy(&self, kind: TaxonomyKind) -> Vec<EntityRef> {
        let mut entities: Vec<_> = self
            .lock()
            .taxonomy
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, e)| e.clone())
            .collect();
        entities.sort_by_key(|e| e.id);
        entities
    }

    /// 作者数量
    pub fn author_count(&self) -> usize {
        self.lock().authors.len()
    }
}

impl Store for MemoryStore {
    async fn upsert_taxonomy(
        &self,
        kind: TaxonomyKind,
        slug: &str,
        name: &str,
    ) -> Result<EntityRef> {
        let mut inner = self.lock();
        if let Some(existing) = inner.taxonomy.get(&(kind, slug.to_string())) {
            return Ok(existing.clone());
        }

        let entity = EntityRef {
            id: inner.next_id(),
            slug: slug.to_string(),
            name: name.to_string(),
        };
        inner
            .taxonomy
            .insert((kind, slug.to_string()), entity.clone());
        Ok(entity)
    }

    async fn post_slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.lock().posts.iter().any(|p| p.slug == slug))
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let mut inner = self.lock();
        if inner.posts.iter().any(|p| p.slug == post.slug) {
            return Err(Error::SlugTaken(post.slug));
        }

        let post = Post::from_new(inner.next_id(), Local::now(), post);
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn ensure_default_author(&self, key: &str, _name: &str) -> Result<i64> {
        let mut inner = self.lock();
        if let Some(id) = inner.authors.get(key) {
            return Ok(*id);
        }

        let id = inner.next_id();
        inner.authors.insert(key.to_string(), id);
        Ok(id)
    }
}
