use serde::Serialize;

use crate::{error::Result, slug, storage::Store};

/// 分类体系中的实体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Category,
    Tag,
}

impl TaxonomyKind {
    /// 对应的数据表名
    pub fn table(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Tag => "tags",
        }
    }
}

/// 已持久化的分类或标签
///
/// 身份由 `slug` 决定，`name` 仅为首次创建时的展示名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct EntityRef {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

/// 分类与标签的幂等 get-or-create
///
/// slug 相同即视为同一实体，不做后缀去重。已存在的实体原样返回，展示名不会被覆盖。
pub struct TaxonomyResolver<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> TaxonomyResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// 解析单个名称，规范化为空时使用 [`slug::PLACEHOLDER`]
    pub async fn resolve_one(&self, kind: TaxonomyKind, name: &str) -> Result<EntityRef> {
        let name = name.trim();
        let slug = slug::base_slug(name);
        self.store.upsert_taxonomy(kind, &slug, name).await
    }

    /// 批量解析名称
    ///
    /// - 规范化后为空的名称与 [`resolve_one`](Self::resolve_one) 一样使用占位 slug
    /// - 同一批次中 slug 相同的名称只解析一次，结果保持首次出现的顺序
    /// - 存储层错误直接向上传播
    pub async fn resolve_many<T: AsRef<str>>(
        &self,
        kind: TaxonomyKind,
        names: &[T],
    ) -> Result<Vec<EntityRef>> {
        let mut resolved: Vec<EntityRef> = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref().trim();
            let slug = slug::base_slug(name);
            if resolved.iter().any(|e| e.slug == slug) {
                continue;
            }
            resolved.push(self.store.upsert_taxonomy(kind, &slug, name).await?);
        }

        Ok(resolved)
    }
}
