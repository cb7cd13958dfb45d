use chrono::{DateTime, Local};
use serde::Serialize;

use crate::{
    error::{Error, ErrorKind},
    image::ImageSource,
    storage::Post,
    topic::Topic,
};

/// 单个主题的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    Generating,
    ImageResolving,
    Publishing,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Pending => "pending",
            Stage::Generating => "generating",
            Stage::ImageResolving => "image-resolving",
            Stage::Publishing => "publishing",
        })
    }
}

/// 单个主题的最终结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded {
        post_id: i64,
        slug: String,
        cover_source: ImageSource,
    },
    Failed {
        stage: Stage,
        kind: ErrorKind,
        reason: String,
    },
    /// 批次被取消，主题未开始处理
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    /// 在输入主题列表中的位置
    pub index: usize,
    pub title: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ItemOutcome {
    pub fn succeeded(index: usize, topic: &Topic, post: &Post, cover_source: ImageSource) -> Self {
        Self {
            index,
            title: topic.title.clone(),
            outcome: Outcome::Succeeded {
                post_id: post.id,
                slug: post.slug.clone(),
                cover_source,
            },
        }
    }

    pub fn failed(index: usize, topic: &Topic, stage: Stage, error: &Error) -> Self {
        Self {
            index,
            title: topic.title.clone(),
            outcome: Outcome::Failed {
                stage,
                kind: error.kind(),
                reason: error.to_string(),
            },
        }
    }

    pub fn skipped(index: usize, topic: &Topic, reason: impl Into<String>) -> Self {
        Self {
            index,
            title: topic.title.clone(),
            outcome: Outcome::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Succeeded { .. })
    }
}

/// 一次批处理的汇总报告，不持久化
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `succeeded / total`，空批次为 0
    pub success_rate: f64,
    /// 与输入主题顺序一致
    pub outcomes: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Local>, outcomes: Vec<ItemOutcome>) -> Self {
        let count = |f: fn(&Outcome) -> bool| outcomes.iter().filter(|o| f(&o.outcome)).count();

        let total = outcomes.len();
        let succeeded = count(|o| matches!(o, Outcome::Succeeded { .. }));
        let failed = count(|o| matches!(o, Outcome::Failed { .. }));
        let skipped = count(|o| matches!(o, Outcome::Skipped { .. }));
        let success_rate = if total == 0 {
            0.0
        } else {
            succeeded as f64 / total as f64
        };

        Self {
            started_at,
            finished_at: Local::now(),
            total,
            succeeded,
            failed,
            skipped,
            success_rate,
            outcomes,
        }
    }

    /// 成功率百分比
    pub fn success_percent(&self) -> f64 {
        self.success_rate * 100.0
    }

    /// 失败的主题
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Failed { .. }))
    }
}
