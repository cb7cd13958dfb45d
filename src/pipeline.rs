mod report;

pub use self::report::{ItemOutcome, Outcome, RunReport, Stage};

use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    generate::{ContentGenerator, TextProvider},
    image::{self, AspectHint, ImageResolver},
    publish::Publisher,
    storage::Store,
    topic::Topic,
};

/// 批处理编排
///
/// 严格串行地处理每个主题：生成 → 解析图片 → 发布。单个主题失败不会中止批次，
/// 相邻主题之间固定等待 `delay`，以避开供应商的速率限制。
pub struct Pipeline<P, S> {
    generator: ContentGenerator<P>,
    images: ImageResolver,
    publisher: Publisher<S>,
}

impl<P: TextProvider, S: Store> Pipeline<P, S> {
    pub fn new(
        generator: ContentGenerator<P>,
        images: ImageResolver,
        publisher: Publisher<S>,
    ) -> Self {
        Self {
            generator,
            images,
            publisher,
        }
    }

    pub fn publisher(&self) -> &Publisher<S> {
        &self.publisher
    }

    /// 处理全部主题
    pub async fn run(&self, topics: &[Topic], delay: Duration) -> RunReport {
        self.run_with_cancel(topics, delay, &CancellationToken::new())
            .await
    }

    /// 处理全部主题，`cancel` 只在主题之间检查
    ///
    /// 正在处理的主题总会执行完；取消后剩余主题记为跳过，报告中不会丢失任何主题。
    pub async fn run_with_cancel(
        &self,
        topics: &[Topic],
        delay: Duration,
        cancel: &CancellationToken,
    ) -> RunReport {
        let started_at = Local::now();
        let mut outcomes = Vec::with_capacity(topics.len());

        tracing::info!(total = topics.len(), ?delay, "batch started");

        for (index, topic) in topics.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::debug!(index, stage = %Stage::Pending, "topic skipped");
                outcomes.push(ItemOutcome::skipped(index, topic, "cancelled"));
                continue;
            }

            let span = tracing::info_span!("topic", index, title = %topic.title);
            let outcome = self.process(index, topic).instrument(span).await;
            outcomes.push(outcome);

            if index + 1 < topics.len() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => {
                        tracing::info!("batch cancelled, skipping remaining topics");
                    }
                }
            }
        }

        let report = RunReport::new(started_at, outcomes);
        let success_rate = format!("{:.1}%", report.success_percent());
        tracing::info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            success_rate = %success_rate,
            "batch finished"
        );
        report
    }

    async fn process(&self, index: usize, topic: &Topic) -> ItemOutcome {
        tracing::debug!(stage = %Stage::Generating);
        let content = match self.generator.generate(topic).await {
            Ok(content) => content,
            Err(e) => return fail(index, topic, Stage::Generating, e),
        };

        tracing::debug!(stage = %Stage::ImageResolving);
        let cover = self
            .images
            .resolve(
                &image::cover_prompt(&content.title, &topic.category),
                AspectHint::Wide,
            )
            .await;

        tracing::debug!(stage = %Stage::Publishing, cover_source = ?cover.source);
        match self.publisher.publish(&content, topic, &cover).await {
            Ok(post) => {
                tracing::info!(slug = %post.slug, "topic succeeded");
                ItemOutcome::succeeded(index, topic, &post, cover.source)
            }
            Err(e) => fail(index, topic, Stage::Publishing, e),
        }
    }
}

fn fail(index: usize, topic: &Topic, stage: Stage, error: crate::error::Error) -> ItemOutcome {
    tracing::warn!(%stage, kind = ?error.kind(), error = %error, "topic failed");
    ItemOutcome::failed(index, topic, stage, &error)
}
