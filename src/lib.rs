pub mod config;
pub mod error;
pub mod extract;
pub mod generate;
pub mod image;
pub mod pipeline;
pub mod publish;
pub mod slug;
pub mod storage;
pub mod taxonomy;
pub mod topic;

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use config::Config;
use error::{Error, Result};
use generate::{ChatCompletionsProvider, ContentGenerator};
use image::ImageResolver;
use pipeline::{Pipeline, RunReport};
use publish::Publisher;
use storage::{MemoryStore, PgStore, Store};
use topic::Topic;

/// 初始化日志，过滤规则读取自环境变量 `AUTOPUB_LOG`
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("AUTOPUB_LOG"))
        .init();
}

/// 一次批处理的启动参数
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 主题列表文件（TOML）
    pub topics_path: PathBuf,
    /// 试运行：结果只写入内存，不连接数据库
    pub dry_run: bool,
}

/// 读取配置和主题，执行一次完整的批处理
///
/// 配置错误（缺少凭据、主题文件无效、数据库无法连接）在处理任何主题之前返回；
/// 之后的所有单个主题错误都记录在 [`RunReport`] 中。
pub async fn run(options: RunOptions, cancel: CancellationToken) -> Result<RunReport> {
    let config = Config::from_env(!options.dry_run)?;
    let topics = topic::load_topics(&options.topics_path)?;

    tracing::info!(
        topics = topics.len(),
        path = %options.topics_path.display(),
        dry_run = options.dry_run,
        "loaded topics"
    );

    match &config.database_url {
        Some(url) if !options.dry_run => {
            let pool = storage::connect(url)
                .await
                .map_err(|e| Error::Configuration(format!("cannot connect to database: {e}")))?;
            storage::migrate(&pool).await?;
            execute(&config, &topics, PgStore::new(pool), &cancel).await
        }
        _ => execute(&config, &topics, MemoryStore::default(), &cancel).await,
    }
}

async fn execute<S: Store>(
    config: &Config,
    topics: &[Topic],
    store: S,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    let generator = ContentGenerator::new(ChatCompletionsProvider::new(&config.text)?);
    let images = ImageResolver::from_config(&config.image)?;
    let publisher = Publisher::new(store, config.author_name.clone());

    let pipeline = Pipeline::new(generator, images, publisher);
    Ok(pipeline.run_with_cancel(topics, config.delay, cancel).await)
}
