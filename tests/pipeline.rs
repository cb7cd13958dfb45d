use std::{
    collections::VecDeque,
    sync::Mutex,
    time::{Duration, Instant},
};

use autopub::{
    config::ProviderConfig,
    error::{Error, ErrorKind, Result},
    generate::{ContentGenerator, TextProvider},
    image::{GenerativeTier, ImageResolver, ImageSource, STATIC_POOL, StockTier},
    pipeline::{Outcome, Pipeline, Stage},
    publish::Publisher,
    storage::{MemoryStore, PostStatus},
    taxonomy::TaxonomyKind,
    topic::Topic,
};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::any};

/// 按调用顺序返回预设响应的文本生成服务
struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String>>>,
    /// 第一次调用时触发取消
    cancel_on_first_call: Option<CancellationToken>,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            cancel_on_first_call: None,
        }
    }
}

impl TextProvider for ScriptedProvider {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        if let Some(token) = &self.cancel_on_first_call {
            token.cancel();
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("调用次数超过预设响应数量")
    }
}

fn article(title: &str, tags: &[&str]) -> Result<String> {
    Ok(serde_json::json!({
        "title": title,
        "metaDescription": format!("All about {title}."),
        "keywords": ["one", "two", "three", "four", "five"],
        "tags": tags,
        "content": "<p>".to_string() + &"lorem ".repeat(320) + "</p>",
    })
    .to_string())
}

fn transport_failure() -> Result<String> {
    Err(Error::ProviderStatus {
        provider: "text-generation",
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "upstream overloaded".to_string(),
    })
}

fn topics() -> Vec<Topic> {
    vec![
        Topic::new("Rust for backend services", "Programming", ["rust", "axum"]),
        Topic::new("Vector search basics", "AI Tools", ["embeddings"]),
        Topic::new("Postgres indexing", "Databases", ["btree", "gin"]),
    ]
}

fn pipeline(provider: ScriptedProvider) -> Pipeline<ScriptedProvider, MemoryStore> {
    Pipeline::new(
        ContentGenerator::new(provider),
        ImageResolver::new(),
        Publisher::new(MemoryStore::default(), "Editorial Bot"),
    )
}

#[tokio::test]
async fn test_single_failure_does_not_abort_batch() {
    let pipeline = pipeline(ScriptedProvider::new(vec![
        article("Rust for Backend Services", &["Rust"]),
        transport_failure(),
        article("Postgres Indexing", &["Postgres", "Performance"]),
    ]));

    let report = pipeline.run(&topics(), Duration::ZERO).await;

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert!((report.success_rate - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(format!("{:.1}", report.success_percent()), "66.7");

    let indexes: Vec<_> = report.outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indexes, vec![0, 1, 2], "报告应保持输入顺序");
    assert_eq!(report.outcomes[1].title, "Vector search basics");

    match &report.outcomes[1].outcome {
        Outcome::Failed { stage, kind, .. } => {
            assert_eq!(*stage, Stage::Generating);
            assert_eq!(*kind, ErrorKind::Transport);
        }
        other => panic!("第二个主题应失败，实际为 {other:?}"),
    }

    let store = pipeline.publisher().store();
    let posts = store.posts();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.status == PostStatus::Published));
    assert_eq!(posts[0].slug, "rust-for-backend-services");
    assert_eq!(posts[1].slug, "postgres-indexing");
    assert_eq!(store.taxonomy(TaxonomyKind::Category).len(), 2);
}

#[tokio::test]
async fn test_extraction_failure_is_recorded() {
    let pipeline = pipeline(ScriptedProvider::new(vec![Ok(
        "Sorry, here is a draft: {\"title\": \"oops\"".to_string(),
    )]));

    let report = pipeline.run(&topics()[..1], Duration::ZERO).await;

    assert_eq!(report.failed, 1);
    assert!(matches!(
        report.outcomes[0].outcome,
        Outcome::Failed {
            stage: Stage::Generating,
            kind: ErrorKind::Extraction,
            ..
        }
    ));
    assert!(pipeline.publisher().store().posts().is_empty());
}

#[tokio::test]
async fn test_failing_image_tiers_fall_back_to_static_pool() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = |path: &str| ProviderConfig {
        endpoint: format!("{}{path}", server.uri()),
        api_key: "key".to_string(),
    };
    let images = ImageResolver::new()
        .with_tier(GenerativeTier::new(&provider("/generate")).unwrap())
        .with_tier(StockTier::new(&provider("/search")).unwrap());

    let pipeline = Pipeline::new(
        ContentGenerator::new(ScriptedProvider::new(vec![article(
            "Rust for Backend Services",
            &["Rust"],
        )])),
        images,
        Publisher::new(MemoryStore::default(), "Editorial Bot"),
    );

    let report = pipeline.run(&topics()[..1], Duration::ZERO).await;

    assert_eq!(report.succeeded, 1);
    assert!(matches!(
        report.outcomes[0].outcome,
        Outcome::Succeeded {
            cover_source: ImageSource::StaticPool,
            ..
        }
    ));

    let post = &pipeline.publisher().store().posts()[0];
    assert!(STATIC_POOL.contains(&post.cover_image_url.as_str()));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2, "两个层级都应被尝试一次");
}

#[tokio::test]
async fn test_cancel_is_checked_between_items() {
    let cancel = CancellationToken::new();
    let provider = ScriptedProvider {
        script: Mutex::new(vec![article("Rust for Backend Services", &["Rust"])].into()),
        cancel_on_first_call: Some(cancel.clone()),
    };
    let pipeline = pipeline(provider);

    let report = pipeline
        .run_with_cancel(&topics(), Duration::from_secs(3600), &cancel)
        .await;

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 1, "进行中的主题应执行完");
    assert_eq!(report.skipped, 2);
    assert!(matches!(
        report.outcomes[2].outcome,
        Outcome::Skipped { .. }
    ));
}

#[tokio::test]
async fn test_delay_between_items_only() {
    let delay = Duration::from_millis(40);
    let pipeline = pipeline(ScriptedProvider::new(vec![
        transport_failure(),
        transport_failure(),
        transport_failure(),
    ]));

    let started = Instant::now();
    let report = pipeline.run(&topics(), delay).await;

    assert_eq!(report.failed, 3);
    assert!(started.elapsed() >= delay * 2, "三个主题之间应等待两次");
}

#[tokio::test]
async fn test_duplicate_titles_get_distinct_slugs() {
    let pipeline = pipeline(ScriptedProvider::new(vec![
        article("Same Title", &["A"]),
        article("Same Title", &["A"]),
    ]));
    let topics = vec![
        Topic::new("Same Title", "General", ["x"]),
        Topic::new("Same Title", "General", ["x"]),
    ];

    let report = pipeline.run(&topics, Duration::ZERO).await;

    let slugs: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| match &o.outcome {
            Outcome::Succeeded { slug, .. } => Some(slug.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(slugs, vec!["same-title", "same-title-2"]);
    assert_eq!(
        pipeline.publisher().store().taxonomy(TaxonomyKind::Tag).len(),
        1
    );
}
