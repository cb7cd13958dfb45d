use autopub::{
    extract::GeneratedContent,
    image::{ImageReference, ImageSource},
    publish::Publisher,
    storage::{PgStore, Store, connect, migrate},
    taxonomy::{TaxonomyKind, TaxonomyResolver},
    topic::Topic,
};

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let pool = connect(&url).await.expect("连接数据库失败");

    migrate(&pool).await.expect("初始化sql失败");
    sqlx::query("TRUNCATE TABLE post_tags, post_categories, posts, tags, categories, authors")
        .execute(&pool)
        .await
        .expect("清空数据失败");

    PgStore::new(pool)
}

fn content(title: &str) -> GeneratedContent {
    GeneratedContent {
        title: title.to_string(),
        slug_hint: None,
        meta_description: "desc".to_string(),
        keywords: vec!["a".to_string()],
        tags: vec!["AI Tools".to_string(), "Rust".to_string()],
        body_markup: "hello world".to_string(),
    }
}

#[tokio::test]
#[ignore = "依赖真实数据库"]
async fn test_publish_against_postgres() {
    let store = store().await;
    let publisher = Publisher::new(&store, "Bot");
    let topic = Topic::new("Hello World", "General", ["k"]);
    let image = ImageReference {
        url: "https://img.example/a.jpg".to_string(),
        source: ImageSource::StaticPool,
    };

    let first = publisher
        .publish(&content("Hello World"), &topic, &image)
        .await
        .expect("第一次发布失败");
    let second = publisher
        .publish(&content("Hello, World!"), &topic, &image)
        .await
        .expect("第二次发布失败");

    assert_eq!(first.slug, "hello-world");
    assert_eq!(second.slug, "hello-world-2");
    assert_eq!(first.author_id, second.author_id);
    assert_eq!(first.tag_ids, second.tag_ids);
    assert!(store.post_slug_exists("hello-world-2").await.unwrap());

    let tag_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(tag_count, 2);
}

#[tokio::test]
#[ignore = "依赖真实数据库"]
async fn test_taxonomy_upsert_keeps_first_name() {
    let store = store().await;
    let resolver = TaxonomyResolver::new(&store);

    let first = resolver
        .resolve_many(TaxonomyKind::Category, &["AI Tools"])
        .await
        .unwrap();
    let second = resolver
        .resolve_many(TaxonomyKind::Category, &["ai tools"])
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(second[0].name, "AI Tools");
}
