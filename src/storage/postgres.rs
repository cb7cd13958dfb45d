use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

/// 数据库连接池类型
pub type DBPool = sqlx::PgPool;

/// 根据连接 URL 创建新的数据库连接池
///
/// 连接池配置：
///
/// - 最大空闲时间 60 秒
/// - 最大生存时间 1500 秒（约 25 分钟）
/// - 最大连接数 4，批处理是串行的，不需要更多
/// - 获取连接超时 5 秒
/// - 获取前测试连接
pub async fn connect(conn_url: &str) -> Result<DBPool, sqlx::Error> {
    PgPoolOptions::new()
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(1500))
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .min_connections(1)
        .connect(conn_url)
        .await
}

/// 建表语句，编译期嵌入二进制，所有语句均可重复执行
pub const SCHEMA: &str = include_str!("../../sql/01-CREATE_TABLE.sql");

/// 按 `;` 拆分出非空的 SQL 语句
fn statements(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// 在连接池上应用 [`SCHEMA`]
///
/// 表均以 `IF NOT EXISTS` 创建，启动时每次执行都是安全的。
pub async fn migrate(db: &DBPool) -> Result<(), sqlx::Error> {
    let mut applied = 0;
    for sql in statements(SCHEMA) {
        sqlx::query(sql).execute(db).await?;
        applied += 1;
    }
    tracing::debug!(statements = applied, "schema applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_skip_blank_fragments() {
        let sql = "CREATE TABLE a (id INT);\n\n  ;CREATE TABLE b (id INT);\n";
        let parsed: Vec<_> = statements(sql).collect();
        assert_eq!(parsed, vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]);
    }

    #[test]
    fn test_schema_is_rerunnable() {
        let parsed: Vec<_> = statements(SCHEMA).collect();
        assert!(!parsed.is_empty());
        for sql in parsed {
            let sql = sql.to_uppercase();
            assert!(
                sql.starts_with("CREATE TABLE IF NOT EXISTS") || sql.starts_with("CREATE INDEX IF NOT EXISTS"),
                "语句不可重复执行: {sql}"
            );
        }
    }
}
