// ==========================================
// 適格請求書合规校验系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发批次写入时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化审计表 schema（幂等）
///
/// 字段与 AuditRecord 对齐: 每张发票一行, 不做跨票事务
pub fn init_audit_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS invoice_results (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL,
            invoice_number  TEXT NOT NULL,
            batch_id        TEXT,
            status          TEXT NOT NULL,
            issues_count    INTEGER NOT NULL DEFAULT 0,
            pdf_path        TEXT,
            pdf_hash        TEXT NOT NULL,
            ruleset_version TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_invoice_results_batch
            ON invoice_results(batch_id);
        CREATE INDEX IF NOT EXISTS idx_invoice_results_user
            ON invoice_results(user_id);
        CREATE INDEX IF NOT EXISTS idx_invoice_results_number
            ON invoice_results(invoice_number);
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_audit_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_audit_schema(&conn).unwrap();
        init_audit_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM invoice_results", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
