// ==========================================
// 適格請求書合规校验系统 - 审计层
// ==========================================
// 职责: 逐票校验结果落库 (SQLite)
// 红线: 每票一条 INSERT, 不做跨票事务; 单票写入失败不影响后续票
// ==========================================

use crate::db;
use crate::domain::AuditRecord;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// 审计写入错误类型
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("audit database failure: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

// ==========================================
// AuditSink - 审计接口
// ==========================================
// 编排器对落库介质无感知, 测试用内存实现替换
// 返回值为已持久化行的 id
pub trait AuditSink {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError>;
}

// ==========================================
// SqliteAuditSink - SQLite 实现
// ==========================================
// Connection 非 Sync, 用 Mutex 承接以便编排器按 &self 调用
pub struct SqliteAuditSink {
    conn: Mutex<Connection>,
}

impl SqliteAuditSink {
    /// 打开 (或创建) 审计库并保证 schema 就绪
    pub fn open(db_path: &Path) -> Result<Self, AuditError> {
        let conn = db::open_sqlite_connection(&db_path.to_string_lossy())?;
        db::init_audit_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 内存库 (测试用)
    pub fn open_in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory()?;
        db::configure_sqlite_connection(&conn)?;
        db::init_audit_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 某批次的落库行数 (测试与对账用)
    pub fn count_for_batch(&self, batch_id: &str) -> Result<i64, AuditError> {
        let conn = self.conn.lock().expect("audit connection poisoned");
        let count = conn.query_row(
            "SELECT COUNT(*) FROM invoice_results WHERE batch_id = ?1",
            params![batch_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl AuditSink for SqliteAuditSink {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let conn = self.conn.lock().expect("audit connection poisoned");
        conn.execute(
            r#"
            INSERT INTO invoice_results
                (user_id, invoice_number, batch_id, status, issues_count,
                 pdf_path, pdf_hash, ruleset_version, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.user_id,
                record.invoice_number,
                record.batch_id,
                record.status,
                record.issues_count,
                record.pdf_path,
                record.pdf_hash,
                record.ruleset_version,
                record.created_at.to_rfc3339(),
            ],
        )?;
        let row_id = conn.last_insert_rowid();
        debug!(
            invoice_number = %record.invoice_number,
            status = %record.status,
            row_id,
            "审计记录已落库"
        );
        Ok(row_id)
    }
}
