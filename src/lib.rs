// ==========================================
// 適格請求書合规校验系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 发票合规批量校验 (规则引擎 + 自动修复 + 合规盖章)
// ==========================================

// 初始化国际化系统 (校验消息为 ja/en 双语)
rust_i18n::i18n!("locales", fallback = "ja");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// PDF 渲染层 - 合规盖章文档
pub mod pdf;

// 审计层 - 逐票落库
pub mod audit;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    AuditRecord, AutoFixSummary, BatchCounts, BatchSummary, Bilingual, FieldOutcome, FieldPath,
    FieldStatus, FormattedInvoice, FormattedLine, ItemOutcome, LineItem, NormalizedInvoice,
    RawInvoice, RawLineItem, RawTotals, RuleDefinition, RuleKind, RuleSet, ValidationResult,
};

// 引擎
pub use engine::{
    AutoHealer, BatchError, BatchOrchestrator, DisplayFormatter, Normalizer, RuleEngine,
};

// 外部协作接口
pub use audit::{AuditSink, SqliteAuditSink};
pub use pdf::{InvoicePdfRenderer, LopdfRenderer};

// 配置
pub use config::AppConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "適格請求書合规校验系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
