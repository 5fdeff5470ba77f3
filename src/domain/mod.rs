// ==========================================
// 適格請求書合规校验系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、规则类型、校验结果结构
// 红线: 不含引擎逻辑, 不含数据访问逻辑
// ==========================================

pub mod batch;
pub mod invoice;
pub mod rule;
pub mod validation;

// 重导出核心类型
pub use batch::{AuditRecord, BatchCounts, BatchSummary, ItemOutcome};
pub use invoice::{
    FormattedInvoice, FormattedLine, LineItem, NormalizedInvoice, RawInvoice, RawLineItem,
    RawTotals,
};
pub use rule::{FieldPath, RuleDefinition, RuleKind, RuleSet, RulesetError};
pub use validation::{
    AutoFixSummary, Bilingual, FieldOutcome, FieldStatus, MessageLists, OverallOutcome,
    ValidationResult,
};
