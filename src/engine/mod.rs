// ==========================================
// 適格請求書合规校验系统 - 引擎层
// ==========================================
// 职责: 规则求值 / 规范化 / 自动修复 / 显示格式化 / 批次编排
// 红线: 引擎层不做 I/O (编排器除外), 所有失败必须给出 reason
// ==========================================

pub mod auto_healer;
pub mod error;
pub mod formatter;
pub mod normalizer;
pub mod orchestrator;
pub mod rule_engine;
pub mod totals;

// 重导出核心引擎
pub use auto_healer::{AutoHealer, HealError, HealReport};
pub use error::{ArchiveError, BatchError, BatchResult};
pub use formatter::{DisplayFormatter, FormatError};
pub use normalizer::Normalizer;
pub use orchestrator::{sha256_hex, BatchOrchestrator};
pub use rule_engine::{RuleEngine, RuleEngineError};
pub use totals::{compute_totals, verify_declared_totals, ComputedTotals};
