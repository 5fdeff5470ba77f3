// ==========================================
// 適格請求書合规校验系统 - 应用配置
// ==========================================
// 默认值 + 环境变量覆盖; 输出根目录缺省放在用户数据目录下
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 合计比对默认绝对容差 (円)
pub const DEFAULT_TOTALS_TOLERANCE: f64 = 0.01;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 批次工作区根目录 (每批次在其下建 batch_<id>/)
    pub output_root: PathBuf,
    /// 审计库文件路径
    pub audit_db_path: PathBuf,
    /// 合计比对绝对容差
    pub totals_tolerance: f64,
    /// 校验消息默认语言 ("ja"/"en", 单票可覆盖)
    pub default_language: String,
    /// 外置规则文件 (None 用内置 2025-10 规则集)
    pub ruleset_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jct-invoice-validator");
        Self {
            output_root: data_root.join("batches"),
            audit_db_path: data_root.join("audit.db"),
            totals_tolerance: DEFAULT_TOTALS_TOLERANCE,
            default_language: "ja".to_string(),
            ruleset_path: None,
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置 (未设置的项用默认值)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_root: std::env::var("INVOICE_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            audit_db_path: std::env::var("INVOICE_AUDIT_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.audit_db_path),
            totals_tolerance: std::env::var("INVOICE_TOTALS_TOLERANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOTALS_TOLERANCE),
            default_language: std::env::var("INVOICE_DEFAULT_LANG")
                .unwrap_or(defaults.default_language),
            ruleset_path: std::env::var("INVOICE_RULESET_PATH").ok().map(PathBuf::from),
        }
    }
}
