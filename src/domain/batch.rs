// ==========================================
// 適格請求書合规校验系统 - 批次领域模型
// ==========================================
// BatchSummary: 一次批量运行的完整清单 (manifest.json 的内容)
// ItemOutcome:  单票终局结果 (成功处理 或 被隔离的失败)
// AuditRecord:  审计落库行 (每票一条, 无跨票事务)
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// BatchCounts - 批次计数
// ==========================================
// 不变式: pass + fail == 达到终局结果的输入票数 (批级致命中止除外)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BatchCounts {
    pub pass: u32,
    pub fail: u32,
    pub warn: u32,
}

// ==========================================
// ItemOutcome - 单票终局结果
// ==========================================
// 两种形态 (字段集合互斥, 缺省项不序列化):
// - 处理完成: compliant/issues/pdf_sha256 (+compliant 时 pdf_path)
// - 流程失败: error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub invoice_number: String,
    pub status: String, // "pass" | "fail"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliant: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    /// 处理完成的单票结果; pdf_path 仅在合规时给出
    pub fn processed(
        invoice_number: String,
        compliant: bool,
        issues: u32,
        pdf_path: Option<String>,
        pdf_sha256: String,
    ) -> Self {
        Self {
            invoice_number,
            status: if compliant { "pass" } else { "fail" }.to_string(),
            compliant: Some(compliant),
            issues: Some(issues),
            pdf_path,
            pdf_sha256: Some(pdf_sha256),
            error: None,
        }
    }

    /// 流程失败 (校验引擎异常 / PDF 生成失败 / 存储失败) 的隔离结果
    pub fn failed(invoice_number: String, error: String) -> Self {
        Self {
            invoice_number,
            status: "fail".to_string(),
            compliant: None,
            issues: None,
            pdf_path: None,
            pdf_sha256: None,
            error: Some(error),
        }
    }
}

// ==========================================
// BatchSummary - 批次清单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub ruleset_version: String,
    pub created_at: String, // RFC 3339
    pub invoices: Vec<ItemOutcome>,
    pub counts: BatchCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_error: Option<String>,
}

impl BatchSummary {
    pub fn new(batch_id: String, ruleset_version: String, created_at: DateTime<Utc>) -> Self {
        Self {
            batch_id,
            ruleset_version,
            created_at: created_at.to_rfc3339(),
            invoices: Vec::new(),
            counts: BatchCounts::default(),
            zip_path: None,
            zip_error: None,
        }
    }
}

// ==========================================
// AuditRecord - 审计落库行
// ==========================================
// 对齐 invoice_results 表 (db.rs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub invoice_number: String,
    pub user_id: i64,
    pub batch_id: Option<String>,
    pub status: String,
    pub issues_count: u32,
    pub pdf_path: Option<String>,
    pub pdf_hash: String,
    pub ruleset_version: String,
    pub created_at: DateTime<Utc>,
}
