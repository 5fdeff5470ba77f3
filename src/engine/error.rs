// ==========================================
// 適格請求書合规校验系统 - 批次错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================
// 三种单票错误 (Validation/PdfGeneration/Storage) 在编排循环边界被捕获,
// 转为失败 ItemOutcome 后继续下一票;
// BatchProcessing 为批级致命错误, 直接向调用方传播
// ==========================================

use crate::audit::AuditError;
use crate::engine::rule_engine::RuleEngineError;
use crate::pdf::PdfError;
use thiserror::Error;

/// 批次处理错误类型
#[derive(Error, Debug)]
pub enum BatchError {
    // ===== 单票错误 (循环边界捕获) =====
    #[error("validation engine failure for {invoice_number}: {details}")]
    Validation {
        invoice_number: String,
        details: String,
    },

    #[error("PDF generation failed: {0}")]
    PdfGeneration(String),

    #[error("storage failure: {0}")]
    Storage(String),

    // ===== 批级致命错误 (不捕获) =====
    #[error("batch-level failure: {0}")]
    BatchProcessing(String),
}

impl BatchError {
    /// 是否为客户端可重试的单票错误
    ///
    /// API 边界 (本 crate 之外) 据此映射错误类别:
    /// 单票错误 → 可重试; 批级错误 → 服务端致命
    pub fn is_retriable(&self) -> bool {
        !matches!(self, BatchError::BatchProcessing(_))
    }

    /// 规则引擎异常 → 单票 Validation 错误
    pub fn validation(invoice_number: &str, err: RuleEngineError) -> Self {
        BatchError::Validation {
            invoice_number: invoice_number.to_string(),
            details: err.to_string(),
        }
    }
}

// 审计写入失败是"单票产物的持久化失败", 归入 Storage
impl From<AuditError> for BatchError {
    fn from(err: AuditError) -> Self {
        BatchError::Storage(err.to_string())
    }
}

impl From<PdfError> for BatchError {
    fn from(err: PdfError) -> Self {
        BatchError::PdfGeneration(err.to_string())
    }
}

/// Result 类型别名
pub type BatchResult<T> = Result<T, BatchError>;

// ==========================================
// ArchiveError - 批次归档错误
// ==========================================
// 归档失败只记录到 summary.zip_error, 从不向上抛
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip write failure: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("path outside batch dir: {0}")]
    Path(#[from] std::path::StripPrefixError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_item_kinds_are_retriable() {
        assert!(BatchError::PdfGeneration("x".into()).is_retriable());
        assert!(BatchError::Storage("x".into()).is_retriable());
        assert!(BatchError::Validation {
            invoice_number: "INV-1".into(),
            details: "x".into()
        }
        .is_retriable());
        assert!(!BatchError::BatchProcessing("x".into()).is_retriable());
    }
}
