// ==========================================
// 適格請求書合规校验系统 - PDF 渲染层
// ==========================================
// 职责: 显示形态发票 + 校验结果 → 盖章 PDF 字节
// 约定: 渲染器只产字节, 落盘与哈希由编排器负责
// ==========================================

pub mod renderer;

pub use renderer::LopdfRenderer;

use crate::domain::{FormattedInvoice, ValidationResult};
use thiserror::Error;

/// PDF 渲染错误类型
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("document assembly failed: {0}")]
    Document(#[from] lopdf::Error),

    #[error("pdf I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

// ==========================================
// InvoicePdfRenderer - 渲染接口
// ==========================================
// 合规票与不合规票都要出 PDF, 区别只在盖章文言与问题页
pub trait InvoicePdfRenderer {
    fn render(
        &self,
        invoice: &FormattedInvoice,
        result: &ValidationResult,
    ) -> Result<Vec<u8>, PdfError>;
}
