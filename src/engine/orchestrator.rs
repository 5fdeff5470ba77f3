// ==========================================
// 適格請求書合规校验系统 - 批次编排器
// ==========================================
// 职责: 驱动单票流水线走完整个批次
//   规范化 → 校验 → (不合规) 修复+二次校验 → 合计比对并入 →
//   显示格式化 (失败降级) → PDF 渲染 → 哈希 → 审计落库 → 清单条目
// 红线:
// - 单票错误 (Validation/PdfGeneration/Storage) 在循环边界隔离,
//   记为失败 ItemOutcome 后继续下一票
// - 批次工作区建立失败为批级致命, 直接中止
// - manifest.json 无条件落盘; 归档失败只记 zip_error, 从不上抛
// ==========================================

use crate::audit::AuditSink;
use crate::config::AppConfig;
use crate::domain::{
    AuditRecord, BatchSummary, ItemOutcome, NormalizedInvoice, RawInvoice, RawTotals,
    ValidationResult,
};
use crate::engine::error::{ArchiveError, BatchError, BatchResult};
use crate::engine::{totals, AutoHealer, DisplayFormatter, Normalizer, RuleEngine};
use crate::pdf::InvoicePdfRenderer;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 批次清单文件名
const MANIFEST_FILENAME: &str = "manifest.json";

// ==========================================
// BatchOrchestrator - 批次编排器
// ==========================================
// 渲染器与审计接口泛型注入, 测试用替身实现
pub struct BatchOrchestrator<R: InvoicePdfRenderer, A: AuditSink> {
    engine: RuleEngine,
    normalizer: Normalizer,
    healer: AutoHealer,
    formatter: DisplayFormatter,
    renderer: R,
    audit: A,
    output_root: PathBuf,
    totals_tolerance: f64,
}

impl<R: InvoicePdfRenderer, A: AuditSink> BatchOrchestrator<R, A> {
    pub fn new(engine: RuleEngine, renderer: R, audit: A, config: &AppConfig) -> Self {
        Self {
            engine,
            normalizer: Normalizer::new(),
            healer: AutoHealer::new(),
            formatter: DisplayFormatter::new(),
            renderer,
            audit,
            output_root: config.output_root.clone(),
            totals_tolerance: config.totals_tolerance,
        }
    }

    /// 处理一个批次, 返回完整批次清单
    ///
    /// language 为本次调用的缺省语言, 单票 language 字段可覆盖;
    /// 输入顺序即处理顺序, 严格串行
    pub fn run_batch(
        &self,
        user_id: i64,
        invoices: &[RawInvoice],
        language: &str,
    ) -> BatchResult<BatchSummary> {
        let batch_id = Uuid::new_v4().to_string();
        let batch_dir = self.output_root.join(format!("batch_{}", batch_id));

        // 工作区建立失败不归属任何单票, 批级致命
        fs::create_dir_all(&batch_dir).map_err(|e| {
            BatchError::BatchProcessing(format!(
                "cannot create batch dir {}: {}",
                batch_dir.display(),
                e
            ))
        })?;

        info!(batch_id = %batch_id, count = invoices.len(), "批次开始");

        let mut summary = BatchSummary::new(
            batch_id.clone(),
            self.engine.ruleset_version().to_string(),
            Utc::now(),
        );

        for raw in invoices {
            let normalized = self.normalizer.normalize(raw);
            let invoice_number = normalized.invoice_number.clone();
            let item_language = raw.language.as_deref().unwrap_or(language);

            let outcome = match self.process_invoice(
                user_id,
                &batch_id,
                &batch_dir,
                normalized,
                raw.totals.as_ref(),
                item_language,
            ) {
                Ok(outcome) => outcome,
                // 批级错误理论上不会从单票流程冒出, 冒出即中止
                Err(err @ BatchError::BatchProcessing(_)) => return Err(err),
                Err(err) => {
                    warn!(invoice_number = %invoice_number, error = %err, "单票失败, 已隔离");
                    ItemOutcome::failed(invoice_number, err.to_string())
                }
            };

            if outcome.status == "pass" {
                summary.counts.pass += 1;
            } else {
                summary.counts.fail += 1;
            }
            summary.invoices.push(outcome);
        }

        // 清单无条件落盘 (归档之前, 归档把清单一并打包)
        self.write_manifest(&batch_dir, &summary)?;

        // 归档尽力而为
        let zip_path = self.output_root.join(format!("batch_{}.zip", batch_id));
        match archive_batch_dir(&batch_dir, &zip_path) {
            Ok(()) => summary.zip_path = Some(zip_path.to_string_lossy().into_owned()),
            Err(err) => {
                warn!(batch_id = %batch_id, error = %err, "批次归档失败");
                summary.zip_error = Some(err.to_string());
            }
        }

        info!(
            batch_id = %batch_id,
            pass = summary.counts.pass,
            fail = summary.counts.fail,
            "批次结束"
        );
        Ok(summary)
    }

    // ==========================================
    // 单票流水线
    // ==========================================
    fn process_invoice(
        &self,
        user_id: i64,
        batch_id: &str,
        batch_dir: &Path,
        invoice: NormalizedInvoice,
        declared_totals: Option<&RawTotals>,
        language: &str,
    ) -> BatchResult<ItemOutcome> {
        let invoice_number = invoice.invoice_number.clone();

        // 首轮校验
        let first = self
            .engine
            .validate(&invoice, language)
            .map_err(|e| BatchError::validation(&invoice_number, e))?;

        // 不合规时单次有界修复 + 二次校验; 修复自身出错则沿用首轮结果
        let (invoice, mut result) = if first.compliant() {
            (invoice, first)
        } else {
            match self.healer.heal(&invoice) {
                Ok(report) => {
                    let second = self
                        .engine
                        .validate_with_fixes(&report.invoice, language, report.auto_fixed)
                        .map_err(|e| BatchError::validation(&invoice_number, e))?;
                    (report.invoice, second)
                }
                Err(err) => {
                    warn!(invoice_number = %invoice_number, error = %err, "自动修复失败, 沿用首轮结果");
                    (invoice, first)
                }
            }
        };

        // 申告合计比对 (修复后的明细为准), 不一致强制整票不合规
        if let Some(declared) = declared_totals {
            let mismatches =
                totals::verify_declared_totals(&invoice.items, declared, self.totals_tolerance);
            totals::merge_mismatches(&mut result, mismatches);
        }

        // 显示格式化, 失败降级为零额形态 (PDF 照出)
        let formatted = match self.formatter.format(&invoice) {
            Ok(formatted) => formatted,
            Err(err) => {
                warn!(invoice_number = %invoice_number, error = %err, "显示格式化失败, 降级渲染");
                self.formatter.degraded(&invoice)
            }
        };

        // 渲染 → 哈希 → 按合规性落入 compliant/ 或 failed/ 子区
        let pdf_bytes = self.renderer.render(&formatted, &result)?;
        let pdf_sha256 = sha256_hex(&pdf_bytes);

        let compliant = result.compliant();
        let sub_area = batch_dir.join(if compliant { "compliant" } else { "failed" });
        fs::create_dir_all(&sub_area)
            .map_err(|e| BatchError::Storage(format!("cannot create sub-area: {}", e)))?;
        let pdf_path = sub_area.join(format!("{}.pdf", sanitize_filename(&invoice_number)));
        fs::write(&pdf_path, &pdf_bytes)
            .map_err(|e| BatchError::Storage(format!("cannot write pdf: {}", e)))?;

        let recorded_path = compliant.then(|| pdf_path.to_string_lossy().into_owned());

        // 审计落库 (单条 INSERT, 无跨票事务)
        let audit_id = self.audit.insert(&AuditRecord {
            invoice_number: invoice_number.clone(),
            user_id,
            batch_id: Some(batch_id.to_string()),
            status: audit_status(&result),
            issues_count: result.issues_count,
            pdf_path: recorded_path.clone(),
            pdf_hash: pdf_sha256.clone(),
            ruleset_version: self.engine.ruleset_version().to_string(),
            created_at: Utc::now(),
        })?;
        debug!(invoice_number = %invoice_number, audit_id, "单票流水线完成");

        Ok(ItemOutcome::processed(
            invoice_number,
            compliant,
            result.issues_count,
            recorded_path,
            pdf_sha256,
        ))
    }

    fn write_manifest(&self, batch_dir: &Path, summary: &BatchSummary) -> BatchResult<()> {
        let manifest_path = batch_dir.join(MANIFEST_FILENAME);
        let json = serde_json::to_string_pretty(summary)
            .map_err(|e| BatchError::BatchProcessing(format!("manifest serialization: {}", e)))?;
        fs::write(&manifest_path, json).map_err(|e| {
            BatchError::BatchProcessing(format!(
                "cannot write manifest {}: {}",
                manifest_path.display(),
                e
            ))
        })
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 字节内容 → 十六进制 SHA-256
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// 审计行与清单条目共用同一状态词表
fn audit_status(result: &ValidationResult) -> String {
    if result.compliant() {
        "pass".to_string()
    } else {
        "fail".to_string()
    }
}

/// 发票号 → 安全文件名 (路径分隔符等替换为下划线)
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// 把批次工作区 (含 compliant/failed 子区) 打包为单个 zip
fn archive_batch_dir(batch_dir: &Path, zip_path: &Path) -> Result<(), ArchiveError> {
    let file = fs::File::create(zip_path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let mut entries = Vec::new();
    collect_files(batch_dir, &mut entries)?;
    // 条目顺序固定, 同一工作区重复归档字节一致
    entries.sort();

    for path in entries {
        let name = path.strip_prefix(batch_dir)?.to_string_lossy().into_owned();
        writer.start_file(name, options)?;
        writer.write_all(&fs::read(&path)?)?;
    }

    writer.finish()?;
    Ok(())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sanitize_filename_strips_separators() {
        assert_eq!(sanitize_filename("INV/2024:01"), "INV_2024_01");
        assert_eq!(sanitize_filename("INV-001"), "INV-001");
    }
}
