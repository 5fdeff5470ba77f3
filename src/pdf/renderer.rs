// ==========================================
// 適格請求書合规校验系统 - lopdf 渲染器
// ==========================================
// 单页 A4, Helvetica 单字体, 文本指令流手工拼装
// 布局: 头部标识块 → 金额块 → 合规盖章 → 问题清单 → 自动修复页脚
// ==========================================

use crate::domain::{FieldStatus, FormattedInvoice, ValidationResult};
use crate::i18n;
use crate::pdf::{InvoicePdfRenderer, PdfError};
use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

// A4 (pt)
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: i64 = 50;
const LINE_HEIGHT: i64 = 18;

// ==========================================
// LopdfRenderer
// ==========================================
pub struct LopdfRenderer;

impl LopdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LopdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoicePdfRenderer for LopdfRenderer {
    fn render(
        &self,
        invoice: &FormattedInvoice,
        result: &ValidationResult,
    ) -> Result<Vec<u8>, PdfError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let content = Content {
            operations: build_operations(invoice, result),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

// ==========================================
// 指令流拼装
// ==========================================

fn build_operations(invoice: &FormattedInvoice, result: &ValidationResult) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT - 60;

    // 标识块
    text_line(&mut ops, y, 16, "Qualified Invoice / 適格請求書");
    y -= LINE_HEIGHT * 2;
    for line in [
        format!("請求書番号 Invoice No: {}", invoice.invoice_number),
        format!("発行日 Issue Date: {}", invoice.issue_date),
        format!("発行者 Issuer: {}", invoice.issuer_name),
        format!("登録番号 Registration No: {}", invoice.issuer_id),
        format!("請求先 Bill To: {}", invoice.buyer_name),
    ] {
        text_line(&mut ops, y, 11, &line);
        y -= LINE_HEIGHT;
    }
    if !invoice.address.is_empty() {
        text_line(&mut ops, y, 11, &format!("住所 Address: {}", invoice.address));
        y -= LINE_HEIGHT;
    }

    // 明细表
    if !invoice.items.is_empty() {
        y -= LINE_HEIGHT;
        text_line(&mut ops, y, 11, "Description / Amount (excl. tax) / Rate");
        y -= LINE_HEIGHT;
        for item in &invoice.items {
            text_line(
                &mut ops,
                y,
                10,
                &format!(
                    "{}  {}  {}",
                    item.description, item.amount_display, item.tax_rate
                ),
            );
            y -= LINE_HEIGHT;
        }
    }

    // 金额块
    y -= LINE_HEIGHT;
    for line in [
        format!("小計 Subtotal: {}", invoice.subtotal_display),
        format!("消費税 Tax: {}", invoice.tax_display),
        format!("合計 Total: {}", invoice.total_display),
    ] {
        text_line(&mut ops, y, 12, &line);
        y -= LINE_HEIGHT;
    }
    if !invoice.reduced_rate_flag.is_empty() {
        text_line(&mut ops, y, 10, &invoice.reduced_rate_flag);
        y -= LINE_HEIGHT;
    }

    // 合规盖章 (双语 + 打印时刻)
    y -= LINE_HEIGHT;
    let stamp = i18n::bilingual(if result.compliant() {
        "stamp.pass"
    } else {
        "stamp.fail"
    });
    let stamped_at = Utc::now().format("%Y-%m-%d %H:%M UTC");
    text_line(
        &mut ops,
        y,
        14,
        &format!("{} - {} / {} - {}", stamp.en, stamped_at, stamp.ja, stamped_at),
    );
    y -= LINE_HEIGHT * 2;

    // 问题清单 (结果语言单语)
    if !result.compliant() {
        text_line(&mut ops, y, 12, "Issues:");
        y -= LINE_HEIGHT;
        for (field, outcome) in &result.fields {
            if outcome.status != FieldStatus::Fail {
                continue;
            }
            let messages = if result.language == "ja" {
                &outcome.messages.ja
            } else {
                &outcome.messages.en
            };
            for msg in messages {
                text_line(&mut ops, y, 10, &format!("- {}: {}", field, msg));
                y -= LINE_HEIGHT;
            }
        }
    }

    // 自动修复页脚
    if !result.auto_fix_summary.auto_fixed.is_empty() {
        y -= LINE_HEIGHT;
        text_line(&mut ops, y, 9, "Auto-fixed:");
        y -= LINE_HEIGHT;
        for fix in &result.auto_fix_summary.auto_fixed {
            text_line(&mut ops, y, 9, &format!("* {}", fix));
            y -= LINE_HEIGHT;
        }
    }

    if !invoice.remarks.is_empty() {
        y -= LINE_HEIGHT;
        text_line(&mut ops, y, 9, &format!("Remarks: {}", invoice.remarks));
    }

    ops
}

fn text_line(ops: &mut Vec<Operation>, y: i64, size: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec!["F1".into(), size.into()]));
    ops.push(Operation::new("Td", vec![MARGIN_LEFT.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
    ops.push(Operation::new("ET", vec![]));
}
