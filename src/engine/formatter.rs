// ==========================================
// 適格請求書合规校验系统 - 显示格式化器
// ==========================================
// 职责: 规范发票 → 渲染用显示形态
// - 金额重算后生成 "¥1,234" 风格显示串 (四舍五入到整数円)
// - 含 8% 明细时标注軽減税率
// - 非有限金额 (NaN/∞) 为格式化失败, 由编排器降级处理
// ==========================================

use crate::domain::{FormattedInvoice, FormattedLine, NormalizedInvoice};
use crate::engine::totals::{self, rate_percent};
use thiserror::Error;

/// 軽減税率标注文言
const REDUCED_RATE_NOTE: &str = "※軽減税率対象";

/// 显示格式化错误类型
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("non-finite amount in {field}")]
    NonFiniteAmount { field: &'static str },
}

// ==========================================
// DisplayFormatter - 显示格式化器
// ==========================================
pub struct DisplayFormatter;

impl DisplayFormatter {
    pub fn new() -> Self {
        Self
    }

    /// 生成显示形态 (金额由明细行重算, 不采用申告值)
    pub fn format(&self, invoice: &NormalizedInvoice) -> Result<FormattedInvoice, FormatError> {
        for item in &invoice.items {
            if !item.amount_excl_tax.is_finite() {
                return Err(FormatError::NonFiniteAmount {
                    field: "items.amount_excl_tax",
                });
            }
        }

        let computed = totals::compute_totals(&invoice.items);
        if !computed.grand_total.is_finite() {
            return Err(FormatError::NonFiniteAmount {
                field: "grand_total",
            });
        }

        let reduced_rate_flag = if invoice
            .items
            .iter()
            .any(|item| rate_percent(&item.tax_rate) == 8.0)
        {
            REDUCED_RATE_NOTE.to_string()
        } else {
            String::new()
        };

        let items = invoice
            .items
            .iter()
            .map(|item| FormattedLine {
                description: item.description.clone(),
                amount_display: format_yen(item.amount_excl_tax),
                tax_rate: item.tax_rate.clone(),
            })
            .collect();

        Ok(FormattedInvoice {
            invoice_number: invoice.invoice_number.clone(),
            issue_date: invoice.date.clone(),
            issuer_name: invoice.issuer_name.clone(),
            issuer_id: invoice.issuer_id.clone(),
            address: invoice.address.clone(),
            phone: invoice.phone.clone(),
            email: invoice.email.clone(),
            buyer_name: invoice.buyer.clone(),
            items,
            subtotal: computed.subtotal,
            subtotal_display: format_yen(computed.subtotal),
            tax_total: computed.tax_total,
            tax_display: format_yen(computed.tax_total),
            grand_total: computed.grand_total,
            total_display: format_yen(computed.grand_total),
            reduced_rate_flag,
            remarks: invoice.remarks.clone(),
        })
    }

    /// 降级形态: 格式化失败时仍要出 PDF, 金额区间全部置零
    pub fn degraded(&self, invoice: &NormalizedInvoice) -> FormattedInvoice {
        FormattedInvoice {
            invoice_number: invoice.invoice_number.clone(),
            issue_date: invoice.date.clone(),
            issuer_name: invoice.issuer_name.clone(),
            issuer_id: invoice.issuer_id.clone(),
            address: invoice.address.clone(),
            phone: invoice.phone.clone(),
            email: invoice.email.clone(),
            buyer_name: invoice.buyer.clone(),
            items: Vec::new(),
            subtotal: 0.0,
            subtotal_display: format_yen(0.0),
            tax_total: 0.0,
            tax_display: format_yen(0.0),
            grand_total: 0.0,
            total_display: format_yen(0.0),
            reduced_rate_flag: String::new(),
            remarks: invoice.remarks.clone(),
        }
    }
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// 日元显示串 (¥ + 四舍五入整数 + 千分位)
pub fn format_yen(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let negative = rounded < 0;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-¥{}", grouped)
    } else {
        format!("¥{}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LineItem;

    fn invoice(items: Vec<LineItem>) -> NormalizedInvoice {
        NormalizedInvoice {
            invoice_number: "INV-001".into(),
            issuer_name: "株式会社テスト".into(),
            issuer_id: "T1234567890123".into(),
            buyer: "買い手".into(),
            date: "2024-01-01".into(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            items,
            remarks: String::new(),
        }
    }

    fn item(amount: f64, rate: &str) -> LineItem {
        LineItem {
            description: "品目".into(),
            amount_excl_tax: amount,
            tax_rate: rate.into(),
        }
    }

    #[test]
    fn test_format_yen_grouping() {
        assert_eq!(format_yen(0.0), "¥0");
        assert_eq!(format_yen(123.0), "¥123");
        assert_eq!(format_yen(1234.0), "¥1,234");
        assert_eq!(format_yen(1234567.0), "¥1,234,567");
        assert_eq!(format_yen(1234.5), "¥1,235");
        assert_eq!(format_yen(-1234.0), "-¥1,234");
    }

    #[test]
    fn test_format_recomputes_totals() {
        let formatted = DisplayFormatter::new()
            .format(&invoice(vec![item(100_000.0, "10%"), item(200_000.0, "8%")]))
            .unwrap();
        assert_eq!(formatted.subtotal, 300_000.0);
        assert_eq!(formatted.subtotal_display, "¥300,000");
        assert_eq!(formatted.tax_total, 26_000.0);
        assert_eq!(formatted.tax_display, "¥26,000");
        assert_eq!(formatted.total_display, "¥326,000");
        assert_eq!(formatted.items.len(), 2);
        assert_eq!(formatted.items[0].amount_display, "¥100,000");
        assert_eq!(formatted.items[1].tax_rate, "8%");
    }

    #[test]
    fn test_reduced_rate_flag_only_with_8_percent() {
        let fmt = DisplayFormatter::new();
        let with = fmt.format(&invoice(vec![item(100.0, "8%")])).unwrap();
        assert_eq!(with.reduced_rate_flag, "※軽減税率対象");

        let without = fmt.format(&invoice(vec![item(100.0, "10%")])).unwrap();
        assert!(without.reduced_rate_flag.is_empty());
    }

    #[test]
    fn test_non_finite_amount_is_an_error() {
        let err = DisplayFormatter::new()
            .format(&invoice(vec![item(f64::NAN, "10%")]))
            .unwrap_err();
        assert!(matches!(
            err,
            FormatError::NonFiniteAmount {
                field: "items.amount_excl_tax"
            }
        ));
    }

    #[test]
    fn test_degraded_zeroes_amounts_keeps_identity() {
        let degraded = DisplayFormatter::new().degraded(&invoice(vec![item(f64::NAN, "10%")]));
        assert_eq!(degraded.invoice_number, "INV-001");
        assert_eq!(degraded.subtotal_display, "¥0");
        assert_eq!(degraded.total_display, "¥0");
    }
}
