// ==========================================
// 適格請求書合规校验系统 - 合计校验
// ==========================================
// 职责: 由明细行重算 小计/税额合计/总合计, 与申告值按绝对容差比对
// 容差语义: 差额恰等于容差 → 通过; 严格大于容差 → 不一致
// ==========================================

use crate::domain::{Bilingual, FieldStatus, LineItem, RawTotals, ValidationResult};
use crate::i18n;

// ==========================================
// ComputedTotals - 重算结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedTotals {
    pub subtotal: f64,
    pub tax_total: f64,
    pub grand_total: f64,
}

/// 从明细行重算合计
pub fn compute_totals(items: &[LineItem]) -> ComputedTotals {
    let mut subtotal = 0.0;
    let mut tax_total = 0.0;

    for item in items {
        subtotal += item.amount_excl_tax;
        tax_total += item.amount_excl_tax * rate_percent(&item.tax_rate) / 100.0;
    }

    ComputedTotals {
        subtotal,
        tax_total,
        grand_total: subtotal + tax_total,
    }
}

/// 税率串 → 百分数数值 ("8%" → 8.0, "8" → 8.0, 异常 → 0.0)
pub fn rate_percent(rate: &str) -> f64 {
    let trimmed = rate.trim();
    let numeric = trimmed.strip_suffix('%').unwrap_or(trimmed);
    numeric.trim().parse::<f64>().unwrap_or(0.0)
}

/// 申告合计与重算值比对, 返回不一致消息 (空列表 = 一致)
pub fn verify_declared_totals(
    items: &[LineItem],
    declared: &RawTotals,
    tolerance: f64,
) -> Vec<Bilingual> {
    let computed = compute_totals(items);
    let mut mismatches = Vec::new();

    let checks = [
        ("totals.subtotal_mismatch", declared.subtotal, computed.subtotal),
        ("totals.tax_mismatch", declared.tax_total, computed.tax_total),
        ("totals.grand_mismatch", declared.grand_total, computed.grand_total),
    ];

    for (key, declared_value, computed_value) in checks {
        let Some(expected) = declared_value else {
            continue;
        };
        if (expected - computed_value).abs() > tolerance {
            mismatches.push(i18n::bilingual_args(
                key,
                &[
                    ("expected", format!("{}", expected).as_str()),
                    ("computed", format!("{:.2}", computed_value).as_str()),
                ],
            ));
        }
    }

    mismatches
}

/// 把合计不一致并入整票校验结果
///
/// 即使规则校验已判定合规, 合计不一致也强制整票不合规
pub fn merge_mismatches(result: &mut ValidationResult, mismatches: Vec<Bilingual>) {
    if mismatches.is_empty() {
        return;
    }

    for msg in mismatches {
        result.mark_fail("totals", msg);
    }

    result.overall.compliant = false;
    result.overall.status = FieldStatus::Fail;
    result.overall.summary = i18n::bilingual("validate.summary_fail");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(amount: f64, rate: &str) -> LineItem {
        LineItem {
            description: "品目".into(),
            amount_excl_tax: amount,
            tax_rate: rate.into(),
        }
    }

    #[test]
    fn test_compute_totals_mixed_rates_exact() {
        // 100@10% + 200@8% → 小计300.0 / 税26.0 / 合计326.0 (精确)
        let computed = compute_totals(&[item(100.0, "10%"), item(200.0, "8%")]);
        assert_eq!(computed.subtotal, 300.0);
        assert_eq!(computed.tax_total, 26.0);
        assert_eq!(computed.grand_total, 326.0);
    }

    #[test]
    fn test_rate_percent_forms() {
        assert_eq!(rate_percent("8%"), 8.0);
        assert_eq!(rate_percent(" 10% "), 10.0);
        assert_eq!(rate_percent("8"), 8.0);
        assert_eq!(rate_percent("junk"), 0.0);
    }

    #[test]
    fn test_difference_equal_to_tolerance_passes() {
        // 容差取 0.25 (可精确表示), 差额恰等于容差 → 通过
        let items = [item(300.0, "0%")];
        let declared = RawTotals {
            subtotal: Some(300.25),
            tax_total: None,
            grand_total: None,
        };
        assert!(verify_declared_totals(&items, &declared, 0.25).is_empty());
    }

    #[test]
    fn test_difference_greater_than_tolerance_fails() {
        let items = [item(300.0, "0%")];
        let declared = RawTotals {
            subtotal: Some(300.5),
            tax_total: None,
            grand_total: None,
        };
        let mismatches = verify_declared_totals(&items, &declared, 0.25);
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].en.contains("Subtotal mismatch"));
        assert!(mismatches[0].ja.contains("小計"));
    }

    #[test]
    fn test_all_three_totals_checked() {
        let items = [item(100.0, "10%")];
        let declared = RawTotals {
            subtotal: Some(90.0),
            tax_total: Some(5.0),
            grand_total: Some(95.0),
        };
        assert_eq!(verify_declared_totals(&items, &declared, 0.01).len(), 3);
    }

    #[test]
    fn test_absent_declared_fields_are_skipped() {
        let items = [item(100.0, "10%")];
        let declared = RawTotals::default();
        assert!(verify_declared_totals(&items, &declared, 0.01).is_empty());
    }
}
