// ==========================================
// 適格請求書合规校验系统 - 自动修复器
// ==========================================
// 职责: 对首轮校验未通过的规范发票做一次确定性整形
// - 文本标识字段去首尾空白
// - 日期强制转 ISO
// - 税率串补 % (裸数字), 无法解析的税率回退 10%
// - 登録番号先头小写 t → 大写 T
// ==========================================
// 红线: 单次有界重试, 不是循环; 二次失败即为终局
//       修复动作本身出错时返回 Err, 由编排器决定"沿用首轮结果继续"
// ==========================================

use crate::domain::NormalizedInvoice;
use crate::engine::normalizer;
use thiserror::Error;

/// 自动修复错误类型
#[derive(Error, Debug)]
pub enum HealError {
    #[error("item {index} tax rate '{value}' resolves to a negative percentage")]
    NegativeRate { index: usize, value: String },
}

// ==========================================
// HealReport - 修复结果
// ==========================================
// auto_fixed 为空表示无可修复项 (发票原样返回)
#[derive(Debug, Clone)]
pub struct HealReport {
    pub invoice: NormalizedInvoice,
    pub auto_fixed: Vec<String>,
}

// ==========================================
// AutoHealer - 自动修复器
// ==========================================
pub struct AutoHealer;

impl AutoHealer {
    pub fn new() -> Self {
        Self
    }

    /// 执行一次修复。调用方负责触发且仅触发一次二次校验
    pub fn heal(&self, invoice: &NormalizedInvoice) -> Result<HealReport, HealError> {
        let mut healed = invoice.clone();
        let mut auto_fixed = Vec::new();

        // 文本标识字段去空白
        let mut trimmed_fields = Vec::new();
        for (name, field) in [
            ("invoice_number", &mut healed.invoice_number),
            ("issuer_name", &mut healed.issuer_name),
            ("address", &mut healed.address),
            ("email", &mut healed.email),
            ("phone", &mut healed.phone),
        ] {
            let trimmed = field.trim();
            if trimmed != field.as_str() {
                *field = trimmed.to_string();
                trimmed_fields.push(name);
            }
        }
        if !trimmed_fields.is_empty() {
            auto_fixed.push(format!("whitespace trimmed ({})", trimmed_fields.join(", ")));
        }

        // 日期强制 ISO
        let iso = normalizer::parse_date(Some(&healed.date));
        if iso != healed.date {
            healed.date = iso;
            auto_fixed.push("date formatted to ISO".to_string());
        }

        // 税率补 %
        let mut fixed_rates = 0usize;
        for (index, item) in healed.items.iter_mut().enumerate() {
            if item.tax_rate.trim_end().ends_with('%') {
                continue;
            }
            match item.tax_rate.trim().parse::<f64>() {
                Ok(num) if num < 0.0 => {
                    return Err(HealError::NegativeRate {
                        index,
                        value: item.tax_rate.clone(),
                    });
                }
                Ok(num) => {
                    item.tax_rate = format!("{}%", num.trunc() as i64);
                    fixed_rates += 1;
                }
                Err(_) => {
                    // 完全无法解释的税率回退标准税率
                    item.tax_rate = "10%".to_string();
                    fixed_rates += 1;
                }
            }
        }
        if fixed_rates > 0 {
            auto_fixed.push(format!("tax rate normalized on {} item(s)", fixed_rates));
        }

        // 登録番号先头大小写
        if healed.issuer_id.starts_with('t') {
            healed.issuer_id.replace_range(..1, "T");
            auto_fixed.push("issuer_id capitalized".to_string());
        }

        Ok(HealReport {
            invoice: healed,
            auto_fixed,
        })
    }
}

impl Default for AutoHealer {
    fn default() -> Self {
        Self::new()
    }
}
