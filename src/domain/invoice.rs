// ==========================================
// 適格請求書合规校验系统 - 发票领域模型
// ==========================================
// 三种形态:
// - RawInvoice: 上游解析层给出的松散输入 (字段可缺失, 金额可为字符串)
// - NormalizedInvoice: 规范化后的标准形态 (ISO 日期 / 十进制金额 / 规范税率)
// - FormattedInvoice: 面向渲染的显示形态 (日元字符串 / 默认值补全)
// ==========================================
// 生命周期: NormalizedInvoice 仅存活于单票流水线内, 处理结束即丢弃
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==========================================
// RawInvoice - 松散输入
// ==========================================
// 用途: 上游 (CSV/multipart 解析, 本 crate 之外) 的直接产物
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInvoice {
    pub invoice_number: Option<String>,
    pub issuer_name: Option<String>,
    pub issuer_id: Option<String>,       // 登録番号 (T+13桁)
    pub buyer: Option<String>,
    pub date: Option<String>,            // 任意格式, 由 Normalizer 统一
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub items: Option<Vec<RawLineItem>>,
    pub totals: Option<RawTotals>,       // 申告合计 (可省略)
    pub remarks: Option<String>,
    pub language: Option<String>,        // 单票语言覆盖 ("ja"/"en")
}

// ==========================================
// RawLineItem - 松散明细行
// ==========================================
// 金额类字段用 Value 承接: 上游可能给数字也可能给 "¥1,000" 这类字符串
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLineItem {
    pub description: Option<String>,
    pub quantity: Option<Value>,
    pub price: Option<Value>,            // 单价 (与 quantity 组合使用)
    pub amount_excl_tax: Option<Value>,  // 税抜金額 (预先算好时直接给出)
    pub tax_rate: Option<Value>,
}

// ==========================================
// RawTotals - 申告合计块
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTotals {
    pub subtotal: Option<f64>,
    #[serde(alias = "taxTotal")]
    pub tax_total: Option<f64>,
    #[serde(alias = "grandTotal")]
    pub grand_total: Option<f64>,
}

// ==========================================
// NormalizedInvoice - 规范化发票
// ==========================================
// 不变式: date 为 ISO-8601 日历日期; items[].tax_rate 规范化后 ∈ {0%,8%,10%}
// 序列化键名即规则 fieldPath 的寻址空间
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedInvoice {
    pub invoice_number: String,
    pub issuer_name: String,
    pub issuer_id: String,
    pub buyer: String,
    pub date: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub items: Vec<LineItem>,
    pub remarks: String,
}

// ==========================================
// LineItem - 规范明细行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount_excl_tax: f64,
    pub tax_rate: String, // "<int>%" 形式, 如 "8%"
}

// ==========================================
// FormattedInvoice - 显示形态
// ==========================================
// 用途: PdfRenderer 的输入; 金额均附带 ¥ 千分位显示串
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedInvoice {
    // 标识
    pub invoice_number: String,
    pub issue_date: String,
    // 发行方
    pub issuer_name: String,
    pub issuer_id: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    // 请求先
    pub buyer_name: String,
    // 明细 (渲染用显示行)
    pub items: Vec<FormattedLine>,
    // 金额
    pub subtotal: f64,
    pub subtotal_display: String,
    pub tax_total: f64,
    pub tax_display: String,
    pub grand_total: f64,
    pub total_display: String,
    // 合规标注
    pub reduced_rate_flag: String, // 含8%明细时 "※軽減税率対象"
    pub remarks: String,
}

// ==========================================
// FormattedLine - 显示明细行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedLine {
    pub description: String,
    pub amount_display: String, // "¥1,000"
    pub tax_rate: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_invoice_accepts_sparse_json() {
        let raw: RawInvoice = serde_json::from_str(
            r#"{"invoice_number": "INV-1", "items": [{"amount_excl_tax": "¥1,000", "tax_rate": 10}]}"#,
        )
        .unwrap();
        assert_eq!(raw.invoice_number.as_deref(), Some("INV-1"));
        assert!(raw.issuer_name.is_none());
        assert_eq!(raw.items.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_raw_totals_camel_case_aliases() {
        let totals: RawTotals =
            serde_json::from_str(r#"{"subtotal": 300, "taxTotal": 26, "grandTotal": 326}"#).unwrap();
        assert_eq!(totals.tax_total, Some(26.0));
        assert_eq!(totals.grand_total, Some(326.0));
    }
}
