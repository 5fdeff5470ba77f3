// ==========================================
// 適格請求書合规校验系统 - 规范化器
// ==========================================
// 职责: 把松散输入转为规范发票
// - 货币串 (记号/千分位/括号负数) → 十进制, 解析失败取 0 (有损, 不报错)
// - 日期按固定格式表顺序尝试, 全部失败回退当天 (显式记录在案的回退)
// - 税率 "<float>%" → "<int>%" (裸数字不动, 留给 AutoHealer 补 %)
// - 明细行给出 单价×数量 时现算金额
// ==========================================

use crate::domain::{LineItem, NormalizedInvoice, RawInvoice, RawLineItem};
use chrono::{Local, NaiveDate};
use serde_json::Value;
use uuid::Uuid;

/// 日期解析格式表 (按声明顺序尝试, 首个成功者生效)
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%Y.%m.%d", "%Y%m%d"];

// ==========================================
// Normalizer - 规范化器
// ==========================================
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// 规范化整张发票
    pub fn normalize(&self, raw: &RawInvoice) -> NormalizedInvoice {
        let invoice_number = raw
            .invoice_number
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(generate_invoice_number);

        let items = raw
            .items
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(normalize_item)
            .collect();

        NormalizedInvoice {
            invoice_number,
            issuer_name: trimmed(&raw.issuer_name),
            issuer_id: trimmed(&raw.issuer_id),
            buyer: trimmed(&raw.buyer),
            date: parse_date(raw.date.as_deref()),
            address: trimmed(&raw.address),
            phone: trimmed(&raw.phone),
            email: trimmed(&raw.email),
            items,
            remarks: trimmed(&raw.remarks),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 明细行规范化
// ==========================================

fn normalize_item(raw: &RawLineItem) -> LineItem {
    let quantity = decimal_from_value(raw.quantity.as_ref(), 1.0);
    // 给了单价用单价, 否则认为 amount_excl_tax 是单件金额
    let price = match present(&raw.price) {
        Some(v) => decimal_from_value(Some(v), 0.0),
        None => decimal_from_value(present(&raw.amount_excl_tax), 0.0),
    };

    LineItem {
        description: raw.description.clone().unwrap_or_default(),
        amount_excl_tax: quantity * price,
        tax_rate: normalize_rate(raw.tax_rate.as_ref()),
    }
}

/// Some(Null) 与 None 同等视为缺失
fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

// ==========================================
// 解析辅助函数
// ==========================================

/// 货币风格字符串 → f64
///
/// 支持 "¥1,000" / "￥1，000" / "（123）" / "(123)"; 解析失败取 0
pub fn parse_decimal(input: &str) -> f64 {
    let mut s: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '¥' | '￥' | ',' | '，'))
        .collect();

    // 括号负数 (全角/半角)
    for (open, close) in [('（', '）'), ('(', ')')] {
        if s.starts_with(open) && s.ends_with(close) && s.chars().count() > 2 {
            let inner: String = s
                .chars()
                .skip(1)
                .take(s.chars().count() - 2)
                .collect();
            s = format!("-{}", inner.trim());
            break;
        }
    }

    s.trim().parse::<f64>().unwrap_or(0.0)
}

/// JSON 值 → f64 (缺失用 default, 字符串走货币解析)
fn decimal_from_value(value: Option<&Value>, default: f64) -> f64 {
    match value {
        None | Some(Value::Null) => default,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => parse_decimal(s),
        Some(_) => default,
    }
}

/// 多格式日期解析 → ISO (YYYY-MM-DD); 全部失败回退当天
pub fn parse_date(raw: Option<&str>) -> String {
    let today = || Local::now().date_naive().format("%Y-%m-%d").to_string();

    let Some(raw) = raw else {
        return today();
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return today();
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    today()
}

/// 税率值规范化
///
/// 带 % 的数值串统一为 "<int>%" ("8.0%" → "8%");
/// 裸数字保持原样 —— 补 % 属于 AutoHealer 的修复动作,
/// 否则首轮校验就不会失败, 修复也就无从谈起
pub fn normalize_rate(value: Option<&Value>) -> String {
    let raw = match value {
        None | Some(Value::Null) => return "10%".to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    };

    if let Some(stripped) = raw.strip_suffix('%') {
        if let Ok(num) = stripped.trim().parse::<f64>() {
            return format!("{}%", num.trunc() as i64);
        }
    }
    raw
}

/// 缺失发票号时生成占位号 (INV-六位十六进制)
fn generate_invoice_number() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("INV-{}", &hex[..6])
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_decimal_currency_forms() {
        assert_eq!(parse_decimal("¥1,000"), 1000.0);
        assert_eq!(parse_decimal("￥12，345"), 12345.0);
        assert_eq!(parse_decimal(" 42.5 "), 42.5);
        assert_eq!(parse_decimal("（123）"), -123.0);
        assert_eq!(parse_decimal("(123)"), -123.0);
    }

    #[test]
    fn test_parse_decimal_unparseable_defaults_to_zero() {
        assert_eq!(parse_decimal("abc"), 0.0);
        assert_eq!(parse_decimal(""), 0.0);
    }

    #[test]
    fn test_parse_date_known_formats() {
        assert_eq!(parse_date(Some("2024-01-02")), "2024-01-02");
        assert_eq!(parse_date(Some("2024/01/02")), "2024-01-02");
        assert_eq!(parse_date(Some("02-01-2024")), "2024-01-02");
        assert_eq!(parse_date(Some("2024.01.02")), "2024-01-02");
        assert_eq!(parse_date(Some("20240102")), "2024-01-02");
    }

    #[test]
    fn test_parse_date_fallback_is_today() {
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(parse_date(Some("not a date")), today);
        assert_eq!(parse_date(None), today);
    }

    #[test]
    fn test_normalize_rate_canonicalizes_percent_forms() {
        assert_eq!(normalize_rate(Some(&json!("8.0%"))), "8%");
        assert_eq!(normalize_rate(Some(&json!(" 10% "))), "10%");
        assert_eq!(normalize_rate(Some(&json!("0%"))), "0%");
        // 裸数字不动: 留给 AutoHealer
        assert_eq!(normalize_rate(Some(&json!("8"))), "8");
        assert_eq!(normalize_rate(Some(&json!(8))), "8");
        // 缺失默认 10%
        assert_eq!(normalize_rate(None), "10%");
    }

    #[test]
    fn test_normalize_item_quantity_times_price() {
        let raw: RawInvoice = serde_json::from_value(json!({
            "invoice_number": "INV-1",
            "items": [
                {"description": "A", "quantity": 3, "price": "¥1,000", "tax_rate": "10%"},
                {"description": "B", "amount_excl_tax": 200, "tax_rate": "8%"}
            ]
        }))
        .unwrap();

        let normalized = Normalizer::new().normalize(&raw);
        assert_eq!(normalized.items[0].amount_excl_tax, 3000.0);
        // 无 quantity 时默认 1
        assert_eq!(normalized.items[1].amount_excl_tax, 200.0);
    }

    #[test]
    fn test_normalize_trims_identity_fields() {
        let raw: RawInvoice = serde_json::from_value(json!({
            "invoice_number": "INV-1",
            "issuer_name": "  株式会社テスト  ",
            "buyer": " 買い手 ",
            "issuer_id": " T1234567890123 "
        }))
        .unwrap();

        let normalized = Normalizer::new().normalize(&raw);
        assert_eq!(normalized.issuer_name, "株式会社テスト");
        assert_eq!(normalized.buyer, "買い手");
        assert_eq!(normalized.issuer_id, "T1234567890123");
    }

    #[test]
    fn test_missing_invoice_number_generates_placeholder() {
        let normalized = Normalizer::new().normalize(&RawInvoice::default());
        assert!(normalized.invoice_number.starts_with("INV-"));
        assert_eq!(normalized.invoice_number.len(), "INV-".len() + 6);
    }
}
