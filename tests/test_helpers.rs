// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的发票样本与批次配置
// ==========================================

use jct_invoice_validator::config::AppConfig;
use jct_invoice_validator::domain::RawInvoice;
use serde_json::json;
use std::path::Path;

/// 完整合规的发票样本
pub fn compliant_invoice(number: &str) -> RawInvoice {
    serde_json::from_value(json!({
        "invoice_number": number,
        "issuer_name": "株式会社テスト",
        "issuer_id": "T1234567890123",
        "buyer": "株式会社買い手",
        "date": "2024-06-01",
        "items": [
            {"description": "商品A", "amount_excl_tax": 100.0, "tax_rate": "10%"},
            {"description": "商品B", "amount_excl_tax": 200.0, "tax_rate": "8%"}
        ]
    }))
    .expect("sample invoice must deserialize")
}

/// 税率为裸数字的发票 (首轮不合规, 自动修复后合规)
pub fn bare_rate_invoice(number: &str) -> RawInvoice {
    let mut invoice = compliant_invoice(number);
    invoice.items.as_mut().unwrap()[1].tax_rate = Some(json!("8"));
    invoice
}

/// 缺失发行方 + 登録番号格式错误的发票 (修复后仍不合规)
pub fn broken_invoice(number: &str) -> RawInvoice {
    serde_json::from_value(json!({
        "invoice_number": number,
        "issuer_id": "1234567890123",
        "buyer": "株式会社買い手",
        "date": "2024-06-01",
        "items": [
            {"description": "商品A", "amount_excl_tax": 100.0, "tax_rate": "10%"}
        ]
    }))
    .expect("sample invoice must deserialize")
}

/// 指向临时目录的批次配置
pub fn test_config(root: &Path) -> AppConfig {
    AppConfig {
        output_root: root.join("batches"),
        audit_db_path: root.join("audit.db"),
        totals_tolerance: 0.01,
        default_language: "ja".to_string(),
        ruleset_path: None,
    }
}
