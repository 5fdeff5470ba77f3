// ==========================================
// 规则引擎集成测试
// ==========================================
// 覆盖: 全字段通过 / 多字段失败 / 逐元素税率定位 /
//       外置规则文件加载 / 实时单字段校验
// ==========================================

mod test_helpers;

use jct_invoice_validator::domain::{FieldStatus, RuleSet};
use jct_invoice_validator::engine::{Normalizer, RuleEngine};
use serde_json::json;
use std::io::Write;

fn engine() -> RuleEngine {
    RuleEngine::new(RuleSet::builtin().expect("builtin ruleset"))
}

#[test]
fn test_compliant_invoice_passes_all_fields() {
    let raw = test_helpers::compliant_invoice("INV-001");
    let invoice = Normalizer::new().normalize(&raw);

    let result = engine().validate(&invoice, "ja").unwrap();

    assert!(result.overall.compliant);
    assert_eq!(result.overall.status, FieldStatus::Pass);
    assert_eq!(result.issues_count, 0);
    for (field, outcome) in &result.fields {
        assert_eq!(outcome.status, FieldStatus::Pass, "field {field} should pass");
    }
}

#[test]
fn test_broken_invoice_reports_each_field() {
    // issuer_name 缺失 + issuer_id 无 T 前缀
    let raw = test_helpers::broken_invoice("INV-002");
    let invoice = Normalizer::new().normalize(&raw);

    let result = engine().validate(&invoice, "ja").unwrap();

    assert!(!result.overall.compliant);
    assert_eq!(result.fields["issuer_name"].status, FieldStatus::Fail);
    assert_eq!(result.fields["issuer_id"].status, FieldStatus::Fail);
    assert!(result.issues_count >= 2);

    // 双语消息成对累积
    let issuer_name = &result.fields["issuer_name"];
    assert_eq!(issuer_name.messages.ja.len(), issuer_name.messages.en.len());
    assert!(issuer_name.messages.ja[0].contains("issuer_name"));
}

#[test]
fn test_item_rate_failures_name_the_index() {
    let mut raw = test_helpers::compliant_invoice("INV-003");
    raw.items.as_mut().unwrap()[1].tax_rate = Some(json!("5%"));
    let invoice = Normalizer::new().normalize(&raw);

    let result = engine().validate(&invoice, "ja").unwrap();

    assert!(!result.overall.compliant);
    assert!(result.fields.contains_key("items[1].tax_rate"));
    assert!(!result.fields.contains_key("items[0].tax_rate"));
}

#[test]
fn test_external_ruleset_file_loads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"version": "custom-1", "rules": [{{"field": "buyer", "type": "required"}}]}}"#
    )
    .unwrap();

    let ruleset = RuleSet::from_path(file.path()).unwrap();
    assert_eq!(ruleset.version(), "custom-1");

    let custom = RuleEngine::new(ruleset);
    let invoice = Normalizer::new().normalize(&test_helpers::broken_invoice("INV-004"));
    // 自定义规则集只看 buyer, 原本的 issuer 问题不再出现
    let result = custom.validate(&invoice, "ja").unwrap();
    assert!(result.overall.compliant);
}

#[test]
fn test_validate_field_only_live_semantics() {
    let engine = engine();

    // 精确路径
    assert_eq!(
        engine.validate_field_only("issuer_id", &json!("T1234567890123")),
        FieldStatus::Pass
    );
    assert_eq!(
        engine.validate_field_only("issuer_id", &json!("X123")),
        FieldStatus::Fail
    );
    // 通配路径按末段字段名匹配, 标量直接比对允许集
    assert_eq!(
        engine.validate_field_only("tax_rate", &json!("8%")),
        FieldStatus::Pass
    );
    assert_eq!(
        engine.validate_field_only("tax_rate", &json!("5%")),
        FieldStatus::Fail
    );
    // 无规则字段恒通过
    assert_eq!(
        engine.validate_field_only("remarks", &json!("何でも")),
        FieldStatus::Pass
    );
}
