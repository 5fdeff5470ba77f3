// ==========================================
// 適格請求書合规校验系统 - 规则引擎
// ==========================================
// 职责: 按声明顺序解释规则集, 产出字段级 pass/fail 结果
// - validate_field_only: 单字段实时校验 (前端绿/红勾)
// - validate: 整票校验 (驱动 PDF 盖章)
// ==========================================
// 红线: 引擎内部无时间戳、无隐藏状态;
//       同一 (规则集, 发票) 输入永远得到字节一致的结果
// ==========================================

use crate::domain::rule::{FieldPath, RuleKind, RuleSet};
use crate::domain::validation::{
    AutoFixSummary, Bilingual, FieldStatus, OverallOutcome, ValidationResult,
};
use crate::domain::NormalizedInvoice;
use crate::i18n;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// 规则引擎错误类型
///
/// 注意: 字段级校验失败是数据 (ValidationResult.fields), 不是错误;
/// 这里只覆盖"引擎本身无法求值"的情形
#[derive(Error, Debug)]
pub enum RuleEngineError {
    #[error("invoice not representable as JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ==========================================
// RuleEngine - 规则引擎
// ==========================================
// 构造时持有规则集, 此后不可变; 无环境全局实例
pub struct RuleEngine {
    ruleset: RuleSet,
}

impl RuleEngine {
    /// 从已加载的规则集构造引擎
    pub fn new(ruleset: RuleSet) -> Self {
        Self { ruleset }
    }

    /// 当前规则集版本
    pub fn ruleset_version(&self) -> &str {
        self.ruleset.version()
    }

    // ==========================================
    // 单字段实时校验
    // ==========================================

    /// 只校验单个字段的值, 不跑整票逻辑
    ///
    /// 命中规则: 精确路径全等, 或通配路径末段等于 field_name。
    /// 没有任何规则引用该字段时返回 pass
    /// (合规性是"相对规则覆盖面"的, 不是数据完备性)
    pub fn validate_field_only(&self, field_name: &str, value: &Value) -> FieldStatus {
        for rule in self.ruleset.rules() {
            if !rule.path.matches_field_name(field_name) {
                continue;
            }

            match &rule.kind {
                RuleKind::Required => {
                    if is_empty_value(Some(value)) {
                        return FieldStatus::Fail;
                    }
                }
                RuleKind::Regex(regex) => {
                    if !regex.is_match(&value_as_string(value)) {
                        return FieldStatus::Fail;
                    }
                }
                RuleKind::DateIso => {
                    if parse_iso_date(&value_as_string(value)).is_none() {
                        return FieldStatus::Fail;
                    }
                }
                RuleKind::EnumAnyItem(allowed) => {
                    // 实时模式下直接比对标量值
                    if !allowed.contains(&value_as_string(value)) {
                        return FieldStatus::Fail;
                    }
                }
            }
        }

        FieldStatus::Pass
    }

    // ==========================================
    // 整票校验
    // ==========================================

    /// 校验整张发票
    pub fn validate(
        &self,
        invoice: &NormalizedInvoice,
        language: &str,
    ) -> Result<ValidationResult, RuleEngineError> {
        self.validate_with_fixes(invoice, language, Vec::new())
    }

    /// 校验整张发票, 并在结果中携带已应用的自动修复描述
    /// (AutoHealer 的二次校验走这里)
    pub fn validate_with_fixes(
        &self,
        invoice: &NormalizedInvoice,
        language: &str,
        auto_fixed: Vec<String>,
    ) -> Result<ValidationResult, RuleEngineError> {
        let value = serde_json::to_value(invoice)?;
        Ok(self.validate_value(&value, language, auto_fixed))
    }

    /// 对已序列化的发票 JSON 求值 (引擎内部核心)
    pub fn validate_value(
        &self,
        invoice: &Value,
        language: &str,
        auto_fixed: Vec<String>,
    ) -> ValidationResult {
        let mut result = ValidationResult {
            language: language.to_string(),
            overall: OverallOutcome {
                status: FieldStatus::Pass,
                compliant: true,
                summary: Bilingual {
                    ja: String::new(),
                    en: String::new(),
                },
            },
            fields: IndexMap::new(),
            issues_count: 0,
            auto_fix_summary: AutoFixSummary {
                auto_fixed,
                needs_user_action: Vec::new(),
            },
        };

        for rule in self.ruleset.rules() {
            match (&rule.path, &rule.kind) {
                (FieldPath::Exact(name), RuleKind::Required) => {
                    if is_empty_value(invoice.get(name)) {
                        result.mark_fail(
                            name,
                            i18n::bilingual_args("validate.required", &[("field", name)]),
                        );
                    }
                }
                (FieldPath::Exact(name), RuleKind::Regex(regex)) => {
                    if let Some(val) = non_empty_string(invoice.get(name)) {
                        if !regex.is_match(&val) {
                            result.mark_fail(
                                name,
                                i18n::bilingual_args("validate.regex", &[("field", name)]),
                            );
                        }
                    }
                }
                (FieldPath::Exact(name), RuleKind::DateIso) => {
                    if let Some(val) = non_empty_string(invoice.get(name)) {
                        if parse_iso_date(&val).is_none() {
                            result.mark_fail(
                                name,
                                i18n::bilingual_args("validate.date_iso", &[("field", name)]),
                            );
                        }
                    }
                }
                (FieldPath::AnyItem { container, subfield }, RuleKind::EnumAnyItem(allowed)) => {
                    let items = invoice
                        .get(container.as_str())
                        .and_then(Value::as_array)
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    for (idx, item) in items.iter().enumerate() {
                        let val = item.get(subfield.as_str()).map(value_as_string);
                        if !val.map(|v| allowed.contains(&v)).unwrap_or(false) {
                            let fname = format!("{}[{}].{}", container, idx, subfield);
                            let msg = i18n::bilingual_args(
                                "validate.enum_any_item",
                                &[("field", fname.as_str())],
                            );
                            result.mark_fail(&fname, msg);
                        }
                    }
                }
                // 标量规则声明在通配路径上 (或反之) 属规则集笔误, 跳过
                (path, kind) => {
                    debug!(field = %rule.field, kind = kind.name(), ?path, "规则路径与类型不匹配, 跳过");
                }
            }
        }

        // 整票结论: 所有出现过的字段均 pass 才算合规
        let compliant = result
            .fields
            .values()
            .all(|outcome| outcome.status == FieldStatus::Pass);
        result.overall = OverallOutcome {
            status: if compliant {
                FieldStatus::Pass
            } else {
                FieldStatus::Fail
            },
            compliant,
            summary: i18n::bilingual(if compliant {
                "validate.summary_pass"
            } else {
                "validate.summary_fail"
            }),
        };

        // 派生 needs_user_action: 失败字段按出现顺序, 取首条英文消息
        result.auto_fix_summary.needs_user_action = result
            .fields
            .iter()
            .filter(|(_, outcome)| outcome.status == FieldStatus::Fail)
            .map(|(name, outcome)| match outcome.messages.en.first() {
                Some(msg) => format!("{}: {}", name, msg),
                None => i18n::t_args_in("en", "validate.needs_action_fallback", &[("field", name)]),
            })
            .collect();

        result
    }
}

// ==========================================
// 求值辅助函数
// ==========================================

/// required 语义的"空": 缺失 / null / "" / [] / {}
fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        _ => false,
    }
}

/// 标量值的字符串形态 (数字按十进制, null 为空串)
fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 非空字符串形态; regex/date_iso 对空值放行 (required 另行覆盖)
fn non_empty_string(value: Option<&Value>) -> Option<String> {
    let s = value_as_string(value?);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
