// ==========================================
// 適格請求書合规校验系统 - 校验结果模型
// ==========================================
// 不变式: overall.compliant ⇔ fields 中所有条目 status == pass
//         (没有命中任何规则的字段不会出现在 fields 里, 不影响合规判定)
// fields 使用 IndexMap: 按规则声明顺序保序, 重复校验结果字节一致
// ==========================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ==========================================
// Bilingual - ja/en 双语文本对
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bilingual {
    pub ja: String,
    pub en: String,
}

// ==========================================
// MessageLists - 按语言累积的消息列表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLists {
    pub ja: Vec<String>,
    pub en: Vec<String>,
}

impl MessageLists {
    pub fn push(&mut self, msg: Bilingual) {
        self.ja.push(msg.ja);
        self.en.push(msg.en);
    }
}

// ==========================================
// FieldStatus - 字段状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Pass,
    Fail,
}

// ==========================================
// FieldOutcome - 单字段结果
// ==========================================
// 一旦 fail 即保持 fail, 后续同字段规则通过也不会翻转
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOutcome {
    pub status: FieldStatus,
    pub messages: MessageLists,
}

// ==========================================
// OverallOutcome - 整票结论
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallOutcome {
    pub status: FieldStatus,
    pub compliant: bool,
    pub summary: Bilingual,
}

// ==========================================
// AutoFixSummary - 自动修复摘要
// ==========================================
// auto_fixed: 已应用的修复描述 (渲染到 PDF 页脚)
// needs_user_action: 仍需人工处理的字段 (首条英文消息, 字段名前缀)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoFixSummary {
    pub auto_fixed: Vec<String>,
    pub needs_user_action: Vec<String>,
}

// ==========================================
// ValidationResult - 整票校验结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub language: String,
    pub overall: OverallOutcome,
    pub fields: IndexMap<String, FieldOutcome>,
    pub issues_count: u32,
    pub auto_fix_summary: AutoFixSummary,
}

impl ValidationResult {
    pub fn compliant(&self) -> bool {
        self.overall.compliant
    }

    /// 向某字段追加一条失败消息 (字段不存在则创建)
    ///
    /// issues_count 由调用方感知: 返回后计数恒 +1
    pub fn mark_fail(&mut self, field: &str, msg: Bilingual) {
        let entry = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| FieldOutcome {
                status: FieldStatus::Fail,
                messages: MessageLists::default(),
            });
        entry.status = FieldStatus::Fail;
        entry.messages.push(msg);
        self.issues_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_result() -> ValidationResult {
        ValidationResult {
            language: "en".to_string(),
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
            auto_fix_summary: AutoFixSummary::default(),
        }
    }

    #[test]
    fn test_mark_fail_accumulates_messages() {
        let mut result = empty_result();
        result.mark_fail(
            "date",
            Bilingual {
                ja: "a".into(),
                en: "b".into(),
            },
        );
        result.mark_fail(
            "date",
            Bilingual {
                ja: "c".into(),
                en: "d".into(),
            },
        );

        assert_eq!(result.issues_count, 2);
        let outcome = &result.fields["date"];
        assert_eq!(outcome.status, FieldStatus::Fail);
        assert_eq!(outcome.messages.ja, vec!["a", "c"]);
        assert_eq!(outcome.messages.en, vec!["b", "d"]);
    }

    #[test]
    fn test_field_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FieldStatus::Fail).unwrap(),
            r#""fail""#
        );
    }
}
