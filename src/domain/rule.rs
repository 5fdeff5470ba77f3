// ==========================================
// 適格請求書合规校验系统 - 规则定义
// ==========================================
// 规则来源: 版本化 JSON (rules/rules-<version>.json)
// 加载时机: RuleEngine 构造时一次性加载, 运行期不可变
// ==========================================
// 设计: 规则类型为带标签变体 (每种一个求值器), 不用条件链;
//       带通配符的 fieldPath 在加载时解析为结构化描述符, 不逐次重解析
// ==========================================

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 内置默认规则集 (2025-10 版)
const BUILTIN_RULES: &str = include_str!("../../rules/rules-2025-10.json");

// ==========================================
// 错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum RulesetError {
    #[error("ruleset file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("ruleset JSON malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rule for '{field}' has unknown type '{kind}'")]
    UnknownKind { field: String, kind: String },

    #[error("regex rule for '{field}' is missing a pattern")]
    MissingPattern { field: String },

    #[error("regex rule for '{field}' has invalid pattern: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("enum rule for '{field}' is missing allowed values")]
    MissingAllowed { field: String },

    #[error("wildcard path '{field}' must take the form '<list>[].<subfield>'")]
    InvalidWildcardPath { field: String },
}

// ==========================================
// FieldPath - 结构化字段路径
// ==========================================
// "issuer_id"          → Exact
// "items[].tax_rate"   → AnyItem { container: "items", subfield: "tax_rate" }
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    Exact(String),
    AnyItem { container: String, subfield: String },
}

impl FieldPath {
    /// 解析字段路径 (加载时调用一次)
    pub fn parse(field: &str) -> Result<Self, RulesetError> {
        match field.find("[]") {
            None => Ok(FieldPath::Exact(field.to_string())),
            Some(pos) => {
                let container = &field[..pos];
                let rest = &field[pos + 2..];
                let subfield = rest.strip_prefix('.').unwrap_or("");
                if container.is_empty() || subfield.is_empty() || subfield.contains("[]") {
                    return Err(RulesetError::InvalidWildcardPath {
                        field: field.to_string(),
                    });
                }
                Ok(FieldPath::AnyItem {
                    container: container.to_string(),
                    subfield: subfield.to_string(),
                })
            }
        }
    }

    /// 实时校验的字段名匹配:
    /// 精确路径要求全等, 通配路径要求末段一致 (如 "tax_rate")
    pub fn matches_field_name(&self, field_name: &str) -> bool {
        match self {
            FieldPath::Exact(name) => name == field_name,
            FieldPath::AnyItem { subfield, .. } => subfield == field_name,
        }
    }
}

// ==========================================
// RuleKind - 规则类型 (带标签变体)
// ==========================================
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// 空串 / null / 空列表 / 空映射 视为缺失
    Required,
    /// 非空值必须匹配模式 (加载时编译)
    Regex(Regex),
    /// 非空值必须为 ISO-8601 日历日期
    DateIso,
    /// 列表每个元素的子字段值必须在允许集内
    EnumAnyItem(Vec<String>),
}

impl RuleKind {
    /// 规则类型名 (与 JSON "type" 字段一致)
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Regex(_) => "regex",
            RuleKind::DateIso => "date_iso",
            RuleKind::EnumAnyItem(_) => "enum_any_item",
        }
    }
}

// ==========================================
// RuleDefinition - 单条规则
// ==========================================
#[derive(Debug, Clone)]
pub struct RuleDefinition {
    /// 原始字段路径串 (消息中引用)
    pub field: String,
    /// 解析后的结构化路径
    pub path: FieldPath,
    pub kind: RuleKind,
}

// ==========================================
// RuleSet - 版本化有序规则集
// ==========================================
#[derive(Debug)]
pub struct RuleSet {
    version: String,
    rules: Vec<RuleDefinition>,
}

/// JSON 文件形态
#[derive(Deserialize)]
struct RuleSetFile {
    version: String,
    rules: Vec<RuleEntry>,
}

#[derive(Deserialize)]
struct RuleEntry {
    field: String,
    #[serde(rename = "type")]
    kind: String,
    pattern: Option<String>,
    allowed: Option<Vec<String>>,
}

impl RuleSet {
    /// 从 JSON 文本加载
    pub fn from_json(json: &str) -> Result<Self, RulesetError> {
        let file: RuleSetFile = serde_json::from_str(json)?;

        let mut rules = Vec::with_capacity(file.rules.len());
        for entry in file.rules {
            let path = FieldPath::parse(&entry.field)?;
            let kind = match entry.kind.as_str() {
                "required" => RuleKind::Required,
                "regex" => {
                    let pattern = entry.pattern.ok_or_else(|| RulesetError::MissingPattern {
                        field: entry.field.clone(),
                    })?;
                    let regex =
                        Regex::new(&pattern).map_err(|source| RulesetError::InvalidPattern {
                            field: entry.field.clone(),
                            source,
                        })?;
                    RuleKind::Regex(regex)
                }
                "date_iso" => RuleKind::DateIso,
                "enum_any_item" => {
                    let allowed = entry.allowed.ok_or_else(|| RulesetError::MissingAllowed {
                        field: entry.field.clone(),
                    })?;
                    RuleKind::EnumAnyItem(allowed)
                }
                other => {
                    return Err(RulesetError::UnknownKind {
                        field: entry.field,
                        kind: other.to_string(),
                    })
                }
            };
            rules.push(RuleDefinition {
                field: entry.field,
                path,
                kind,
            });
        }

        Ok(Self {
            version: file.version,
            rules,
        })
    }

    /// 从文件路径加载
    pub fn from_path(path: &Path) -> Result<Self, RulesetError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// 加载内置默认规则集
    pub fn builtin() -> Result<Self, RulesetError> {
        Self::from_json(BUILTIN_RULES)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }
}
