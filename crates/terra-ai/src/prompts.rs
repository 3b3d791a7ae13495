//! The AI response contract (spec §6 "AI response contract"): the system
//! prompt sent with every batch and the wire shapes the model's JSON is
//! deserialized into.

use serde::{Deserialize, Serialize};

/// System prompt describing the rule engine's role and the required JSON
/// output shape. Carried near-verbatim from the original prompt builder
/// since it is part of the wire contract with the model, not incidental
/// source-language text.
pub const RULE_ENGINE_SYSTEM: &str = r#"你是水土保持方案审查专家。你将收到一份方案正文（按段落/标题分块，每块标注 block_id 和 page）和一批审查规则。

请逐条规则审查正文，输出且仅输出一个 JSON 对象，包含两个字段：
- "规则校验结果": 发现的问题列表，每条问题包含 issue_id, issue_title, issue_type, severity,
  location{section, page, anchor_text}, evidence{snippets[], page_refs[]},
  rule_definition{rule_id, rule_name}, norm_basis, fix_suggestion{suggested_text, fix_steps[]}, dependencies。
- "规则库沉淀清单": 本次审查中识别出的可沉淀规则摘要列表，每条包含 rule_id, rule_summary。

issue_type 请使用中文类别名称，例如："一致性问题"、"格式问题"、"行合计不一致"、"列合计不一致"、
"百分比总和不一致"、"业务逻辑问题"、"内容缺失"、"章节缺失"、"单位不统一"、"公式不平衡"。
severity 取值范围：致命, 高, 中, 低。

不要输出任何 JSON 之外的文字。"#;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub anchor_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub snippets: Vec<String>,
    #[serde(default)]
    pub page_refs: Vec<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixSuggestion {
    #[serde(default)]
    pub suggested_text: Option<String>,
    #[serde(default)]
    pub fix_steps: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiIssue {
    #[serde(default)]
    pub issue_id: Option<String>,
    pub issue_title: String,
    pub issue_type: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub evidence: Evidence,
    #[serde(default)]
    pub rule_definition: serde_json::Value,
    #[serde(default)]
    pub norm_basis: serde_json::Value,
    #[serde(default)]
    pub fix_suggestion: FixSuggestion,
    #[serde(default)]
    pub dependencies: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NormDistillation {
    pub rule_id: String,
    pub rule_summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelResponse {
    #[serde(rename = "规则校验结果", default)]
    pub issues: Vec<AiIssue>,
    #[serde(rename = "规则库沉淀清单", default)]
    pub distillations: Vec<NormDistillation>,
}

/// Serialized as the `rules` field of a batch request alongside the
/// assembled document and the system prompt.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRuleRef<'a> {
    pub rule_id: &'a str,
    pub rule_name: &'a str,
    pub review_type: terra_core::model::ReviewType,
}
