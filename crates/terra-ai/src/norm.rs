//! The norm library: the rule records batched into AI review requests
//! (spec §4.7 step 2). Each entry mirrors one row of the original norm
//! library table — just enough metadata for the model prompt and for
//! classifying the issues it returns.

use serde::{Deserialize, Serialize};
use terra_core::model::ReviewType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormRule {
    pub id: String,
    pub name: String,
    pub review_type: ReviewType,
    pub compare_mode: Option<String>,
}

impl NormRule {
    pub fn new(id: &str, name: &str, review_type: ReviewType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            review_type,
            compare_mode: None,
        }
    }

    pub fn with_compare_mode(mut self, mode: &str) -> Self {
        self.compare_mode = Some(mode.to_string());
        self
    }
}

/// A representative norm library for water-and-soil conservation plan
/// review. Real deployments load this from the checkpoint store rather
/// than a fixed list; this default is what `terra-worker` seeds a fresh
/// database with and what the driver's tests batch against.
pub fn default_norm_library() -> Vec<NormRule> {
    vec![
        NormRule::new("N001", "目录与正文章节标题一致", ReviewType::Form),
        NormRule::new("N002", "水土流失防治责任范围面积一致性", ReviewType::Tech),
        NormRule::new("N003", "表格合计行与分项求和一致", ReviewType::Tech).with_compare_mode("sum"),
        NormRule::new("N004", "百分比指标之和等于100%", ReviewType::Tech).with_compare_mode("percentage_sum"),
        NormRule::new("N005", "计量单位全文统一", ReviewType::Tech),
        NormRule::new("N006", "水土保持措施布局符合选址限制", ReviewType::Tech),
        NormRule::new("N007", "六项指标计算公式一致", ReviewType::Tech).with_compare_mode("formula"),
        NormRule::new("N008", "工程概况章节完整性", ReviewType::Form),
        NormRule::new("N009", "附图附表与正文引用一致", ReviewType::Form),
        NormRule::new("N010", "弃渣场容量与弃渣总量匹配", ReviewType::Tech),
        NormRule::new("N011", "水土保持监测方案章节完整性", ReviewType::Form),
        NormRule::new("N012", "投资估算与工程量清单一致", ReviewType::Tech),
    ]
}
