use crate::ids::VersionId;
use serde::{Deserialize, Serialize};

/// A fact's value is one or the other, never a pair of nullable fields —
/// callers match on this instead of checking which optional field is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Numeric(f64),
    Text(String),
}

impl FactValue {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            FactValue::Numeric(v) => Some(*v),
            FactValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FactValue::Text(s) => Some(s.as_str()),
            FactValue::Numeric(_) => None,
        }
    }
}

/// Where a fact's value was scoped to, e.g. a table title, an outline
/// section title, or "document" for a document-level fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactScope(pub String);

impl FactScope {
    pub const DOCUMENT: &'static str = "document";

    pub fn document() -> Self {
        Self(Self::DOCUMENT.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub version_id: VersionId,
    pub fact_key: String,
    pub scope: FactScope,
    pub value: FactValue,
    pub unit: Option<String>,
    pub confidence: f64,
    pub source_block_id: Option<i64>,
}
