use crate::ids::{OutlineNodeId, VersionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineNode {
    pub id: OutlineNodeId,
    pub version_id: VersionId,
    pub parent_id: Option<OutlineNodeId>,
    pub level: u8,
    /// Numbering string as it appears in source, e.g. "1.2.3" or "附表1". Capped at 32 chars.
    pub node_no: Option<String>,
    pub title: String,
    pub order_index: i64,
}

impl OutlineNode {
    pub const NODE_NO_MAX: usize = 32;
    pub const TITLE_MAX: usize = 255;

    pub fn path_string<'a>(&self, by_id: impl Fn(OutlineNodeId) -> Option<&'a OutlineNode>) -> String
    where
        Self: 'a,
    {
        let mut parts = Vec::new();
        let mut cursor = Some(self.clone());
        // walk to the root, recording each node's "no + title" label
        let mut guard = 0;
        while let Some(node) = cursor {
            let label = format!("{} {}", node.node_no.clone().unwrap_or_default(), node.title)
                .trim()
                .to_string();
            if !label.is_empty() {
                parts.push(label);
            }
            cursor = node.parent_id.and_then(&by_id).cloned();
            guard += 1;
            if guard > 64 {
                break; // malformed parent chain; don't loop forever
            }
        }
        parts.reverse();
        parts.join("\n")
    }
}
