//! Drill-down from a hierarchy node back to the items behind it.

use serde::Serialize;

use crate::analysis::hierarchy::NodeRef;
use crate::model::{ClassifiedItem, Sentiment};

/// Text shown for items whose source content is missing.
pub const MISSING_TEXT_PLACEHOLDER: &str = "(no text)";

/// Read-only projection of one classified item for human review.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Position of the item in the job's flat result list.
    pub index: usize,
    pub text: String,
    pub sentiment: Sentiment,
    pub source_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl AuditRecord {
    fn project(index: usize, item: &ClassifiedItem) -> Self {
        let text = item
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(MISSING_TEXT_PLACEHOLDER)
            .to_string();

        Self {
            index,
            text,
            sentiment: item.sentiment,
            source_ref: item.source_ref.clone(),
            rating: item.rating,
            date: item.date.clone(),
        }
    }
}

/// Returns one record per item under `node`, in result-list order.
pub fn query(items: &[ClassifiedItem], node: &NodeRef) -> Vec<AuditRecord> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| node.matches(&item.topic_assignment))
        .map(|(index, item)| AuditRecord::project(index, item))
        .collect()
}

/// Filters by level-1 id and, when given, an exact level-2 name.
pub fn query_by(
    items: &[ClassifiedItem],
    level1_id: &str,
    level2_name: Option<&str>,
) -> Vec<AuditRecord> {
    let node = match level2_name {
        Some(name) => NodeRef::level2(level1_id, name),
        None => NodeRef::level1(level1_id),
    };
    query(items, &node)
}
