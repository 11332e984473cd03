//! Two-level topic hierarchy types.

use serde::{Deserialize, Serialize};

use crate::model::TopicAssignment;

/// Display name used for the implicit child holding level-1-only items.
pub const UNCLASSIFIED_LABEL: &str = "Unclassified";

/// A percentage kept at full precision; rounding happens only for display.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Percentage {
    /// `part / whole × 100`, or zero for an empty base.
    pub fn of(part: usize, whole: usize) -> Self {
        if whole == 0 {
            Self(0.0)
        } else {
            Self(part as f64 / whole as f64 * 100.0)
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Value rounded to one decimal place.
    pub fn rounded(&self) -> f64 {
        (self.0 * 10.0).round() / 10.0
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.rounded())
    }
}

/// Identity of a level-2 child within its parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
pub enum Level2Key {
    Named(String),
    /// Items that only received a level-1 classification.
    Unclassified,
}

impl Level2Key {
    pub fn display_name(&self) -> &str {
        match self {
            Level2Key::Named(name) => name,
            Level2Key::Unclassified => UNCLASSIFIED_LABEL,
        }
    }
}

impl std::fmt::Display for Level2Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Level2Node {
    pub key: Level2Key,
    pub count: usize,
    pub percentage_of_parent: Percentage,
    pub percentage_of_total: Percentage,
}

impl Level2Node {
    pub fn name(&self) -> &str {
        self.key.display_name()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Level1Node {
    pub id: String,
    pub name: String,
    pub count: usize,
    pub percentage_of_total: Percentage,
    pub children: Vec<Level2Node>,
}

impl Level1Node {
    pub fn child(&self, key: &Level2Key) -> Option<&Level2Node> {
        self.children.iter().find(|c| &c.key == key)
    }

    /// Reference to this node for audit queries.
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::Level1 {
            level1_id: self.id.clone(),
        }
    }

    /// Reference to one of this node's children for audit queries.
    pub fn child_ref(&self, child: &Level2Node) -> NodeRef {
        NodeRef::Level2 {
            level1_id: self.id.clone(),
            key: child.key.clone(),
        }
    }
}

/// Aggregated view over a whole result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hierarchy {
    /// Every item in the result set, assigned or not.
    pub total_items: usize,
    pub assigned_items: usize,
    pub unassigned_items: usize,
    pub nodes: Vec<Level1Node>,
}

impl Hierarchy {
    pub fn find(&self, level1_id: &str) -> Option<&Level1Node> {
        self.nodes.iter().find(|n| n.id == level1_id)
    }

    /// Item count recorded for a node, or zero if the node does not exist.
    pub fn count_for(&self, node: &NodeRef) -> usize {
        match node {
            NodeRef::Level1 { level1_id } => self.find(level1_id).map_or(0, |n| n.count),
            NodeRef::Level2 { level1_id, key } => self
                .find(level1_id)
                .and_then(|n| n.child(key))
                .map_or(0, |c| c.count),
        }
    }
}

/// Reference to a hierarchy node, used to drill down into its items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", tag = "level")]
pub enum NodeRef {
    #[serde(rename_all = "camelCase")]
    Level1 { level1_id: String },
    #[serde(rename_all = "camelCase")]
    Level2 { level1_id: String, key: Level2Key },
}

impl NodeRef {
    pub fn level1(level1_id: &str) -> Self {
        NodeRef::Level1 {
            level1_id: level1_id.to_string(),
        }
    }

    pub fn level2(level1_id: &str, level2_name: &str) -> Self {
        NodeRef::Level2 {
            level1_id: level1_id.to_string(),
            key: Level2Key::Named(level2_name.to_string()),
        }
    }

    pub fn unclassified(level1_id: &str) -> Self {
        NodeRef::Level2 {
            level1_id: level1_id.to_string(),
            key: Level2Key::Unclassified,
        }
    }

    /// Returns true if an item with this assignment belongs under the node.
    pub fn matches(&self, assignment: &TopicAssignment) -> bool {
        match self {
            NodeRef::Level1 { level1_id } => assignment.level1_id() == Some(level1_id.as_str()),
            NodeRef::Level2 { level1_id, key } => {
                assignment.level1_id() == Some(level1_id.as_str())
                    && assignment.level2_key().as_ref() == Some(key)
            }
        }
    }
}
