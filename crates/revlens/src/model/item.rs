//! Classified items: one row of a job's flat result set.

use serde::{Deserialize, Serialize};

use crate::analysis::Level2Key;

/// Sentiment label attached to an item by the classification pipeline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Unknown => write!(f, "unknown"),
        }
    }
}

/// Wire shape of a topic assignment: `{ level1Id, level2Name? }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level1_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level2_name: Option<String>,
}

/// Which hierarchy node(s) an item belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "Option<WireAssignment>", into = "Option<WireAssignment>")]
pub enum TopicAssignment {
    /// No topic was assigned.
    #[default]
    Unassigned,
    /// Only a top-level classification was made.
    Level1 { level1_id: String },
    Level2 {
        level1_id: String,
        level2_name: String,
    },
}

impl TopicAssignment {
    pub fn level1(level1_id: &str) -> Self {
        TopicAssignment::Level1 {
            level1_id: level1_id.to_string(),
        }
    }

    pub fn level2(level1_id: &str, level2_name: &str) -> Self {
        TopicAssignment::Level2 {
            level1_id: level1_id.to_string(),
            level2_name: level2_name.to_string(),
        }
    }

    pub fn level1_id(&self) -> Option<&str> {
        match self {
            TopicAssignment::Unassigned => None,
            TopicAssignment::Level1 { level1_id } | TopicAssignment::Level2 { level1_id, .. } => {
                Some(level1_id.as_str())
            }
        }
    }

    pub fn level2_name(&self) -> Option<&str> {
        match self {
            TopicAssignment::Level2 { level2_name, .. } => Some(level2_name.as_str()),
            _ => None,
        }
    }

    /// The level-2 child this item counts toward, if it is assigned at all.
    pub fn level2_key(&self) -> Option<Level2Key> {
        match self {
            TopicAssignment::Unassigned => None,
            TopicAssignment::Level1 { .. } => Some(Level2Key::Unclassified),
            TopicAssignment::Level2 { level2_name, .. } => {
                Some(Level2Key::Named(level2_name.clone()))
            }
        }
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, TopicAssignment::Unassigned)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl From<Option<WireAssignment>> for TopicAssignment {
    fn from(wire: Option<WireAssignment>) -> Self {
        let wire = wire.unwrap_or_default();
        match (non_blank(wire.level1_id), non_blank(wire.level2_name)) {
            (None, _) => TopicAssignment::Unassigned,
            (Some(level1_id), None) => TopicAssignment::Level1 { level1_id },
            (Some(level1_id), Some(level2_name)) => TopicAssignment::Level2 {
                level1_id,
                level2_name,
            },
        }
    }
}

impl From<TopicAssignment> for Option<WireAssignment> {
    fn from(assignment: TopicAssignment) -> Self {
        match assignment {
            TopicAssignment::Unassigned => None,
            TopicAssignment::Level1 { level1_id } => Some(WireAssignment {
                level1_id: Some(level1_id),
                level2_name: None,
            }),
            TopicAssignment::Level2 {
                level1_id,
                level2_name,
            } => Some(WireAssignment {
                level1_id: Some(level1_id),
                level2_name: Some(level2_name),
            }),
        }
    }
}

/// One row of the flat result set.
///
/// The item's position in the result list is its identity for audit
/// purposes; items are never mutated once the job has completed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub sentiment: Sentiment,
    /// Provenance: URL or origin identifier.
    #[serde(default)]
    pub source_ref: String,
    #[serde(default)]
    pub topic_assignment: TopicAssignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ClassifiedItem {
    pub fn new(text: &str, sentiment: Sentiment, source_ref: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            sentiment,
            source_ref: source_ref.to_string(),
            topic_assignment: TopicAssignment::Unassigned,
            rating: None,
            date: None,
        }
    }

    pub fn with_assignment(mut self, assignment: TopicAssignment) -> Self {
        self.topic_assignment = assignment;
        self
    }
}

/// Display name of a level-1 topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TopicLabel {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_sentiment_label() {
        let item: ClassifiedItem =
            serde_json::from_str(r#"{"text":"meh","sentiment":"mixed","sourceRef":"a"}"#)
                .unwrap();
        assert_eq!(item.sentiment, Sentiment::Unknown);
        assert_eq!(item.topic_assignment, TopicAssignment::Unassigned);
    }

    #[test]
    fn test_assignment_variants_from_wire() {
        let cases = [
            (r#"null"#, TopicAssignment::Unassigned),
            (r#"{}"#, TopicAssignment::Unassigned),
            (r#"{"level1Id":"  "}"#, TopicAssignment::Unassigned),
            (r#"{"level1Id":"billing"}"#, TopicAssignment::level1("billing")),
            (
                r#"{"level1Id":"billing","level2Name":""}"#,
                TopicAssignment::level1("billing"),
            ),
            (
                r#"{"level1Id":"billing","level2Name":"refunds"}"#,
                TopicAssignment::level2("billing", "refunds"),
            ),
        ];

        for (json, expected) in cases {
            let parsed: TopicAssignment = serde_json::from_str(json).unwrap();
            assert_eq!(parsed, expected, "case {}", json);
        }
    }

    #[test]
    fn test_assignment_serializes_to_wire_shape() {
        let json = serde_json::to_value(TopicAssignment::level2("billing", "refunds")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"level1Id": "billing", "level2Name": "refunds"})
        );
        let json = serde_json::to_value(TopicAssignment::Unassigned).unwrap();
        assert!(json.is_null());
    }

    #[test]
    fn test_level2_key() {
        assert_eq!(TopicAssignment::Unassigned.level2_key(), None);
        assert_eq!(
            TopicAssignment::level1("billing").level2_key(),
            Some(Level2Key::Unclassified)
        );
        assert_eq!(
            TopicAssignment::level2("billing", "refunds").level2_key(),
            Some(Level2Key::Named("refunds".to_string()))
        );
    }
}
