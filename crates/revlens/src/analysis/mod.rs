//! Topic hierarchy aggregation and audit drill-down over completed results.

pub mod aggregate;
pub mod audit;
pub mod hierarchy;

pub use aggregate::{aggregate, aggregate_with_topics};
pub use audit::{query, query_by, AuditRecord, MISSING_TEXT_PLACEHOLDER};
pub use hierarchy::{Hierarchy, Level1Node, Level2Key, Level2Node, NodeRef, Percentage};
