pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod telemetry;
pub mod transport;

pub use analysis::{
    aggregate, aggregate_with_topics, query, query_by, AuditRecord, Hierarchy, NodeRef,
};
pub use config::{load_config, MonitorConfig};
pub use error::{
    ConfigError, JobError, MonitorError, Result, RevlensError, TransportError, ValidationError,
};
pub use model::{
    AnalysisParams, AnalysisRequest, ClassifiedItem, FilePayload, JobId, JobOutcome, JobResult,
    JobStatus, Sentiment, StatusEvent, TopicAssignment,
};
pub use monitor::{JobMonitor, JobSnapshot};
pub use telemetry::init_logging;
pub use transport::{HttpBackend, JobBackend, PushChannel, WsPushChannel};
