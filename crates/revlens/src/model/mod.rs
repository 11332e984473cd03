pub mod item;
pub mod job;
pub mod request;

pub use item::{ClassifiedItem, Sentiment, TopicAssignment, TopicLabel};
pub use job::{JobId, JobOutcome, JobRecord, JobResult, JobStatus, StatusEvent};
pub use request::{AnalysisParams, AnalysisRequest, FilePayload, JobSource, SubmitRequest};
