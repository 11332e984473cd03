use std::path::PathBuf;
use thiserror::Error;

use crate::model::JobId;

#[derive(Error, Debug)]
pub enum RevlensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// A submission rejected before any network call was made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request must carry either target URLs or a file payload, not both")]
    BothSources,

    #[error("Request must carry either target URLs or a file payload")]
    NoSource,

    #[error("Target URL #{index} is blank")]
    BlankUrl { index: usize },

    #[error("Target URL '{url}' must use http or https")]
    UnsupportedScheme { url: String },

    #[error("Uploaded file '{filename}' is empty")]
    EmptyFile { filename: String },

    #[error("Invalid file type '{filename}'. Only CSV and Excel files are supported")]
    UnsupportedFileType { filename: String },

    #[error("Parameter '{name}' must be greater than zero")]
    ZeroParameter { name: &'static str },
}

/// Failure of either transport channel or of a plain backend request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend responded with {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to decode backend payload: {0}")]
    Decode(String),

    #[error("Push channel closed before the job finished")]
    Closed,

    #[error("Job not found: {0}")]
    NotFound(JobId),
}

impl TransportError {
    /// Not-found responses are fatal; every other transport failure is retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::NotFound(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Terminal error kinds delivered to completion listeners.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job failed: {0}")]
    Failed(String),

    #[error("Job was cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to submit job: {0}")]
    Submit(#[source] TransportError),

    #[error("Unknown job: {0}")]
    UnknownJob(JobId),

    #[error("Job {0} was disposed before it finished")]
    Disposed(JobId),

    #[error("Failed to build backend client: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, RevlensError>;
