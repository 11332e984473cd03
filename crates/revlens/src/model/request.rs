//! Analysis submissions and their pre-flight validation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// File extensions the backend accepts for uploaded review exports.
const SUPPORTED_UPLOAD_EXTENSIONS: &[&str] = &[".csv", ".xlsx", ".xls"];

/// Tunable parameters forwarded to the backend with every submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams {
    #[serde(default = "default_max_items")]
    pub max_items: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_max_items() -> u32 {
    500
}

fn default_batch_size() -> u32 {
    20
}

fn default_max_pages() -> u32 {
    10
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            batch_size: default_batch_size(),
            max_pages: default_max_pages(),
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_items == 0 {
            return Err(ValidationError::ZeroParameter { name: "maxItems" });
        }
        if self.batch_size == 0 {
            return Err(ValidationError::ZeroParameter { name: "batchSize" });
        }
        if self.max_pages == 0 {
            return Err(ValidationError::ZeroParameter { name: "maxPages" });
        }
        Ok(())
    }
}

/// An uploaded review export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl FilePayload {
    pub fn new(filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.to_string(),
            bytes,
        }
    }

    /// MIME type guessed from the file name.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let lower = self.filename.to_lowercase();
        if !SUPPORTED_UPLOAD_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(ext))
        {
            return Err(ValidationError::UnsupportedFileType {
                filename: self.filename.clone(),
            });
        }
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyFile {
                filename: self.filename.clone(),
            });
        }
        Ok(())
    }
}

/// What the caller asks the backend to analyze.
///
/// Exactly one of `urls` and `file` must be populated; this is checked by
/// [`AnalysisRequest::validate`] rather than by construction so that a
/// malformed request can be reported back to the caller verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub urls: Vec<String>,
    pub file: Option<FilePayload>,
    /// Overrides the configured defaults when set.
    pub params: Option<AnalysisParams>,
}

impl AnalysisRequest {
    /// Creates a request over an ordered list of target URLs.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            file: None,
            params: None,
        }
    }

    /// Creates a request over a single uploaded file.
    pub fn from_file(file: FilePayload) -> Self {
        Self {
            urls: vec![],
            file: Some(file),
            params: None,
        }
    }

    pub fn with_file(mut self, file: FilePayload) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_params(mut self, params: AnalysisParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Checks the request and resolves it into what goes on the wire.
    pub fn validate(&self, defaults: &AnalysisParams) -> Result<SubmitRequest<'_>, ValidationError> {
        let source = match (self.urls.is_empty(), &self.file) {
            (false, Some(_)) => return Err(ValidationError::BothSources),
            (true, None) => return Err(ValidationError::NoSource),
            (false, None) => {
                validate_urls(&self.urls)?;
                JobSource::Urls(&self.urls)
            }
            (true, Some(file)) => {
                file.validate()?;
                JobSource::File(file)
            }
        };

        let params = self.params.unwrap_or(*defaults);
        params.validate()?;

        Ok(SubmitRequest { source, params })
    }
}

fn validate_urls(urls: &[String]) -> Result<(), ValidationError> {
    for (index, url) in urls.iter().enumerate() {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::BlankUrl { index });
        }
        match reqwest::Url::parse(trimmed) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => {
                return Err(ValidationError::UnsupportedScheme {
                    url: url.clone(),
                })
            }
        }
    }
    Ok(())
}

/// Where the analyzed content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSource<'a> {
    Urls(&'a [String]),
    File(&'a FilePayload),
}

/// A validated submission, ready to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitRequest<'a> {
    pub source: JobSource<'a>,
    pub params: AnalysisParams,
}
