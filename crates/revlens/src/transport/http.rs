//! HTTP implementation of the request/response seam.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::JobBackend;
use crate::config::{EndpointPaths, ServerConfig};
use crate::error::TransportError;
use crate::model::{AnalysisParams, JobId, JobRecord, JobSource, SubmitRequest};

/// Maximum length for error bodies echoed into errors and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

pub(super) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... (truncated)", &body[..cut]),
        None => body.to_string(),
    }
}

/// Tuning fields as the backend names them. `max_items` goes out as
/// `max_reviews`; the backend ignores fields it does not know.
#[derive(Serialize)]
struct WireParams {
    max_reviews: u32,
    batch_size: u32,
    max_pages: u32,
}

impl From<AnalysisParams> for WireParams {
    fn from(params: AnalysisParams) -> Self {
        Self {
            max_reviews: params.max_items,
            batch_size: params.batch_size,
            max_pages: params.max_pages,
        }
    }
}

#[derive(Serialize)]
struct UrlSubmission<'a> {
    urls: &'a [String],
    #[serde(flatten)]
    params: WireParams,
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(rename = "jobId", alias = "job_id")]
    job_id: JobId,
}

/// Talks to the analysis backend over HTTP.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    paths: EndpointPaths,
}

impl HttpBackend {
    pub fn new(server: &ServerConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(server.connect_timeout())
            .timeout(server.request_timeout())
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: server.base_url.trim_end_matches('/').to_string(),
            paths: server.paths.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn job_endpoint(&self, template: &str, job_id: &JobId) -> String {
        self.endpoint(&template.replace("{id}", job_id.as_str()))
    }

    async fn submit_urls(
        &self,
        urls: &[String],
        params: AnalysisParams,
    ) -> Result<Response, TransportError> {
        info!("Submitting analysis of {} URL(s)", urls.len());
        let response = self
            .client
            .post(self.endpoint(&self.paths.submit_urls))
            .json(&UrlSubmission {
                urls,
                params: params.into(),
            })
            .send()
            .await?;
        Ok(response)
    }

    async fn submit_upload(
        &self,
        filename: &str,
        bytes: &[u8],
        mime_type: &str,
        params: AnalysisParams,
    ) -> Result<Response, TransportError> {
        info!("Submitting analysis of uploaded file '{}'", filename);
        let part = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("max_reviews", params.max_items.to_string())
            .text("batch_size", params.batch_size.to_string())
            .text("max_pages", params.max_pages.to_string());

        let response = self
            .client
            .post(self.endpoint(&self.paths.submit_upload))
            .multipart(form)
            .send()
            .await?;
        Ok(response)
    }
}

/// Maps non-success responses to transport errors.
async fn check_status(response: Response, job_id: Option<&JobId>) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(job_id) = job_id {
            return Err(TransportError::NotFound(job_id.clone()));
        }
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Http {
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

#[async_trait]
impl JobBackend for HttpBackend {
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<JobId, TransportError> {
        let response = match request.source {
            JobSource::Urls(urls) => self.submit_urls(urls, request.params).await?,
            JobSource::File(file) => {
                self.submit_upload(&file.filename, &file.bytes, &file.mime_type(), request.params)
                    .await?
            }
        };
        let response = check_status(response, None).await?;
        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(format!("Failed to parse submit response: {}", e)))?;

        info!("Job {} accepted by backend", body.job_id);
        Ok(body.job_id)
    }

    async fn fetch_job(&self, job_id: &JobId) -> Result<JobRecord, TransportError> {
        let response = self
            .client
            .get(self.job_endpoint(&self.paths.job, job_id))
            .send()
            .await?;
        let response = check_status(response, Some(job_id)).await?;
        let record: JobRecord = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(format!("Failed to parse job record: {}", e)))?;

        debug!(
            "Fetched job {}: {} at {}%",
            job_id, record.status, record.progress
        );
        Ok(record)
    }

    async fn cancel(&self, job_id: &JobId) -> Result<(), TransportError> {
        let response = self
            .client
            .delete(self.job_endpoint(&self.paths.job, job_id))
            .send()
            .await?;
        check_status(response, Some(job_id)).await?;
        info!("Cancellation of job {} sent", job_id);
        Ok(())
    }

    async fn download(&self, report: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.endpoint(&self.paths.download.replace("{report}", report));
        let response = self.client.get(url).send().await?;
        let response = check_status(response, None).await?;
        let bytes = response.bytes().await?;
        debug!("Downloaded report '{}' ({} bytes)", report, bytes.len());
        Ok(bytes.to_vec())
    }
}
