// ABOUTME: Bits operations against the Cloud Controller v2 HTTP API.
// ABOUTME: Multipart upload, download-based fingerprint, and copy_bits with job polling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tokio_util::io::{ReaderStream, StreamReader};

use super::{BitsOps, Job, PlatformError};
use crate::artifact::{ArchiveReader, fingerprint};
use crate::poll::{PollError, poll};
use crate::types::AppGuid;

/// Waiting limits for bits operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitsTimeouts {
    /// Delay between job status checks.
    pub job_interval: Duration,
    /// Ceiling for an upload job to finish.
    pub upload_timeout: Duration,
    /// Ceiling for the fingerprint download request.
    pub download_timeout: Duration,
}

impl Default for BitsTimeouts {
    fn default() -> Self {
        Self {
            job_interval: Duration::from_secs(2),
            upload_timeout: Duration::from_secs(15 * 60),
            download_timeout: Duration::from_secs(2),
        }
    }
}

/// [`BitsOps`] over the controller's `/v2/apps/:guid/bits` family of endpoints.
#[derive(Debug, Clone)]
pub struct CloudControllerBits {
    client: reqwest::Client,
    endpoint: String,
    authorization: String,
    timeouts: BitsTimeouts,
}

impl CloudControllerBits {
    /// `token` may be given with or without its `bearer ` prefix.
    pub fn new(client: reqwest::Client, endpoint: &str, token: &str) -> Self {
        let authorization = if token.to_ascii_lowercase().starts_with("bearer ") {
            token.to_string()
        } else {
            format!("bearer {}", token)
        };
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            authorization,
            timeouts: BitsTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: BitsTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PlatformError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn get_job(&self, guid: &str) -> Result<Job, PlatformError> {
        let response = self
            .client
            .get(self.url(&format!("/v2/jobs/{}", guid)))
            .header(AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        Self::json(response).await
    }

    /// Poll `job` until it finishes or fails.
    async fn wait_for_job(
        &self,
        job: Job,
        operation: &str,
        timeout: Option<Duration>,
    ) -> Result<(), PlatformError> {
        let guid = job.entity.guid;
        tracing::debug!(job = %guid, operation, "waiting for job");

        let result = poll(self.timeouts.job_interval, timeout, || async {
            let job = self.get_job(&guid).await?;
            match job.entity.status.as_str() {
                "finished" => Ok(Some(())),
                "failed" => {
                    let details = job.entity.error_details.unwrap_or_default();
                    Err(PlatformError::JobFailed {
                        error_code: details.error_code,
                        description: details.description,
                        code: details.code,
                    })
                }
                _ => Ok(None),
            }
        })
        .await;

        result.map_err(|e| match e {
            PollError::Timeout(after) => PlatformError::Timeout {
                operation: operation.to_string(),
                after,
            },
            PollError::Failed(e) => e,
        })
    }
}

/// Multipart form for an upload: empty `resources` plus the zip itself.
pub(crate) fn upload_form(archive: ArchiveReader, size: u64) -> Result<Form, PlatformError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(
        HeaderName::from_static("content-transfer-encoding"),
        HeaderValue::from_static("binary"),
    );

    let body = reqwest::Body::wrap_stream(ReaderStream::new(archive));
    let part = Part::stream_with_length(body, size)
        .file_name("application.zip")
        .mime_str("application/zip")?
        .headers(headers);

    Ok(Form::new().text("resources", "[]").part("application", part))
}

#[async_trait]
impl BitsOps for CloudControllerBits {
    async fn upload_bits(
        &self,
        app: &AppGuid,
        archive: ArchiveReader,
        size: u64,
    ) -> Result<(), PlatformError> {
        let form = upload_form(archive, size)?;
        let response = self
            .client
            .put(self.url(&format!("/v2/apps/{}/bits?async=true", app)))
            .header(AUTHORIZATION, &self.authorization)
            .multipart(form)
            .send()
            .await?;
        let job: Job = Self::json(response).await?;

        self.wait_for_job(job, "bits upload", Some(self.timeouts.upload_timeout))
            .await?;
        tracing::info!(app = %app, size, "uploaded application bits");
        Ok(())
    }

    /// The body is fingerprinted whatever the status, so an app without bits
    /// still yields a stable value.
    async fn remote_fingerprint(&self, app: &AppGuid) -> Result<String, PlatformError> {
        let response = self
            .client
            .get(self.url(&format!("/v2/apps/{}/download", app)))
            .header(AUTHORIZATION, &self.authorization)
            .timeout(self.timeouts.download_timeout)
            .send()
            .await?;
        tracing::debug!(app = %app, status = %response.status(), "downloading bits prefix");

        let body = StreamReader::new(Box::pin(futures::TryStreamExt::map_err(
            response.bytes_stream(),
            std::io::Error::other,
        )));
        Ok(fingerprint(body).await?)
    }

    async fn copy_bits(&self, source: &AppGuid, target: &AppGuid) -> Result<(), PlatformError> {
        let response = self
            .client
            .post(self.url(&format!("/v2/apps/{}/copy_bits", target)))
            .header(AUTHORIZATION, &self.authorization)
            .json(&serde_json::json!({ "source_app_guid": source.as_str() }))
            .send()
            .await?;
        let job: Job = Self::json(response).await?;

        self.wait_for_job(job, "bits copy", None).await?;
        tracing::info!(source = %source, target = %target, "copied application bits");
        Ok(())
    }
}
