// ABOUTME: Handler for zip, tar, and tar.gz archives served over http(s).
// ABOUTME: Tarballs are converted into a temp zip; zip bodies stream straight through.

use std::io::{Seek, SeekFrom, Write};

use async_trait::async_trait;
use futures::TryStreamExt;
use snafu::{OptionExt, ResultExt};
use tokio::io::{AsyncRead, AsyncSeekExt};
use tokio_util::io::{StreamReader, SyncIoBridge};

use super::SourceHandler;
use crate::artifact::convert::{ConvertError, TarCompression, tar_to_zip};
use crate::artifact::error::{
    ArtifactError, ConvertSnafu, DownloadStatusSnafu, IoSnafu, NoHandlerSnafu, RequestSnafu,
    TaskSnafu,
};
use crate::artifact::fingerprint::fingerprint;
use crate::artifact::handle::{ArchiveHandle, Cleanup};
use crate::artifact::location::{ArchiveFormat, SourceKind, redact_location, web_archive_format};

const TEMP_PREFIX: &str = "downloads-";

/// Serves archive URLs recognized by their extension.
#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: reqwest::Client,
}

impl HttpHandler {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ArtifactError> {
        let shown = redact_location(url);
        tracing::debug!(url = %shown, "downloading artifact");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context(RequestSnafu { url: shown })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return DownloadStatusSnafu { status, body }.fail();
        }
        Ok(response)
    }

    async fn convert(
        &self,
        response: reqwest::Response,
        compression: TarCompression,
    ) -> Result<ArchiveHandle, ArtifactError> {
        let (file, path) = temp_zip()?;
        let cleanup = Cleanup::file(&path);

        // The bridge captures the current runtime handle, so build it before leaving it.
        let bridge = SyncIoBridge::new(body_reader(response));
        let converted = tokio::task::spawn_blocking(move || {
            let mut file = tar_to_zip(bridge, compression, file)?;
            file.flush()?;
            file.seek(SeekFrom::Start(0))?;
            let size = file.metadata()?.len();
            Ok::<_, ConvertError>((file, size))
        })
        .await;

        match converted {
            Ok(Ok((file, size))) => {
                tracing::debug!(archive = %path.display(), size, "converted tarball to zip");
                Ok(ArchiveHandle::new(
                    Box::new(tokio::fs::File::from_std(file)),
                    size,
                    cleanup,
                ))
            }
            Ok(Err(e)) => {
                cleanup.discard().await;
                Err(e).context(ConvertSnafu)
            }
            Err(e) => {
                cleanup.discard().await;
                Err(e).context(TaskSnafu)
            }
        }
    }

    /// Copy a body of unknown length to disk so its size is known before upload.
    async fn spool(&self, response: reqwest::Response) -> Result<ArchiveHandle, ArtifactError> {
        let (file, path) = temp_zip()?;
        let cleanup = Cleanup::file(&path);
        let mut file = tokio::fs::File::from_std(file);

        let spooled = async {
            let mut body = body_reader(response);
            let size = tokio::io::copy(&mut body, &mut file).await?;
            file.seek(SeekFrom::Start(0)).await?;
            Ok::<_, std::io::Error>(size)
        }
        .await;

        match spooled {
            Ok(size) => Ok(ArchiveHandle::new(Box::new(file), size, cleanup)),
            Err(e) => {
                cleanup.discard().await;
                Err(e).context(IoSnafu {
                    action: "failed to spool downloaded archive",
                })
            }
        }
    }
}

#[async_trait]
impl SourceHandler for HttpHandler {
    fn kind(&self) -> SourceKind {
        SourceKind::Http
    }

    fn detect(&self, location: &str) -> bool {
        web_archive_format(location).is_some()
    }

    async fn acquire(&self, location: &str) -> Result<ArchiveHandle, ArtifactError> {
        let format = web_archive_format(location).context(NoHandlerSnafu {
            location: redact_location(location),
        })?;
        let response = self.get(location).await?;

        match format {
            ArchiveFormat::Zip => match response.content_length() {
                Some(size) => Ok(ArchiveHandle::new(
                    Box::new(body_reader(response)),
                    size,
                    Cleanup::none(),
                )),
                None => self.spool(response).await,
            },
            ArchiveFormat::Tar => self.convert(response, TarCompression::None).await,
            ArchiveFormat::TarGz => self.convert(response, TarCompression::Gzip).await,
        }
    }

    /// Fingerprints the raw downloaded bytes. Tarballs are not converted first,
    /// so a tar source never fingerprints equal to the zip it uploads as.
    async fn fingerprint(&self, location: &str) -> Result<String, ArtifactError> {
        let response = self.get(location).await?;
        fingerprint(body_reader(response)).await.context(IoSnafu {
            action: format!("failed to read {}", redact_location(location)),
        })
    }
}

fn body_reader(response: reqwest::Response) -> impl AsyncRead + Send + Unpin + 'static {
    StreamReader::new(Box::pin(
        response.bytes_stream().map_err(std::io::Error::other),
    ))
}

fn temp_zip() -> Result<(std::fs::File, std::path::PathBuf), ArtifactError> {
    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".zip")
        .tempfile()
        .and_then(|temp| temp.keep().map_err(|e| e.error))
        .context(IoSnafu {
            action: "failed to create temporary archive",
        })
}
