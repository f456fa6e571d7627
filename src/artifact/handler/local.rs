// ABOUTME: Handler for local directories and files.
// ABOUTME: Zips the path into a temp file that is removed on release.

use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snafu::ResultExt;

use super::SourceHandler;
use crate::artifact::convert::ConvertError;
use crate::artifact::error::{ArtifactError, ConvertSnafu, IoSnafu, TaskSnafu};
use crate::artifact::fingerprint::fingerprint;
use crate::artifact::handle::{ArchiveHandle, Cleanup};
use crate::artifact::location::SourceKind;
use crate::artifact::zipper::zip_path;

const TEMP_PREFIX: &str = "uploads-";

/// Serves any location that exists on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHandler;

impl LocalHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceHandler for LocalHandler {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    fn detect(&self, location: &str) -> bool {
        Path::new(location).exists()
    }

    async fn acquire(&self, location: &str) -> Result<ArchiveHandle, ArtifactError> {
        zip_local(Path::new(location)).await
    }

    async fn fingerprint(&self, location: &str) -> Result<String, ArtifactError> {
        let (reader, _, cleanup) = self.acquire(location).await?.into_parts();
        let result = fingerprint(reader).await.context(IoSnafu {
            action: "failed to read local archive",
        });
        cleanup.release().await.context(IoSnafu {
            action: "failed to remove local archive",
        })?;
        result
    }
}

/// Zip `source` into a fresh temp file and open it for reading.
pub(crate) async fn zip_local(source: &Path) -> Result<ArchiveHandle, ArtifactError> {
    let (file, path) = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".zip")
        .tempfile()
        .and_then(|temp| temp.keep().map_err(|e| e.error))
        .context(IoSnafu {
            action: "failed to create temporary archive",
        })?;
    let cleanup = Cleanup::file(&path);

    tracing::debug!(source = %source.display(), archive = %path.display(), "zipping local path");
    let source: PathBuf = source.to_path_buf();
    let zipped = tokio::task::spawn_blocking(move || {
        let mut file = zip_path(&source, file)?;
        file.flush()?;
        file.seek(SeekFrom::Start(0))?;
        let size = file.metadata()?.len();
        Ok::<_, ConvertError>((file, size))
    })
    .await;

    match zipped {
        Ok(Ok((file, size))) => Ok(ArchiveHandle::new(
            Box::new(tokio::fs::File::from_std(file)),
            size,
            cleanup,
        )),
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
