// ABOUTME: Handler for http(s) git repositories with an optional #ref fragment.
// ABOUTME: Checks the ref out into a temp dir, drops .git, and zips the tree.

use std::path::Path;

use async_trait::async_trait;
use snafu::ResultExt;

use super::SourceHandler;
use super::local::zip_local;
use crate::artifact::error::{ArtifactError, GitSnafu, IoSnafu};
use crate::artifact::git::{GitResolver, GitSource};
use crate::artifact::handle::{ArchiveHandle, Cleanup};
use crate::artifact::location::{SourceKind, is_git_url, redact_location};

/// Serves `http(s)://…/repo.git[#ref]` locations.
#[derive(Debug, Clone, Default)]
pub struct GitHandler {
    resolver: GitResolver,
}

impl GitHandler {
    pub fn new(resolver: GitResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl SourceHandler for GitHandler {
    fn kind(&self) -> SourceKind {
        SourceKind::Git
    }

    fn detect(&self, location: &str) -> bool {
        is_git_url(location)
    }

    async fn acquire(&self, location: &str) -> Result<ArchiveHandle, ArtifactError> {
        let shown = redact_location(location);
        let source = GitSource::parse(location).context(GitSnafu { location: &shown })?;
        let dir = tempfile::Builder::new()
            .prefix("git-clone-")
            .tempdir()
            .context(IoSnafu {
                action: "failed to create clone directory",
            })?
            .keep();
        let clone = Cleanup::dir(&dir);

        let prepared = async {
            let resolved = self
                .resolver
                .checkout(&source, &dir)
                .await
                .context(GitSnafu { location: &shown })?;
            tracing::info!(
                url = %source.url,
                reference = %resolved.reference,
                commit = %resolved.commit,
                "checked out git source"
            );
            remove_git_metadata(&dir).await?;
            zip_local(&dir).await
        }
        .await;

        match prepared {
            Ok(handle) => {
                // The handle now owns the clone directory alongside its zip.
                clone.disarm();
                Ok(handle.also_remove_dir(dir))
            }
            Err(e) => {
                clone.discard().await;
                Err(e)
            }
        }
    }

    /// A full commit hash is returned as given; anything else is resolved
    /// against the remote and reported as the commit at its head.
    async fn fingerprint(&self, location: &str) -> Result<String, ArtifactError> {
        let shown = redact_location(location);
        let source = GitSource::parse(location).context(GitSnafu { location: &shown })?;
        self.resolver
            .head_commit(&source)
            .await
            .context(GitSnafu { location: &shown })
    }
}

async fn remove_git_metadata(dir: &Path) -> Result<(), ArtifactError> {
    match tokio::fs::remove_dir_all(dir.join(".git")).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context(IoSnafu {
            action: "failed to remove .git from clone",
        }),
    }
}
