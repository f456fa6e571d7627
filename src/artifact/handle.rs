// ABOUTME: Archive handle pairing a byte stream with its size and cleanup obligations.
// ABOUTME: Cleanup is released once; a dropped, unreleased cleanup removes its paths and warns.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncRead;

/// Byte stream of an uploadable zip archive.
pub type ArchiveReader = Box<dyn AsyncRead + Send + Unpin>;

/// An acquired archive ready to be streamed.
pub struct ArchiveHandle {
    reader: ArchiveReader,
    size: u64,
    cleanup: Cleanup,
}

impl ArchiveHandle {
    pub fn new(reader: ArchiveReader, size: u64, cleanup: Cleanup) -> Self {
        Self {
            reader,
            size,
            cleanup,
        }
    }

    /// Declared length of the archive in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Also remove `dir` on release, after any paths already registered.
    pub fn also_remove_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cleanup.targets.push(Target::Dir(dir.into()));
        self
    }

    /// Split into stream, size, and cleanup so the stream can be consumed first.
    pub fn into_parts(self) -> (ArchiveReader, u64, Cleanup) {
        (self.reader, self.size, self.cleanup)
    }

    /// Drop the stream and release the cleanup.
    pub async fn release(self) -> std::io::Result<()> {
        let (reader, _, cleanup) = self.into_parts();
        drop(reader);
        cleanup.release().await
    }
}

impl fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveHandle")
            .field("size", &self.size)
            .field("cleanup", &self.cleanup)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    File(PathBuf),
    Dir(PathBuf),
}

impl Target {
    fn path(&self) -> &Path {
        match self {
            Target::File(p) | Target::Dir(p) => p,
        }
    }
}

/// Temporary paths owned by an archive, removed in registration order.
#[derive(Debug, Default)]
pub struct Cleanup {
    targets: Vec<Target>,
    released: bool,
}

impl Cleanup {
    /// Nothing to remove.
    pub fn none() -> Self {
        Self::default()
    }

    /// Remove `path` on release.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            targets: vec![Target::File(path.into())],
            released: false,
        }
    }

    /// Remove the directory tree at `path` on release.
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            targets: vec![Target::Dir(path.into())],
            released: false,
        }
    }

    /// Paths this cleanup will remove.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().map(Target::path)
    }

    /// Remove every registered path. Paths that are already gone are not errors.
    ///
    /// All targets are attempted; the first failure is returned.
    pub async fn release(mut self) -> std::io::Result<()> {
        self.released = true;
        let mut first_error = None;

        for target in std::mem::take(&mut self.targets) {
            let result = match &target {
                Target::File(p) => tokio::fs::remove_file(p).await,
                Target::Dir(p) => tokio::fs::remove_dir_all(p).await,
            };
            match result {
                Ok(()) => tracing::debug!(path = %target.path().display(), "released"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Give up ownership without removing anything.
    pub(crate) fn disarm(mut self) {
        self.released = true;
    }

    /// Release on an error path, where a cleanup failure must not mask the cause.
    pub(crate) async fn discard(self) {
        if let Err(e) = self.release().await {
            tracing::warn!("failed to remove partial archive: {}", e);
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        if self.released || self.targets.is_empty() {
            return;
        }
        tracing::warn!("archive dropped without release, removing temporary files");
        for target in &self.targets {
            let result = match target {
                Target::File(p) => std::fs::remove_file(p),
                Target::Dir(p) => std::fs::remove_dir_all(p),
            };
            match result {
                Err(e) if e.kind() != ErrorKind::NotFound => {
                    tracing::warn!(path = %target.path().display(), "cleanup failed: {}", e);
                }
                _ => {}
            }
        }
    }
}
