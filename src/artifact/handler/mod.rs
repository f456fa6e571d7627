// ABOUTME: Source handler trait and the three location strategies.
// ABOUTME: Each handler detects its locations, acquires a zip archive, and fingerprints.

mod git;
mod http;
mod local;

pub use git::GitHandler;
pub use http::HttpHandler;
pub use local::LocalHandler;

use async_trait::async_trait;

use super::error::ArtifactError;
use super::handle::ArchiveHandle;
use super::location::SourceKind;

/// A strategy for one family of artifact locations.
#[async_trait]
pub trait SourceHandler: Send + Sync {
    /// Which family this handler serves.
    fn kind(&self) -> SourceKind;

    /// Whether this handler recognizes `location`. Must not touch the network.
    fn detect(&self, location: &str) -> bool;

    /// Produce an uploadable zip archive for `location`.
    async fn acquire(&self, location: &str) -> Result<ArchiveHandle, ArtifactError>;

    /// Cheap change-detection fingerprint for `location`.
    async fn fingerprint(&self, location: &str) -> Result<String, ArtifactError>;
}
