// ABOUTME: Artifact acquisition and fingerprinting.
// ABOUTME: Turns local paths, archive URLs, and git URLs into uploadable zip archives.

pub mod convert;
mod error;
pub mod fingerprint;
pub mod git;
mod handle;
pub mod handler;
pub mod location;
mod manager;
pub mod zipper;

pub use error::{ArtifactError, ArtifactErrorKind};
pub use fingerprint::{FINGERPRINT_PREFIX_LEN, fingerprint, fingerprint_bytes};
pub use handle::{ArchiveHandle, ArchiveReader, Cleanup};
pub use location::{ArchiveFormat, SourceKind};
pub use manager::{ArtifactManager, Diff};
