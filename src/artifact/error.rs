// ABOUTME: Artifact error types with SNAFU pattern.
// ABOUTME: Unifies detection, transport, conversion, and git failures behind one kind() accessor.

use snafu::Snafu;

use super::convert::ConvertError;
use super::git::GitError;
use crate::platform::PlatformError;
use crate::types::AppGuid;

/// Unified error for acquiring, fingerprinting, and uploading artifacts.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ArtifactError {
    #[snafu(display("Handler for path '{location}' cannot be found."))]
    NoHandler { location: String },

    #[snafu(display("{action}: {source}"))]
    Io {
        action: String,
        source: std::io::Error,
    },

    #[snafu(display("failed to build HTTP client: {source}"))]
    Client { source: reqwest::Error },

    #[snafu(display("request to {url} failed: {source}"))]
    Request { url: String, source: reqwest::Error },

    #[snafu(display("Error occurred when downloading file: {status}: \n{body}"))]
    DownloadStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[snafu(display("failed to build zip archive: {source}"))]
    Convert { source: ConvertError },

    #[snafu(display("git source '{location}': {source}"))]
    Git { location: String, source: GitError },

    #[snafu(display("archive task panicked or was cancelled: {source}"))]
    Task { source: tokio::task::JoinError },

    #[snafu(display("failed to upload bits for app {app}: {source}"))]
    Upload { app: AppGuid, source: PlatformError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactErrorKind {
    /// No handler recognizes the location.
    Detection,
    /// Network or git transport failure.
    Transport,
    /// Git ref exists neither as a branch nor as a tag.
    ReferenceNotFound,
    /// Tar to zip conversion or local zipping failed.
    Conversion,
    /// Local filesystem failure.
    Io,
    /// The platform rejected the upload.
    Upload,
}

impl ArtifactError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ArtifactErrorKind {
        match self {
            ArtifactError::NoHandler { .. } => ArtifactErrorKind::Detection,
            ArtifactError::Client { .. }
            | ArtifactError::Request { .. }
            | ArtifactError::DownloadStatus { .. } => ArtifactErrorKind::Transport,
            ArtifactError::Convert { .. } => ArtifactErrorKind::Conversion,
            ArtifactError::Git { source, .. } => match source {
                GitError::ReferenceNotFound { .. } => ArtifactErrorKind::ReferenceNotFound,
                GitError::Io(_) => ArtifactErrorKind::Io,
                GitError::CommandFailed { .. } | GitError::InvalidUrl(_) => {
                    ArtifactErrorKind::Transport
                }
            },
            ArtifactError::Io { .. } | ArtifactError::Task { .. } => ArtifactErrorKind::Io,
            ArtifactError::Upload { .. } => ArtifactErrorKind::Upload,
        }
    }

    /// HTTP status of a failed download, if this is one.
    pub fn download_status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ArtifactError::DownloadStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_handler_names_the_location() {
        let err = ArtifactError::NoHandler {
            location: "/does/not/exist".into(),
        };
        assert_eq!(
            err.to_string(),
            "Handler for path '/does/not/exist' cannot be found."
        );
        assert_eq!(err.kind(), ArtifactErrorKind::Detection);
    }

    #[test]
    fn download_status_message_carries_body() {
        let err = ArtifactError::DownloadStatus {
            status: reqwest::StatusCode::NOT_FOUND,
            body: "no such file".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404 Not Found"));
        assert!(msg.ends_with("no such file"));
        assert_eq!(err.download_status(), Some(reqwest::StatusCode::NOT_FOUND));
    }

    #[test]
    fn missing_ref_has_its_own_kind() {
        let err = ArtifactError::Git {
            location: "https://x.com/repo.git#v9".into(),
            source: GitError::ReferenceNotFound {
                reference: "v9".into(),
                tried: vec!["refs/heads/v9".into(), "refs/tags/v9".into()],
            },
        };
        assert_eq!(err.kind(), ArtifactErrorKind::ReferenceNotFound);
    }
}
