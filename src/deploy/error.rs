// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers platform, artifact, start-up verification, and blue-green pipeline failures.

use std::fmt;
use std::time::Duration;

use crate::artifact::ArtifactError;
use crate::diagnostics::Warning;
use crate::pipeline::PipelineError;
use crate::platform::{InstanceState, LogMessage, PlatformError};
use crate::types::AppName;

/// Errors that can occur while updating an application.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The app did not come up; carries recent logs or why they are missing.
    #[error("{failure}{logs}")]
    Startup {
        app: AppName,
        failure: StartupFailure,
        logs: RecentLogs,
    },

    /// A blue-green pipeline failed, possibly leaving state to verify by hand.
    #[error("error when trying to update the app {app} in blue-green {mode} mode: {source}")]
    BlueGreen {
        app: AppName,
        mode: BlueGreenMode,
        source: Box<PipelineError<DeployError>>,
        /// Warnings collected before and during rollback.
        warnings: Vec<Warning>,
    },
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Platform(_) => DeployErrorKind::Platform,
            DeployError::Artifact(_) => DeployErrorKind::Artifact,
            DeployError::Startup { .. } => DeployErrorKind::Startup,
            DeployError::BlueGreen { source, .. } if source.is_rollback_failure() => {
                DeployErrorKind::RollbackFailed
            }
            DeployError::BlueGreen { .. } => DeployErrorKind::RolledBack,
        }
    }

    /// Non-fatal problems recorded before the failure, such as a replacement
    /// app that could not be deleted.
    pub fn warnings(&self) -> &[Warning] {
        match self {
            DeployError::BlueGreen { warnings, .. } => warnings,
            _ => &[],
        }
    }
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Platform,
    Artifact,
    Startup,
    /// A blue-green step failed and every completed step was undone.
    RolledBack,
    /// A blue-green step failed and undoing it failed too.
    RollbackFailed,
}

/// Which blue-green flow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlueGreenMode {
    Deploy,
    Restage,
}

impl fmt::Display for BlueGreenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlueGreenMode::Deploy => write!(f, "deploy"),
            BlueGreenMode::Restage => write!(f, "restage"),
        }
    }
}

/// Why an app failed to start.
#[derive(Debug, thiserror::Error)]
pub enum StartupFailure {
    #[error("Staging failed for app {app}")]
    StagingFailed { app: AppName },

    #[error("Staging of app {app} did not finish within {after:?}")]
    StagingTimeout { app: AppName, after: Duration },

    #[error("Instance {index} failed with state {state} for app {app}")]
    InstanceFailed {
        index: u32,
        state: InstanceState,
        app: AppName,
    },

    #[error("{0}")]
    Platform(#[from] PlatformError),
}

/// Recent logs attached to a start-up failure.
#[derive(Debug)]
pub enum RecentLogs {
    Lines(Vec<LogMessage>),
    /// Fetching logs failed; the reason replaces them.
    Unavailable(String),
}

impl fmt::Display for RecentLogs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecentLogs::Lines(lines) => {
                write!(f, ":")?;
                for line in lines {
                    write!(f, "\n\t{}", line)?;
                }
                Ok(())
            }
            RecentLogs::Unavailable(reason) => {
                write!(f, " and failed to retrieve logs (error: {})", reason)
            }
        }
    }
}
