// ABOUTME: Platform boundary traits consumed by the artifact manager and deploy orchestrator.
// ABOUTME: App CRUD, bindings, logs, and bits; the controller client lives behind these seams.

pub mod cloud_controller;
mod types;

pub use cloud_controller::{BitsTimeouts, CloudControllerBits};
pub use types::{
    App, AppInstance, AppParams, AppState, Bindings, InstanceState, Job, JobEntity,
    JobErrorDetails, JobMetadata, LogMessage, LogStream, PackageState,
};

use std::time::Duration;

use async_trait::async_trait;

use crate::artifact::ArchiveReader;
use crate::types::{AppGuid, AppName, RouteId, ServiceInstanceId};

/// Errors reported by a platform implementation.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("platform API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Error {error_code}, {description} [code: {code}]")]
    JobFailed {
        error_code: String,
        description: String,
        code: i64,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("failed to read application bits: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Application lifecycle operations.
#[async_trait]
pub trait AppOps: Send + Sync {
    async fn create_app(&self, params: &AppParams) -> Result<App, PlatformError>;

    async fn get_app(&self, guid: &AppGuid) -> Result<App, PlatformError>;

    async fn rename_app(&self, guid: &AppGuid, name: &AppName) -> Result<(), PlatformError>;

    /// Apply a full parameter set to an existing application.
    async fn update_app(&self, guid: &AppGuid, params: &AppParams) -> Result<App, PlatformError>;

    async fn set_state(&self, guid: &AppGuid, state: AppState) -> Result<(), PlatformError>;

    async fn delete_app(&self, guid: &AppGuid) -> Result<(), PlatformError>;

    async fn instances(&self, guid: &AppGuid) -> Result<Vec<AppInstance>, PlatformError>;
}

/// Route and service bindings.
#[async_trait]
pub trait BindingOps: Send + Sync {
    async fn bind_route(&self, route: &RouteId, app: &AppGuid) -> Result<(), PlatformError>;

    async fn bind_service(
        &self,
        service: &ServiceInstanceId,
        app: &AppGuid,
    ) -> Result<(), PlatformError>;
}

/// Recent application logs, used to explain start-up failures.
#[async_trait]
pub trait LogOps: Send + Sync {
    async fn recent_logs(&self, app: &AppGuid) -> Result<Vec<LogMessage>, PlatformError>;
}

/// Application bits storage.
#[async_trait]
pub trait BitsOps: Send + Sync {
    /// Upload a zip archive of `size` bytes as `app`'s bits.
    async fn upload_bits(
        &self,
        app: &AppGuid,
        archive: ArchiveReader,
        size: u64,
    ) -> Result<(), PlatformError>;

    /// Fingerprint of the bits the platform currently holds for `app`.
    async fn remote_fingerprint(&self, app: &AppGuid) -> Result<String, PlatformError>;

    /// Copy `source`'s bits into `target` on the platform side.
    async fn copy_bits(&self, source: &AppGuid, target: &AppGuid) -> Result<(), PlatformError>;
}

/// Everything the deploy orchestrator needs from the platform.
pub trait Platform: AppOps + BindingOps + LogOps + BitsOps {}

impl<T> Platform for T where T: AppOps + BindingOps + LogOps + BitsOps {}
