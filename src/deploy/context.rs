// ABOUTME: Shared state for one deploy attempt, threaded through every pipeline step.
// ABOUTME: Tracks what has been changed so rollback only undoes what actually happened.

use std::sync::Arc;
use std::time::Duration;

use crate::artifact::ArtifactManager;
use crate::diagnostics::Diagnostics;
use crate::platform::{AppParams, Bindings};
use crate::types::{AppGuid, AppName};

use super::bits::BitsFingerprints;

/// The live application as it was before any change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginApp {
    pub guid: AppGuid,
    pub name: AppName,
}

/// What the application should look like after the update.
#[derive(Debug, Clone)]
pub struct DesiredApp {
    pub params: AppParams,
    pub bindings: Bindings,
    /// Artifact location for the bits.
    pub location: String,
    /// Whether the app should be running afterwards.
    pub started: bool,
}

/// Polling cadence for start-up verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupPolling {
    pub interval: Duration,
    pub staging_timeout: Duration,
}

impl Default for StartupPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            staging_timeout: Duration::from_secs(15 * 60),
        }
    }
}

/// Context passed to every blue-green step, forward and reverse.
pub struct DeployContext<P> {
    pub platform: Arc<P>,
    pub artifacts: Arc<ArtifactManager>,
    pub polling: StartupPolling,
    pub origin: OriginApp,
    pub desired: DesiredApp,
    /// The replacement app, once created.
    pub new_app: Option<AppGuid>,
    /// Whether the origin currently carries its venerable name.
    pub origin_renamed: bool,
    /// Fingerprints recorded when bits were sent.
    pub fingerprints: Option<BitsFingerprints>,
    pub diagnostics: Diagnostics,
}

impl<P> DeployContext<P> {
    pub fn new(
        platform: Arc<P>,
        artifacts: Arc<ArtifactManager>,
        polling: StartupPolling,
        origin: OriginApp,
        desired: DesiredApp,
    ) -> Self {
        Self {
            platform,
            artifacts,
            polling,
            origin,
            desired,
            new_app: None,
            origin_renamed: false,
            fingerprints: None,
            diagnostics: Diagnostics::default(),
        }
    }
}
