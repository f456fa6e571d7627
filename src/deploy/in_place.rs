// ABOUTME: In-place update strategies that modify the live app without a replacement.
// ABOUTME: Used when blue-green is opted out; the app is briefly unavailable.

use crate::artifact::ArtifactManager;
use crate::platform::{AppParams, AppState, Platform};
use crate::types::{AppGuid, AppName};

use super::bits::{BitsFingerprints, send_bits};
use super::context::StartupPolling;
use super::error::DeployError;
use super::start::start_app;

/// Stop the app, upload new bits, and start it again.
pub async fn deploy_in_place<P: Platform + ?Sized>(
    platform: &P,
    artifacts: &ArtifactManager,
    app: &AppGuid,
    name: &AppName,
    location: &str,
    polling: StartupPolling,
) -> Result<BitsFingerprints, DeployError> {
    tracing::info!(app = %name, "deploying in place");
    platform.set_state(app, AppState::Stopped).await?;
    let fingerprints = send_bits(platform, artifacts, app, location).await?;
    start_app(platform, app, name, polling).await?;
    Ok(fingerprints)
}

/// Apply new parameters and restart the app so it restages.
pub async fn restage_in_place<P: Platform + ?Sized>(
    platform: &P,
    app: &AppGuid,
    params: &AppParams,
    polling: StartupPolling,
) -> Result<(), DeployError> {
    tracing::info!(app = %params.name, "restaging in place");
    platform.update_app(app, params).await?;
    platform.set_state(app, AppState::Stopped).await?;
    start_app(platform, app, &params.name, polling).await
}
