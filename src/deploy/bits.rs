// ABOUTME: Bits bookkeeping: upload with fingerprint recording, and change detection.
// ABOUTME: A change is reported when either the local source or the platform copy moved.

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactManager;
use crate::platform::BitsOps;
use crate::types::AppGuid;

use super::error::DeployError;

/// Fingerprints recorded after bits were sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitsFingerprints {
    /// Fingerprint of the artifact location.
    pub local: String,
    /// Fingerprint of the bits held by the platform.
    pub remote: String,
}

/// Outcome of comparing current fingerprints with recorded ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitsChange {
    pub changed: bool,
    /// Current fingerprints, to record if the change is acted on.
    pub fingerprints: BitsFingerprints,
}

/// Upload `location` as `app`'s bits and record both fingerprints.
pub async fn send_bits<B>(
    bits: &B,
    artifacts: &ArtifactManager,
    app: &AppGuid,
    location: &str,
) -> Result<BitsFingerprints, DeployError>
where
    B: BitsOps + ?Sized,
{
    artifacts.upload(bits, app, location).await?;
    let local = artifacts.fingerprint(location).await?;
    let remote = bits.remote_fingerprint(app).await?;
    tracing::debug!(app = %app, local = %local, remote = %remote, "recorded fingerprints");
    Ok(BitsFingerprints { local, remote })
}

/// Compare the location and the platform copy against `known`.
pub async fn detect_bits_change<B>(
    bits: &B,
    artifacts: &ArtifactManager,
    app: &AppGuid,
    location: &str,
    known: &BitsFingerprints,
) -> Result<BitsChange, DeployError>
where
    B: BitsOps + ?Sized,
{
    let local = artifacts.diff(location, &known.local).await?;
    let remote = bits.remote_fingerprint(app).await?;
    let changed = local.changed || remote != known.remote;
    tracing::debug!(
        app = %app,
        local_changed = local.changed,
        remote_changed = remote != known.remote,
        "checked bits"
    );

    Ok(BitsChange {
        changed,
        fingerprints: BitsFingerprints {
            local: local.fingerprint,
            remote,
        },
    })
}
