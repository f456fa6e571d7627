// ABOUTME: Local artifact commands: fingerprint, diff, and package.
// ABOUTME: None of these talk to the platform, so no config is required.

use std::path::Path;

use cfship::artifact::ArtifactManager;
use cfship::artifact::location::redact_location;
use cfship::error::Result;
use cfship::output::Output;
use serde::Serialize;

/// Print the fingerprint of `location`.
pub async fn fingerprint(manager: &ArtifactManager, location: &str, output: &Output) -> Result<()> {
    output.progress(&format!("Fingerprinting {}", redact_location(location)));
    let fingerprint = manager.fingerprint(location).await?;
    output.result("fingerprint", &fingerprint);
    Ok(())
}

#[derive(Serialize)]
struct DiffReport {
    changed: bool,
    fingerprint: String,
}

impl std::fmt::Display for DiffReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.changed { "changed" } else { "unchanged" };
        write!(f, "{} {}", state, self.fingerprint)
    }
}

/// Compare `location` with a known fingerprint.
pub async fn diff(
    manager: &ArtifactManager,
    location: &str,
    known: &str,
    output: &Output,
) -> Result<()> {
    let diff = manager.diff(location, known).await?;
    output.result(
        "diff",
        &DiffReport {
            changed: diff.changed,
            fingerprint: diff.fingerprint,
        },
    );
    Ok(())
}

/// Write the uploadable archive for `location` to `dest`.
pub async fn package(
    manager: &ArtifactManager,
    location: &str,
    dest: &Path,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    output.progress(&format!("Packaging {}", redact_location(location)));

    let (mut reader, size, cleanup) = manager.acquire(location).await?.into_parts();
    let written = async {
        let mut file = tokio::fs::File::create(dest).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.sync_all().await?;
        Ok::<_, std::io::Error>(written)
    }
    .await;
    drop(reader);
    cleanup.release().await?;
    let written = written?;

    tracing::debug!(declared = size, written, "archive written");
    output.success(&format!("Wrote {} ({} bytes)", dest.display(), written));
    Ok(())
}
