// ABOUTME: Platform bits commands: upload and remote fingerprint.
// ABOUTME: Builds a controller client from the discovered configuration.

use cfship::artifact::ArtifactManager;
use cfship::artifact::location::redact_location;
use cfship::config::Config;
use cfship::error::{Error, Result};
use cfship::output::Output;
use cfship::platform::{BitsOps, CloudControllerBits};
use cfship::types::AppGuid;

fn controller(config: &Config) -> Result<CloudControllerBits> {
    let token = config.api.token.resolve()?;
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(config.skip_ssl_validation)
        .build()
        .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {e}")))?;
    Ok(CloudControllerBits::new(client, &config.api.endpoint, &token).with_timeouts(config.bits_timeouts()))
}

/// Upload `location` as the bits of `app`.
pub async fn upload(
    config: &Config,
    manager: &ArtifactManager,
    app: &str,
    location: &str,
    mut output: Output,
) -> Result<()> {
    let bits = controller(config)?;
    let app = AppGuid::new(app);

    output.start_timer();
    output.progress(&format!("Uploading {} to app {app}", redact_location(location)));
    manager.upload(&bits, &app, location).await?;

    let local = manager.fingerprint(location).await?;
    let remote = bits.remote_fingerprint(&app).await?;
    output.result("local fingerprint", &local);
    output.result("remote fingerprint", &remote);
    output.success("Upload complete");
    Ok(())
}

/// Print the fingerprint of the bits the platform holds for `app`.
pub async fn remote_fingerprint(config: &Config, app: &str, output: &Output) -> Result<()> {
    let bits = controller(config)?;
    let fingerprint = bits.remote_fingerprint(&AppGuid::new(app)).await?;
    output.result("remote fingerprint", &fingerprint);
    Ok(())
}
