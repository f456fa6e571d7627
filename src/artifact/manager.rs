// ABOUTME: Artifact manager dispatching locations to the first matching source handler.
// ABOUTME: Exposes acquire, upload, fingerprint, and diff over any supported location.

use serde::Serialize;
use snafu::{OptionExt, ResultExt};

use super::error::{ArtifactError, ClientSnafu, IoSnafu, NoHandlerSnafu, UploadSnafu};
use super::git::GitResolver;
use super::handle::ArchiveHandle;
use super::handler::{GitHandler, HttpHandler, LocalHandler, SourceHandler};
use super::location::redact_location;
use crate::platform::BitsOps;
use crate::types::AppGuid;

/// Result of comparing a location's fingerprint to a known one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub changed: bool,
    pub fingerprint: String,
}

/// Routes locations to source handlers.
///
/// Handlers are consulted in order and the first detector match wins. The
/// default order is Git, Http, Local: a `.git` URL is also a web URL and a
/// local path could shadow either, so the most specific handler goes first.
pub struct ArtifactManager {
    handlers: Vec<Box<dyn SourceHandler>>,
}

impl ArtifactManager {
    /// Default handlers sharing `client` for downloads.
    pub fn new(client: reqwest::Client, resolver: GitResolver) -> Self {
        Self::with_handlers(vec![
            Box::new(GitHandler::new(resolver)),
            Box::new(HttpHandler::new(client)),
            Box::new(LocalHandler::new()),
        ])
    }

    /// Default handlers with a client honoring `skip_ssl_validation`.
    pub fn from_settings(skip_ssl_validation: bool) -> Result<Self, ArtifactError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(skip_ssl_validation)
            .build()
            .context(ClientSnafu)?;
        Ok(Self::new(client, GitResolver::new(skip_ssl_validation)))
    }

    /// Custom handler list, consulted in the given order.
    pub fn with_handlers(handlers: Vec<Box<dyn SourceHandler>>) -> Self {
        Self { handlers }
    }

    /// First handler whose detector accepts `location`.
    pub fn choose_handler(&self, location: &str) -> Result<&dyn SourceHandler, ArtifactError> {
        let handler = self
            .handlers
            .iter()
            .find(|h| h.detect(location))
            .context(NoHandlerSnafu {
                location: redact_location(location),
            })?;
        tracing::debug!(location = %redact_location(location), handler = %handler.kind(), "selected source handler");
        Ok(handler.as_ref())
    }

    /// Acquire an archive for `location`. The caller must release it.
    pub async fn acquire(&self, location: &str) -> Result<ArchiveHandle, ArtifactError> {
        self.choose_handler(location)?.acquire(location).await
    }

    /// Acquire `location` and stream it to the platform as `app`'s bits.
    ///
    /// The archive is released whether or not the upload succeeded. A failed
    /// release is an error of its own once the upload went through.
    pub async fn upload<B>(&self, bits: &B, app: &AppGuid, location: &str) -> Result<(), ArtifactError>
    where
        B: BitsOps + ?Sized,
    {
        let (reader, size, cleanup) = self.acquire(location).await?.into_parts();
        tracing::info!(app = %app, size, "uploading application bits");

        let uploaded = bits.upload_bits(app, reader, size).await;
        let released = cleanup.release().await;
        if let Err(e) = uploaded {
            if let Err(release_error) = released {
                tracing::warn!(app = %app, "failed to release archive after upload: {}", release_error);
            }
            return Err(e).context(UploadSnafu { app: app.clone() });
        }
        released.context(IoSnafu {
            action: "failed to release archive after upload",
        })
    }

    /// Fingerprint of `location` as computed by its handler.
    pub async fn fingerprint(&self, location: &str) -> Result<String, ArtifactError> {
        self.choose_handler(location)?.fingerprint(location).await
    }

    /// Compare `location`'s current fingerprint to `known`.
    ///
    /// An empty `known` never matches, so a first deploy always reports a change.
    pub async fn diff(&self, location: &str, known: &str) -> Result<Diff, ArtifactError> {
        let fingerprint = self.fingerprint(location).await?;
        Ok(Diff {
            changed: fingerprint != known,
            fingerprint,
        })
    }
}

impl Default for ArtifactManager {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), GitResolver::default())
    }
}
