// ABOUTME: Deployment orchestration: blue-green and in-place updates of platform apps.
// ABOUTME: Exports the Orchestrator, its settings, and the start-up and bits helpers.

mod bits;
mod blue_green;
mod context;
mod error;
mod in_place;
mod start;
mod strategy;

pub use bits::{BitsChange, BitsFingerprints, detect_bits_change, send_bits};
pub use blue_green::{deploy_pipeline, restage_pipeline};
pub use context::{DeployContext, DesiredApp, OriginApp, StartupPolling};
pub use error::{BlueGreenMode, DeployError, DeployErrorKind, RecentLogs, StartupFailure};
pub use in_place::{deploy_in_place, restage_in_place};
pub use start::start_app;
pub use strategy::UpdateStrategy;

use std::sync::Arc;

use serde::Serialize;

use crate::artifact::ArtifactManager;
use crate::diagnostics::Warning;
use crate::pipeline::{DEFAULT_ROLLBACK_MESSAGE, Pipeline};
use crate::platform::Platform;
use crate::types::AppGuid;

/// Knobs controlling how updates are carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    /// Update changed bits in place instead of through a replacement app.
    pub no_blue_green_deploy: bool,
    /// Restage in place instead of through a replacement app.
    pub no_blue_green_restage: bool,
    /// Shown when a blue-green rollback itself fails.
    pub rollback_message: String,
    pub polling: StartupPolling,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            no_blue_green_deploy: false,
            no_blue_green_restage: false,
            rollback_message: DEFAULT_ROLLBACK_MESSAGE.to_string(),
            polling: StartupPolling::default(),
        }
    }
}

/// Result of a successful create or update.
#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    /// The app now serving under the desired name.
    pub app: AppGuid,
    /// `None` for a fresh create.
    pub strategy: Option<UpdateStrategy>,
    /// Fingerprints to record for the next change check.
    pub fingerprints: BitsFingerprints,
    pub warnings: Vec<Warning>,
}

/// Drives app creation and updates against a platform.
pub struct Orchestrator<P> {
    platform: Arc<P>,
    artifacts: Arc<ArtifactManager>,
    settings: DeploySettings,
}

impl<P: Platform + 'static> Orchestrator<P> {
    pub fn new(platform: Arc<P>, artifacts: Arc<ArtifactManager>, settings: DeploySettings) -> Self {
        Self {
            platform,
            artifacts,
            settings,
        }
    }

    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    /// Create an app, bind it, upload its bits, and start it if desired.
    pub async fn create(&self, desired: &DesiredApp) -> Result<DeployOutcome, DeployError> {
        let app = self.platform.create_app(&desired.params).await?;
        tracing::info!(app = %app.name, guid = %app.guid, "created app");

        for route in &desired.bindings.routes {
            self.platform.bind_route(route, &app.guid).await?;
        }
        for service in &desired.bindings.services {
            self.platform.bind_service(service, &app.guid).await?;
        }

        let fingerprints = self.send_bits(&app.guid, &desired.location).await?;
        if desired.started {
            self.start_app(&app.guid, &desired.params.name).await?;
        }

        Ok(DeployOutcome {
            app: app.guid,
            strategy: None,
            fingerprints,
            warnings: Vec::new(),
        })
    }

    /// Update `origin` to match `desired`, choosing the strategy from the bits.
    pub async fn update(
        &self,
        origin: OriginApp,
        desired: DesiredApp,
        known: &BitsFingerprints,
    ) -> Result<DeployOutcome, DeployError> {
        let change = self
            .detect_bits_change(&origin.guid, &desired.location, known)
            .await?;
        let (strategy, reason) = UpdateStrategy::for_update(change.changed, &self.settings);
        match reason {
            Some(reason) => tracing::info!(app = %origin.name, ?strategy, reason, "selected update strategy"),
            None => tracing::info!(app = %origin.name, ?strategy, "selected update strategy"),
        }

        match strategy {
            UpdateStrategy::BlueGreenDeploy => self.blue_green_deploy(origin, desired).await,
            UpdateStrategy::BlueGreenRestage => {
                let mut outcome = self.blue_green_restage(origin, desired).await?;
                outcome.fingerprints = change.fingerprints;
                Ok(outcome)
            }
            UpdateStrategy::InPlaceDeploy => {
                let fingerprints = self.deploy_in_place(&origin.guid, &desired).await?;
                Ok(DeployOutcome {
                    app: origin.guid,
                    strategy: Some(strategy),
                    fingerprints,
                    warnings: Vec::new(),
                })
            }
            UpdateStrategy::InPlaceRestage => {
                self.restage_in_place(&origin.guid, &desired).await?;
                Ok(DeployOutcome {
                    app: origin.guid,
                    strategy: Some(strategy),
                    fingerprints: change.fingerprints,
                    warnings: Vec::new(),
                })
            }
        }
    }

    /// Replace `origin` with a new app carrying freshly uploaded bits.
    pub async fn blue_green_deploy(
        &self,
        origin: OriginApp,
        desired: DesiredApp,
    ) -> Result<DeployOutcome, DeployError> {
        let started = desired.started;
        let pipeline = deploy_pipeline(&self.settings.rollback_message, started);
        self.run_blue_green(
            pipeline,
            BlueGreenMode::Deploy,
            UpdateStrategy::BlueGreenDeploy,
            origin,
            desired,
        )
        .await
    }

    /// Replace `origin` with a new app holding a copy of its staged bits.
    pub async fn blue_green_restage(
        &self,
        origin: OriginApp,
        desired: DesiredApp,
    ) -> Result<DeployOutcome, DeployError> {
        let pipeline = restage_pipeline(&self.settings.rollback_message);
        self.run_blue_green(
            pipeline,
            BlueGreenMode::Restage,
            UpdateStrategy::BlueGreenRestage,
            origin,
            desired,
        )
        .await
    }

    async fn run_blue_green(
        &self,
        pipeline: Pipeline<DeployContext<P>, DeployError>,
        mode: BlueGreenMode,
        strategy: UpdateStrategy,
        origin: OriginApp,
        desired: DesiredApp,
    ) -> Result<DeployOutcome, DeployError> {
        let app_name = origin.name.clone();
        let mut ctx = DeployContext::new(
            Arc::clone(&self.platform),
            Arc::clone(&self.artifacts),
            self.settings.polling,
            origin,
            desired,
        );

        if let Err(e) = pipeline.execute(&mut ctx).await {
            return Err(DeployError::BlueGreen {
                app: app_name,
                mode,
                source: Box::new(e),
                warnings: ctx.diagnostics.into_warnings(),
            });
        }

        let app = match ctx.new_app {
            Some(app) => app,
            None => {
                return Err(DeployError::Platform(
                    crate::platform::PlatformError::NotFound {
                        what: "replacement app".to_string(),
                    },
                ));
            }
        };
        Ok(DeployOutcome {
            app,
            strategy: Some(strategy),
            fingerprints: ctx.fingerprints.unwrap_or_default(),
            warnings: ctx.diagnostics.into_warnings(),
        })
    }

    /// Stop, upload, and start the existing app.
    pub async fn deploy_in_place(
        &self,
        app: &AppGuid,
        desired: &DesiredApp,
    ) -> Result<BitsFingerprints, DeployError> {
        deploy_in_place(
            self.platform.as_ref(),
            &self.artifacts,
            app,
            &desired.params.name,
            &desired.location,
            self.settings.polling,
        )
        .await
    }

    /// Update parameters of the existing app and restart it.
    pub async fn restage_in_place(&self, app: &AppGuid, desired: &DesiredApp) -> Result<(), DeployError> {
        restage_in_place(
            self.platform.as_ref(),
            app,
            &desired.params,
            self.settings.polling,
        )
        .await
    }

    pub async fn detect_bits_change(
        &self,
        app: &AppGuid,
        location: &str,
        known: &BitsFingerprints,
    ) -> Result<BitsChange, DeployError> {
        detect_bits_change(self.platform.as_ref(), &self.artifacts, app, location, known).await
    }

    pub async fn send_bits(&self, app: &AppGuid, location: &str) -> Result<BitsFingerprints, DeployError> {
        send_bits(self.platform.as_ref(), &self.artifacts, app, location).await
    }

    pub async fn start_app(&self, app: &AppGuid, name: &crate::types::AppName) -> Result<(), DeployError> {
        start_app(self.platform.as_ref(), app, name, self.settings.polling).await
    }
}
