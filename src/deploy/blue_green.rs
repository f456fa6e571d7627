// ABOUTME: Blue-green deploy and restage step lists built on the compensating pipeline.
// ABOUTME: The origin is renamed aside, a replacement is stood up, and the origin is deleted last.

use async_trait::async_trait;

use crate::diagnostics::Warning;
use crate::pipeline::{Action, Pipeline};
use crate::platform::Platform;

use super::bits::send_bits;
use super::context::DeployContext;
use super::error::DeployError;
use super::start::start_app;

type Ctx<P> = DeployContext<P>;

/// Steps for a blue-green deploy: rename, create with new bits, delete origin.
pub fn deploy_pipeline<P: Platform + 'static>(
    rollback_message: &str,
    started: bool,
) -> Pipeline<Ctx<P>, DeployError> {
    Pipeline::new(rollback_message)
        .then(RenameOrigin)
        .then(CreateApp {
            start: started,
            upload: true,
        })
        .then(DeleteOrigin)
}

/// Steps for a blue-green restage: rename, create empty, copy bits, start, delete origin.
pub fn restage_pipeline<P: Platform + 'static>(
    rollback_message: &str,
) -> Pipeline<Ctx<P>, DeployError> {
    Pipeline::new(rollback_message)
        .then(RenameOrigin)
        .then(CreateApp {
            start: false,
            upload: false,
        })
        .then(CopyBits)
        .then(StartIfDesired)
        .then(DeleteOrigin)
}

/// Undo the replacement: delete the new app, then give the origin its name back.
///
/// Safe to call repeatedly; each part only runs if there is something to undo.
/// Failing to delete the new app is recorded as a warning, and the rename
/// back then decides the outcome.
pub(crate) async fn restore_origin<P: Platform>(ctx: &mut Ctx<P>) -> Result<(), DeployError> {
    if let Some(new_app) = ctx.new_app.take() {
        tracing::info!(app = %new_app, "deleting replacement app");
        if let Err(e) = ctx.platform.delete_app(&new_app).await {
            ctx.diagnostics.warn(Warning::rollback_cleanup(format!(
                "failed to delete replacement app {}: {}",
                new_app, e
            )));
        }
    }

    if ctx.origin_renamed {
        tracing::info!(app = %ctx.origin.name, "restoring original app name");
        ctx.platform
            .rename_app(&ctx.origin.guid, &ctx.origin.name)
            .await?;
        ctx.origin_renamed = false;
    }
    Ok(())
}

/// Rename the origin to its venerable name. Not reversible on its own.
struct RenameOrigin;

#[async_trait]
impl<P: Platform> Action<Ctx<P>, DeployError> for RenameOrigin {
    fn name(&self) -> &str {
        "rename origin"
    }

    async fn forward(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        let venerable = ctx.origin.name.venerable();
        ctx.platform
            .rename_app(&ctx.origin.guid, &venerable)
            .await?;
        ctx.origin_renamed = true;
        tracing::info!(from = %ctx.origin.name, to = %venerable, "renamed origin app");
        Ok(())
    }
}

/// Create the replacement app, bind it, and optionally upload bits and start it.
///
/// If any part fails, the step's abort deletes the replacement and gives the
/// origin its name back. Nothing earlier in the pipeline can do this, since
/// renaming has no rollback.
struct CreateApp {
    start: bool,
    upload: bool,
}

impl CreateApp {
    async fn stand_up<P: Platform>(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        let app = ctx.platform.create_app(&ctx.desired.params).await?;
        ctx.new_app = Some(app.guid.clone());
        tracing::info!(app = %app.name, guid = %app.guid, "created replacement app");

        for route in &ctx.desired.bindings.routes {
            ctx.platform.bind_route(route, &app.guid).await?;
        }
        for service in &ctx.desired.bindings.services {
            ctx.platform.bind_service(service, &app.guid).await?;
        }

        if self.upload {
            let fingerprints = send_bits(
                ctx.platform.as_ref(),
                &ctx.artifacts,
                &app.guid,
                &ctx.desired.location,
            )
            .await?;
            ctx.fingerprints = Some(fingerprints);
        }

        if self.start {
            start_app(ctx.platform.as_ref(), &app.guid, &app.name, ctx.polling).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<P: Platform> Action<Ctx<P>, DeployError> for CreateApp {
    fn name(&self) -> &str {
        "create app"
    }

    async fn forward(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        self.stand_up(ctx).await
    }

    async fn abort(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        tracing::info!("create failed, undoing partial replacement");
        restore_origin(ctx).await
    }

    fn has_reverse(&self) -> bool {
        true
    }

    async fn reverse_previous(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        restore_origin(ctx).await
    }
}

/// Copy the origin's staged bits into the replacement on the platform side.
struct CopyBits;

#[async_trait]
impl<P: Platform> Action<Ctx<P>, DeployError> for CopyBits {
    fn name(&self) -> &str {
        "copy bits"
    }

    async fn forward(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        let target = replacement(ctx)?;
        ctx.platform.copy_bits(&ctx.origin.guid, &target).await?;
        Ok(())
    }

    fn has_reverse(&self) -> bool {
        true
    }

    async fn reverse_previous(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        restore_origin(ctx).await
    }
}

/// Start the replacement if the desired state is started.
struct StartIfDesired;

#[async_trait]
impl<P: Platform> Action<Ctx<P>, DeployError> for StartIfDesired {
    fn name(&self) -> &str {
        "start app"
    }

    async fn forward(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        if !ctx.desired.started {
            return Ok(());
        }
        let target = replacement(ctx)?;
        start_app(
            ctx.platform.as_ref(),
            &target,
            &ctx.desired.params.name,
            ctx.polling,
        )
        .await
    }

    fn has_reverse(&self) -> bool {
        true
    }

    async fn reverse_previous(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        restore_origin(ctx).await
    }
}

/// Delete the renamed origin. Not reversible.
struct DeleteOrigin;

#[async_trait]
impl<P: Platform> Action<Ctx<P>, DeployError> for DeleteOrigin {
    fn name(&self) -> &str {
        "delete origin"
    }

    async fn forward(&self, ctx: &mut Ctx<P>) -> Result<(), DeployError> {
        ctx.platform.delete_app(&ctx.origin.guid).await?;
        ctx.origin_renamed = false;
        tracing::info!(guid = %ctx.origin.guid, "deleted origin app");
        Ok(())
    }
}

fn replacement<P>(ctx: &Ctx<P>) -> Result<crate::types::AppGuid, DeployError> {
    ctx.new_app.clone().ok_or_else(|| {
        DeployError::Platform(crate::platform::PlatformError::NotFound {
            what: "replacement app".to_string(),
        })
    })
}
