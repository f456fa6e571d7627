// ABOUTME: Start an application and wait until it has staged and an instance is running.
// ABOUTME: Failures are enriched with the app's recent logs.

use crate::platform::{AppOps, AppState, InstanceState, LogOps, PackageState};
use crate::poll::{PollError, poll};
use crate::types::{AppGuid, AppName};

use super::context::StartupPolling;
use super::error::{DeployError, RecentLogs, StartupFailure};

/// Set `app` started, then wait for staging and for a running instance.
///
/// Staging is bounded by the staging timeout; instance polling is not. An
/// app with zero desired instances counts as started once staged.
pub async fn start_app<P>(
    platform: &P,
    app: &AppGuid,
    name: &AppName,
    polling: StartupPolling,
) -> Result<(), DeployError>
where
    P: AppOps + LogOps + ?Sized,
{
    tracing::info!(app = %name, "starting app");
    platform.set_state(app, AppState::Started).await?;

    let staged = poll(polling.interval, Some(polling.staging_timeout), || async {
        let current = platform.get_app(app).await?;
        match current.package_state {
            PackageState::Staged => Ok(Some(current)),
            PackageState::Failed => Err(StartupFailure::StagingFailed { app: name.clone() }),
            PackageState::Pending => Ok(None),
        }
    })
    .await;

    let staged = match staged {
        Ok(staged) => staged,
        Err(PollError::Timeout(after)) => {
            let failure = StartupFailure::StagingTimeout {
                app: name.clone(),
                after,
            };
            return Err(with_recent_logs(platform, app, name, failure).await);
        }
        Err(PollError::Failed(failure)) => {
            return Err(with_recent_logs(platform, app, name, failure).await);
        }
    };
    tracing::debug!(app = %name, "staged");

    if staged.instances == 0 {
        return Ok(());
    }

    let running = poll(polling.interval, None, || async {
        let instances = platform.instances(app).await?;
        for instance in instances {
            match instance.state {
                InstanceState::Starting => continue,
                InstanceState::Running => return Ok(Some(())),
                state => {
                    return Err(StartupFailure::InstanceFailed {
                        index: instance.index,
                        state,
                        app: name.clone(),
                    });
                }
            }
        }
        Ok(None)
    })
    .await;

    match running {
        Ok(()) => {
            tracing::info!(app = %name, "app is running");
            Ok(())
        }
        Err(PollError::Failed(failure)) => Err(with_recent_logs(platform, app, name, failure).await),
        Err(PollError::Timeout(after)) => {
            // Unreachable in practice: instance polling runs without a timeout.
            let failure = StartupFailure::StagingTimeout {
                app: name.clone(),
                after,
            };
            Err(with_recent_logs(platform, app, name, failure).await)
        }
    }
}

async fn with_recent_logs<P>(
    platform: &P,
    app: &AppGuid,
    name: &AppName,
    failure: StartupFailure,
) -> DeployError
where
    P: LogOps + ?Sized,
{
    let logs = match platform.recent_logs(app).await {
        Ok(lines) => RecentLogs::Lines(lines),
        Err(e) => RecentLogs::Unavailable(e.to_string()),
    };
    DeployError::Startup {
        app: name.clone(),
        failure,
        logs,
    }
}
