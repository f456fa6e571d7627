// ABOUTME: Update strategy selection based on bits changes and settings.
// ABOUTME: Determines whether to deploy or restage, and whether to go blue-green.

use serde::Serialize;

use super::DeploySettings;

/// How an existing application gets updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// New bits, new app: stand up a replacement, then delete the original.
    BlueGreenDeploy,

    /// New bits, same app: stop, upload, start.
    InPlaceDeploy,

    /// Same bits: replacement gets a server-side copy of the staged bits.
    BlueGreenRestage,

    /// Same bits, same app: update parameters and restart.
    InPlaceRestage,
}

impl UpdateStrategy {
    /// Pick the strategy for an update.
    /// Returns the strategy and a reason if blue-green was opted out.
    ///
    /// Priority:
    /// 1. Changed bits mean a deploy, otherwise a restage
    /// 2. The matching opt-out flag forces in-place
    /// 3. Default to blue-green
    pub fn for_update(bits_changed: bool, settings: &DeploySettings) -> (Self, Option<&'static str>) {
        if bits_changed {
            if settings.no_blue_green_deploy {
                (
                    UpdateStrategy::InPlaceDeploy,
                    Some("blue-green deploy disabled by settings"),
                )
            } else {
                (UpdateStrategy::BlueGreenDeploy, None)
            }
        } else if settings.no_blue_green_restage {
            (
                UpdateStrategy::InPlaceRestage,
                Some("blue-green restage disabled by settings"),
            )
        } else {
            (UpdateStrategy::BlueGreenRestage, None)
        }
    }

    pub fn is_blue_green(self) -> bool {
        matches!(
            self,
            UpdateStrategy::BlueGreenDeploy | UpdateStrategy::BlueGreenRestage
        )
    }
}
