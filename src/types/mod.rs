// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent GUID confusion at compile time.

mod app_name;
mod id;

pub use app_name::{AppName, AppNameError, VENERABLE_SUFFIX};
pub use id::{AppGuid, JobId, RouteId, ServiceInstanceId, SpaceId};
