// ABOUTME: Platform-side data types for applications, instances, logs, and jobs.
// ABOUTME: Wire enums deserialize from the controller's upper-case state strings.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AppGuid, AppName, RouteId, ServiceInstanceId, SpaceId};

/// Requested run state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppState {
    Started,
    Stopped,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppState::Started => write!(f, "STARTED"),
            AppState::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Staging state of an application's package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PackageState {
    Pending,
    Staged,
    Failed,
}

/// State of one running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstanceState {
    Starting,
    Running,
    Crashed,
    Down,
    Flapping,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceState::Starting => "STARTING",
            InstanceState::Running => "RUNNING",
            InstanceState::Crashed => "CRASHED",
            InstanceState::Down => "DOWN",
            InstanceState::Flapping => "FLAPPING",
            InstanceState::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Everything needed to create or fully update an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppParams {
    pub name: AppName,
    pub space: SpaceId,
    pub instances: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_quota_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildpack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

impl AppParams {
    /// Minimal parameters: one instance, platform defaults for the rest.
    pub fn new(name: AppName, space: SpaceId) -> Self {
        Self {
            name,
            space,
            instances: 1,
            memory_mb: None,
            disk_quota_mb: None,
            buildpack: None,
            command: None,
            stack: None,
            health_check_type: None,
            environment: BTreeMap::new(),
        }
    }
}

/// Bindings attached to a freshly created application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    #[serde(default)]
    pub routes: Vec<RouteId>,
    #[serde(default)]
    pub services: Vec<ServiceInstanceId>,
}

/// An application as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub guid: AppGuid,
    pub name: AppName,
    pub state: AppState,
    pub package_state: PackageState,
    /// Desired instance count.
    pub instances: u32,
}

/// One instance of a running application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInstance {
    pub index: u32,
    pub state: InstanceState,
}

/// Output stream a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Out,
    Err,
}

/// A recent log line for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub timestamp: DateTime<Utc>,
    /// Emitter, e.g. `STG/0` or `APP/PROC/WEB/0`.
    pub source: String,
    pub stream: LogStream,
    pub message: String,
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stream = match self.stream {
            LogStream::Out => "OUT",
            LogStream::Err => "ERR",
        };
        write!(
            f,
            "{} [{}] {} {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.2f%:z"),
            self.source,
            stream,
            self.message.trim_end()
        )
    }
}

/// Asynchronous controller job, as returned by bits uploads and copies.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub metadata: JobMetadata,
    pub entity: JobEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobMetadata {
    pub guid: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobEntity {
    pub guid: String,
    pub status: String,
    #[serde(default)]
    pub error_details: Option<JobErrorDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobErrorDetails {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub error_code: String,
}
