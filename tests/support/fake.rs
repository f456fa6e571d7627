// ABOUTME: In-memory platform for exercising deploy flows without a controller.
// ABOUTME: Records every call and lets tests script failures, staging, and instance states.

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;

use cfship::artifact::{ArchiveReader, fingerprint_bytes};
use cfship::platform::{
    App, AppInstance, AppOps, AppParams, AppState, BindingOps, BitsOps, InstanceState, LogMessage,
    LogOps, PackageState, PlatformError,
};
use cfship::types::{AppGuid, AppName, RouteId, ServiceInstanceId};

/// Operation names used to script failures and filter recorded calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateApp,
    GetApp,
    RenameApp,
    UpdateApp,
    SetState,
    DeleteApp,
    Instances,
    BindRoute,
    BindService,
    RecentLogs,
    UploadBits,
    RemoteFingerprint,
    CopyBits,
}

/// A recorded platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateApp(AppName),
    GetApp(AppGuid),
    RenameApp(AppGuid, AppName),
    UpdateApp(AppGuid),
    SetState(AppGuid, AppState),
    DeleteApp(AppGuid),
    Instances(AppGuid),
    BindRoute(RouteId, AppGuid),
    BindService(ServiceInstanceId, AppGuid),
    RecentLogs(AppGuid),
    UploadBits(AppGuid, u64),
    RemoteFingerprint(AppGuid),
    CopyBits(AppGuid, AppGuid),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::CreateApp(_) => Op::CreateApp,
            Call::GetApp(_) => Op::GetApp,
            Call::RenameApp(..) => Op::RenameApp,
            Call::UpdateApp(_) => Op::UpdateApp,
            Call::SetState(..) => Op::SetState,
            Call::DeleteApp(_) => Op::DeleteApp,
            Call::Instances(_) => Op::Instances,
            Call::BindRoute(..) => Op::BindRoute,
            Call::BindService(..) => Op::BindService,
            Call::RecentLogs(_) => Op::RecentLogs,
            Call::UploadBits(..) => Op::UploadBits,
            Call::RemoteFingerprint(_) => Op::RemoteFingerprint,
            Call::CopyBits(..) => Op::CopyBits,
        }
    }
}

/// An application held by the fake.
#[derive(Debug, Clone)]
pub struct FakeApp {
    pub app: App,
    pub params: AppParams,
    pub bits: Option<Vec<u8>>,
    pub routes: Vec<RouteId>,
    pub services: Vec<ServiceInstanceId>,
}

#[derive(Default)]
struct State {
    apps: BTreeMap<AppGuid, FakeApp>,
    next_guid: u32,
    calls: Vec<Call>,
    counts: HashMap<Op, usize>,
    failures: HashMap<(Op, usize), String>,
    package_states: VecDeque<PackageState>,
    instance_states: VecDeque<Vec<InstanceState>>,
    logs: Vec<LogMessage>,
}

/// Thread-safe in-memory `Platform`.
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<State>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing application and return its GUID.
    pub fn seed_app(&self, params: AppParams, state: AppState, bits: Option<Vec<u8>>) -> AppGuid {
        let mut s = self.state.lock();
        let guid = next_guid(&mut s);
        let app = App {
            guid: guid.clone(),
            name: params.name.clone(),
            state,
            package_state: PackageState::Staged,
            instances: params.instances,
        };
        s.apps.insert(
            guid.clone(),
            FakeApp {
                app,
                params,
                bits,
                routes: Vec::new(),
                services: Vec::new(),
            },
        );
        guid
    }

    /// Fail the `nth` call (1-based, counted from creation) of `op` with `message`.
    pub fn fail_nth(&self, op: Op, nth: usize, message: impl Into<String>) {
        self.state.lock().failures.insert((op, nth), message.into());
    }

    /// Fail the next call of `op`.
    pub fn fail_next(&self, op: Op, message: impl Into<String>) {
        let mut s = self.state.lock();
        let nth = s.counts.get(&op).copied().unwrap_or(0) + 1;
        s.failures.insert((op, nth), message.into());
    }

    /// Package states returned by successive `get_app` calls; the last one sticks.
    pub fn script_package_states(&self, states: impl IntoIterator<Item = PackageState>) {
        self.state.lock().package_states = states.into_iter().collect();
    }

    /// Instance lists returned by successive `instances` calls; the last one sticks.
    pub fn script_instances(&self, states: impl IntoIterator<Item = Vec<InstanceState>>) {
        self.state.lock().instance_states = states.into_iter().collect();
    }

    pub fn set_logs(&self, logs: Vec<LogMessage>) {
        self.state.lock().logs = logs;
    }

    pub fn app(&self, guid: &AppGuid) -> Option<FakeApp> {
        self.state.lock().apps.get(guid).cloned()
    }

    pub fn app_named(&self, name: &str) -> Option<FakeApp> {
        self.state
            .lock()
            .apps
            .values()
            .find(|a| a.app.name.as_str() == name)
            .cloned()
    }

    pub fn app_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .apps
            .values()
            .map(|a| a.app.name.to_string())
            .collect();
        names.sort();
        names
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    /// Record `call` and return the scripted failure for it, if any.
    fn enter(&self, call: Call) -> Result<(), PlatformError> {
        let mut s = self.state.lock();
        let op = call.op();
        let count = s.counts.entry(op).or_insert(0);
        *count += 1;
        let nth = *count;
        s.calls.push(call);
        match s.failures.remove(&(op, nth)) {
            Some(message) => Err(PlatformError::Other(message)),
            None => Ok(()),
        }
    }

    fn with_app<T>(
        &self,
        guid: &AppGuid,
        f: impl FnOnce(&mut FakeApp) -> T,
    ) -> Result<T, PlatformError> {
        let mut s = self.state.lock();
        let app = s.apps.get_mut(guid).ok_or_else(|| PlatformError::NotFound {
            what: format!("app {}", guid),
        })?;
        Ok(f(app))
    }
}

fn next_guid(s: &mut State) -> AppGuid {
    s.next_guid += 1;
    AppGuid::new(format!("app-{}", s.next_guid))
}

fn name_taken(s: &State, name: &AppName, except: Option<&AppGuid>) -> bool {
    s.apps
        .values()
        .any(|a| &a.app.name == name && Some(&a.app.guid) != except)
}

fn pop_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl AppOps for FakePlatform {
    async fn create_app(&self, params: &AppParams) -> Result<App, PlatformError> {
        self.enter(Call::CreateApp(params.name.clone()))?;
        let mut s = self.state.lock();
        if name_taken(&s, &params.name, None) {
            return Err(PlatformError::Api {
                status: 400,
                body: format!("The app name is taken: {}", params.name),
            });
        }
        let guid = next_guid(&mut s);
        let app = App {
            guid: guid.clone(),
            name: params.name.clone(),
            state: AppState::Stopped,
            package_state: PackageState::Pending,
            instances: params.instances,
        };
        s.apps.insert(
            guid,
            FakeApp {
                app: app.clone(),
                params: params.clone(),
                bits: None,
                routes: Vec::new(),
                services: Vec::new(),
            },
        );
        Ok(app)
    }

    async fn get_app(&self, guid: &AppGuid) -> Result<App, PlatformError> {
        self.enter(Call::GetApp(guid.clone()))?;
        let scripted = pop_sticky(&mut self.state.lock().package_states);
        self.with_app(guid, |a| {
            if let Some(state) = scripted {
                a.app.package_state = state;
            } else if a.app.state == AppState::Started && a.bits.is_some() {
                a.app.package_state = PackageState::Staged;
            }
            a.app.clone()
        })
    }

    async fn rename_app(&self, guid: &AppGuid, name: &AppName) -> Result<(), PlatformError> {
        self.enter(Call::RenameApp(guid.clone(), name.clone()))?;
        if name_taken(&self.state.lock(), name, Some(guid)) {
            return Err(PlatformError::Api {
                status: 400,
                body: format!("The app name is taken: {}", name),
            });
        }
        self.with_app(guid, |a| {
            a.app.name = name.clone();
            a.params.name = name.clone();
        })
    }

    async fn update_app(&self, guid: &AppGuid, params: &AppParams) -> Result<App, PlatformError> {
        self.enter(Call::UpdateApp(guid.clone()))?;
        self.with_app(guid, |a| {
            a.params = params.clone();
            a.app.name = params.name.clone();
            a.app.instances = params.instances;
            a.app.clone()
        })
    }

    async fn set_state(&self, guid: &AppGuid, state: AppState) -> Result<(), PlatformError> {
        self.enter(Call::SetState(guid.clone(), state))?;
        self.with_app(guid, |a| a.app.state = state)
    }

    async fn delete_app(&self, guid: &AppGuid) -> Result<(), PlatformError> {
        self.enter(Call::DeleteApp(guid.clone()))?;
        match self.state.lock().apps.remove(guid) {
            Some(_) => Ok(()),
            None => Err(PlatformError::NotFound {
                what: format!("app {}", guid),
            }),
        }
    }

    async fn instances(&self, guid: &AppGuid) -> Result<Vec<AppInstance>, PlatformError> {
        self.enter(Call::Instances(guid.clone()))?;
        let scripted = pop_sticky(&mut self.state.lock().instance_states);
        self.with_app(guid, |a| {
            let states = scripted.unwrap_or_else(|| {
                let state = if a.app.state == AppState::Started {
                    InstanceState::Running
                } else {
                    InstanceState::Down
                };
                vec![state; a.app.instances as usize]
            });
            states
                .into_iter()
                .enumerate()
                .map(|(index, state)| AppInstance {
                    index: index as u32,
                    state,
                })
                .collect()
        })
    }
}

#[async_trait]
impl BindingOps for FakePlatform {
    async fn bind_route(&self, route: &RouteId, app: &AppGuid) -> Result<(), PlatformError> {
        self.enter(Call::BindRoute(route.clone(), app.clone()))?;
        self.with_app(app, |a| a.routes.push(route.clone()))
    }

    async fn bind_service(
        &self,
        service: &ServiceInstanceId,
        app: &AppGuid,
    ) -> Result<(), PlatformError> {
        self.enter(Call::BindService(service.clone(), app.clone()))?;
        self.with_app(app, |a| a.services.push(service.clone()))
    }
}

#[async_trait]
impl LogOps for FakePlatform {
    async fn recent_logs(&self, app: &AppGuid) -> Result<Vec<LogMessage>, PlatformError> {
        self.enter(Call::RecentLogs(app.clone()))?;
        Ok(self.state.lock().logs.clone())
    }
}

#[async_trait]
impl BitsOps for FakePlatform {
    async fn upload_bits(
        &self,
        app: &AppGuid,
        mut archive: ArchiveReader,
        size: u64,
    ) -> Result<(), PlatformError> {
        self.enter(Call::UploadBits(app.clone(), size))?;
        let mut bits = Vec::new();
        archive.read_to_end(&mut bits).await?;
        if bits.len() as u64 != size {
            return Err(PlatformError::Other(format!(
                "declared size {} but received {} bytes",
                size,
                bits.len()
            )));
        }
        self.with_app(app, |a| a.bits = Some(bits))
    }

    async fn remote_fingerprint(&self, app: &AppGuid) -> Result<String, PlatformError> {
        self.enter(Call::RemoteFingerprint(app.clone()))?;
        self.with_app(app, |a| fingerprint_bytes(a.bits.as_deref().unwrap_or_default()))
    }

    async fn copy_bits(&self, source: &AppGuid, target: &AppGuid) -> Result<(), PlatformError> {
        self.enter(Call::CopyBits(source.clone(), target.clone()))?;
        let bits = self.with_app(source, |a| a.bits.clone())?;
        self.with_app(target, |a| a.bits = bits)
    }
}
