// ─── Launch Orchestrator ───
// Profile + account + installed version -> running game process, and the
// registry of sessions it started.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use serde::Serialize;
use tokio::process::Command;
use tokio::sync::{broadcast, oneshot, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::arguments::{game_arguments, jvm_arguments, LaunchContext};
use super::classpath::{build_classpath, extract_natives, join_classpath, ClasspathPlan};
use super::session::{log_output, pump_output, record_output, LaunchSession, OutputLine, SessionSnapshot};
use crate::core::assets::{ensure_objects, AssetIndex};
use crate::core::auth::{Account, AccountKind};
use crate::core::downloader::FetchClient;
use crate::core::error::{LaunchErrorCode, LauncherError, LauncherResult};
use crate::core::instance::{Profile, ProfileDirs};
use crate::core::loaders::{read_marker, LoaderInstallResult};
use crate::core::store::EntityStore;
use crate::core::state::LauncherPaths;
use crate::core::version::{OsName, VersionDetail};

/// Forward-only progress of one launch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message")]
pub enum LaunchState {
    Idle,
    Preparing,
    Downloading,
    Installing,
    Launching,
    Running,
    Error(String),
}

impl LaunchState {
    fn rank(&self) -> u8 {
        match self {
            LaunchState::Idle => 0,
            LaunchState::Preparing => 1,
            LaunchState::Downloading => 2,
            LaunchState::Installing => 3,
            LaunchState::Launching => 4,
            LaunchState::Running => 5,
            LaunchState::Error(_) => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchState::Error(_))
    }
}

pub type StateObserver = Arc<dyn Fn(LaunchState) + Send + Sync>;

/// Tracks one attempt and rejects backward transitions. `Running -> Idle`
/// is the single exception: it ends a clean session.
///
/// Shared between the launch call and the exit watcher; the observer is
/// invoked under the lock so it sees transitions in order.
struct Attempt {
    state: std::sync::Mutex<LaunchState>,
    observer: Option<StateObserver>,
}

impl Attempt {
    fn new(observer: Option<StateObserver>) -> Self {
        Self {
            state: std::sync::Mutex::new(LaunchState::Idle),
            observer,
        }
    }

    fn advance(&self, next: LaunchState) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        let allowed = next.rank() > state.rank()
            || (*state == LaunchState::Running && next == LaunchState::Idle);
        if !allowed || state.is_terminal() {
            warn!("Ignoring launch transition {:?} -> {:?}", *state, next);
            return;
        }
        debug!("Launch state: {:?}", next);
        *state = next.clone();
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }
}

/// What the exit watcher needs to publish the final state.
struct ExitWatch {
    attempt: Arc<Attempt>,
    /// Fires once `Running` has been published.
    running: oneshot::Receiver<()>,
}

/// Launcher-wide values a profile may leave unset.
#[derive(Debug, Clone)]
pub struct LaunchDefaults {
    pub java_path: PathBuf,
    pub window: (u32, u32),
    pub fullscreen: bool,
    pub asset_objects_url: String,
}

struct TrackedProcess {
    session: Arc<LaunchSession>,
    kill: Mutex<Option<oneshot::Sender<()>>>,
}

pub struct LaunchOrchestrator {
    store: Arc<dyn EntityStore>,
    fetch: Arc<FetchClient>,
    paths: LauncherPaths,
    defaults: LaunchDefaults,
    sessions: RwLock<HashMap<u32, Arc<TrackedProcess>>>,
}

impl LaunchOrchestrator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        fetch: Arc<FetchClient>,
        paths: LauncherPaths,
        defaults: LaunchDefaults,
    ) -> Self {
        Self {
            store,
            fetch,
            paths,
            defaults,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start the game for `profile_id`. Returns once the process is running;
    /// exit is tracked in the background.
    pub async fn launch(
        &self,
        profile_id: &str,
        observer: Option<StateObserver>,
    ) -> LauncherResult<Arc<LaunchSession>> {
        let attempt = Arc::new(Attempt::new(observer));
        match self.run_launch(profile_id, &attempt).await {
            Ok(session) => Ok(session),
            Err(e) => {
                error!("Launch of {} failed: {}", profile_id, e);
                attempt.advance(LaunchState::Error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn run_launch(
        &self,
        profile_id: &str,
        attempt: &Arc<Attempt>,
    ) -> LauncherResult<Arc<LaunchSession>> {
        // ── Preparing ──
        attempt.advance(LaunchState::Preparing);
        let mut profile = self.store.get_profile(profile_id).await?.ok_or_else(|| {
            LauncherError::launch(
                LaunchErrorCode::InstanceNotFound,
                format!("Profile {} does not exist", profile_id),
            )
        })?;
        let account = self.store.active_account().await?.ok_or_else(|| {
            LauncherError::launch(LaunchErrorCode::NoAccount, "No active account selected")
        })?;
        if account.kind == AccountKind::Microsoft && account.is_token_expired(chrono::Utc::now()) {
            warn!("Access token of {} has expired; the game may reject it", account.username);
        }

        let dirs = ProfileDirs::new(&self.paths.instances_dir(), &profile.id);
        dirs.materialize().await?;
        let detail = self.load_detail(&profile.version_id).await?;
        let loader = self.load_loader(&profile).await?;

        // ── Downloading ──
        attempt.advance(LaunchState::Downloading);
        self.sync_assets(&detail).await;

        // ── Installing ──
        attempt.advance(LaunchState::Installing);
        let os = OsName::current();
        extract_natives(&detail, &self.paths.libraries_dir(), &dirs.natives_dir(), os).await?;

        // ── Launching ──
        attempt.advance(LaunchState::Launching);
        let mod_files: Vec<PathBuf> = self
            .store
            .enabled_mods(&profile.id)
            .await?
            .into_iter()
            .map(|m| dirs.mods_dir().join(m.file_name))
            .collect();
        let libraries_dir = self.paths.libraries_dir();
        let client_jar = self.paths.version_jar(&profile.version_id);
        let loader_libraries = loader.as_ref().map(|l| l.libraries.as_slice()).unwrap_or(&[]);
        let entries = build_classpath(&ClasspathPlan {
            detail: &detail,
            libraries_dir: &libraries_dir,
            loader_libraries,
            client_jar: &client_jar,
            mod_files: &mod_files,
            os,
        })?;
        let classpath = join_classpath(&entries);
        debug!("Classpath has {} entries", entries.len());

        let (running_tx, running_rx) = oneshot::channel();
        let session = self
            .spawn(
                &profile,
                &account,
                &detail,
                loader.as_ref(),
                &classpath,
                &dirs,
                ExitWatch {
                    attempt: attempt.clone(),
                    running: running_rx,
                },
            )
            .await?;

        // ── Running ──
        profile.last_played = Some(chrono::Utc::now());
        if let Err(e) = self.store.save_profile(&profile).await {
            warn!("Could not record last played time for {}: {}", profile.name, e);
        }
        attempt.advance(LaunchState::Running);
        let _ = running_tx.send(());
        info!(
            "Launched {} (pid {}) as {}",
            profile.name,
            session.process_id(),
            account.username
        );
        Ok(session)
    }

    async fn load_detail(&self, version_id: &str) -> LauncherResult<VersionDetail> {
        let path = self.paths.version_json(version_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LauncherError::launch(
                    LaunchErrorCode::VersionNotFound,
                    format!("Version {} is not installed", version_id),
                ));
            }
            Err(e) => return Err(LauncherError::io(path, e)),
        };
        VersionDetail::parse(&raw).map_err(|e| {
            LauncherError::launch(
                LaunchErrorCode::InvalidVersionJson,
                format!("Version {} has an unreadable detail file: {}", version_id, e),
            )
        })
    }

    async fn load_loader(&self, profile: &Profile) -> LauncherResult<Option<LoaderInstallResult>> {
        let (Some(loader), Some(loader_version)) = (profile.loader, profile.loader_version.as_deref())
        else {
            return Ok(None);
        };
        let version_dir = self.paths.version_dir(&profile.version_id);
        match read_marker(&version_dir, loader, loader_version).await? {
            Some(result) => Ok(Some(result)),
            None => Err(LauncherError::launch(
                LaunchErrorCode::VersionNotFound,
                format!(
                    "{} {} is not installed for {}",
                    loader, loader_version, profile.version_id
                ),
            )),
        }
    }

    /// Missing asset objects are fetched here rather than at install time.
    async fn sync_assets(&self, detail: &VersionDetail) {
        let index_path = self.paths.asset_index(detail.asset_index_id());
        let index = match AssetIndex::load(&index_path).await {
            Ok(index) => index,
            Err(e) => {
                warn!("Asset index unavailable, continuing without assets: {}", e);
                return;
            }
        };
        let report = ensure_objects(
            &self.fetch,
            &index,
            &self.paths.assets_dir(),
            &self.defaults.asset_objects_url,
        )
        .await;
        if report.failed > 0 {
            warn!("{} of {} asset objects could not be fetched", report.failed, report.total);
        }
    }

    async fn spawn(
        &self,
        profile: &Profile,
        account: &Account,
        detail: &VersionDetail,
        loader: Option<&LoaderInstallResult>,
        classpath: &str,
        dirs: &ProfileDirs,
        watch: ExitWatch,
    ) -> LauncherResult<Arc<LaunchSession>> {
        let natives_dir = dirs.natives_dir();
        let libraries_dir = self.paths.libraries_dir();
        let assets_dir = self.paths.assets_dir();
        let ctx = LaunchContext {
            profile,
            account,
            detail,
            loader,
            classpath,
            natives_dir: &natives_dir,
            libraries_dir: &libraries_dir,
            game_dir: dirs.game_dir(),
            assets_dir: &assets_dir,
            default_window: self.defaults.window,
            default_fullscreen: self.defaults.fullscreen,
        };

        let java = profile
            .java_path
            .clone()
            .unwrap_or_else(|| self.defaults.java_path.clone());

        let mut cmd = Command::new(&java);
        cmd.args(jvm_arguments(&ctx))
            .args(game_arguments(&ctx))
            .current_dir(dirs.game_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        info!("Launching Minecraft {} with Java: {:?}", profile.version_id, java);

        let mut child = cmd.spawn().map_err(|e| {
            LauncherError::launch(
                LaunchErrorCode::ProcessStartFailed,
                format!("Could not start {:?}: {}", java, e),
            )
        })?;
        let Some(pid) = child.id() else {
            return Err(LauncherError::launch(
                LaunchErrorCode::ProcessStartFailed,
                "Process exited before it could be tracked",
            ));
        };

        let session = Arc::new(LaunchSession::new(pid, profile.id.clone()));
        let (kill_tx, kill_rx) = oneshot::channel();
        let tracked = Arc::new(TrackedProcess {
            session: session.clone(),
            kill: Mutex::new(Some(kill_tx)),
        });
        self.sessions.write().await.insert(pid, tracked);

        // Subscribe before the pump starts so no line is missed.
        let recorder_rx = session.subscribe();
        let logger_rx = session.subscribe();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let pump = tokio::spawn({
            let session = session.clone();
            async move { pump_output(&session, stdout, stderr).await }
        });
        let recorder = tokio::spawn({
            let session = session.clone();
            async move {
                if let Some(rx) = recorder_rx {
                    record_output(&session, rx).await;
                }
            }
        });
        if let Some(rx) = logger_rx {
            tokio::spawn(log_output(pid, rx));
        }

        tokio::spawn({
            let session = session.clone();
            async move {
                let mut kill_rx = kill_rx;
                let (status, terminated) = tokio::select! {
                    status = child.wait() => (status, false),
                    Ok(()) = &mut kill_rx => {
                        if let Err(e) = child.kill().await {
                            warn!("Failed to kill pid {}: {}", pid, e);
                        }
                        (child.wait().await, true)
                    }
                };
                let exit_code = match status {
                    Ok(status) => status.code(),
                    Err(e) => {
                        warn!("Waiting on pid {} failed: {}", pid, e);
                        None
                    }
                };

                // Late crash lines must land before the exit is classified.
                let _ = pump.await;
                let _ = recorder.await;
                session.finish(exit_code, terminated).await;

                let snapshot = session.snapshot().await;
                let final_state = if snapshot.crashed {
                    let reason = snapshot.crash_reason.unwrap_or_default();
                    warn!("Game pid {} crashed: {}", pid, reason);
                    LaunchState::Error(reason)
                } else {
                    info!("Game pid {} exited with {:?}", pid, exit_code);
                    LaunchState::Idle
                };
                // The exit may beat `Running`; publish after it.
                let _ = watch.running.await;
                watch.attempt.advance(final_state);
                session.mark_exited();
            }
        });

        Ok(session)
    }

    // ── Session registry ────────────────────────────────

    pub async fn session(&self, pid: u32) -> Option<Arc<LaunchSession>> {
        self.sessions.read().await.get(&pid).map(|t| t.session.clone())
    }

    pub async fn running_sessions(&self) -> Vec<SessionSnapshot> {
        let tracked: Vec<_> = self.sessions.read().await.values().cloned().collect();
        let mut running = Vec::new();
        for t in tracked {
            let snapshot = t.session.snapshot().await;
            if snapshot.is_running {
                running.push(snapshot);
            }
        }
        running
    }

    pub async fn subscribe_output(&self, pid: u32) -> Option<broadcast::Receiver<OutputLine>> {
        self.session(pid).await?.subscribe()
    }

    /// Kill the process and wait for it to exit. False when `pid` is unknown.
    pub async fn terminate(&self, pid: u32) -> bool {
        let Some(tracked) = self.sessions.read().await.get(&pid).cloned() else {
            return false;
        };
        if let Some(kill) = tracked.kill.lock().await.take() {
            info!("Terminating game pid {}", pid);
            let _ = kill.send(());
        }
        tracked.session.wait_for_exit().await;
        true
    }
}

/// Observer that appends every state it sees to a shared list.
pub fn recording_observer() -> (StateObserver, Arc<std::sync::Mutex<Vec<LaunchState>>>) {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let observer: StateObserver = Arc::new(move |state| {
        if let Ok(mut states) = sink.lock() {
            states.push(state);
        }
    });
    (observer, seen)
}
