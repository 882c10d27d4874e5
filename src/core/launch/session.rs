// ─── Launch Session ───
// Runtime record of one game process. The output pump broadcasts lines; the
// recorder and the logger consume them independently.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{broadcast, watch, RwLock};
use tracing::{debug, info, warn};

/// Case-sensitive substrings that mark a stdout line as a crash report.
pub const CRASH_INDICATORS: [&str; 3] = ["Exception", "Error", "Crash"];

const OUTPUT_CHANNEL_CAPACITY: usize = 1024;
const MAX_LOG_LINES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

impl OutputLine {
    /// Form kept in the session log.
    pub fn log_form(&self) -> String {
        match self.stream {
            OutputStream::Stdout => self.text.clone(),
            OutputStream::Stderr => format!("[ERROR] {}", self.text),
        }
    }
}

pub fn detect_crash_indicator(line: &str) -> bool {
    CRASH_INDICATORS.iter().any(|needle| line.contains(needle))
}

/// Crash reason derived from the exit status, if any. A crash already found
/// in the output always takes precedence.
pub fn classify_exit(exit_code: Option<i32>, already_crashed: bool, terminated: bool) -> Option<String> {
    if already_crashed || terminated {
        return None;
    }
    match exit_code {
        Some(0) => None,
        Some(code) => Some(format!("Abnormal exit code: {}", code)),
        None => Some("Process ended without an exit code".into()),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub process_id: u32,
    pub profile_id: String,
    pub start_time: DateTime<Utc>,
    pub is_running: bool,
    pub exit_code: Option<i32>,
    pub crashed: bool,
    pub crash_reason: Option<String>,
    pub log_lines: Vec<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    is_running: bool,
    exit_code: Option<i32>,
    crashed: bool,
    crash_reason: Option<String>,
    log_lines: VecDeque<String>,
}

#[derive(Debug)]
pub struct LaunchSession {
    process_id: u32,
    profile_id: String,
    start_time: DateTime<Utc>,
    state: RwLock<SessionState>,
    /// Dropped once both pipes close, which ends every subscriber.
    output: Mutex<Option<broadcast::Sender<OutputLine>>>,
    exited: watch::Sender<bool>,
}

impl LaunchSession {
    pub fn new(process_id: u32, profile_id: impl Into<String>) -> Self {
        let (output, _) = broadcast::channel(OUTPUT_CHANNEL_CAPACITY);
        let (exited, _) = watch::channel(false);
        Self {
            process_id,
            profile_id: profile_id.into(),
            start_time: Utc::now(),
            state: RwLock::new(SessionState {
                is_running: true,
                ..Default::default()
            }),
            output: Mutex::new(Some(output)),
            exited,
        }
    }

    pub fn process_id(&self) -> u32 {
        self.process_id
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    /// Live output from now on; `None` once the process output has ended.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<OutputLine>> {
        self.output
            .lock()
            .ok()?
            .as_ref()
            .map(broadcast::Sender::subscribe)
    }

    fn sender(&self) -> Option<broadcast::Sender<OutputLine>> {
        self.output.lock().ok()?.as_ref().cloned()
    }

    fn close_output(&self) {
        if let Ok(mut output) = self.output.lock() {
            output.take();
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            process_id: self.process_id,
            profile_id: self.profile_id.clone(),
            start_time: self.start_time,
            is_running: state.is_running,
            exit_code: state.exit_code,
            crashed: state.crashed,
            crash_reason: state.crash_reason.clone(),
            log_lines: state.log_lines.iter().cloned().collect(),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_running
    }

    /// Recorder side: append the line, flag the first crash indicator.
    pub async fn record_line(&self, line: &OutputLine) {
        let mut state = self.state.write().await;
        if state.log_lines.len() == MAX_LOG_LINES {
            state.log_lines.pop_front();
        }
        state.log_lines.push_back(line.log_form());

        if line.stream == OutputStream::Stdout && !state.crashed && detect_crash_indicator(&line.text) {
            state.crashed = true;
            state.crash_reason = Some(line.text.clone());
        }
    }

    /// Watcher side: record the exit. Never clears a crash found in the output.
    /// Waiters are released separately by `mark_exited`.
    pub async fn finish(&self, exit_code: Option<i32>, terminated: bool) {
        let mut state = self.state.write().await;
        state.is_running = false;
        state.exit_code = exit_code;
        if let Some(reason) = classify_exit(exit_code, state.crashed, terminated) {
            state.crashed = true;
            state.crash_reason = Some(reason);
        }
    }

    pub fn mark_exited(&self) {
        self.exited.send_replace(true);
    }

    pub async fn wait_for_exit(&self) {
        let mut rx = self.exited.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }
}

// ── Output plumbing ─────────────────────────────────────

async fn pump_lines<R>(reader: R, stream: OutputStream, tx: broadcast::Sender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(text)) => {
                // No receivers is fine; the line is simply unobserved.
                let _ = tx.send(OutputLine { stream, text });
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Reading game {:?} failed: {}", stream, e);
                break;
            }
        }
    }
}

/// Forward both pipes into the session broadcast until they close.
pub async fn pump_output<O, E>(session: &LaunchSession, stdout: Option<O>, stderr: Option<E>)
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    if let Some(tx) = session.sender() {
        let out = async {
            if let Some(stdout) = stdout {
                pump_lines(stdout, OutputStream::Stdout, tx.clone()).await;
            }
        };
        let err = async {
            if let Some(stderr) = stderr {
                pump_lines(stderr, OutputStream::Stderr, tx.clone()).await;
            }
        };
        tokio::join!(out, err);
    }
    session.close_output();
}

/// Subscriber that keeps the session log and crash flag current.
pub async fn record_output(session: &LaunchSession, mut rx: broadcast::Receiver<OutputLine>) {
    loop {
        match rx.recv().await {
            Ok(line) => session.record_line(&line).await,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Session log skipped {} lines of pid {}", skipped, session.process_id);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Subscriber that re-emits game output through tracing.
pub async fn log_output(process_id: u32, mut rx: broadcast::Receiver<OutputLine>) {
    loop {
        match rx.recv().await {
            Ok(line) => match line.stream {
                OutputStream::Stdout => info!(target: "craftline::game", "[{}] {}", process_id, line.text),
                OutputStream::Stderr => warn!(target: "craftline::game", "[{}] {}", process_id, line.text),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(target: "craftline::game", "[{}] {} lines not logged", process_id, skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
