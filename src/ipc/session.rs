use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::protocol::{IpcCommand, IpcEvent};
use super::router::handle_command;
use crate::buttons::{ActionButtons, HostModules};
use crate::config::BridgeConfig;
use crate::host::{ChatPanelManager, EffectRunner, FrontendChannel, FrontendEvent, Trigger};
use crate::lock_or_recover;

// ============================================================================
// Event Sending
// ============================================================================

/// Serializes events as JSON lines onto a shared writer (stdout in production).
pub struct EventWriter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl EventWriter {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn emit<T: Serialize + ?Sized>(&self, event: &T) {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(err) => {
                error!(error = %err, "failed to serialize event");
                return;
            }
        };
        let mut out = lock_or_recover(&self.out, "ipc.event_writer");
        if writeln!(out, "{json}").and_then(|_| out.flush()).is_err() {
            warn!("event writer closed; dropping event");
        }
    }
}

impl FrontendChannel for EventWriter {
    fn send(&self, event: FrontendEvent) {
        self.emit(&event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChainState {
    Running,
    Finished(Option<String>),
}

/// Command stream the runner drains while a chain is running on the host.
struct BridgeLink {
    commands: Receiver<IpcCommand>,
    state: Weak<BridgeState>,
}

/// Hands effect chains to the host as `process-effects` and blocks until the
/// host reports `action-buttons:effects-finished` for the same request.
///
/// Commands that arrive meanwhile (nested `action-button:click`, queries) are
/// handled in place, so nested clicks re-enter the dispatcher. Without an
/// attached command stream the chain is handed off without waiting.
pub struct IpcEffectRunner {
    events: Arc<EventWriter>,
    next_request: AtomicU64,
    chains: Mutex<HashMap<u64, ChainState>>,
    link: OnceLock<BridgeLink>,
}

impl IpcEffectRunner {
    pub fn new(events: Arc<EventWriter>) -> Self {
        Self {
            events,
            next_request: AtomicU64::new(1),
            chains: Mutex::new(HashMap::new()),
            link: OnceLock::new(),
        }
    }

    fn attach(&self, commands: Receiver<IpcCommand>, state: Weak<BridgeState>) {
        if self.link.set(BridgeLink { commands, state }).is_err() {
            warn!("effect runner already attached to a command stream");
        }
    }

    /// Record a completion. Returns `false` when no chain is waiting on `request_id`.
    pub(super) fn complete(&self, request_id: u64, error: Option<String>) -> bool {
        let mut chains = lock_or_recover(&self.chains, "ipc.effect_chains");
        match chains.get_mut(&request_id) {
            Some(chain) if *chain == ChainState::Running => {
                *chain = ChainState::Finished(error);
                true
            }
            _ => false,
        }
    }

    fn take_finished(&self, request_id: u64) -> Option<Option<String>> {
        let mut chains = lock_or_recover(&self.chains, "ipc.effect_chains");
        if !matches!(chains.get(&request_id), Some(ChainState::Finished(_))) {
            return None;
        }
        match chains.remove(&request_id) {
            Some(ChainState::Finished(error)) => Some(error),
            _ => None,
        }
    }

    fn wait_for(&self, request_id: u64, link: &BridgeLink) -> Result<()> {
        let state = link
            .state
            .upgrade()
            .context("bridge state dropped while an effect chain was running")?;
        loop {
            if let Some(error) = self.take_finished(request_id) {
                return match error {
                    Some(message) => Err(anyhow!(message)),
                    None => Ok(()),
                };
            }
            let cmd = link
                .commands
                .recv()
                .context("host closed the command stream before the effect chain finished")?;
            debug!(request_id, ?cmd, "command received while awaiting effect chain");
            handle_command(&state, cmd);
        }
    }
}

impl EffectRunner for IpcEffectRunner {
    fn process_effects(&self, trigger: &Trigger, effects: &Value) -> Result<()> {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let link = self.link.get();
        if link.is_some() {
            lock_or_recover(&self.chains, "ipc.effect_chains")
                .insert(request_id, ChainState::Running);
        }
        self.events.emit(&IpcEvent::ProcessEffects {
            request_id,
            trigger: trigger.clone(),
            effects: effects.clone(),
        });

        let Some(link) = link else {
            return Ok(());
        };
        let result = self.wait_for(request_id, link);
        if result.is_err() {
            lock_or_recover(&self.chains, "ipc.effect_chains").remove(&request_id);
        }
        result
    }
}

// ============================================================================
// Bridge State
// ============================================================================

pub(super) struct BridgeState {
    pub(super) buttons: Arc<ActionButtons>,
    pub(super) events: Arc<EventWriter>,
    pub(super) effect_runner: Arc<IpcEffectRunner>,
    pub(super) panel_component: String,
    pub(super) session_id: String,
}

impl BridgeState {
    pub(super) fn new(config: &BridgeConfig, events: Arc<EventWriter>) -> Self {
        let frontend: Arc<dyn FrontendChannel> = events.clone();
        let effect_runner = Arc::new(IpcEffectRunner::new(events.clone()));
        let host = HostModules {
            effect_runner: effect_runner.clone(),
            chat_panels: Arc::new(ChatPanelManager::new(frontend.clone())),
            frontend,
        };
        Self {
            buttons: Arc::new(ActionButtons::new(host)),
            events,
            effect_runner,
            panel_component: config.panel_component.clone(),
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Share the dispatch loop's command stream with the effect runner so
    /// `process-effects` can wait for the host's completion.
    pub(super) fn attach_commands(self: &Arc<Self>, commands: Receiver<IpcCommand>) {
        self.effect_runner.attach(commands, Arc::downgrade(self));
    }

    pub(super) fn send_event(&self, event: &IpcEvent) {
        self.events.emit(event);
    }

    pub(super) fn emit_ready(&self) {
        self.send_event(&IpcEvent::Ready {
            session_id: self.session_id.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            panel_component: self.panel_component.clone(),
        });
    }
}

// ============================================================================
// Line Reader Thread
// ============================================================================

fn spawn_line_reader(
    input: impl BufRead + Send + 'static,
    tx: Sender<IpcCommand>,
    events: Arc<EventWriter>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for line in input.lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<IpcCommand>(trimmed) {
                Ok(cmd) => {
                    if tx.send(cmd).is_err() {
                        break; // Dispatch loop has exited
                    }
                }
                Err(e) => {
                    warn!(error = %e, "invalid command line");
                    events.emit(&IpcEvent::Error {
                        message: format!("Invalid command: {e}"),
                        recoverable: true,
                    });
                }
            }
        }

        debug!("line reader thread exiting");
    })
}

// ============================================================================
// Main Event Loop
// ============================================================================

pub fn run_ipc_mode(config: &BridgeConfig) -> Result<()> {
    run_bridge(config, io::BufReader::new(io::stdin()), EventWriter::stdout())
}

/// Serve commands from `input` until it closes.
pub fn run_bridge(
    config: &BridgeConfig,
    input: impl BufRead + Send + 'static,
    events: EventWriter,
) -> Result<()> {
    info!(panel_component = %config.panel_component, "starting action buttons bridge");
    let state = Arc::new(BridgeState::new(config, Arc::new(events)));
    state.emit_ready();

    let (cmd_tx, cmd_rx) = bounded(config.command_channel_capacity);
    state.attach_commands(cmd_rx.clone());
    let reader = spawn_line_reader(input, cmd_tx, state.events.clone());
    run_ipc_loop(&state, &cmd_rx);

    if reader.join().is_err() {
        bail!("line reader thread panicked");
    }
    info!("action buttons bridge exiting");
    Ok(())
}

pub(super) fn run_ipc_loop(state: &BridgeState, cmd_rx: &Receiver<IpcCommand>) {
    let mut handled: u64 = 0;
    for cmd in cmd_rx.iter() {
        handled += 1;
        debug!(?cmd, "ipc command received");
        handle_command(state, cmd);
    }
    debug!(handled, "command channel disconnected");
}
