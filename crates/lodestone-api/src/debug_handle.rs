//! Debug-route plumbing (spec §6 `POST /api/debug/{clear,refresh}-pool-cache`,
//! `POST /api/debug/restart-monitor`, `GET /api/debug/system-health`). The
//! caches and indexer fleet these commands act on live in the supervisor
//! binary, not this crate — `DebugHandle` is the narrow channel the
//! supervisor wires in at startup so the API never reaches into process
//! internals directly.

use serde::Serialize;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    ClearPoolCache,
    RefreshPoolCache,
    RestartMonitor,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SystemHealth {
    pub indexers_running: usize,
    pub price_graph_age_secs: u64,
    pub db_reachable: bool,
}

#[derive(Clone)]
pub struct DebugHandle {
    commands: mpsc::UnboundedSender<DebugCommand>,
    health: watch::Receiver<SystemHealth>,
}

impl DebugHandle {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DebugCommand>, watch::Sender<SystemHealth>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (health_tx, health_rx) = watch::channel(SystemHealth::default());
        (
            Self {
                commands: cmd_tx,
                health: health_rx,
            },
            cmd_rx,
            health_tx,
        )
    }

    pub fn send(&self, cmd: DebugCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }

    pub fn health(&self) -> SystemHealth {
        self.health.borrow().clone()
    }
}
