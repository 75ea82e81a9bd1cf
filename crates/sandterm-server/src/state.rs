//! Shared application state.

use crate::config::Config;
use chrono::Utc;
use dashmap::DashMap;
use sandterm_core::{ConsoleError, PtyOptions};
use sandterm_types::ConsoleSummary;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    consoles: DashMap<Uuid, ConsoleSummary>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            consoles: DashMap::new(),
        }
    }

    /// Reserve a console slot for `target`. The slot is released when the guard drops.
    pub fn attach(self: &Arc<Self>, target: &str) -> sandterm_core::Result<ConsoleGuard> {
        if self.consoles.len() >= self.config.max_sessions {
            return Err(ConsoleError::SessionLimitExceeded(self.config.max_sessions));
        }

        let summary = ConsoleSummary {
            id: Uuid::new_v4(),
            target: target.to_string(),
            shell: self.config.shell.clone(),
            attached_at: Utc::now(),
        };
        let id = summary.id;
        self.consoles.insert(id, summary);
        debug!(target: "sandterm::ws", "Console {} attached for {}", id, target);

        Ok(ConsoleGuard {
            state: Arc::clone(self),
            id,
        })
    }

    /// Attached consoles, oldest first.
    pub fn consoles(&self) -> Vec<ConsoleSummary> {
        let mut consoles: Vec<ConsoleSummary> =
            self.consoles.iter().map(|entry| entry.value().clone()).collect();
        consoles.sort_by_key(|c| c.attached_at);
        consoles
    }

    pub fn console_count(&self) -> usize {
        self.consoles.len()
    }

    /// PTY settings for a new console shell.
    pub fn pty_options(&self, target: &str) -> PtyOptions {
        PtyOptions {
            program: self.config.shell.clone(),
            args: self.config.shell_args.clone(),
            cwd: self.config.working_dir.clone(),
            rows: self.config.rows,
            cols: self.config.cols,
            env: vec![("SANDTERM_TARGET".to_string(), target.to_string())],
        }
    }
}

/// Registration of one attached console.
pub struct ConsoleGuard {
    state: Arc<AppState>,
    id: Uuid,
}

impl ConsoleGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for ConsoleGuard {
    fn drop(&mut self) {
        self.state.consoles.remove(&self.id);
        debug!(target: "sandterm::ws", "Console {} detached", self.id);
    }
}
