//! Crash-restart supervision of server processes.
//!
//! One [`Supervisor`] owns one materialized server. Its loop spawns the
//! child, waits for it to exit, and respawns it after a fixed delay, forever,
//! until stopped. An exit is never inspected for a verdict: any termination
//! while the supervisor is running is unexpected and gets the same treatment.
//!
//! [`Supervisor::stop`] only sets the stop flag and cuts the restart delay
//! short. The running child is left alone; the loop ends after the child
//! exits on its own. Stopping a cluster therefore means stopping supervision,
//! not tearing down the servers.

use std::process::Stdio;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

use crate::cluster::Config;
use crate::error::SupervisorError;
use crate::error::TemplateError;
use crate::node::Node;
use crate::servers::RunningServer;
use crate::servers::ServerDescriptor;

/// Delay between a child's exit and its respawn.
const RESTART_DELAY: Duration = Duration::from_secs(1);

/// Supervisor for one server process.
pub struct Supervisor {
    /// The materialized server: name, argv, and optional log path.
    server: RunningServer,

    /// Whether the loop should stop respawning.
    stopping: AtomicBool,

    /// Number of child exits observed.
    terminations: AtomicU32,

    /// Cuts the restart delay short on stop. Replaced with a fresh token on
    /// every start, so a stopped supervisor can be started again.
    cancel: Mutex<CancellationToken>,
}

impl Supervisor {
    /// Create a supervisor for an already materialized server.
    pub fn new(server: RunningServer) -> Arc<Self> {
        Arc::new(Self {
            server,
            stopping: AtomicBool::new(false),
            terminations: AtomicU32::new(0),
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    /// Materialize a descriptor against the given node and wrap it.
    pub fn from_descriptor(
        config: &Config,
        node_name: &str,
        node: &Node,
        descriptor: &ServerDescriptor,
    ) -> Result<Arc<Self>, TemplateError> {
        Ok(Self::new(descriptor.materialize(config, node_name, node)?))
    }

    /// Name of the supervised server.
    pub fn name(&self) -> &str {
        &self.server.name
    }

    /// Number of child exits observed so far.
    pub fn terminations(&self) -> u32 {
        self.terminations.load(Ordering::Acquire)
    }

    /// Start the supervision loop on the runtime.
    ///
    /// Clears the stop flag, so a stopped supervisor starts over. The log
    /// file's directory is created up front so a missing deployment tree
    /// fails loudly here instead of on every respawn.
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<()>, SupervisorError> {
        if let Some(log_path) = &self.server.log_path {
            if let Some(directory) = std::path::Path::new(log_path).parent() {
                std::fs::create_dir_all(directory).map_err(|source| SupervisorError::LogDirectory {
                    path: directory.display().to_string(),
                    source,
                })?;
            }
        }

        self.stopping.store(false, Ordering::Release);
        *self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = CancellationToken::new();

        let supervisor = self.clone();

        Ok(tokio::spawn(async move {
            supervisor.supervise().await;
        }))
    }

    /// Stop respawning. The current child, if any, keeps running.
    pub fn stop(&self) {
        info!(name = %self.server.name, "stopping supervision");
        self.stopping.store(true, Ordering::Release);
        self.cancel_token().cancel();
    }

    /// The token guarding the current run's restart delay.
    fn cancel_token(&self) -> CancellationToken {
        self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    #[cfg(test)]
    fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// The respawn loop.
    async fn supervise(self: Arc<Self>) {
        while !self.stopping.load(Ordering::Acquire) {
            info!(name = %self.server.name, command = %self.server.argv[0], "starting server");

            match self.run_once().await {
                Ok(status) => {
                    self.terminations.fetch_add(1, Ordering::AcqRel);

                    if !self.stopping.load(Ordering::Acquire) {
                        error!(name = %self.server.name, status = %status, "server terminated");
                    }
                }
                Err(error) => {
                    error!(name = %self.server.name, error = %error, "server failed to run");
                }
            }

            // Fixed delay before the respawn; stop() cuts it short.
            let cancel = self.cancel_token();
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(RESTART_DELAY) => {}
            }
        }

        info!(name = %self.server.name, "supervision ended");
    }

    /// Spawn the child once and wait for it to exit.
    async fn run_once(&self) -> std::io::Result<std::process::ExitStatus> {
        let mut command = Command::new(&self.server.argv[0]);
        command.args(&self.server.argv[1..]);

        if let Some(log_path) = &self.server.log_path {
            let log = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;
            let log_for_stderr = log.try_clone()?;

            command.stdout(Stdio::from(log));
            command.stderr(Stdio::from(log_for_stderr));
        }

        command.status().await
    }
}
