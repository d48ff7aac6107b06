/*!
 * Coordinator Thread
 *
 * Background loop that hands the session to the next queued claimant.
 *
 * The loop sleeps on three channels: enqueue events from the queue, end
 * events from the session (published on every transition to free, no
 * matter who ended it) and commands from the orchestrator. On each wake it asks the session to grant itself to the next
 * `(rank, sequence)`-ordered identity. The grant only happens while the
 * session is free and is performed under the session's admission guard, so
 * a fast-path claimant can never slip in between the check and the hand-off.
 *
 * # Shutdown
 *
 * `shutdown()` sends a shutdown command and joins the thread. It is
 * idempotent and also runs from the orchestrator's `Drop`.
 */

use super::config::OrchestratorConfig;
use super::Shared;
use crate::core::errors::{OrchestratorError, OrchestratorResult};
use crate::core::id::Identity;
use crate::core::sync::ValueCell;
use crate::queue::Enqueued;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// What the loop does after a wake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Re-examine the session and the queue
    Check,
    /// Stop the loop
    Shutdown,
}

/// Handle to the coordinator thread
pub(super) struct Coordinator {
    commands: flume::Sender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Start the loop and return once it is running
    pub fn spawn<C>(shared: Arc<Shared<C>>, config: &OrchestratorConfig) -> OrchestratorResult<Self>
    where
        C: PartialEq + Send + Sync + 'static,
    {
        config.validate()?;

        let (commands, command_rx) = flume::unbounded();
        let enqueued = shared.queue.subscribe();
        let ended = shared.session.subscribe_ended();
        let running = Arc::new(ValueCell::with_value(false));

        let mut builder = thread::Builder::new().name(config.coordinator_name.clone());
        if let Some(bytes) = config.stack_size {
            builder = builder.stack_size(bytes);
        }

        let started = running.clone();
        let handle = builder
            .spawn(move || {
                started.set(true);
                run(&*shared, &command_rx, &enqueued, &ended);
            })
            .map_err(|e| OrchestratorError::Spawn(e.to_string()))?;

        running.wait_for_value(&true);
        info!(name = %config.coordinator_name, "coordinator running");

        Ok(Self {
            commands,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stop the loop and wait for it to exit
    pub fn shutdown(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };

        let _ = self.commands.send(Command::Shutdown);
        if handle.join().is_err() {
            warn!("coordinator thread panicked before shutdown");
        } else {
            info!("coordinator stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<C: PartialEq>(
    shared: &Shared<C>,
    commands: &flume::Receiver<Command>,
    enqueued: &flume::Receiver<Enqueued>,
    ended: &flume::Receiver<Identity>,
) {
    loop {
        let command = flume::Selector::new()
            .recv(commands, |cmd| cmd.unwrap_or(Command::Shutdown))
            .recv(enqueued, |event| match event {
                Ok(_) => Command::Check,
                Err(_) => Command::Shutdown,
            })
            .recv(ended, |event| match event {
                Ok(_) => Command::Check,
                Err(_) => Command::Shutdown,
            })
            .wait();

        match command {
            Command::Check => {
                if let Some(owner) = shared.grant_next() {
                    debug!(owner = %owner, pending = shared.queue.len(), "resource granted");
                }
            }
            Command::Shutdown => break,
        }
    }
}
