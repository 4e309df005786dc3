//! Single-consumer command mailbox in front of a [`PositioningEngine`]
//!
//! Producers on any thread push commands; one worker thread applies them
//! to the engine in arrival order. Snapshot reads go straight to the
//! engine and never queue behind commands.

use crate::api::engine::PositioningEngine;
use crate::api::types::{EngineError, EngineResult};
use crate::core::{EngineSnapshot, Observation};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Commands accepted by the worker
#[derive(Debug)]
pub enum EngineCommand {
    Start { ready: bool, reply: Sender<bool> },
    Stop,
    Interrupt { reason: String },
    Batch(Vec<Observation>),
    Shutdown,
}

/// Cloneable producer side of the mailbox
#[derive(Debug, Clone)]
pub struct MailboxHandle {
    sender: Sender<EngineCommand>,
}

impl MailboxHandle {
    fn send(&self, command: EngineCommand) -> EngineResult<()> {
        self.sender
            .send(command)
            .map_err(|_| EngineError::WorkerStopped)
    }

    /// Queue an observation batch
    pub fn submit_batch(&self, batch: Vec<Observation>) -> EngineResult<()> {
        self.send(EngineCommand::Batch(batch))
    }

    /// Queue a start request and wait for the worker's answer
    pub fn start(&self, ready: bool) -> EngineResult<bool> {
        let (reply, answer) = mpsc::channel();
        self.send(EngineCommand::Start { ready, reply })?;
        answer.recv().map_err(|_| EngineError::WorkerStopped)
    }

    pub fn stop(&self) -> EngineResult<()> {
        self.send(EngineCommand::Stop)
    }

    pub fn interrupt(&self, reason: impl Into<String>) -> EngineResult<()> {
        self.send(EngineCommand::Interrupt {
            reason: reason.into(),
        })
    }
}

/// Worker thread owning the consumer side
pub struct EngineMailbox {
    handle: MailboxHandle,
    worker: Option<JoinHandle<()>>,
    engine: Arc<PositioningEngine>,
}

impl EngineMailbox {
    /// Spawn the worker for `engine`
    pub fn spawn(engine: Arc<PositioningEngine>) -> EngineResult<Self> {
        let (sender, receiver) = mpsc::channel();
        let worker_engine = Arc::clone(&engine);

        let worker = thread::Builder::new()
            .name("beacon-engine".to_string())
            .spawn(move || run_worker(&worker_engine, receiver))
            .map_err(EngineError::WorkerSpawn)?;

        Ok(Self {
            handle: MailboxHandle { sender },
            worker: Some(worker),
            engine,
        })
    }

    pub fn handle(&self) -> MailboxHandle {
        self.handle.clone()
    }

    pub fn engine(&self) -> &Arc<PositioningEngine> {
        &self.engine
    }

    pub fn current_snapshot(&self) -> Arc<EngineSnapshot> {
        self.engine.current_snapshot()
    }

    /// Process everything already queued, then stop the worker. Handles
    /// still held elsewhere get [`EngineError::WorkerStopped`] afterwards.
    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.handle.send(EngineCommand::Shutdown);
            if worker.join().is_err() {
                warn!("engine worker panicked");
            }
        }
    }
}

impl Drop for EngineMailbox {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn run_worker(engine: &PositioningEngine, receiver: Receiver<EngineCommand>) {
    debug!("engine worker running");
    for command in receiver.iter() {
        match command {
            EngineCommand::Start { ready, reply } => {
                let started = engine.start(ready);
                // Caller may have stopped waiting
                let _ = reply.send(started);
            }
            EngineCommand::Stop => engine.stop(),
            EngineCommand::Interrupt { reason } => engine.interrupt(&reason),
            EngineCommand::Batch(batch) => engine.on_observation_batch(&batch),
            EngineCommand::Shutdown => break,
        }
    }
    info!("engine worker stopped");
}
