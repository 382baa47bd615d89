//! Test doubles for the process host.
//!
//! `RecordingProcessHost` spawns nothing: it records every spawn request and
//! hands out `FakeProcess`es that record writes and can emit output on demand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use simple_repl_core::{Error, Result};
use simple_repl_term::Scrollback;

use crate::process::{ProcessHost, ReplProcess, SpawnSpec};

/// Process host recording spawn requests.
#[derive(Debug, Default)]
pub struct RecordingProcessHost {
    spawns: Mutex<Vec<SpawnSpec>>,
    processes: Mutex<Vec<Arc<FakeProcess>>>,
    fail: AtomicBool,
}

impl RecordingProcessHost {
    /// Create a host that spawns successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following spawn fail (or succeed again).
    pub fn fail_spawns(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of successful spawns.
    pub fn spawn_count(&self) -> usize {
        self.spawns.lock().unwrap().len()
    }

    /// Every successful spawn request, oldest first.
    pub fn spawns(&self) -> Vec<SpawnSpec> {
        self.spawns.lock().unwrap().clone()
    }

    /// The most recently spawned process.
    pub fn last_process(&self) -> Option<Arc<FakeProcess>> {
        self.processes.lock().unwrap().last().cloned()
    }

    /// All spawned processes, oldest first.
    pub fn processes(&self) -> Vec<Arc<FakeProcess>> {
        self.processes.lock().unwrap().clone()
    }
}

impl ProcessHost for RecordingProcessHost {
    fn spawn(&self, spec: &SpawnSpec, output: Arc<Scrollback>) -> Result<Box<dyn ReplProcess>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::PtyError(format!(
                "Failed to spawn command '{}'",
                spec.program
            )));
        }

        let process = Arc::new(FakeProcess {
            writes: Mutex::new(Vec::new()),
            alive: AtomicBool::new(true),
            refuse_kill: AtomicBool::new(false),
            output,
        });
        self.spawns.lock().unwrap().push(spec.clone());
        self.processes.lock().unwrap().push(Arc::clone(&process));
        Ok(Box::new(process))
    }
}

/// A process that records what it is sent.
#[derive(Debug)]
pub struct FakeProcess {
    writes: Mutex<Vec<Vec<u8>>>,
    alive: AtomicBool,
    refuse_kill: AtomicBool,
    output: Arc<Scrollback>,
}

impl FakeProcess {
    /// Every write, in order, decoded lossily.
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Pretend the process printed `bytes`.
    pub fn emit(&self, bytes: &[u8]) {
        self.output.feed(bytes);
    }

    /// Pretend the process exited.
    pub fn exit(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Make `kill` fail and leave the process running (or work again).
    pub fn refuse_kill(&self, refuse: bool) {
        self.refuse_kill.store(refuse, Ordering::SeqCst);
    }
}

impl ReplProcess for FakeProcess {
    fn write(&self, data: &[u8]) -> Result<usize> {
        if !self.is_alive() {
            return Err(Error::PtyError("process exited".to_string()));
        }
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(data.len())
    }

    fn kill(&self) -> Result<()> {
        if self.refuse_kill.load(Ordering::SeqCst) {
            return Err(Error::PtyError("Kill failed: operation not permitted".to_string()));
        }
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}
