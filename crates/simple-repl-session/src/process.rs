//! Process host seam: how a session's interactive process gets spawned.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use simple_repl_core::{Dimensions, Result};
use simple_repl_term::{PtyHandle, Scrollback};

/// Everything needed to spawn a session's process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSpec {
    /// Program to run (the shell)
    pub program: String,
    /// Program arguments
    pub args: Vec<String>,
    /// Working directory; the current directory when `None`
    pub cwd: Option<PathBuf>,
    /// Terminal dimensions
    pub dimensions: Dimensions,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
}

/// A running interactive process.
pub trait ReplProcess: Send + Sync + std::fmt::Debug {
    /// Write bytes to the process input.
    fn write(&self, data: &[u8]) -> Result<usize>;

    /// Kill the process.
    fn kill(&self) -> Result<()>;

    /// Whether the process is still running.
    fn is_alive(&self) -> bool;

    /// Process ID, when known.
    fn pid(&self) -> Option<u32> {
        None
    }
}

impl<P: ReplProcess + ?Sized> ReplProcess for Arc<P> {
    fn write(&self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn kill(&self) -> Result<()> {
        (**self).kill()
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }

    fn pid(&self) -> Option<u32> {
        (**self).pid()
    }
}

/// Spawns session processes.
///
/// Implementations must route everything the process prints into `output`.
pub trait ProcessHost: Send + Sync {
    /// Spawn a process described by `spec`.
    fn spawn(&self, spec: &SpawnSpec, output: Arc<Scrollback>) -> Result<Box<dyn ReplProcess>>;
}

/// Process host backed by real pseudo-terminals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PtyProcessHost;

impl ProcessHost for PtyProcessHost {
    fn spawn(&self, spec: &SpawnSpec, output: Arc<Scrollback>) -> Result<Box<dyn ReplProcess>> {
        let pty = PtyHandle::spawn(
            &spec.program,
            &spec.args,
            spec.dimensions,
            spec.cwd.as_deref(),
            &spec.env,
        )?;
        let buffer = output.id();
        pty.pump_into(output)?;
        debug!("PTY output pumped into {}", buffer);
        Ok(Box::new(pty))
    }
}

impl ReplProcess for PtyHandle {
    fn write(&self, data: &[u8]) -> Result<usize> {
        PtyHandle::write(self, data)
    }

    fn kill(&self) -> Result<()> {
        PtyHandle::kill(self)
    }

    fn is_alive(&self) -> bool {
        PtyHandle::is_alive(self)
    }

    fn pid(&self) -> Option<u32> {
        PtyHandle::pid(self)
    }
}
