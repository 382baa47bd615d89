//! PTY (Pseudo-Terminal) handling with portable-pty.

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use simple_repl_core::{Dimensions, Error, Result};

use crate::scrollback::Scrollback;

/// Handle to a spawned PTY process.
pub struct PtyHandle {
    /// The master PTY end; the PTY stays open while it is held
    _master: Mutex<Box<dyn MasterPty + Send>>,
    /// The child process
    child: Arc<Mutex<Box<dyn Child + Send + Sync>>>,
    /// PTY writer
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    /// PTY reader, handed to the output pump once
    reader: Mutex<Option<Box<dyn Read + Send>>>,
    /// Process ID of the child, when the platform reports one
    pid: Option<u32>,
}

impl std::fmt::Debug for PtyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyHandle")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl PtyHandle {
    /// Spawn a new PTY running `command`.
    ///
    /// # Arguments
    /// * `command` - Program to execute (e.g., "/bin/sh", "cmd.exe")
    /// * `args` - Program arguments
    /// * `dimensions` - Initial terminal dimensions
    /// * `cwd` - Working directory; the current directory when `None`
    /// * `env` - Extra environment variables
    ///
    /// # Example
    /// ```no_run
    /// use simple_repl_term::PtyHandle;
    /// use simple_repl_core::Dimensions;
    ///
    /// # fn example() -> simple_repl_core::Result<()> {
    /// let pty = PtyHandle::spawn("/bin/sh", &[], Dimensions::new(24, 80), None, &[])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn(
        command: &str,
        args: &[String],
        dimensions: Dimensions,
        cwd: Option<&Path>,
        env: &[(String, String)],
    ) -> Result<Self> {
        info!(
            "Spawning PTY: command='{}' args={:?}, dimensions={}x{}, cwd={:?}",
            command, args, dimensions.rows, dimensions.cols, cwd
        );

        let pty_system = native_pty_system();

        let pty_size = PtySize {
            rows: dimensions.rows,
            cols: dimensions.cols,
            pixel_width: 0,
            pixel_height: 0,
        };

        let pair = pty_system.openpty(pty_size).map_err(|e| {
            error!("Failed to open PTY: {}", e);
            Error::PtyError(format!("Failed to open PTY: {e}"))
        })?;

        let mut cmd = CommandBuilder::new(command);
        for arg in args {
            cmd.arg(arg);
        }
        for (key, value) in env {
            cmd.env(key, value);
        }

        let cwd = match cwd {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        debug!("Setting working directory to: {}", cwd.display());
        cmd.cwd(cwd);

        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            error!("Failed to spawn command '{}': {}", command, e);
            Error::PtyError(format!("Failed to spawn command '{command}': {e}"))
        })?;
        // The slave end must not outlive the child, or the reader never sees EOF.
        drop(pair.slave);

        let writer = pair.master.take_writer().map_err(|e| {
            error!("Failed to take PTY writer: {}", e);
            Error::PtyError(format!("Failed to take writer: {e}"))
        })?;

        let reader = pair.master.try_clone_reader().map_err(|e| {
            error!("Failed to clone PTY reader: {}", e);
            Error::PtyError(format!("Failed to clone reader: {e}"))
        })?;

        let pid = child.process_id();
        info!("PTY spawned successfully: command='{}', pid={:?}", command, pid);

        Ok(Self {
            _master: Mutex::new(pair.master),
            child: Arc::new(Mutex::new(child)),
            writer: Arc::new(Mutex::new(writer)),
            reader: Mutex::new(Some(reader)),
            pid,
        })
    }

    /// Process ID of the child.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Start a background thread feeding everything the process prints into
    /// `sink`.
    ///
    /// The thread ends at EOF (the process exited) or on a read error. The
    /// reader can only be pumped once.
    pub fn pump_into(&self, sink: Arc<Scrollback>) -> Result<JoinHandle<()>> {
        let mut reader = self
            .reader
            .lock()
            .map_err(|e| Error::PtyError(format!("Reader lock error: {e}")))?
            .take()
            .ok_or_else(|| Error::PtyError("PTY output is already being pumped".to_string()))?;

        let buffer_id = sink.id();
        thread::Builder::new()
            .name(format!("pty-reader-{}", buffer_id.0))
            .spawn(move || {
                let mut buffer = [0u8; 4096];
                loop {
                    match reader.read(&mut buffer) {
                        Ok(0) => {
                            debug!("PTY reached EOF: {}", buffer_id);
                            break;
                        }
                        Ok(n) => sink.feed(&buffer[..n]),
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            // EIO is how Linux reports a closed slave end.
                            debug!("PTY read ended for {}: {}", buffer_id, e);
                            break;
                        }
                    }
                }
            })
            .map_err(Error::Io)
    }

    /// Write data to the PTY.
    ///
    /// # Arguments
    /// * `data` - Bytes to write to the PTY
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        debug!("Writing {} bytes to PTY", data.len());
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| Error::PtyError(format!("Lock error: {e}")))?;

        writer.write_all(data).map_err(Error::Io)?;
        writer.flush().map_err(Error::Io)?;

        Ok(data.len())
    }

    /// Check if the child process is still running.
    pub fn is_alive(&self) -> bool {
        match self.child.lock() {
            Ok(mut child) => matches!(child.try_wait(), Ok(None)),
            Err(_) => false,
        }
    }

    /// Kill the child process.
    pub fn kill(&self) -> Result<()> {
        info!("Killing PTY process: pid={:?}", self.pid);
        let mut child = self
            .child
            .lock()
            .map_err(|e| Error::PtyError(format!("Lock error: {e}")))?;

        if !matches!(child.try_wait(), Ok(None)) {
            warn!("PTY process already exited: pid={:?}", self.pid);
            return Ok(());
        }

        child
            .kill()
            .map_err(|e| Error::PtyError(format!("Kill failed: {e}")))
    }
}
