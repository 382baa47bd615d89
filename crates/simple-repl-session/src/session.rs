//! REPL session: one named interactive process and its display buffer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use tracing::{debug, error, info};

use simple_repl_core::{BufferId, Result, SessionId, SessionName, SessionStatus};
use simple_repl_term::Scrollback;

use crate::process::{ProcessHost, ReplProcess, SpawnSpec};

/// A REPL session.
#[derive(Debug)]
pub struct Session {
    /// Session identifier
    id: SessionId,

    /// Composed session name
    name: SessionName,

    /// The running process
    process: Box<dyn ReplProcess>,

    /// Serializes writes and the kill so payloads never interleave
    process_lock: Mutex<()>,

    /// Display buffer fed by the process output
    buffer: Arc<Scrollback>,

    /// Program that was spawned
    command: String,

    /// Working directory the process started in
    cwd: PathBuf,

    /// Session creation time
    created_at: SystemTime,

    /// Set once the session was closed explicitly
    terminated: AtomicBool,
}

impl Session {
    /// Spawn a new session through `host`.
    pub fn create(
        name: SessionName,
        spec: &SpawnSpec,
        host: &dyn ProcessHost,
        scrollback_lines: usize,
    ) -> Result<Self> {
        info!(
            "Creating session: name='{}', command='{}', cwd={:?}",
            name, spec.program, spec.cwd
        );

        let cwd = match &spec.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let spec = SpawnSpec {
            cwd: Some(cwd.clone()),
            ..spec.clone()
        };

        let buffer = Arc::new(Scrollback::with_width(
            scrollback_lines,
            usize::from(spec.dimensions.cols),
        ));
        let process = host.spawn(&spec, Arc::clone(&buffer))?;

        let session_id = SessionId::new();
        info!(
            "Session created successfully: name='{}', id={}, buffer={}",
            name,
            session_id,
            buffer.id()
        );

        Ok(Self {
            id: session_id,
            name,
            process,
            process_lock: Mutex::new(()),
            buffer,
            command: spec.program.clone(),
            cwd,
            created_at: SystemTime::now(),
            terminated: AtomicBool::new(false),
        })
    }

    /// Get the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Get the composed session name.
    pub fn name(&self) -> &SessionName {
        &self.name
    }

    /// Get the display buffer.
    pub fn buffer(&self) -> &Arc<Scrollback> {
        &self.buffer
    }

    /// Get the display buffer handle.
    pub fn buffer_id(&self) -> BufferId {
        self.buffer.id()
    }

    /// Get the command.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Get the working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the session creation time.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Process ID, when known.
    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    /// Get the current session status.
    pub fn status(&self) -> SessionStatus {
        if self.terminated.load(Ordering::SeqCst) {
            SessionStatus::Terminated
        } else if self.process.is_alive() {
            SessionStatus::Running
        } else {
            SessionStatus::Exited
        }
    }

    /// Check if the session is alive.
    pub fn is_alive(&self) -> bool {
        self.status() == SessionStatus::Running
    }

    /// Write bytes to the process input.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        debug!("Writing to session: name='{}', {} bytes", self.name, data.len());
        let _guard = self.lock_process();
        self.process.write(data)
    }

    fn lock_process(&self) -> MutexGuard<'_, ()> {
        match self.process_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Terminate the session.
    ///
    /// The session only counts as terminated once the kill succeeded.
    pub fn terminate(&self) -> Result<()> {
        info!("Terminating session: name='{}', id={}", self.name, self.id);

        let _guard = self.lock_process();
        if self.terminated.load(Ordering::SeqCst) {
            debug!("Session already terminated: name='{}'", self.name);
            return Ok(());
        }

        self.process.kill().map_err(|e| {
            error!("Failed to kill process for session '{}': {}", self.name, e);
            e
        })?;
        self.terminated.store(true, Ordering::SeqCst);

        info!("Session terminated successfully: name='{}'", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingProcessHost;
    use simple_repl_core::{Dimensions, Error, DEFAULT_PREFIX};

    fn spec() -> SpawnSpec {
        SpawnSpec {
            program: "sh".to_string(),
            args: vec![],
            cwd: Some(PathBuf::from("/tmp")),
            dimensions: Dimensions::default(),
            env: vec![],
        }
    }

    #[test]
    fn test_session_create() {
        let host = RecordingProcessHost::new();
        let name = SessionName::compose(DEFAULT_PREFIX, Some("db"));

        let session = Session::create(name.clone(), &spec(), &host, 100).unwrap();

        assert_eq!(session.name(), &name);
        assert_eq!(session.command(), "sh");
        assert_eq!(session.cwd(), Path::new("/tmp"));
        assert_eq!(session.status(), SessionStatus::Running);
        assert_eq!(host.spawn_count(), 1);
    }

    #[test]
    fn test_session_create_resolves_cwd_before_spawn() {
        let host = RecordingProcessHost::new();
        let spec = SpawnSpec { cwd: None, ..spec() };

        let session = Session::create(SessionName::compose("p", None), &spec, &host, 100).unwrap();

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(session.cwd(), cwd.as_path());
        assert_eq!(host.spawns()[0].cwd, Some(cwd));
    }

    #[test]
    fn test_session_create_propagates_spawn_failure() {
        let host = RecordingProcessHost::new();
        host.fail_spawns(true);

        let result = Session::create(SessionName::compose("p", None), &spec(), &host, 100);
        assert!(matches!(result, Err(Error::PtyError(_))));
    }

    #[test]
    fn test_session_write() {
        let host = RecordingProcessHost::new();
        let session = Session::create(SessionName::compose("p", None), &spec(), &host, 100).unwrap();

        assert_eq!(session.write(b"1 + 1\n").unwrap(), 6);
        assert_eq!(host.last_process().unwrap().writes(), vec!["1 + 1\n"]);
    }

    #[test]
    fn test_session_output_reaches_buffer() {
        let host = RecordingProcessHost::new();
        let session = Session::create(SessionName::compose("p", None), &spec(), &host, 100).unwrap();

        host.last_process().unwrap().emit(b"=> 2\r\n");
        assert_eq!(session.buffer().lines(), vec!["=> 2", ""]);
    }

    #[test]
    fn test_session_status_exited() {
        let host = RecordingProcessHost::new();
        let session = Session::create(SessionName::compose("p", None), &spec(), &host, 100).unwrap();

        host.last_process().unwrap().exit();
        assert_eq!(session.status(), SessionStatus::Exited);
        assert!(!session.is_alive());
    }

    #[test]
    fn test_session_terminate() {
        let host = RecordingProcessHost::new();
        let session = Session::create(SessionName::compose("p", None), &spec(), &host, 100).unwrap();

        session.terminate().unwrap();
        assert_eq!(session.status(), SessionStatus::Terminated);
        assert!(!host.last_process().unwrap().is_alive());

        // Second terminate is a no-op
        assert!(session.terminate().is_ok());
    }

    #[test]
    fn test_session_failed_kill_stays_running() {
        let host = RecordingProcessHost::new();
        let session = Session::create(SessionName::compose("p", None), &spec(), &host, 100).unwrap();
        let process = host.last_process().unwrap();

        process.refuse_kill(true);
        assert!(matches!(session.terminate(), Err(Error::PtyError(_))));
        assert_eq!(session.status(), SessionStatus::Running);

        process.refuse_kill(false);
        session.terminate().unwrap();
        assert_eq!(session.status(), SessionStatus::Terminated);
    }

    #[test]
    #[cfg(unix)]
    fn test_session_with_real_pty() {
        use crate::process::PtyProcessHost;
        use std::time::{Duration, Instant};

        let spec = SpawnSpec {
            program: "/bin/sh".to_string(),
            ..spec()
        };
        let session =
            Session::create(SessionName::compose("p", Some("sh")), &spec, &PtyProcessHost, 1000)
                .unwrap();
        session.write(b"echo from-$((6 * 7))\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline
            && !session.buffer().lines().iter().any(|l| l.contains("from-42"))
        {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(session.buffer().lines().iter().any(|l| l.contains("from-42")));
        session.terminate().unwrap();
    }
}
