//! Session registry: at most one live session per name.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use simple_repl_core::{Dimensions, ReplConfig, Result, SessionId, SessionName, SessionStatus};

use crate::process::{ProcessHost, SpawnSpec};
use crate::session::Session;

/// Callback run once, right after a session is created.
pub type CreateCallback = Box<dyn FnOnce(&Arc<Session>) + Send>;

/// How a session is started when its name is not registered yet.
///
/// Ignored entirely when the session already exists.
#[derive(Default)]
pub struct StartupConfig {
    /// Working directory; the current directory when `None`
    pub cwd: Option<PathBuf>,
    /// Command typed into the shell once it is up
    pub cmd: Option<String>,
    /// One-shot callback run after creation
    pub on_create: Option<CreateCallback>,
}

impl StartupConfig {
    /// Startup that types `cmd` into the shell.
    pub fn with_cmd(cmd: impl Into<String>) -> Self {
        Self {
            cmd: Some(cmd.into()),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for StartupConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupConfig")
            .field("cwd", &self.cwd)
            .field("cmd", &self.cmd)
            .field("on_create", &self.on_create.is_some())
            .finish()
    }
}

/// Process settings shared by every session the registry spawns.
#[derive(Debug, Clone)]
pub struct SpawnSettings {
    /// Shell to spawn
    pub shell: String,
    /// Terminal dimensions
    pub dimensions: Dimensions,
    /// TERM value exported to the shell
    pub term: String,
    /// Lines kept per display buffer
    pub scrollback_lines: usize,
}

impl From<&ReplConfig> for SpawnSettings {
    fn from(config: &ReplConfig) -> Self {
        Self {
            shell: config.session.shell.clone(),
            dimensions: config.terminal.dimensions(),
            term: config.terminal.term.clone(),
            scrollback_lines: config.session.scrollback_lines,
        }
    }
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self::from(&ReplConfig::default())
    }
}

/// Registry mapping session names to live sessions.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionName, Arc<Session>>>,
    host: Arc<dyn ProcessHost>,
    settings: SpawnSettings,
}

impl SessionRegistry {
    /// Create an empty registry spawning through `host`.
    pub fn new(host: Arc<dyn ProcessHost>, settings: SpawnSettings) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            host,
            settings,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionName, Arc<Session>>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Session registry lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Look up a live session. Never creates one.
    ///
    /// A session whose process has exited is dropped from the registry and
    /// reported as absent.
    pub fn get(&self, name: &SessionName) -> Option<Arc<Session>> {
        let mut sessions = self.lock();
        Self::live(&mut sessions, name)
    }

    fn live(
        sessions: &mut HashMap<SessionName, Arc<Session>>,
        name: &SessionName,
    ) -> Option<Arc<Session>> {
        let session = sessions.get(name)?;
        if session.is_alive() {
            return Some(Arc::clone(session));
        }
        info!("Pruning dead session: name='{}'", name);
        sessions.remove(name);
        None
    }

    /// Return the live session registered under `name`, creating it from
    /// `startup` when there is none.
    ///
    /// The flag is `true` only when this call created the session. For an
    /// existing session `startup` is dropped unused, callback included.
    pub fn start(&self, name: &SessionName, startup: StartupConfig) -> Result<(Arc<Session>, bool)> {
        let session = {
            let mut sessions = self.lock();
            if let Some(existing) = Self::live(&mut sessions, name) {
                debug!("Reusing session: name='{}', startup ignored", name);
                return Ok((existing, false));
            }

            let spec = SpawnSpec {
                program: self.settings.shell.clone(),
                args: Vec::new(),
                cwd: startup.cwd.clone(),
                dimensions: self.settings.dimensions,
                env: vec![("TERM".to_string(), self.settings.term.clone())],
            };
            let session = Arc::new(Session::create(
                name.clone(),
                &spec,
                self.host.as_ref(),
                self.settings.scrollback_lines,
            )?);
            sessions.insert(name.clone(), Arc::clone(&session));
            session
        };

        // Listeners attached here must see the startup command's output.
        if let Some(on_create) = startup.on_create {
            on_create(&session);
        }

        if let Some(cmd) = startup.cmd.as_deref().filter(|c| !c.is_empty()) {
            let line = terminated(cmd);
            if let Err(e) = session.write(line.as_bytes()) {
                warn!("Failed to send startup command to '{}': {}", name, e);
            }
        }

        Ok((session, true))
    }

    /// Terminate the session registered under `name` and unregister it,
    /// returning it. `Ok(None)` when there is no such session.
    ///
    /// A session whose kill fails stays registered, so the name keeps
    /// pointing at the still-running process.
    pub fn terminate(&self, name: &SessionName) -> Result<Option<Arc<Session>>> {
        let mut sessions = self.lock();
        let Some(session) = sessions.get(name).cloned() else {
            return Ok(None);
        };
        session.terminate()?;
        sessions.remove(name);
        Ok(Some(session))
    }

    /// Remove every session, returning them.
    pub fn drain(&self) -> Vec<Arc<Session>> {
        self.lock().drain().map(|(_, session)| session).collect()
    }

    /// List all registered sessions, sorted by name.
    pub fn list(&self) -> Vec<SessionInfo> {
        let sessions = self.lock();
        let mut infos: Vec<SessionInfo> = sessions
            .values()
            .map(|session| SessionInfo {
                name: session.name().clone(),
                session_id: *session.id(),
                command: session.command().to_string(),
                cwd: session.cwd().to_path_buf(),
                status: session.status(),
                created_at: session.created_at(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Get the number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }
}

/// Make sure a startup command ends with a line terminator so it runs.
fn terminated(cmd: &str) -> String {
    if cmd.ends_with('\n') {
        cmd.to_string()
    } else {
        format!("{cmd}\n")
    }
}

/// Information about a session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Composed name
    pub name: SessionName,

    /// Session ID
    pub session_id: SessionId,

    /// Command
    pub command: String,

    /// Working directory
    pub cwd: PathBuf,

    /// Session status
    pub status: SessionStatus,

    /// Creation time
    pub created_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ReplProcess;
    use crate::testing::RecordingProcessHost;
    use simple_repl_core::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> (Arc<RecordingProcessHost>, SessionRegistry) {
        let host = Arc::new(RecordingProcessHost::new());
        let settings = SpawnSettings {
            shell: "sh".to_string(),
            ..Default::default()
        };
        let registry = SessionRegistry::new(host.clone(), settings);
        (host, registry)
    }

    fn name(n: &str) -> SessionName {
        SessionName::compose("simple_repl", Some(n))
    }

    #[test]
    fn test_registry_get_does_not_create() {
        let (host, registry) = registry();
        assert!(registry.get(&name("db")).is_none());
        assert_eq!(host.spawn_count(), 0);
        assert_eq!(registry.session_count(), 0);
    }

    #[test]
    fn test_registry_start_creates_once() {
        let (host, registry) = registry();

        let (first, created) = registry
            .start(
                &name("db"),
                StartupConfig {
                    cwd: Some(PathBuf::from("/tmp")),
                    cmd: Some("psql".to_string()),
                    on_create: None,
                },
            )
            .unwrap();
        assert!(created);

        let (second, created) = registry
            .start(
                &name("db"),
                StartupConfig {
                    cwd: Some(PathBuf::from("/var")),
                    cmd: Some("python".to_string()),
                    on_create: None,
                },
            )
            .unwrap();
        assert!(!created);

        assert_eq!(first.id(), second.id());
        assert_eq!(host.spawn_count(), 1);
        assert_eq!(host.spawns()[0].cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(host.last_process().unwrap().writes(), vec!["psql\n"]);
    }

    #[test]
    fn test_registry_on_create_runs_once() {
        let (_host, registry) = registry();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&calls);
            registry
                .start(
                    &name("py"),
                    StartupConfig {
                        on_create: Some(Box::new(move |_: &Arc<Session>| {
                            counter.fetch_add(1, Ordering::SeqCst);
                        })),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registry_on_create_sees_registered_session() {
        let (_host, registry) = registry();
        let registry = Arc::new(registry);
        let seen = Arc::new(Mutex::new(None));

        let inner = Arc::clone(&registry);
        let sink = Arc::clone(&seen);
        registry
            .start(
                &name("py"),
                StartupConfig {
                    on_create: Some(Box::new(move |session: &Arc<Session>| {
                        let found = inner.get(session.name()).map(|s| *s.id());
                        *sink.lock().unwrap() = found;
                    })),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(seen.lock().unwrap().is_some());
    }

    #[test]
    fn test_registry_on_create_runs_before_startup_command() {
        let (host, registry) = registry();
        let writes_seen = Arc::new(Mutex::new(None));

        let recorder = Arc::clone(&host);
        let sink = Arc::clone(&writes_seen);
        registry
            .start(
                &name("db"),
                StartupConfig {
                    cmd: Some("psql".to_string()),
                    on_create: Some(Box::new(move |_: &Arc<Session>| {
                        let writes = recorder.last_process().map(|p| p.writes().len());
                        *sink.lock().unwrap() = writes;
                    })),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(*writes_seen.lock().unwrap(), Some(0));
        assert_eq!(host.last_process().unwrap().writes(), vec!["psql\n"]);
    }

    #[test]
    fn test_registry_cmd_keeps_existing_terminator() {
        let (host, registry) = registry();
        registry
            .start(&name("db"), StartupConfig::with_cmd("sqlite3\n"))
            .unwrap();
        assert_eq!(host.last_process().unwrap().writes(), vec!["sqlite3\n"]);
    }

    #[test]
    fn test_registry_plain_shell_writes_nothing() {
        let (host, registry) = registry();
        registry.start(&name("sh"), StartupConfig::default()).unwrap();
        assert!(host.last_process().unwrap().writes().is_empty());
        assert_eq!(host.spawns()[0].program, "sh");
    }

    #[test]
    fn test_registry_spawn_failure_propagates() {
        let (host, registry) = registry();
        host.fail_spawns(true);

        let result = registry.start(&name("db"), StartupConfig::default());
        assert!(matches!(result, Err(Error::PtyError(_))));
        assert!(registry.get(&name("db")).is_none());
    }

    #[test]
    fn test_registry_dead_session_is_absent() {
        let (host, registry) = registry();
        registry.start(&name("db"), StartupConfig::default()).unwrap();

        host.last_process().unwrap().exit();
        assert!(registry.get(&name("db")).is_none());
        assert_eq!(registry.session_count(), 0);

        let (_, created) = registry.start(&name("db"), StartupConfig::default()).unwrap();
        assert!(created);
        assert_eq!(host.spawn_count(), 2);
    }

    #[test]
    fn test_registry_terminate_makes_name_absent() {
        let (host, registry) = registry();
        registry.start(&name("db"), StartupConfig::default()).unwrap();

        assert!(registry.terminate(&name("db")).unwrap().is_some());
        assert!(!host.last_process().unwrap().is_alive());
        assert!(registry.get(&name("db")).is_none());
        assert!(registry.terminate(&name("db")).unwrap().is_none());
    }

    #[test]
    fn test_registry_failed_kill_keeps_session() {
        let (host, registry) = registry();
        let (session, _) = registry.start(&name("db"), StartupConfig::default()).unwrap();
        host.last_process().unwrap().refuse_kill(true);

        assert!(registry.terminate(&name("db")).is_err());
        let kept = registry.get(&name("db")).unwrap();
        assert_eq!(kept.id(), session.id());

        let (_, created) = registry.start(&name("db"), StartupConfig::default()).unwrap();
        assert!(!created);
        assert_eq!(host.spawn_count(), 1);
    }

    #[test]
    fn test_registry_list_sorted() {
        let (_host, registry) = registry();
        registry.start(&name("zsh"), StartupConfig::default()).unwrap();
        registry.start(&name("ash"), StartupConfig::default()).unwrap();

        let names: Vec<String> = registry.list().iter().map(|i| i.name.to_string()).collect();
        assert_eq!(names, vec!["simple_repl:ash", "simple_repl:zsh"]);
    }

    #[test]
    fn test_registry_concurrent_start_spawns_once() {
        let (host, registry) = registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let (session, _) = registry.start(&name("db"), StartupConfig::default()).unwrap();
                    *session.id()
                })
            })
            .collect();

        let ids: Vec<SessionId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(host.spawn_count(), 1);
    }

    #[test]
    fn test_terminated() {
        assert_eq!(terminated("sh"), "sh\n");
        assert_eq!(terminated("sh\n"), "sh\n");
    }
}
