//! Text dispatch: turn lines into one payload and write it to a session.

use tracing::{debug, warn};

use crate::session::Session;

/// Join `lines` with `separator`, making sure the result ends with one.
///
/// Most REPLs only evaluate once they see a line terminator, so even a single
/// line gets one. An empty join stays empty.
///
/// ```
/// use simple_repl_session::normalize;
///
/// assert_eq!(normalize(&["(+ 1 2)"], "\n"), "(+ 1 2)\n");
/// assert_eq!(normalize(&["a", "b"], "\n"), "a\nb\n");
/// assert_eq!(normalize::<&str>(&[], "\n"), "");
/// ```
pub fn normalize<S: AsRef<str>>(lines: &[S], separator: &str) -> String {
    let mut payload = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(separator);

    if !payload.is_empty() && !payload.ends_with(separator) {
        payload.push_str(separator);
    }
    payload
}

/// Write `payload` verbatim to `session`.
///
/// Returns the number of bytes written. Nothing is written, and nothing
/// fails, for an absent session or an empty payload; a failed write is
/// logged and reported as zero bytes.
pub fn send(session: Option<&Session>, payload: &str) -> usize {
    let Some(session) = session else {
        debug!("Dropping {} byte payload: no session", payload.len());
        return 0;
    };

    if payload.is_empty() {
        debug!("Empty payload for '{}', nothing sent", session.name());
        return 0;
    }

    match session.write(payload.as_bytes()) {
        Ok(n) => n,
        Err(e) => {
            warn!("Failed to send to '{}': {}", session.name(), e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SpawnSpec;
    use crate::testing::RecordingProcessHost;
    use simple_repl_core::{Dimensions, SessionName};

    fn session(host: &RecordingProcessHost) -> Session {
        let spec = SpawnSpec {
            program: "sh".to_string(),
            args: vec![],
            cwd: None,
            dimensions: Dimensions::default(),
            env: vec![],
        };
        Session::create(SessionName::compose("t", None), &spec, host, 100).unwrap()
    }

    #[test]
    fn test_normalize_single_line() {
        assert_eq!(normalize(&["(+ 1 2)"], "\n"), "(+ 1 2)\n");
    }

    #[test]
    fn test_normalize_multiple_lines() {
        assert_eq!(normalize(&["a", "b"], "\n"), "a\nb\n");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize::<String>(&[], "\n"), "");
        assert_eq!(normalize(&[""], "\n"), "");
    }

    #[test]
    fn test_normalize_already_terminated() {
        assert_eq!(normalize(&["a", "b\n"], "\n"), "a\nb\n");
        assert_eq!(normalize(&["a", ""], "\n"), "a\n");
    }

    #[test]
    fn test_normalize_custom_separator() {
        assert_eq!(normalize(&["x = 1", "x"], "\r"), "x = 1\rx\r");
        assert_eq!(normalize(&["SELECT 1"], ";\n"), "SELECT 1;\n");
    }

    #[test]
    fn test_normalize_owned_strings() {
        let lines = vec!["print(1)".to_string()];
        assert_eq!(normalize(&lines, "\n"), "print(1)\n");
    }

    #[test]
    fn test_send_writes_payload() {
        let host = RecordingProcessHost::new();
        let session = session(&host);

        assert_eq!(send(Some(&session), "echo hi\n"), 8);
        assert_eq!(host.last_process().unwrap().writes(), vec!["echo hi\n"]);
    }

    #[test]
    fn test_send_absent_session_is_noop() {
        assert_eq!(send(None, "echo hi\n"), 0);
    }

    #[test]
    fn test_send_empty_payload_skips_write() {
        let host = RecordingProcessHost::new();
        let session = session(&host);

        assert_eq!(send(Some(&session), ""), 0);
        assert!(host.last_process().unwrap().writes().is_empty());
    }

    #[test]
    fn test_send_to_exited_process_degrades() {
        let host = RecordingProcessHost::new();
        let session = session(&host);
        host.last_process().unwrap().exit();

        assert_eq!(send(Some(&session), "x\n"), 0);
    }

    #[test]
    fn test_send_preserves_order() {
        let host = RecordingProcessHost::new();
        let session = session(&host);

        for i in 0..5 {
            send(Some(&session), &format!("{i}\n"));
        }
        assert_eq!(
            host.last_process().unwrap().writes(),
            vec!["0\n", "1\n", "2\n", "3\n", "4\n"]
        );
    }
}
