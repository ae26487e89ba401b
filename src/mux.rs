//! Multiplexer gateway - thin adapter over the terminal-multiplexing substrate
//!
//! The orchestrator only ever needs session/pane CRUD and "send text to
//! pane", so that is the whole trait. `TmuxGateway` maps it onto a live tmux
//! server; `mock::MockMux` replays it in memory for tests.

use std::path::Path;
use std::process::Output;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::trace;

/// Errors surfaced by a multiplexer substrate
#[derive(Debug, Error)]
pub enum MuxError {
    /// Substrate not installed or not reachable
    #[error("substrate unavailable: {0}")]
    Unavailable(String),

    /// A substrate command ran and reported failure
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The substrate process could not be spawned or awaited
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Orientation of a pane split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    /// Left/right halves
    Horizontal,
    /// Top/bottom halves
    Vertical,
}

/// The capability the orchestrator consumes, polymorphic over substrates
#[async_trait]
pub trait Multiplexer: Send + Sync {
    /// Probe the substrate; returns its version string
    async fn available(&self) -> Result<String, MuxError>;

    /// Create a detached session; returns the target of its initial pane.
    /// Fails if the name is already in use.
    async fn create_session(&self, name: &str, cwd: &Path) -> Result<String, MuxError>;

    /// Destroy a session by name; a session that is already gone is success
    async fn destroy_session(&self, name: &str) -> Result<(), MuxError>;

    /// Split the given pane; returns the target of the new pane
    async fn split_pane(&self, target: &str, direction: SplitDirection)
        -> Result<String, MuxError>;

    /// Set the pane's display title
    async fn set_pane_title(&self, target: &str, title: &str) -> Result<(), MuxError>;

    /// Point the pane's foreground shell at a directory
    async fn set_working_directory(&self, target: &str, dir: &Path) -> Result<(), MuxError>;

    /// Send text to the pane's input line; `commit` submits it (Enter).
    /// Empty text with `commit` presses Enter on whatever is staged.
    async fn send_text(&self, target: &str, text: &str, commit: bool) -> Result<(), MuxError>;

    /// Names of all live sessions
    async fn list_sessions(&self) -> Result<Vec<String>, MuxError>;
}

/// True when a substrate error message describes a session that is
/// already gone, which teardown treats as success
fn session_absent(stderr: &str) -> bool {
    let s = stderr.to_ascii_lowercase();
    s.contains("session not found")
        || s.contains("can't find session")
        || s.contains("no server running")
        || s.contains("no such file or directory")
}

/// Gateway to a live tmux server
///
/// Pane targets are tmux pane ids (`%N`) captured at creation, so later
/// layout changes cannot reassign a handle to a different pane.
#[derive(Debug, Default)]
pub struct TmuxGateway;

impl TmuxGateway {
    pub fn new() -> Self {
        Self
    }

    async fn tmux(&self, args: &[&str]) -> Result<Output, MuxError> {
        trace!(args = ?args, "tmux");
        Command::new("tmux").args(args).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MuxError::Unavailable("tmux binary not found on PATH".into())
            } else {
                MuxError::Io(e)
            }
        })
    }

    async fn tmux_expect(&self, args: &[&str]) -> Result<String, MuxError> {
        let output = self.tmux(args).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(MuxError::CommandFailed {
                command: format!("tmux {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl Multiplexer for TmuxGateway {
    async fn available(&self) -> Result<String, MuxError> {
        match self.tmux_expect(&["-V"]).await {
            Ok(version) => Ok(version),
            Err(MuxError::CommandFailed { stderr, .. }) => Err(MuxError::Unavailable(stderr)),
            Err(e) => Err(e),
        }
    }

    async fn create_session(&self, name: &str, cwd: &Path) -> Result<String, MuxError> {
        let cwd = cwd.display().to_string();
        self.tmux_expect(&[
            "new-session",
            "-d",
            "-s",
            name,
            "-c",
            &cwd,
            "-P",
            "-F",
            "#{pane_id}",
        ])
        .await
    }

    async fn destroy_session(&self, name: &str) -> Result<(), MuxError> {
        match self.tmux_expect(&["kill-session", "-t", name]).await {
            Ok(_) => Ok(()),
            Err(MuxError::CommandFailed { stderr, .. }) if session_absent(&stderr) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn split_pane(
        &self,
        target: &str,
        direction: SplitDirection,
    ) -> Result<String, MuxError> {
        let flag = match direction {
            SplitDirection::Horizontal => "-h",
            SplitDirection::Vertical => "-v",
        };
        self.tmux_expect(&["split-window", flag, "-t", target, "-P", "-F", "#{pane_id}"])
            .await
    }

    async fn set_pane_title(&self, target: &str, title: &str) -> Result<(), MuxError> {
        self.tmux_expect(&["select-pane", "-t", target, "-T", title])
            .await
            .map(|_| ())
    }

    async fn set_working_directory(&self, target: &str, dir: &Path) -> Result<(), MuxError> {
        self.send_text(target, &format!("cd '{}'", dir.display()), true)
            .await
    }

    async fn send_text(&self, target: &str, text: &str, commit: bool) -> Result<(), MuxError> {
        if !text.is_empty() {
            // -l sends the text literally instead of interpreting key names
            self.tmux_expect(&["send-keys", "-t", target, "-l", "--", text])
                .await?;
        }
        if commit {
            self.tmux_expect(&["send-keys", "-t", target, "Enter"])
                .await?;
        }
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, MuxError> {
        match self
            .tmux_expect(&["list-sessions", "-F", "#{session_name}"])
            .await
        {
            Ok(out) => Ok(out.lines().map(str::to_string).collect()),
            Err(MuxError::CommandFailed { stderr, .. }) if session_absent(&stderr) => Ok(vec![]),
            Err(e) => Err(e),
        }
    }
}

pub mod mock {
    //! In-memory multiplexer for exercising orchestration without a live substrate

    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::{Multiplexer, MuxError, SplitDirection};

    /// A recorded gateway call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MuxOp {
        CreateSession { name: String },
        DestroySession { name: String },
        SplitPane { target: String, direction: SplitDirection },
        SetTitle { target: String, title: String },
        SetWorkingDirectory { target: String, dir: PathBuf },
        SendText { target: String, text: String, commit: bool },
        ListSessions,
    }

    #[derive(Default)]
    struct State {
        ops: Vec<MuxOp>,
        sessions: HashSet<String>,
        next_pane: usize,
        fail_available: bool,
        fail_create: HashSet<String>,
        fail_send_to: HashSet<String>,
    }

    /// Records every operation and mints pane targets like a real server
    #[derive(Default)]
    pub struct MockMux {
        state: Mutex<State>,
    }

    impl MockMux {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every call made so far, in order
        pub fn ops(&self) -> Vec<MuxOp> {
            self.state.lock().ops.clone()
        }

        /// Names of sessions currently alive, sorted
        pub fn live_sessions(&self) -> Vec<String> {
            let mut names: Vec<String> = self.state.lock().sessions.iter().cloned().collect();
            names.sort();
            names
        }

        /// Make the availability probe fail
        pub fn fail_available(&self) {
            self.state.lock().fail_available = true;
        }

        /// Make creation of the named session fail
        pub fn fail_create(&self, name: &str) {
            self.state.lock().fail_create.insert(name.to_string());
        }

        /// Make every send to the given pane target fail
        pub fn fail_send_to(&self, target: &str) {
            self.state.lock().fail_send_to.insert(target.to_string());
        }
    }

    #[async_trait]
    impl Multiplexer for MockMux {
        async fn available(&self) -> Result<String, MuxError> {
            if self.state.lock().fail_available {
                return Err(MuxError::Unavailable("mock substrate disabled".into()));
            }
            Ok("mock 1.0".into())
        }

        async fn create_session(&self, name: &str, _cwd: &Path) -> Result<String, MuxError> {
            let mut state = self.state.lock();
            state.ops.push(MuxOp::CreateSession { name: name.into() });
            if state.fail_create.contains(name) {
                return Err(MuxError::CommandFailed {
                    command: "new-session".into(),
                    stderr: format!("creation of '{name}' refused"),
                });
            }
            if !state.sessions.insert(name.to_string()) {
                return Err(MuxError::CommandFailed {
                    command: "new-session".into(),
                    stderr: format!("duplicate session: {name}"),
                });
            }
            let target = format!("%{}", state.next_pane);
            state.next_pane += 1;
            Ok(target)
        }

        async fn destroy_session(&self, name: &str) -> Result<(), MuxError> {
            let mut state = self.state.lock();
            state.ops.push(MuxOp::DestroySession { name: name.into() });
            state.sessions.remove(name);
            Ok(())
        }

        async fn split_pane(
            &self,
            target: &str,
            direction: SplitDirection,
        ) -> Result<String, MuxError> {
            let mut state = self.state.lock();
            state.ops.push(MuxOp::SplitPane {
                target: target.into(),
                direction,
            });
            let new_target = format!("%{}", state.next_pane);
            state.next_pane += 1;
            Ok(new_target)
        }

        async fn set_pane_title(&self, target: &str, title: &str) -> Result<(), MuxError> {
            self.state.lock().ops.push(MuxOp::SetTitle {
                target: target.into(),
                title: title.into(),
            });
            Ok(())
        }

        async fn set_working_directory(&self, target: &str, dir: &Path) -> Result<(), MuxError> {
            self.state.lock().ops.push(MuxOp::SetWorkingDirectory {
                target: target.into(),
                dir: dir.to_path_buf(),
            });
            Ok(())
        }

        async fn send_text(&self, target: &str, text: &str, commit: bool) -> Result<(), MuxError> {
            let mut state = self.state.lock();
            state.ops.push(MuxOp::SendText {
                target: target.into(),
                text: text.into(),
                commit,
            });
            if state.fail_send_to.contains(target) {
                return Err(MuxError::CommandFailed {
                    command: "send-keys".into(),
                    stderr: format!("pane {target} is gone"),
                });
            }
            Ok(())
        }

        async fn list_sessions(&self) -> Result<Vec<String>, MuxError> {
            let mut state = self.state.lock();
            state.ops.push(MuxOp::ListSessions);
            let mut names: Vec<String> = state.sessions.iter().cloned().collect();
            names.sort();
            Ok(names)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockMux, MuxOp};
    use super::*;

    #[test]
    fn test_session_absent_classification() {
        assert!(session_absent("session not found: agents"));
        assert!(session_absent("can't find session: agents"));
        assert!(session_absent("no server running on /tmp/tmux-0/default"));
        assert!(!session_absent("server exited unexpectedly"));
    }

    #[tokio::test]
    async fn test_mock_create_rejects_duplicate() {
        let mux = MockMux::new();
        mux.create_session("agents", Path::new("/tmp")).await.unwrap();
        let second = mux.create_session("agents", Path::new("/tmp")).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_mock_destroy_absent_is_success() {
        let mux = MockMux::new();
        assert!(mux.destroy_session("nope").await.is_ok());
        assert_eq!(
            mux.ops(),
            vec![MuxOp::DestroySession {
                name: "nope".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_mock_mints_unique_pane_targets() {
        let mux = MockMux::new();
        let first = mux.create_session("agents", Path::new("/tmp")).await.unwrap();
        let second = mux
            .split_pane(&first, SplitDirection::Horizontal)
            .await
            .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_mock_send_failure_injection() {
        let mux = MockMux::new();
        mux.fail_send_to("%1");
        assert!(mux.send_text("%0", "hi", true).await.is_ok());
        assert!(mux.send_text("%1", "hi", true).await.is_err());
    }
}
