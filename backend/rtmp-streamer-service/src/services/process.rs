//! Child process management for the relay.
//!
//! [`ProcessLauncher`] is the seam between the controller and the operating
//! system: it starts a command in a fresh process group and signals that
//! group later. Tests swap in their own implementation.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::StreamError;
use crate::models::StreamHandle;
use crate::services::ffmpeg_command::FfmpegCommand;

/// Resolves with a description of how the child ended
pub type ExitFuture = BoxFuture<'static, String>;

/// A freshly started child
pub struct SpawnedProcess {
    pub handle: StreamHandle,
    pub exit: ExitFuture,
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Start `command` as the leader of a new process group
    async fn spawn(&self, command: &FfmpegCommand) -> Result<SpawnedProcess, StreamError>;

    /// Send SIGTERM to every process in the group; does not wait for exit
    fn terminate_group(&self, handle: &StreamHandle) -> Result<(), StreamError>;
}

#[cfg(unix)]
pub use system::SystemProcessLauncher;

#[cfg(unix)]
mod system {
    use super::*;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::{getpgid, Pid};
    use std::process::Stdio;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::process::{ChildStderr, ChildStdout, Command};
    use tracing::{debug, info};

    /// Launches real processes through tokio
    #[derive(Debug, Default, Clone)]
    pub struct SystemProcessLauncher;

    impl SystemProcessLauncher {
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl ProcessLauncher for SystemProcessLauncher {
        async fn spawn(&self, command: &FfmpegCommand) -> Result<SpawnedProcess, StreamError> {
            let mut child = Command::new(&command.program)
                .args(&command.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .process_group(0)
                .spawn()
                .map_err(|source| StreamError::Spawn {
                    program: command.program.clone(),
                    source,
                })?;

            let process_id = child.id().ok_or_else(|| StreamError::Spawn {
                program: command.program.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "child exited before its pid could be read",
                ),
            })?;
            // A new group was requested, so the leader's pid doubles as the group id
            let process_group_id = getpgid(Some(Pid::from_raw(process_id as i32)))
                .map(Pid::as_raw)
                .unwrap_or(process_id as i32);

            if let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) {
                tokio::spawn(drain_output(process_id, stdout, stderr));
            }

            info!(pid = process_id, pgid = process_group_id, program = %command.program, "Spawned relay process");

            let exit = Box::pin(async move {
                match child.wait().await {
                    Ok(status) => status.to_string(),
                    Err(e) => format!("wait failed: {e}"),
                }
            });

            Ok(SpawnedProcess {
                handle: StreamHandle {
                    process_id,
                    process_group_id,
                },
                exit,
            })
        }

        fn terminate_group(&self, handle: &StreamHandle) -> Result<(), StreamError> {
            killpg(Pid::from_raw(handle.process_group_id), Signal::SIGTERM).map_err(|errno| {
                StreamError::Signal {
                    pgid: handle.process_group_id,
                    message: errno.desc().to_string(),
                }
            })?;
            debug!(pgid = handle.process_group_id, "Sent SIGTERM to relay process group");
            Ok(())
        }
    }

    /// Interleave stdout and stderr into the `ffmpeg` log target until both close
    async fn drain_output(pid: u32, stdout: ChildStdout, stderr: ChildStderr) {
        let mut out = BufReader::new(stdout).lines();
        let mut err = BufReader::new(stderr).lines();
        let (mut out_open, mut err_open) = (true, true);

        while out_open || err_open {
            tokio::select! {
                line = out.next_line(), if out_open => match line {
                    Ok(Some(line)) => debug!(target: "ffmpeg", pid, "{}", line),
                    _ => out_open = false,
                },
                line = err.next_line(), if err_open => match line {
                    Ok(Some(line)) => debug!(target: "ffmpeg", pid, "{}", line),
                    _ => err_open = false,
                },
            }
        }
    }

}
