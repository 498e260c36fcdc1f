use core::fmt;
use std::{
    fmt::Debug,
    io,
    process::{ExitStatus, Stdio},
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout},
    process::{self, Child, ChildStdout},
};
use tracing::{info, warn};

use crate::{acquire_dir_path, next_terminal_color, Command, FlowError, ProcessResult};

// if set excessively large by some single line, shrink
const LINE_BUF_SHRINK: usize = 8 * 1024;

/// A running [Command]. Stdout lines are pulled one at a time with
/// [CommandRunner::next_line], so nothing beyond the current line is buffered
/// unless the caller keeps it.
///
/// # Note
///
/// Runners should be driven until `next_line` returns `Ok(None)` or an error.
/// Dropping an unfinished runner kills the child process and, if the `tracing`
/// crate has an active subscriber, issues a warning.
#[must_use]
pub struct CommandRunner {
    // this information is kept around for failures
    command: Command,
    child_process: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
    // write point and prefix
    forward: Option<(Stdout, String)>,
    line_buf: Vec<u8>,
    status: Option<ExitStatus>,
}

impl Debug for CommandRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRunner")
            .field("command", &self.command)
            .field("child_process", &self.child_process)
            .field("status", &self.status)
            .finish()
    }
}

impl Drop for CommandRunner {
    fn drop(&mut self) {
        // we purposely parenthesize in this way to avoid calling `panicking` in the
        // normal case
        if self.child_process.is_some() && (!std::thread::panicking()) {
            warn!(
                "A `CommandRunner` was dropped without being properly finished, the command was: \
                 {}",
                self.command.get_unified_command()
            )
        }
    }
}

pub(crate) async fn command_runner(this: Command) -> Result<CommandRunner, FlowError> {
    let mut cmd = process::Command::new(&this.program);
    if let Some(ref cwd) = this.cwd {
        let cwd = acquire_dir_path(cwd).await?;
        cmd.current_dir(cwd);
    }
    cmd.args(&this.args)
        .envs(this.envs.iter().map(|x| (&x.0, &x.1)))
        .kill_on_drop(true);
    info!("running `{}`", this.get_unified_command());
    // stderr goes straight to the terminal so that failures are visible live
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| FlowError::Spawn {
            command: this.get_unified_command(),
            source,
        })?;
    let stdout = child.stdout.take().map(BufReader::new);
    let forward = if this.stdout_debug {
        let prefix = if let Some(prefix) = &this.stdout_debug_line_prefix {
            prefix.clone()
        } else {
            let program_name = this.program.to_string_lossy();
            let child_id = child.id().map(|id| id.to_string()).unwrap_or_default();
            owo_colors::OwoColorize::color(
                &format!("{program_name} {child_id} | "),
                next_terminal_color(),
            )
            .to_string()
        };
        Some((tokio::io::stdout(), prefix))
    } else {
        None
    };
    Ok(CommandRunner {
        command: this,
        child_process: Some(child),
        stdout,
        forward,
        line_buf: Vec::new(),
        status: None,
    })
}

impl CommandRunner {
    /// The command this runner was started with
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Returns the exit status once the process has been observed to complete
    pub fn status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Returns the next stdout line without its line terminator, as soon as
    /// the child process produces it. Invalid UTF-8 is replaced with U+FFFD.
    ///
    /// After stdout closes the child is waited on. `Ok(None)` is returned if
    /// it exited successfully, otherwise `FlowError::ProcessFailure` with the
    /// exit code is returned. Every call after that returns `Ok(None)`.
    pub async fn next_line(&mut self) -> Result<Option<String>, FlowError> {
        if let Some(stdout) = self.stdout.as_mut() {
            self.line_buf.clear();
            let bytes_read = stdout
                .read_until(b'\n', &mut self.line_buf)
                .await
                .map_err(|e| {
                    FlowError::io(format!("failed to read stdout of `{}`", self.command), e)
                })?;
            if bytes_read != 0 {
                if self.line_buf.last() == Some(&b'\n') {
                    self.line_buf.pop();
                    if self.line_buf.last() == Some(&b'\r') {
                        self.line_buf.pop();
                    }
                }
                let line = bstr::ByteSlice::to_str_lossy(self.line_buf.as_slice()).into_owned();
                if self.line_buf.capacity() > LINE_BUF_SHRINK {
                    self.line_buf.shrink_to_fit();
                }
                self.forward_line(&line).await?;
                return Ok(Some(line))
            }
            self.stdout = None;
        }
        if let Some(mut child) = self.child_process.take() {
            let status = child.wait().await.map_err(|e| {
                FlowError::io(format!("failed when waiting on `{}`", self.command), e)
            })?;
            self.status = Some(status);
            if !status.success() {
                return Err(FlowError::ProcessFailure {
                    command: self.command.get_unified_command(),
                    code: status.code(),
                })
            }
        }
        Ok(None)
    }

    async fn forward_line(&mut self, line: &str) -> Result<(), FlowError> {
        if let Some((ref mut std_forward, ref prefix)) = self.forward {
            // the prefix is written together with the line so that concurrent writers
            // to the terminal do not split them
            let mut out = String::with_capacity(prefix.len() + line.len() + 1);
            out.push_str(prefix);
            out.push_str(line);
            out.push('\n');
            std_forward
                .write_all(out.as_bytes())
                .await
                .map_err(|e| FlowError::io("failed to forward command stdout", e))?;
            std_forward
                .flush()
                .await
                .map_err(|e| FlowError::io("failed to flush forwarded stdout", e))?;
        }
        Ok(())
    }

    /// Drains the remaining lines (still forwarding them if debug is set) and
    /// returns the `ProcessResult` with the given previously `recorded` lines.
    pub async fn wait_with_output(
        mut self,
        recorded: Vec<String>,
    ) -> Result<ProcessResult, FlowError> {
        let mut lines = recorded;
        let recording = self.command.stdout_recording;
        while let Some(line) = self.next_line().await? {
            if recording {
                lines.push(line);
            }
        }
        let status = self.status.ok_or_else(|| {
            FlowError::io(
                format!("`{}` finished without an exit status", self.command),
                io::Error::other("missing exit status"),
            )
        })?;
        Ok(ProcessResult {
            command: std::mem::take(&mut self.command),
            status,
            lines,
        })
    }
}
