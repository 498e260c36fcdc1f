use core::fmt;
use std::{
    ffi::{OsStr, OsString},
    fmt::{Debug, Display},
    path::{Path, PathBuf},
    process::ExitStatus,
};

use crate::{command_runner, CommandRunner, FlowError};

/// An OS command whose stdout is streamed line by line. This is
/// `tokio::process::Command` wrapped in the bits of configuration the
/// pipeline needs.
#[derive(Clone, Default)]
pub struct Command {
    /// The program to run.
    pub program: OsString,
    /// All the arguments that will be passed to the program
    pub args: Vec<OsString>,
    /// Environment variable mappings added to the inherited environment
    pub envs: Vec<(OsString, OsString)>,
    /// Working directory for the process
    pub cwd: Option<PathBuf>,
    /// If set, `run_to_completion` keeps every stdout line in the
    /// `ProcessResult`. Set this to `false` for commands with a lot of output
    /// that only needs to be seen, not kept.
    pub stdout_recording: bool,
    /// Forward stdout lines to the current process stdout as they arrive
    pub stdout_debug: bool,
    /// If the default stdout debug line prefix should be overridden
    pub stdout_debug_line_prefix: Option<String>,
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "Command {{ program: {:?},",
            self.get_unified_command()
        ))?;
        if !self.envs.is_empty() {
            f.write_fmt(format_args!(" envs: {:?},", self.envs))?;
        }
        if let Some(cwd) = &self.cwd {
            f.write_fmt(format_args!(" cwd: {cwd:?},"))?;
        }
        if !self.stdout_recording {
            f.write_fmt(format_args!(" recording: false,"))?;
        }
        if self.stdout_debug {
            f.write_fmt(format_args!(" debug: true,"))?;
        }
        f.write_fmt(format_args!(" }}"))
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_unified_command())
    }
}

impl Command {
    /// Creates a `Command` that only sets the `program` and `args` and leaves
    /// other things as their default values. `program_with_args` is separated
    /// by whitespace, the first part becomes the program, and the others
    /// are inserted as args.
    ///
    /// In case an argument has spaces, it should be added with [Command::arg]
    /// as an unbroken `&str`.
    pub fn new(program_with_args: impl AsRef<str>) -> Self {
        let mut parts = program_with_args.as_ref().split_whitespace();
        let program = parts.next().unwrap_or_default();
        Self {
            program: program.into(),
            args: parts.map(OsString::from).collect(),
            stdout_recording: true,
            ..Default::default()
        }
    }

    /// Creates a new `Command` for launching the `program` with no
    /// preprocessing, for program paths that may contain whitespace.
    pub fn new_os_str(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().into(),
            stdout_recording: true,
            ..Default::default()
        }
    }

    /// Adds an argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().into());
        self
    }

    /// Adds arguments to be passed to the program
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().into()));
        self
    }

    /// Sets `self.cwd`
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_owned());
        self
    }

    /// Adds an environment variable
    pub fn env(mut self, env_key: impl AsRef<OsStr>, env_val: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((env_key.as_ref().into(), env_val.as_ref().into()));
        self
    }

    /// Sets `stdout_debug`
    pub fn debug(mut self, stdout_debug: bool) -> Self {
        self.stdout_debug = stdout_debug;
        self
    }

    /// Sets `stdout_recording`
    pub fn recording(mut self, stdout_recording: bool) -> Self {
        self.stdout_recording = stdout_recording;
        self
    }

    /// Changes the debug line prefix for stdout lines. If `None`, then the
    /// default of the command name and process ID is used.
    pub fn stdout_debug_line_prefix(mut self, line_prefix: Option<String>) -> Self {
        self.stdout_debug_line_prefix = line_prefix;
        self
    }

    /// Gets the program and args interspersed with spaces
    pub fn get_unified_command(&self) -> String {
        let mut command = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            command.push(' ');
            command += arg.to_string_lossy().as_ref();
        }
        command
    }

    /// Spawns the command, returning a `CommandRunner` that yields stdout
    /// lines as they are produced
    pub async fn run(self) -> Result<CommandRunner, FlowError> {
        command_runner(self).await
    }

    /// Calls [Command::run] and drives the runner to the end. Fails with
    /// `FlowError::ProcessFailure` on an unsuccessful exit status, regardless
    /// of how many lines came before it.
    pub async fn run_to_completion(self) -> Result<ProcessResult, FlowError> {
        self.run().await?.wait_with_output(vec![]).await
    }
}

/// The result of a [Command] that ran to completion
#[derive(Debug, Clone)]
pub struct ProcessResult {
    // the command information is kept around for diagnostics
    pub command: Command,
    pub status: ExitStatus,
    /// The recorded stdout lines in production order, without terminators.
    /// Empty if recording was disabled.
    pub lines: Vec<String>,
}

impl ProcessResult {
    /// Returns if the command exited with a successful status
    pub fn successful(&self) -> bool {
        self.status.success()
    }

    /// Joins the recorded lines with newlines
    pub fn stdout(&self) -> String {
        self.lines.join("\n")
    }
}
