use std::{ffi::OsStr, path::Path};

use crate::Command;

// No `OsString`s for the container side arguments, they get sent to docker and
// are interpreted as paths inside a Linux container regardless of the host.

/// Builds the container engine invocations used by the pipeline. Only the
/// engine's command line interface is used, so anything CLI compatible with
/// docker (podman, or a test double) can be swapped in.
///
/// All commands forward their stdout live and do not record it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEngine {
    pub program: String,
}

impl ContainerEngine {
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_owned(),
        }
    }

    /// A `Command` running the engine with `args`
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new_os_str(&self.program)
            .args(args)
            .debug(true)
            .recording(false)
    }

    /// `docker build -t {tag} .` run inside `context_dir`
    pub fn build(&self, tag: &str, context_dir: impl AsRef<Path>) -> Command {
        self.command(["build", "-t", tag, "."])
            .cwd(context_dir)
    }

    /// `docker create -v {mount} --name {name} {tag}`, the throwaway anchor
    /// container that owns the lifetime of an anonymous volume at `mount`
    pub fn create_anchor(&self, name: &str, mount: &str, tag: &str) -> Command {
        self.command(["create", "-v", mount, "--name", name, tag])
    }

    /// `docker run --rm {run_args..} {tag} {container_args..}`
    pub fn run<I0, I1, S0, S1>(&self, run_args: I0, tag: &str, container_args: I1) -> Command
    where
        I0: IntoIterator<Item = S0>,
        S0: AsRef<OsStr>,
        I1: IntoIterator<Item = S1>,
        S1: AsRef<OsStr>,
    {
        self.command(["run", "--rm"])
            .args(run_args)
            .arg(tag)
            .args(container_args)
    }

    /// `docker cp {container}:{container_path} {host_path}`
    pub fn copy_out(&self, container: &str, container_path: &str, host_path: &Path) -> Command {
        let source = format!("{container}:{container_path}");
        self.command(["cp", source.as_str()]).arg(host_path)
    }

    /// `docker rm -v {container}`, also removing the anonymous volumes it owns
    pub fn remove_with_volumes(&self, container: &str) -> Command {
        self.command(["rm", "-v", container])
    }
}
