use std::path::PathBuf;

/// The failures that the pipeline primitives can produce.
///
/// The primitives (`CommandRunner`, `ConfigStager`, `transfer`) return this
/// directly so that callers can match on what went wrong. The orchestration
/// routines stack context on top of it with `stacked_errors`.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A child process exited unsuccessfully. `code` is `None` if the process
    /// was terminated by a signal.
    #[error("command `{command}` failed with exit code {}", display_code(.code))]
    ProcessFailure { command: String, code: Option<i32> },
    /// The child process could not be started at all
    #[error("command `{command}` could not be spawned")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no such config file {0:?}")]
    ConfigMissing(PathBuf),
    /// The active config location is occupied and `--force` was not set
    #[error("a config file {0:?} exists already and would be overwritten, `--force` was not set")]
    OverwriteRefused(PathBuf),
    #[error("no such artifact file {0:?}")]
    ArtifactMissing(PathBuf),
    /// A Ctrl-C was observed between stages
    #[error("interrupted by Ctrl-C")]
    Interrupted,
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "<terminated by signal>".to_owned(),
    }
}

impl FlowError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the exit code if this is a `ProcessFailure`
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessFailure { code, .. } => *code,
            _ => None,
        }
    }
}
