//! Pre-build tasks.
//!
//! A [`PreBuildTask`] runs once before pages are written. The build hands
//! each task to a [`Scheduler`], which either runs it on the calling thread
//! or offloads it to a background thread; either way the build gets back a
//! [`TaskHandle`] and joins it before passthrough copy.
//!
//! The one task shipped here is [`CssMinifyTask`]: run an external CSS
//! minifier over a stylesheet, skipped when the minified output is already
//! newer than its source. Wrap it in [`OnceTask`] to make repeated runs
//! within a process return the first outcome.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("failed to start `{program}`: {message}")]
    Spawn { program: String, message: String },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("task `{0}` panicked")]
    Panicked(String),
}

impl From<std::io::Error> for TaskError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// What a task did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task did its work.
    Ran,
    /// Output was already up to date.
    Fresh,
    /// Nothing to do: the input does not exist.
    NoSource,
}

pub trait PreBuildTask: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self) -> Result<TaskOutcome, TaskError>;
}

/// Runs the wrapped task at most once; later calls return the first outcome.
pub struct OnceTask<T> {
    inner: T,
    outcome: OnceLock<Result<TaskOutcome, TaskError>>,
}

impl<T: PreBuildTask> OnceTask<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            outcome: OnceLock::new(),
        }
    }
}

impl<T: PreBuildTask> PreBuildTask for OnceTask<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn run(&self) -> Result<TaskOutcome, TaskError> {
        self.outcome.get_or_init(|| self.inner.run()).clone()
    }
}

/// Where a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheduler {
    /// On the calling thread, before `spawn` returns.
    #[default]
    Inline,
    /// On a dedicated thread; `join` waits for it.
    Background,
}

impl Scheduler {
    pub fn from_background_flag(background: bool) -> Self {
        if background {
            Self::Background
        } else {
            Self::Inline
        }
    }

    pub fn spawn(&self, task: Arc<dyn PreBuildTask>) -> TaskHandle {
        let name = task.name().to_string();
        let state = match self {
            Scheduler::Inline => HandleState::Done(task.run()),
            Scheduler::Background => HandleState::Running(std::thread::spawn(move || task.run())),
        };
        TaskHandle { name, state }
    }
}

enum HandleState {
    Done(Result<TaskOutcome, TaskError>),
    Running(JoinHandle<Result<TaskOutcome, TaskError>>),
}

/// A scheduled task's eventual outcome.
pub struct TaskHandle {
    name: String,
    state: HandleState,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The outcome, if the task has already finished. Always `Some` for
    /// inline tasks.
    pub fn finished(&self) -> Option<&Result<TaskOutcome, TaskError>> {
        match &self.state {
            HandleState::Done(outcome) => Some(outcome),
            HandleState::Running(_) => None,
        }
    }

    /// Wait for the task and return its outcome.
    pub fn join(self) -> Result<TaskOutcome, TaskError> {
        match self.state {
            HandleState::Done(outcome) => outcome,
            HandleState::Running(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(TaskError::Panicked(self.name))),
        }
    }
}

/// `true` when `output` exists and is strictly newer than `source`.
pub fn is_fresh(source: &Path, output: &Path) -> std::io::Result<bool> {
    let output_meta = match std::fs::metadata(output) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let source_modified = std::fs::metadata(source)?.modified()?;
    Ok(output_meta.modified()? > source_modified)
}

/// Minify a stylesheet with an external tool.
///
/// `command[0]` is the program; `{input}` and `{output}` in any element are
/// replaced by the source and output paths. A command with no `{output}`
/// argument is taken to print the result: its stdout replaces the output
/// file on every run.
#[derive(Debug, Clone)]
pub struct CssMinifyTask {
    pub source: PathBuf,
    pub output: PathBuf,
    pub command: Vec<String>,
}

impl CssMinifyTask {
    fn writes_stdout(&self) -> bool {
        !self.command.iter().any(|arg| arg.contains("{output}"))
    }

    fn substituted(&self) -> Vec<String> {
        let input = self.source.to_string_lossy();
        let output = self.output.to_string_lossy();
        self.command
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

impl PreBuildTask for CssMinifyTask {
    fn name(&self) -> &str {
        "minify-css"
    }

    fn run(&self) -> Result<TaskOutcome, TaskError> {
        if !self.source.is_file() {
            debug!(source = %self.source.display(), "No stylesheet to minify");
            return Ok(TaskOutcome::NoSource);
        }
        if is_fresh(&self.source, &self.output)? {
            debug!(output = %self.output.display(), "Minified stylesheet is up to date");
            return Ok(TaskOutcome::Fresh);
        }
        if let Some(parent) = self.output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let argv = self.substituted();
        let Some((program, args)) = argv.split_first() else {
            return Err(TaskError::Spawn {
                program: String::new(),
                message: "empty command".to_string(),
            });
        };

        let result = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| TaskError::Spawn {
                program: program.clone(),
                message: e.to_string(),
            })?;

        if !result.status.success() {
            return Err(TaskError::Failed {
                program: program.clone(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        if self.writes_stdout() {
            write_replacing(&self.output, &result.stdout)?;
        }

        info!(
            source = %self.source.display(),
            output = %self.output.display(),
            "Minified stylesheet"
        );
        Ok(TaskOutcome::Ran)
    }
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
fn write_replacing(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
