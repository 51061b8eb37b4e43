//! Command lines for the computation child

use jayhawk_config::ComputationCommand;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{SupervisorError, SupervisorResult};

/// Description of a child process to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl ChildCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build the computation command from configuration. Without an explicit
    /// program the running executable is re-invoked.
    pub fn from_config(config: &ComputationCommand) -> SupervisorResult<Self> {
        let program = match &config.program {
            Some(program) => PathBuf::from(program),
            None => std::env::current_exe().map_err(|e| {
                SupervisorError::InvalidCommand(format!("Failed to get current exe: {}", e))
            })?,
        };

        Ok(Self::new(program).args(config.args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Human-readable program name for logs and errors
    pub fn display_program(&self) -> String {
        self.program.display().to_string()
    }

    /// Build the tokio command. The child leads its own process group so the
    /// whole group can be signalled, and it is killed if the handle is
    /// dropped without being reaped.
    ///
    /// stdout is inherited: the rows a computation prints land on the
    /// worker's stdout and are not captured by the supervisor.
    pub(crate) fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }
}
