use std::ffi::OsStr;
use std::path::Path;
use std::process::{Child, Command as StdCommand, ExitStatus};

use crate::error::CommandError;

/// Thin builder over [`std::process::Command`] with typed failures.
#[derive(Debug)]
pub struct Command {
    inner:   StdCommand,
    program: String,
}

impl Command {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        let program = program.as_ref();
        Self {
            inner:   StdCommand::new(program),
            program: program.to_string_lossy().into_owned(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.inner.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.inner.current_dir(dir);
        self
    }

    pub fn program(&self) -> &str { &self.program }

    pub fn get_args(&self) -> impl Iterator<Item = &OsStr> { self.inner.get_args() }

    pub fn get_current_dir(&self) -> Option<&Path> { self.inner.get_current_dir() }

    pub fn spawn(&mut self) -> Result<Child, CommandError> {
        self.inner.spawn().map_err(|source| CommandError::Spawn {
            cmd: self.program.clone(),
            source,
        })
    }

    /// Spawns and waits; a non-zero exit is an error.
    pub fn run(&mut self) -> Result<(), CommandError> {
        let mut child = self.spawn()?;
        let status = child.wait().map_err(|source| CommandError::Wait {
            cmd: self.program.clone(),
            source,
        })?;
        self.check(status)
    }

    pub(crate) fn check(&self, status: ExitStatus) -> Result<(), CommandError> {
        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Exit {
                cmd: self.program.clone(),
                status,
            })
        }
    }
}
