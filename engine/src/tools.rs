//! External program invocation.
//!
//! The archiver, the cipher and the notifier are separate binaries. They are
//! launched through [`ToolRunner`] so the engine can be exercised without
//! them installed.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use crate::error::EngineError;

/// A single external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    /// Bytes written to the program's stdin; stdin is closed when `None`
    pub stdin: Option<Vec<u8>>,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Invocation {
            program: program.to_string(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: Vec<u8>) -> Self {
        self.stdin = Some(input);
        self
    }
}

/// Exit status of a finished program; `code` is `None` when killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolExit {
    pub code: Option<i32>,
}

impl ToolExit {
    pub const SUCCESS: ToolExit = ToolExit { code: Some(0) };

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs to completion. No timeout is applied.
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolExit>;
}

/// Runs programs with `std::process::Command`, inheriting stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolExit> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        command.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = command.spawn()?;
        let fed = match (&invocation.stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => pipe.write_all(input),
            _ => Ok(()),
        };
        // The pipe was dropped with the match arm, so stdin is closed here.
        let status = child.wait()?;
        if let Err(e) = fed {
            if status.success() {
                return Err(e);
            }
            tracing::debug!(program = %invocation.program, error = %e, "Program exited before reading its input");
        }
        Ok(ToolExit {
            code: status.code(),
        })
    }
}

/// Run an invocation and turn launch failures and unsuccessful exits into errors.
pub fn run_checked(runner: &dyn ToolRunner, invocation: &Invocation) -> Result<(), EngineError> {
    tracing::debug!(program = %invocation.program, args = ?invocation.args, "Running external tool");
    let exit = runner
        .run(invocation)
        .map_err(|source| EngineError::ToolLaunchFailed {
            program: invocation.program.clone(),
            source,
        })?;
    if exit.success() {
        Ok(())
    } else {
        Err(EngineError::ToolFailed {
            program: invocation.program.clone(),
            code: exit.code,
        })
    }
}
