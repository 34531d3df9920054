//! External program invocation with suppressed standard streams.

use std::ffi::OsString;
use std::io;
use std::process::{Command, ExitStatus, Stdio};

use log::trace;
use thiserror::Error;

/// Why a single program invocation did not succeed.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("`{0}` is not installed or not on PATH")]
    NotFound(String),

    #[error("`{program}` exited with {status}")]
    Failed { program: String, status: String },

    #[error("could not run `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Runs an external program to completion.
pub trait ProcessRunner {
    /// Runs `program` with `args`, blocking until it exits. Succeeds only on a
    /// success exit status.
    fn run(&self, program: &str, args: &[OsString]) -> Result<(), InvocationError>;
}

/// [`ProcessRunner`] backed by `std::process::Command`, stdio set to null.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<(), InvocationError> {
        trace!("Running {} {:?}", program, args);
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => InvocationError::NotFound(program.to_string()),
                _ => InvocationError::Io {
                    program: program.to_string(),
                    source: e,
                },
            })?;
        check_status(program, status)
    }
}

fn check_status(program: &str, status: ExitStatus) -> Result<(), InvocationError> {
    if status.success() {
        Ok(())
    } else {
        Err(InvocationError::Failed {
            program: program.to_string(),
            status: status.to_string(),
        })
    }
}
