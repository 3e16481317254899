use std::fmt::Debug;
use std::process::Command;
use thiserror::Error;
use tracing::Level;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to run `{cmdline}`: {source}")]
    Spawn {
        cmdline: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{cmdline}` exited with {}: {stderr}", exit_reason(.code))]
    ExitStatus {
        cmdline: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("`{cmdline}` produced non utf-8 output: {source}")]
    Utf8 {
        cmdline: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

fn exit_reason(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {}", c),
        None => "signal".to_string(),
    }
}

/// Runs an external program and hands back its standard output.
///
/// Implementations must not trim the output and must not retry.
pub trait Executor: Debug + Send + Sync {
    fn execute(&self, program: &str, args: &[&str]) -> Result<String, Error>;
}

/// Executes programs as child processes of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct System {}

impl System {
    pub fn new() -> Self {
        System {}
    }
}

pub fn cmdline(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program];
    parts.extend_from_slice(args);
    parts.join(" ")
}

impl Executor for System {
    #[tracing::instrument(level = Level::DEBUG)]
    fn execute(&self, program: &str, args: &[&str]) -> Result<String, Error> {
        let cmdline = cmdline(program, args);
        let output = Command::new(program).args(args).output().map_err(|source| Error::Spawn {
            cmdline: cmdline.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(%cmdline, status = ?output.status, %stderr, "command failed");
            return Err(Error::ExitStatus {
                cmdline,
                code: output.status.code(),
                stderr,
            });
        }

        String::from_utf8(output.stdout).map_err(|source| Error::Utf8 { cmdline, source })
    }
}
