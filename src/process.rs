//! Blocking wrapper around the external command line tools (`security`, `bw`).

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Failure of a single tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("cannot execute {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot talk to {program}: {source}")]
    Io {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {code}: {stderr}")]
    Failed {
        program: PathBuf,
        code: String,
        stderr: String,
    },
}

/// Run `program args..`, optionally feeding `input` on stdin, and return
/// stdout. A non-zero exit status is an error carrying stderr.
pub fn run_tool(program: &Path, args: &[&str], input: Option<&[u8]>) -> Result<String, ToolError> {
    run_tool_with_env(program, args, &[], input)
}

/// Like [`run_tool`], with extra environment variables for the child.
/// Secrets go through `envs` rather than `args` so they stay out of the
/// process list and the logs.
pub fn run_tool_with_env(
    program: &Path,
    args: &[&str],
    envs: &[(&str, &str)],
    input: Option<&[u8]>,
) -> Result<String, ToolError> {
    debug!("Running {} {}", program.display(), args.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args)
        .envs(envs.iter().copied())
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
        program: program.to_path_buf(),
        source,
    })?;

    // Stdin is written in full before stdout is read, so input must stay
    // below the pipe buffer; only `bw create` items (a few hundred bytes) go
    // through here.
    if let (Some(bytes), Some(mut stdin)) = (input, child.stdin.take()) {
        // The tool may exit before draining stdin; its exit status decides.
        match stdin.write_all(bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            Err(source) => {
                return Err(ToolError::Io {
                    program: program.to_path_buf(),
                    source,
                })
            }
        }
    }

    let output = child.wait_with_output().map_err(|source| ToolError::Io {
        program: program.to_path_buf(),
        source,
    })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_path_buf(),
            code: output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
