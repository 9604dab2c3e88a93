//! External process execution with captured output

use std::io;
use std::process::{Command, Stdio};

/// Bytes of combined output preserved in an error
const OUTPUT_TAIL: usize = 2048;

/// Failure of an external tool invocation.
#[derive(Debug)]
pub enum CommandError {
    /// The binary could not be started (missing, not executable).
    Spawn { program: String, source: io::Error },
    /// The process ran and exited non-zero.
    Exit {
        program: String,
        code: Option<i32>,
        output_tail: String,
    },
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn { program, source } => write!(f, "cannot run {program}: {source}"),
            Self::Exit {
                program,
                code: Some(code),
                output_tail,
            } => write!(f, "{program} exited with code {code}: {output_tail}"),
            Self::Exit {
                program,
                code: None,
                output_tail,
            } => write!(f, "{program} killed by signal: {output_tail}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Run a command to completion, capturing stdout and stderr.
///
/// A non-zero exit becomes an error carrying the tail of the combined
/// output, so tool diagnostics survive into the log line without keeping
/// arbitrarily large captures around.
pub fn run_captured(cmd: &mut Command) -> Result<(), CommandError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }

    let mut combined = output.stdout;
    combined.extend_from_slice(&output.stderr);
    Err(CommandError::Exit {
        program,
        code: output.status.code(),
        output_tail: tail(&combined),
    })
}

/// Last `OUTPUT_TAIL` bytes of `bytes` as lossy UTF-8, trimmed.
fn tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.len() <= OUTPUT_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - OUTPUT_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("... {}", &text[start..])
}
