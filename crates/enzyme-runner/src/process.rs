//! Execution driver: one binary round trip with the driver executable.
//!
//! Stdin is fed while stdout and stderr are drained, all inside one task,
//! so a driver that starts writing before it has consumed its whole input
//! cannot deadlock the exchange. The child and its process group are
//! killed if the future is dropped before it finishes.
use enzyme_core::{Direction, EngineError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};

use crate::group::{isolate, GroupGuard};

const WRITE_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub stdout: Vec<u8>,
    /// Bytes the driver accepted on stdin.
    pub bytes_written: usize,
    pub elapsed: Duration,
}

/// Runs `executable` with `input` on stdin and returns its stdout.
///
/// Fails when the child cannot be spawned, exits non-zero or writes
/// anything to stderr; byte counts other than `expected_input` /
/// `expected_output` are protocol errors.
pub async fn run_program(
    executable: &Path,
    input: Vec<u8>,
    expected_input: usize,
    expected_output: usize,
) -> Result<ExecutionOutput> {
    if input.len() != expected_input {
        return Err(EngineError::Protocol {
            direction: Direction::Input,
            expected: expected_input,
            actual: input.len(),
        });
    }

    let start = Instant::now();
    let mut command = Command::new(executable);
    if let Some(dir) = executable.parent() {
        command.current_dir(dir);
    }
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    isolate(&mut command);
    let mut child = command.spawn().map_err(|e| {
        EngineError::execution(format!("failed to spawn {}: {}", executable.display(), e), "")
    })?;
    let group = GroupGuard::new(&child);

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| EngineError::execution("driver stdin was not captured", ""))?;

    let (written, output) = tokio::join!(feed_stdin(stdin, input), child.wait_with_output());
    group.disarm();
    let output = output
        .map_err(|e| EngineError::execution(format!("failed to collect driver output: {}", e), ""))?;
    let elapsed = start.elapsed();

    let diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(EngineError::execution(
            format!("driver exited with {}", output.status),
            diagnostics,
        ));
    }
    if !output.stderr.is_empty() {
        return Err(EngineError::execution(
            format!("driver wrote {} bytes to stderr", output.stderr.len()),
            diagnostics,
        ));
    }

    let (bytes_written, write_result) = written;
    if let Err(e) = write_result {
        tracing::warn!(error = %e, bytes_written, "driver stopped reading stdin");
    }
    if bytes_written != expected_input {
        return Err(EngineError::Protocol {
            direction: Direction::Input,
            expected: expected_input,
            actual: bytes_written,
        });
    }
    if output.stdout.len() != expected_output {
        return Err(EngineError::Protocol {
            direction: Direction::Output,
            expected: expected_output,
            actual: output.stdout.len(),
        });
    }

    tracing::info!(
        elapsed_ms = elapsed.as_millis() as u64,
        bytes_written,
        bytes_read = output.stdout.len(),
        "driver program finished"
    );
    Ok(ExecutionOutput {
        stdout: output.stdout,
        bytes_written,
        elapsed,
    })
}

// Writes in chunks so a driver that stops reading early still yields an
// accurate count of accepted bytes. Closes stdin on return.
async fn feed_stdin(mut stdin: ChildStdin, input: Vec<u8>) -> (usize, std::io::Result<()>) {
    let mut written = 0;
    for chunk in input.chunks(WRITE_CHUNK) {
        if let Err(e) = stdin.write_all(chunk).await {
            return (written, Err(e));
        }
        written += chunk.len();
    }
    let result = stdin.shutdown().await;
    (written, result)
}
