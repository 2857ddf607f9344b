//! Build driver: compiles the generated sources into the driver executable.
use enzyme_core::{EngineConfig, EngineError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::group::{isolate, GroupGuard};

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub executable: PathBuf,
    /// Compiler output, warnings included.
    pub diagnostics: String,
    pub elapsed: Duration,
}

/// Compiler arguments for `main_file`, linking into `executable`.
pub fn compiler_args(config: &EngineConfig, executable: &Path, main_file: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    for flag in [&config.std, &config.opt_level] {
        if !flag.is_empty() {
            args.push(flag.into());
        }
    }
    args.extend(config.extra_flags.iter().map(OsString::from));
    args.push("-o".into());
    args.push(executable.as_os_str().to_owned());
    args.push(main_file.into());
    args.push("-lm".into());
    args
}

/// Runs the compiler in `dir` and checks both its exit status and that the
/// executable actually exists afterwards.
pub async fn build_program(config: &EngineConfig, dir: &Path, main_file: &str) -> Result<BuildOutput> {
    let executable = dir.join(config.executable_file_name());
    let args = compiler_args(config, &executable, main_file);
    let start = Instant::now();

    tracing::debug!(compiler = %config.compiler, ?args, "compiling driver program");
    let mut command = Command::new(&config.compiler);
    command
        .args(&args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    isolate(&mut command);
    let run_failed = |e: std::io::Error| EngineError::Build {
        message: format!("failed to run compiler '{}': {}", config.compiler, e),
        diagnostics: String::new(),
    };
    let child = command.spawn().map_err(run_failed)?;
    let group = GroupGuard::new(&child);
    let output = child.wait_with_output().await;
    group.disarm();
    let output = output.map_err(run_failed)?;

    let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        diagnostics.push_str(&stdout);
    }

    if !output.status.success() {
        return Err(EngineError::Build {
            message: format!("'{}' exited with {}", config.compiler, output.status),
            diagnostics,
        });
    }
    if !executable.is_file() {
        return Err(EngineError::Build {
            message: format!(
                "'{}' reported success but {} was not produced",
                config.compiler,
                executable.display()
            ),
            diagnostics,
        });
    }
    if !diagnostics.trim().is_empty() {
        tracing::warn!(diagnostics = %diagnostics.trim(), "compiler emitted diagnostics");
    }

    let elapsed = start.elapsed();
    tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "driver program built");
    Ok(BuildOutput {
        executable,
        diagnostics,
        elapsed,
    })
}
