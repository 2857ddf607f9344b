//! Process groups for spawned tools.
//!
//! `kill_on_drop` only reaches the direct child. A compiler driver forks
//! `cc1`, `as` and `ld`, so every tool is spawned as the leader of its own
//! process group and the whole group is killed when a call is abandoned.
use tokio::process::{Child, Command};

/// Makes the spawned child the leader of a new process group.
pub(crate) fn isolate(command: &mut Command) {
    #[cfg(unix)]
    command.process_group(0);
    #[cfg(not(unix))]
    let _ = command;
}

/// Kills the child's process group on drop unless the child was waited for.
#[derive(Debug)]
pub(crate) struct GroupGuard {
    pgid: Option<i32>,
}

impl GroupGuard {
    /// Guards the group led by `child`, which must come from an isolated
    /// command.
    pub(crate) fn new(child: &Child) -> Self {
        Self {
            pgid: child.id().and_then(|pid| i32::try_from(pid).ok()),
        }
    }

    /// The leader has been reaped; leave the group alone.
    pub(crate) fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

#[cfg(unix)]
fn kill_group(pgid: i32) {
    // SAFETY: killpg takes plain integers and touches no memory of ours.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc == 0 {
        tracing::debug!(pgid, "killed abandoned process group");
    } else {
        tracing::debug!(pgid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: i32) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};

    fn alive(pid: i32) -> bool {
        // SAFETY: signal 0 only checks for existence.
        unsafe { libc::kill(pid, 0) == 0 }
    }

    #[tokio::test]
    async fn test_dropped_guard_kills_grandchildren() {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg("sleep 30 & echo $!; wait")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true);
        isolate(&mut command);
        let mut child = command.spawn().unwrap();
        let guard = GroupGuard::new(&child);

        let mut stdout = BufReader::new(child.stdout.take().unwrap());
        let mut line = String::new();
        stdout.read_line(&mut line).await.unwrap();
        let grandchild: i32 = line.trim().parse().unwrap();
        assert!(alive(grandchild));

        drop(guard);
        drop(child);

        let mut gone = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            // The orphan is reaped by init once killed; a zombie still
            // answers signal 0, so also accept a zombie state.
            if !alive(grandchild) || is_zombie(grandchild) {
                gone = true;
                break;
            }
        }
        assert!(gone, "sleep {} survived the group kill", grandchild);
    }

    #[tokio::test]
    async fn test_disarmed_guard_leaves_group() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("exit 0");
        isolate(&mut command);
        let mut child = command.spawn().unwrap();
        let guard = GroupGuard::new(&child);
        assert!(guard.pgid.is_some());

        assert!(child.wait().await.unwrap().success());
        guard.disarm();
    }

    fn is_zombie(pid: i32) -> bool {
        std::fs::read_to_string(format!("/proc/{}/stat", pid))
            .map(|stat| {
                stat.rsplit_once(')')
                    .map(|(_, rest)| rest.trim_start().starts_with('Z'))
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }
}
