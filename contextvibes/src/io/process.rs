//! Helpers for running child processes that honor a [`CancelToken`].

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::io::cancel::CancelToken;

/// How often a waiting parent re-checks the cancellation token.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a child process ended.
#[derive(Debug)]
pub enum Finished {
    Exited(ExitStatus),
    Canceled,
}

/// Buffered child output.
#[derive(Debug)]
pub struct CapturedOutput {
    pub finished: Finished,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Run a command with the parent's stdio attached.
pub fn run_inherited(mut cmd: Command, cancel: &CancelToken) -> io::Result<Finished> {
    if cancel.is_canceled() {
        return Ok(Finished::Canceled);
    }
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    debug!("spawning child process (inherited stdio)");
    let _running = cancel.child_guard();
    let mut child = cmd.spawn()?;
    wait_or_cancel(&mut child, cancel)
}

/// Run a command and buffer stdout/stderr without risking pipe deadlocks.
///
/// Both pipes are drained on reader threads while the parent waits.
pub fn run_captured(mut cmd: Command, cancel: &CancelToken) -> io::Result<CapturedOutput> {
    if cancel.is_canceled() {
        return Ok(CapturedOutput {
            finished: Finished::Canceled,
            stdout: Vec::new(),
            stderr: Vec::new(),
        });
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process (captured stdio)");
    let _running = cancel.child_guard();
    let mut child = cmd.spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream(stdout));
    let stderr_handle = thread::spawn(move || read_stream(stderr));

    let finished = wait_or_cancel(&mut child, cancel)?;

    let stdout = join_output(stdout_handle)?;
    let stderr = join_output(stderr_handle)?;

    Ok(CapturedOutput {
        finished,
        stdout,
        stderr,
    })
}

fn wait_or_cancel(child: &mut Child, cancel: &CancelToken) -> io::Result<Finished> {
    loop {
        if let Some(status) = child.wait_timeout(POLL_INTERVAL)? {
            debug!(exit_code = ?status.code(), "child finished");
            return Ok(Finished::Exited(status));
        }
        if cancel.is_canceled() {
            warn!(pid = child.id(), "cancellation requested, killing child");
            if let Err(err) = child.kill() {
                warn!(err = %err, "failed to kill child");
            }
            child.wait()?;
            return Ok(Finished::Canceled);
        }
    }
}

fn join_output(handle: thread::JoinHandle<io::Result<Vec<u8>>>) -> io::Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(io::Error::other("output reader thread panicked")),
    }
}

fn read_stream<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_both_streams() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err 1>&2; exit 3"]);
        let output = run_captured(cmd, &CancelToken::new()).expect("run");
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
        match output.finished {
            Finished::Exited(status) => assert_eq!(status.code(), Some(3)),
            Finished::Canceled => panic!("unexpected cancel"),
        }
    }

    #[test]
    fn pre_canceled_token_never_spawns() {
        let token = CancelToken::new();
        token.cancel();
        let cmd = Command::new("definitely-not-a-real-binary-xyz");
        let output = run_captured(cmd, &token).expect("canceled run");
        assert!(matches!(output.finished, Finished::Canceled));
    }

    #[test]
    fn cancel_kills_running_child() {
        let token = CancelToken::new();
        let trip = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            trip.cancel();
        });
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exec sleep 10"]);
        let output = run_captured(cmd, &token).expect("run");
        handle.join().expect("join");
        assert!(matches!(output.finished, Finished::Canceled));
    }

    #[test]
    fn child_is_counted_only_while_waited_on() {
        let token = CancelToken::new();
        let watcher = token.clone();
        let handle = thread::spawn(move || {
            for _ in 0..100 {
                if watcher.has_running_child() {
                    return true;
                }
                thread::sleep(Duration::from_millis(10));
            }
            false
        });
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 0.5"]);
        run_captured(cmd, &token).expect("run");
        assert!(handle.join().expect("join"), "child never observed as running");
        assert!(!token.has_running_child());
    }
}
