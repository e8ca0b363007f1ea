// Running an external program with a deadline.
//
// The child is polled with `try_wait` until it exits or the limit passes, in
// which case it is killed and reaped. Stderr is drained on a helper thread so a
// chatty child cannot block on a full pipe while we poll; stdout is discarded.

use crate::error::RenderError;
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Exit status and captured stderr of a finished child.
#[derive(Debug)]
pub(crate) struct Finished {
    pub status: ExitStatus,
    pub stderr: String,
}

/// Spawn `command` and wait at most `limit` for it to exit.
pub(crate) fn run_with_timeout(
    mut command: Command,
    limit: Duration,
) -> Result<Finished, RenderError> {
    let program = command.get_program().to_string_lossy().into_owned();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    tracing::debug!(%program, args = ?command.get_args().collect::<Vec<_>>(), "spawning");
    let mut child = command.spawn().map_err(|source| RenderError::Spawn {
        program: program.clone(),
        source,
    })?;

    let drain = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() > limit {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(%program, limit_secs = limit.as_secs(), "killed after timeout");
            return Err(RenderError::Timeout { program, limit });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stderr = drain
        .and_then(|handle| handle.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).trim().to_string())
        .unwrap_or_default();
    tracing::debug!(%program, %status, elapsed_ms = start.elapsed().as_millis() as u64, "finished");
    Ok(Finished { status, stderr })
}

/// Like `run_with_timeout`, but a non-zero exit becomes `RenderError::Failed`.
pub(crate) fn run_checked(command: Command, limit: Duration) -> Result<(), RenderError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let finished = run_with_timeout(command, limit)?;
    if !finished.status.success() {
        return Err(RenderError::Failed {
            program,
            status: finished.status,
            stderr: finished.stderr,
        });
    }
    Ok(())
}
