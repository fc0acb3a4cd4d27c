//! Bounded blocking execution of external tools.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{SourceError, SourceResult};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Run `program` with `args` and return its stdout.
///
/// Blocks for at most `timeout`, covering both the output and the exit of the
/// child; on expiry the child is killed and
/// [`SourceError::Timeout`] is returned. Whitespace-only output is reported as
/// [`SourceError::EmptyOutput`].
pub fn run_with_timeout(program: &Path, args: &[&str], timeout: Duration) -> SourceResult<String> {
    let label = program.display().to_string();
    let deadline = Instant::now() + timeout;
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| SourceError::Spawn {
            program: label.clone(),
            source,
        })?;

    let Some(mut stdout) = child.stdout.take() else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(SourceError::EmptyOutput { program: label });
    };

    // Drain stdout on a helper thread so a chatty child cannot block on a full pipe.
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let result = stdout.read_to_end(&mut buf).map(|_| buf);
        let _ = tx.send(result);
    });

    let output = match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(source)) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SourceError::io(program, source));
        }
        Err(_) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SourceError::Timeout {
                program: label,
                timeout,
            });
        }
    };
    // A child can close stdout and keep running.
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SourceError::Timeout {
                    program: label,
                    timeout,
                });
            }
            Ok(None) => std::thread::sleep(EXIT_POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                return Err(SourceError::io(program, source));
            }
        }
    }

    let text = String::from_utf8_lossy(&output).into_owned();
    if text.trim().is_empty() {
        return Err(SourceError::EmptyOutput { program: label });
    }
    Ok(text)
}
