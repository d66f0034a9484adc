use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::time::{Instant, timeout_at};

use super::{SandboxError, Termination};

/// Most bytes kept per stream; anything beyond is read and discarded
pub(super) const OUTPUT_LIMIT: usize = 8 << 20;

/// How long the pipes may stay open once the budget is spent and the group killed
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Everything observed about one supervised process
#[derive(Debug)]
pub(super) struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// From spawn until termination was observed, either way
    pub elapsed: Duration,
    pub termination: Termination,
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            Termination::Completed
        } else {
            Termination::NonZeroExit(status.code())
        }
    }
}

/// Runs `command` in `work_dir`, killing it once `budget` has elapsed
///
/// Stdout and stderr are drained concurrently with the wait so a chatty process
/// cannot block on a full pipe. When the main process ends, by itself or by the
/// timer, its whole process group is killed, so helpers it forked cannot keep the
/// pipes open. Draining is bounded too: pipes still open `DRAIN_GRACE` after the
/// deadline are abandoned and the run counts as timed out.
pub(super) async fn run_supervised(
    command: &[String],
    work_dir: &Path,
    stdin: Option<&str>,
    budget: Duration,
) -> Result<ProcessOutput, SandboxError> {
    let (program, args) = command.split_first().ok_or(SandboxError::EmptyCommand)?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(work_dir)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so a kill also takes down anything the program forked
    #[cfg(unix)]
    cmd.process_group(0);

    let start = Instant::now();
    let deadline = start + budget;
    let mut child = cmd.spawn().map_err(|source| SandboxError::Launch {
        program: program.clone(),
        source,
    })?;

    let stdin_pipe = child.stdin.take();
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let feed = async move {
        if let (Some(mut pipe), Some(input)) = (stdin_pipe, stdin) {
            // The program is free to exit without reading its input
            if let Err(e) = pipe.write_all(input.as_bytes()).await {
                log::debug!("Failed to write stdin: {e}");
            }
        }
    };

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let drain = async {
        tokio::try_join!(
            read_capped(stdout_pipe, &mut stdout_buf),
            read_capped(stderr_pipe, &mut stderr_buf)
        )
    };

    let (supervised, drained, _) = tokio::join!(
        supervise(&mut child, deadline, budget, start),
        timeout_at(deadline + DRAIN_GRACE, drain),
        timeout_at(deadline + DRAIN_GRACE, feed),
    );
    let (mut termination, mut elapsed) = supervised?;
    match drained {
        Ok(streams) => {
            streams?;
        }
        Err(_) => {
            log::warn!(
                "Output pipes of `{program}` still open {} ms past the budget, abandoning them",
                DRAIN_GRACE.as_millis()
            );
            termination = Termination::TimedOut;
            elapsed = start.elapsed();
        }
    }

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
        elapsed,
        termination,
    })
}

async fn supervise(
    child: &mut Child,
    deadline: Instant,
    budget: Duration,
    start: Instant,
) -> Result<(Termination, Duration), SandboxError> {
    // Taken before the wait: once reaped, the child no longer reports its pid
    let group = child.id();

    match timeout_at(deadline, child.wait()).await {
        Ok(status) => {
            let elapsed = start.elapsed();
            // Leftover helpers in the group would otherwise keep the pipes open
            kill_process_group(group);
            Ok((status?.into(), elapsed))
        }
        Err(_) => {
            // Not reaped yet, so the pid and its process group still belong to this run
            kill_process_group(group);
            if let Err(e) = child.start_kill() {
                log::debug!("start_kill after timeout failed: {e}");
            }
            child.wait().await?;
            let elapsed = start.elapsed();
            log::info!(
                "Process exceeded {} ms, killed after {} ms",
                budget.as_millis(),
                elapsed.as_millis()
            );
            Ok((Termination::TimedOut, elapsed))
        }
    }
}

#[cfg(unix)]
fn kill_process_group(group: Option<u32>) {
    if let Some(pid) = group {
        // SAFETY: plain kill(2) on the group this run's child leads.
        let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
        if rc != 0 {
            // ESRCH is the common case: the group was already empty
            log::debug!(
                "Failed to kill process group {pid}: {}",
                io::Error::last_os_error()
            );
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_group: Option<u32>) {}

/// Reads `stream` to its end, keeping at most `OUTPUT_LIMIT` bytes in `buf`
///
/// Data already read stays in `buf` if the future is dropped halfway.
async fn read_capped<R: AsyncRead + Unpin>(stream: Option<R>, buf: &mut Vec<u8>) -> io::Result<()> {
    let Some(mut stream) = stream else {
        return Ok(());
    };
    let mut chunk = [0u8; 8192];
    let mut discarded = 0usize;
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let keep = n.min(OUTPUT_LIMIT.saturating_sub(buf.len()));
        buf.extend_from_slice(&chunk[..keep]);
        discarded += n - keep;
    }
    if discarded > 0 {
        log::info!("Discarded {discarded} bytes of output past the {OUTPUT_LIMIT} byte limit");
    }
    Ok(())
}
