//! yt-dlp subprocess runner.
//!
//! Spawns yt-dlp, streams stdout line by line into the protocol parser and
//! hands progress events to the caller's hook. Stderr is collected on a
//! separate task so a chatty provider cannot block on a full pipe.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use vidgrab_core::ports::{FetchError, FetchOutcome, ProgressHook, ProviderEvent};

use super::protocol::{ByteAccumulator, parse_progress_line};

/// Stderr lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 20;

fn command(binary: &Path, args: &[OsString]) -> Command {
    let mut cmd = Command::new(binary);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env("PYTHONUNBUFFERED", "1")
        .kill_on_drop(true);
    cmd
}

fn spawn(binary: &Path, args: &[OsString]) -> Result<Child, FetchError> {
    command(binary, args).spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FetchError::ProviderUnavailable(format!("{} not found", binary.display()))
        } else {
            FetchError::ProcessFailed(format!("Failed to spawn: {e}"))
        }
    })
}

/// Read one line without its terminator, replacing invalid UTF-8.
///
/// yt-dlp echoes titles and filenames in the console encoding, so only the
/// ASCII progress lines are guaranteed to decode cleanly.
async fn next_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

fn collect_stderr<R>(stderr: R) -> JoinHandle<VecDeque<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();
        while let Ok(Some(line)) = next_line_lossy(&mut reader, &mut buf).await {
            trace!(target: "yt-dlp", "{line}");
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        tail
    })
}

/// Pick the most useful line of stderr for an error message.
///
/// yt-dlp prefixes fatal problems with `ERROR:`; the last such line wins.
fn failure_reason(tail: &VecDeque<String>, status: std::process::ExitStatus) -> String {
    tail.iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| tail.iter().rev().find(|l| !l.trim().is_empty()))
        .map_or_else(
            || format!("exited with status {status}"),
            |l| l.trim_start_matches("ERROR:").trim().to_string(),
        )
}

async fn stderr_tail(task: JoinHandle<VecDeque<String>>) -> VecDeque<String> {
    task.await.unwrap_or_default()
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Failed to kill yt-dlp (already exited?)");
    }
}

/// Run yt-dlp to completion and return its stdout.
pub async fn run_to_string(
    binary: &Path,
    args: &[OsString],
    cancel: &CancellationToken,
) -> Result<String, FetchError> {
    let mut child = spawn(binary, args)?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| FetchError::ProcessFailed("Missing stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| FetchError::ProcessFailed("Missing stderr".to_string()))?;
    let stderr_task = collect_stderr(stderr);

    let read_stdout = async move {
        let mut stdout = stdout;
        let mut buf = Vec::new();
        stdout
            .read_to_end(&mut buf)
            .await
            .map(|_| String::from_utf8_lossy(&buf).into_owned())
    };

    let output = tokio::select! {
        () = cancel.cancelled() => {
            kill(&mut child).await;
            return Err(FetchError::Cancelled);
        }
        output = read_stdout => output.map_err(|e| FetchError::Io(e.to_string()))?,
    };

    let status = child
        .wait()
        .await
        .map_err(|e| FetchError::ProcessFailed(e.to_string()))?;
    let tail = stderr_tail(stderr_task).await;
    if !status.success() {
        return Err(FetchError::ProcessFailed(failure_reason(&tail, status)));
    }
    Ok(output)
}

/// Run a download, feeding progress to `hook` until yt-dlp exits.
pub async fn run_with_progress(
    binary: &Path,
    args: &[OsString],
    hook: &mut ProgressHook<'_>,
    cancel: &CancellationToken,
) -> Result<FetchOutcome, FetchError> {
    let mut child = spawn(binary, args)?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| FetchError::ProcessFailed("Missing stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| FetchError::ProcessFailed("Missing stderr".to_string()))?;
    let stderr_task = collect_stderr(stderr);

    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    let mut bytes = ByteAccumulator::new();
    let mut last_filename = None;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                kill(&mut child).await;
                return Err(FetchError::Cancelled);
            }
            line = next_line_lossy(&mut reader, &mut buf) => {
                let line = line.map_err(|e| FetchError::Io(e.to_string()))?;
                let Some(line) = line else { break; };

                let parsed = match parse_progress_line(&line) {
                    Ok(Some(parsed)) => parsed,
                    Ok(None) => {
                        if !line.trim().is_empty() {
                            debug!(target: "yt-dlp", "{line}");
                        }
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "Unreadable progress line from yt-dlp");
                        continue;
                    }
                };

                let Some(event) = bytes.apply(parsed) else { continue; };
                if let ProviderEvent::Finished { filename: Some(name) } = &event {
                    last_filename = Some(name.clone());
                }
                if let Err(abort) = hook(&event) {
                    debug!(reason = %abort, "Progress hook stopped the transfer");
                    kill(&mut child).await;
                    return Err(FetchError::Aborted(abort));
                }
            }
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| FetchError::ProcessFailed(e.to_string()))?;
    let tail = stderr_tail(stderr_task).await;
    if !status.success() {
        return Err(FetchError::ProcessFailed(failure_reason(&tail, status)));
    }

    Ok(FetchOutcome {
        bytes_transferred: bytes.total(),
        filename: last_filename,
    })
}
