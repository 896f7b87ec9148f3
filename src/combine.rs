use crate::error::BookError;
use crate::progress::{ProgressDisplay, Projector, parse_progress_line};
use anyhow::{Context, Result};
use crossbeam_channel::unbounded;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Resolves an external tool, either a bare name looked up in `PATH` or a path.
pub fn ensure_tool(binary: &Path) -> Result<PathBuf> {
    which::which(binary).with_context(|| format!("`{}` not found in PATH", binary.display()))
}

#[derive(Debug, Clone)]
pub struct CombineRequest {
    pub ffmpeg: PathBuf,
    pub file_list: PathBuf,
    pub metadata: PathBuf,
    /// Target audio bitrate such as `32k`; `None` copies the streams as-is.
    pub bitrate: Option<String>,
    pub output: PathBuf,
}

impl CombineRequest {
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-y",
            "-hide_banner",
            "-loglevel",
            "warning",
            "-nostats",
            "-progress",
            "-",
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(self.file_list.clone().into_os_string());
        args.push("-i".into());
        args.push(self.metadata.clone().into_os_string());
        args.push("-map_metadata".into());
        args.push("1".into());
        match &self.bitrate {
            Some(bitrate) => {
                args.push("-b:a".into());
                args.push(bitrate.into());
            }
            None => {
                args.push("-c:a".into());
                args.push("copy".into());
            }
        }
        args.push(self.output.clone().into_os_string());
        args
    }
}

/// Runs ffmpeg, turning its progress stream into display updates.
///
/// Progress lines are read on a separate thread and handed over one sample at
/// a time; stderr is drained on another so the child never stalls on a full
/// pipe. Returns the wall-clock time the combine took.
pub fn combine(request: &CombineRequest, total_us: u64) -> Result<Duration> {
    tracing::info!(
        output = %request.output.display(),
        bitrate = request.bitrate.as_deref().unwrap_or("copy"),
        "starting ffmpeg"
    );
    let started = Instant::now();
    let mut child = Command::new(&request.ffmpeg)
        .args(request.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn {}", request.ffmpeg.display()))?;

    let stdout = child.stdout.take().context("open ffmpeg stdout")?;
    let stderr = child.stderr.take().context("open ffmpeg stderr")?;

    let (sample_tx, sample_rx) = unbounded();
    let reader = thread::spawn(move || -> Result<()> {
        for line in BufReader::new(stdout).lines() {
            let line = line.context("read ffmpeg progress")?;
            if let Some(sample) = parse_progress_line(&line) {
                if sample_tx.send(sample).is_err() {
                    break;
                }
            }
        }
        Ok(())
    });
    let diagnostics = thread::spawn(move || {
        let mut text = String::new();
        let _ = BufReader::new(stderr).read_to_string(&mut text);
        text
    });

    let projector = Projector::new(total_us, started);
    let display = ProgressDisplay::new(total_us);
    for sample in sample_rx {
        let projection = projector.observe(sample);
        display.update(sample, &projection);
    }

    let status = child.wait().context("wait for ffmpeg")?;
    let read_result = reader
        .join()
        .unwrap_or_else(|_| Err(anyhow::anyhow!("progress reader panicked")));
    let stderr = diagnostics.join().unwrap_or_default();

    if !status.success() {
        display.abandon();
        return Err(BookError::Combine { status, stderr }.into());
    }
    read_result?;
    display.finish();
    if !stderr.trim().is_empty() {
        tracing::warn!(diagnostics = %stderr.trim(), "ffmpeg reported warnings");
    }
    let elapsed = started.elapsed();
    tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "ffmpeg finished");
    Ok(elapsed)
}
