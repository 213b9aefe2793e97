//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::filters::FilterGraph;

/// Read size for the diagnostic stream.
const CHUNK_SIZE: usize = 8 * 1024;

/// One FFmpeg input with its positional options.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegInput {
    source: String,
    /// Arguments placed right before `-i`
    before: Vec<String>,
    /// Arguments placed right after the input source
    after: Vec<String>,
}

impl FfmpegInput {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Seek before decoding (`-ss` ahead of `-i`).
    pub fn seek(mut self, seconds: f64) -> Self {
        self.before.push("-ss".to_string());
        self.before.push(seconds.to_string());
        self
    }

    /// Stop position (`-to` ahead of `-i`, so it binds to this input).
    pub fn until(mut self, seconds: f64) -> Self {
        self.before.push("-to".to_string());
        self.before.push(seconds.to_string());
        self
    }

    /// Limit duration (`-t` right after the input).
    pub fn duration(mut self, seconds: f64) -> Self {
        self.after.push("-t".to_string());
        self.after.push(seconds.to_string());
        self
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<FfmpegInput>,
    output: PathBuf,
    /// Output arguments (after all inputs)
    output_args: Vec<String>,
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    pub fn input(mut self, input: FfmpegInput) -> Self {
        self.inputs.push(input);
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, graph: &FilterGraph) -> Self {
        self.output_arg("-filter_complex").output_arg(graph.to_string())
    }

    /// Map a labeled stream to the output.
    pub fn map(self, label: &str) -> Self {
        self.output_arg("-map").output_arg(format!("[{}]", label))
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set x264 preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Set target video bitrate.
    pub fn video_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:v").output_arg(bitrate)
    }

    /// Set pixel format.
    pub fn pix_fmt(self, fmt: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(fmt)
    }

    /// Set container movflags.
    pub fn movflags(self, flags: impl Into<String>) -> Self {
        self.output_arg("-movflags").output_arg(flags)
    }

    pub fn inputs(&self) -> &[FfmpegInput] {
        &self.inputs
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        for input in &self.inputs {
            args.extend(input.before.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
            args.extend(input.after.iter().cloned());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// How a finished process exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an FFmpeg argument vector.
///
/// Diagnostic output is forwarded chunk by chunk, in arrival order, over
/// `diagnostics`. A non-zero exit is reported through [`ExitOutcome`], not as
/// an error; errors mean the process could not be run or waited on.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        args: Vec<String>,
        diagnostics: mpsc::UnboundedSender<String>,
    ) -> MediaResult<ExitOutcome>;
}

/// Runner for the FFmpeg binary, spawned without a shell.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    binary: String,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegRunner {
    /// Create a runner for `binary` (a name on PATH or a path).
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout_secs: None,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Wait for child process with optional timeout.
    async fn wait_for_exit(&self, child: &mut Child) -> MediaResult<ExitOutcome> {
        let status = match self.timeout_secs {
            Some(timeout_secs) => {
                match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await {
                    Ok(result) => result?,
                    Err(_) => {
                        warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                        let _ = child.kill().await;
                        return Err(MediaError::Timeout(timeout_secs));
                    }
                }
            }
            None => child.wait().await?,
        };

        Ok(ExitOutcome {
            code: status.code(),
        })
    }
}

#[async_trait]
impl ProcessRunner for FfmpegRunner {
    async fn run(
        &self,
        args: Vec<String>,
        diagnostics: mpsc::UnboundedSender<String>,
    ) -> MediaResult<ExitOutcome> {
        let binary = check_ffmpeg(&self.binary)?;
        debug!("Running FFmpeg: {} {}", binary.display(), args.join(" "));

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;

        let reader_handle = tokio::spawn(forward_chunks(stderr, diagnostics));

        let result = self.wait_for_exit(&mut child).await;

        // Drain whatever the process wrote before exiting
        let _ = reader_handle.await;

        result
    }
}

/// Forward a byte stream as UTF-8 text chunks.
///
/// A multi-byte sequence split across reads is held back until complete.
/// Keeps draining after the receiver is gone so the child never blocks on a
/// full pipe.
async fn forward_chunks<R>(mut reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to read FFmpeg stderr: {}", e);
                break;
            }
        };
        pending.extend_from_slice(&buf[..n]);

        let split = match std::str::from_utf8(&pending) {
            Ok(_) => pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => pending.len(),
        };
        if split == 0 {
            continue;
        }
        let rest = pending.split_off(split);
        let chunk = String::from_utf8_lossy(&pending).into_owned();
        pending = rest;
        let _ = tx.send(chunk);
    }

    if !pending.is_empty() {
        let _ = tx.send(String::from_utf8_lossy(&pending).into_owned());
    }
}

/// Run to completion, collecting all diagnostic output.
pub async fn run_collecting(
    runner: &dyn ProcessRunner,
    args: Vec<String>,
) -> MediaResult<(ExitOutcome, String)> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = runner.run(args, tx).await?;

    let mut output = String::new();
    while let Ok(chunk) = rx.try_recv() {
        output.push_str(&chunk);
    }
    Ok((outcome, output))
}

/// Whether a finished render left its output file behind.
///
/// A render succeeds only when FFmpeg exits 0 and this holds.
pub async fn output_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg(binary: &str) -> MediaResult<PathBuf> {
    which::which(binary).map_err(|_| MediaError::FfmpegNotFound(binary.to_string()))
}
