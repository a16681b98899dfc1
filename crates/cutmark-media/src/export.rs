//! Cut pipeline: turns adjusted segments into FFmpeg invocations and runs them.
//!
//! Each segment is cut into its own part file, then the parts are joined with
//! the concat demuxer. Stages run one after another and can be cancelled
//! between polls.

use cutmark_core::{CutmarkError, Result, Segment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::source::null_output;

/// How often a running stage is polled for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long an interrupted stage may take to finish its output before it is killed.
const STOP_GRACE: Duration = Duration::from_secs(5);

// ── User arguments ──────────────────────────────────────────────

/// Output settings entered by the user as `key: value` lines.
///
/// Argument tokens starting with `#` are dropped.
///
/// ```text
/// out: result.mkv
/// out-args: -map 0 -c:v libx264 #-an
/// in-args: -hwaccel auto
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserArgs {
    pub output: Option<PathBuf>,
    pub out_args: Vec<String>,
    pub in_args: Vec<String>,
}

impl UserArgs {
    pub fn parse(text: &str) -> Self {
        let mut args = Self::default();
        for line in text.lines().map(str::trim) {
            if let Some(rest) = line.strip_prefix("out-args:") {
                args.out_args = split_args(rest);
            } else if let Some(rest) = line.strip_prefix("in-args:") {
                args.in_args = split_args(rest);
            } else if let Some(rest) = line.strip_prefix("out:") {
                let rest = rest.trim();
                if !rest.is_empty() {
                    args.output = Some(PathBuf::from(rest));
                }
            }
        }
        args
    }

    /// The output path, defaulting to `<stem>.cutmark<ext>` in the working directory.
    pub fn output_for(&self, input: &Path) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        match input.extension() {
            Some(ext) => PathBuf::from(format!("{}.cutmark.{}", stem, ext.to_string_lossy())),
            None => PathBuf::from(format!("{stem}.cutmark")),
        }
    }
}

fn split_args(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|arg| !arg.starts_with('#'))
        .map(str::to_string)
        .collect()
}

// ── Commands ────────────────────────────────────────────────────

/// Whether parts are stream-copied or re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodeMode {
    /// Lossless stream copy, cuts land on packet boundaries.
    #[default]
    Copy,
    /// Single-pass re-encode.
    Encode,
    /// Two-pass re-encode.
    TwoPass,
}

impl EncodeMode {
    pub fn from_flags(encode: bool, two_pass: bool) -> Self {
        match (encode, two_pass) {
            (false, _) => Self::Copy,
            (true, false) => Self::Encode,
            (true, true) => Self::TwoPass,
        }
    }
}

/// A single external process call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// The commands for one cut, plus the concat list they depend on.
#[derive(Debug, Clone)]
pub struct CutPlan {
    /// Part cutting stages, in order.
    pub encode: Vec<Invocation>,
    /// Final concatenation stage.
    pub concat: Invocation,
    /// Intermediate part files.
    pub parts: Vec<PathBuf>,
    /// Concat demuxer list file.
    pub list_file: PathBuf,
    /// Contents of the list file.
    pub list_contents: String,
}

impl CutPlan {
    /// All stages in execution order.
    pub fn invocations(&self) -> impl Iterator<Item = &Invocation> {
        self.encode.iter().chain(std::iter::once(&self.concat))
    }

    /// Write the concat list file.
    pub fn write_list(&self) -> Result<()> {
        if let Some(parent) = self.list_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.list_file, &self.list_contents)?;
        Ok(())
    }
}

/// A cut job configuration.
#[derive(Debug, Clone)]
pub struct CutJob {
    /// FFmpeg executable.
    pub ffmpeg: PathBuf,
    /// Source media.
    pub input: PathBuf,
    /// Final output file.
    pub output: PathBuf,
    pub in_args: Vec<String>,
    pub out_args: Vec<String>,
    pub mode: EncodeMode,
    /// Directory for the concat list and two-pass logs.
    pub work_dir: PathBuf,
}

impl CutJob {
    /// Create a new cut job from user arguments.
    pub fn new(
        ffmpeg: impl Into<PathBuf>,
        input: impl Into<PathBuf>,
        user: &UserArgs,
        mode: EncodeMode,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        let input = input.into();
        Self {
            ffmpeg: ffmpeg.into(),
            output: user.output_for(&input),
            input,
            in_args: user.in_args.clone(),
            out_args: user.out_args.clone(),
            mode,
            work_dir: work_dir.into(),
        }
    }

    /// Extension of the output including the dot, or empty.
    fn extension(&self) -> String {
        self.output
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    }

    /// `<output without extension>.partNNN<ext>` for each segment.
    pub fn part_paths(&self, count: usize) -> Vec<PathBuf> {
        let ext = self.extension();
        let base = self.output.with_extension("");
        (0..count)
            .map(|i| PathBuf::from(format!("{}.part{:03}{}", base.display(), i, ext)))
            .collect()
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = self.in_args.clone();
        args.push("-i".into());
        args.push(self.input.to_string_lossy().into_owned());
        args.push("-y".into());
        args
    }

    fn invocation(&self, args: Vec<String>) -> Invocation {
        Invocation {
            program: self.ffmpeg.clone(),
            args,
        }
    }

    /// Build every FFmpeg call needed to cut `segments` and join the parts.
    pub fn plan(&self, segments: &[Segment]) -> Result<CutPlan> {
        let parts = self.part_paths(segments.len());
        let range = |seg: &Segment| -> [String; 4] {
            ["-ss".into(), seg.start.to_string(), "-to".into(), seg.end.to_string()]
        };
        let path_arg = |p: &Path| p.to_string_lossy().into_owned();

        let mut encode = Vec::new();
        match self.mode {
            EncodeMode::Copy => {
                let mut args = self.base_args();
                for (seg, part) in segments.iter().zip(&parts) {
                    args.extend(range(seg));
                    args.extend(["-c", "copy"].map(String::from));
                    args.extend(self.out_args.iter().cloned());
                    args.push(path_arg(part));
                }
                encode.push(self.invocation(args));
            }
            EncodeMode::Encode => {
                let mut args = self.base_args();
                for (seg, part) in segments.iter().zip(&parts) {
                    args.extend(range(seg));
                    args.extend(self.out_args.iter().cloned());
                    args.push(path_arg(part));
                }
                encode.push(self.invocation(args));
            }
            EncodeMode::TwoPass => {
                let format = self.extension().trim_start_matches('.').to_lowercase();
                let has_format = self.out_args.iter().any(|a| a == "-f");
                let logs: Vec<PathBuf> = parts
                    .iter()
                    .map(|p| self.work_dir.join(p.file_name().unwrap_or(p.as_os_str())))
                    .collect();

                let mut first = self.base_args();
                for ((seg, _), log) in segments.iter().zip(&parts).zip(&logs) {
                    if !has_format {
                        first.extend(["-f".into(), format.clone()]);
                    }
                    first.extend(range(seg));
                    first.extend(["-an", "-pass", "1"].map(String::from));
                    first.extend(["-passlogfile".into(), path_arg(log)]);
                    first.extend(self.out_args.iter().cloned());
                    first.push(path_arg(&null_output()));
                }
                encode.push(self.invocation(first));

                let mut second = self.base_args();
                for ((seg, part), log) in segments.iter().zip(&parts).zip(&logs) {
                    second.extend(range(seg));
                    second.extend(["-pass", "2"].map(String::from));
                    second.extend(["-passlogfile".into(), path_arg(log)]);
                    second.extend(self.out_args.iter().cloned());
                    second.push(path_arg(part));
                }
                encode.push(self.invocation(second));
            }
        }

        let list_name = format!(
            "{}.parts",
            self.output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".into())
        );
        let list_file = self.work_dir.join(list_name);
        let cwd = std::env::current_dir()?;
        let list_contents: String = parts
            .iter()
            .map(|p| {
                let abs = if p.is_absolute() { p.clone() } else { cwd.join(p) };
                format!("file '{}'\n", abs.to_string_lossy().replace('\'', "'\\''"))
            })
            .collect();

        let concat = self.invocation(vec![
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            path_arg(&list_file),
            "-y".into(),
            "-c".into(),
            "copy".into(),
            path_arg(&self.output),
        ]);

        Ok(CutPlan {
            encode,
            concat,
            parts,
            list_file,
            list_contents,
        })
    }

    /// Run every stage of `plan` in order.
    ///
    /// * `on_stage` – called before each stage with its 1-based number and the total.
    /// * `cancel` – polled while a stage runs; when set, the stage is
    ///   interrupted and killed if it does not exit within a grace period.
    ///
    /// Stops at the first stage that exits non-zero.
    pub fn run(
        &self,
        plan: &CutPlan,
        on_stage: impl Fn(usize, usize, &Invocation),
        cancel: &CutCancel,
    ) -> Result<()> {
        plan.write_list()?;
        let total = plan.encode.len() + 1;

        for (i, invocation) in plan.invocations().enumerate() {
            if cancel.is_cancelled() {
                return Err(CutmarkError::Interrupted(format!(
                    "Cancelled before stage {}/{}",
                    i + 1,
                    total
                )));
            }
            on_stage(i + 1, total, invocation);

            let mut child = invocation
                .command()
                .stdin(Stdio::null())
                .spawn()
                .map_err(|e| CutmarkError::Encoder(format!("Failed to spawn ffmpeg: {e}")))?;

            let status = loop {
                if let Some(status) = child.try_wait()? {
                    break status;
                }
                if cancel.is_cancelled() {
                    let code = stop_child(&mut child, STOP_GRACE);
                    return Err(CutmarkError::Interrupted(format!(
                        "Stage {}/{} stopped, exit code: {:?}",
                        i + 1,
                        total,
                        code
                    )));
                }
                std::thread::sleep(POLL_INTERVAL);
            };

            if !status.success() {
                return Err(CutmarkError::Encoder(format!(
                    "Stage {}/{} failed, ffmpeg exited with status: {}",
                    i + 1,
                    total,
                    status
                )));
            }
        }

        info!("Cut written to {}", self.output.display());
        Ok(())
    }
}

/// Interrupt `child`, then kill it if it is still running after `grace`.
///
/// Returns the exit code, if the child exited on its own.
fn stop_child(child: &mut Child, grace: Duration) -> Option<i32> {
    interrupt(child);
    let deadline = Instant::now() + grace;
    while Instant::now() < deadline {
        match child.try_wait() {
            Ok(Some(status)) => return status.code(),
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                warn!("Failed to poll ffmpeg: {}", e);
                break;
            }
        }
    }
    warn!("ffmpeg didn't stop within {:?}, killing it", grace);
    if let Err(e) = child.kill() {
        warn!("Failed to kill ffmpeg: {}", e);
    }
    child.wait().ok().and_then(|s| s.code())
}

/// SIGINT makes ffmpeg finish writing its output file.
#[cfg(unix)]
#[allow(unsafe_code)]
fn interrupt(child: &Child) {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: `pid` is our own child and has not been reaped yet.
    if unsafe { libc::kill(pid, libc::SIGINT) } != 0 {
        warn!(
            "Failed to interrupt ffmpeg: {}",
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn interrupt(_child: &Child) {}

/// Handle for cancelling an in-progress cut.
#[derive(Debug, Clone)]
pub struct CutCancel(Arc<AtomicBool>);

impl CutCancel {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for CutCancel {
    fn default() -> Self {
        Self::new()
    }
}
