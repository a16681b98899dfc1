//! Media file probing to get duration and frame rate without a decode, and a
//! check of how stream-copy cuts land on this file.

use cutmark_core::{CutmarkError, FrameRate, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use crate::tools::ToolPaths;

/// Information about a media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    /// File path
    pub path: String,
    /// Container duration in seconds
    pub duration: f64,
    /// Frame rate of the primary video stream
    pub frame_rate: Option<FrameRate>,
    /// Frame count reported by the container, if any
    pub frame_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl MediaProbe {
    /// Probe a media file with ffprobe.
    pub fn probe<P: AsRef<Path>>(tools: &ToolPaths, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CutmarkError::NotFound(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let output = Command::new(&tools.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "format=duration:stream=avg_frame_rate,r_frame_rate,nb_frames,duration",
                "-of",
                "json",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| CutmarkError::Probe(format!("Failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(CutmarkError::Probe(format!(
                "ffprobe exited with status: {}",
                output.status
            )));
        }

        Self::from_json(path, &output.stdout)
    }

    /// Parse `ffprobe -of json` output.
    pub fn from_json(path: &Path, data: &[u8]) -> Result<Self> {
        let raw: ProbeOutput = serde_json::from_slice(data)
            .map_err(|e| CutmarkError::Probe(format!("Invalid ffprobe output: {e}")))?;

        let stream = raw.streams.first();
        let frame_rate = stream.and_then(|s| {
            s.avg_frame_rate
                .as_deref()
                .and_then(FrameRate::parse)
                .or_else(|| s.r_frame_rate.as_deref().and_then(FrameRate::parse))
        });
        let frame_count = stream
            .and_then(|s| s.nb_frames.as_deref())
            .and_then(|n| n.parse().ok());

        let duration = raw
            .format
            .and_then(|f| f.duration)
            .or_else(|| stream.and_then(|s| s.duration.clone()))
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| {
                CutmarkError::Probe(format!("No duration for {}", path.display()))
            })?;

        Ok(Self {
            path: path.to_string_lossy().into_owned(),
            duration,
            frame_rate,
            frame_count,
        })
    }

    /// Duration of one frame, falling back to 24 fps when unknown.
    pub fn frame_duration(&self) -> f64 {
        self.frame_rate.unwrap_or_default().frame_duration()
    }
}

// ── Stream copy seek check ──────────────────────────────────────

/// Outcome of [`check_copy_seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekAccuracy {
    /// A stream-copy cut starts on the frame a decoding seek lands on.
    Accurate,
    /// Stream-copy cuts start elsewhere; copy mode cuts will be off.
    Inaccurate,
}

/// Compare the frame a decoding seek to `position` lands on with the first
/// frame of a one-frame stream-copy cut at the same position.
///
/// Scratch files live in a directory under `work_dir` that is removed again.
pub fn check_copy_seek(
    ffmpeg: &Path,
    input: &Path,
    position: f64,
    work_dir: &Path,
) -> Result<SeekAccuracy> {
    info!("Testing if ffmpeg stream copy seeking on this file works correctly...");
    std::fs::create_dir_all(work_dir)?;
    let scratch = tempfile::Builder::new()
        .prefix("seek-check")
        .tempdir_in(work_dir)?;

    let ext = input
        .extension()
        .map_or_else(|| "mkv".into(), |e| e.to_string_lossy().into_owned());
    let decoded = scratch.path().join("decoded.png");
    let sample = scratch.path().join(format!("sample.{ext}"));
    let copied = scratch.path().join("copied.png");
    let pos = position.to_string();

    run_ffmpeg(ffmpeg, input, Some(&pos), &["-frames", "1"], &decoded)?;
    run_ffmpeg(ffmpeg, input, Some(&pos), &["-c", "copy", "-frames", "1"], &sample)?;
    run_ffmpeg(ffmpeg, &sample, None, &["-frames", "1"], &copied)?;

    let accuracy = if std::fs::read(&decoded)? == std::fs::read(&copied)? {
        info!("FFmpeg stream copy seeking seems to work correctly");
        SeekAccuracy::Accurate
    } else {
        warn!(
            "FFmpeg stream copy seeking seems to work incorrectly, \
             copy mode cuts will most likely be inaccurate"
        );
        SeekAccuracy::Inaccurate
    };
    Ok(accuracy)
}

/// Run `ffmpeg -i <input> -y [-ss <seek>] <args...> -v error <output>`.
fn run_ffmpeg(
    ffmpeg: &Path,
    input: &Path,
    seek: Option<&str>,
    args: &[&str],
    output: &Path,
) -> Result<()> {
    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-i").arg(input).arg("-y");
    if let Some(seek) = seek {
        cmd.args(["-ss", seek]);
    }
    cmd.args(args)
        .args(["-v", "error"])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    debug!("Running {:?}", cmd);

    let out = cmd
        .output()
        .map_err(|e| CutmarkError::Probe(format!("Failed to run ffmpeg: {e}")))?;
    if !out.status.success() {
        return Err(CutmarkError::Probe(format!(
            "Failed testing ffmpeg, exit status {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}
