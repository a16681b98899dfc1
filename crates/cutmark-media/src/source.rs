//! Metadata extraction via ffprobe.
//!
//! The index strategies only see [`PacketRecord`] and [`FrameRecord`] streams
//! through the [`MetadataSource`] trait; [`FfprobeSource`] produces them by
//! spawning ffprobe and parsing its default `key=value` output line by line.

use cutmark_core::{CutmarkError, Result};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use crate::tools::ToolPaths;

/// Timing of one video packet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PacketRecord {
    pub pts: Option<f64>,
    pub dts: Option<f64>,
    pub keyframe: bool,
}

/// Timing of one decoded video frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameRecord {
    pub timestamp: Option<f64>,
    pub picture_type: Option<char>,
}

impl FrameRecord {
    pub fn is_keyframe(&self) -> bool {
        self.picture_type == Some('I')
    }
}

/// Producer of per-packet and per-frame timing records.
pub trait MetadataSource: Send + Sync {
    /// Stream packet records in packet order. Fails if the extractor fails.
    fn read_packets(&self, path: &Path, sink: &mut dyn FnMut(PacketRecord)) -> Result<()>;

    /// Stream frame records in decode order. Fails if the extractor fails.
    fn read_frames(&self, path: &Path, sink: &mut dyn FnMut(FrameRecord)) -> Result<()>;

    /// Total number of video frames, if it can be determined cheaply.
    fn frame_count_hint(&self, path: &Path) -> Option<u64>;
}

/// Parse a timestamp value; `N/A`, garbage and negative values yield `None`.
fn parse_time_value(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Incremental parser for `ffprobe -show_packets` output.
#[derive(Debug, Default)]
pub struct PacketParser {
    current: Option<PacketRecord>,
}

impl PacketParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one output line, returning a packet once it is complete.
    ///
    /// A `pts_time` line opens a new packet, so output without section
    /// markers is handled as well.
    pub fn feed(&mut self, line: &str) -> Option<PacketRecord> {
        let line = line.trim_end();
        if line == "[/PACKET]" {
            return self.current.take();
        }
        let (key, value) = line.split_once('=')?;
        match key {
            "pts_time" => {
                let done = self.current.take();
                self.current = Some(PacketRecord {
                    pts: parse_time_value(value),
                    ..Default::default()
                });
                done
            }
            "dts_time" => {
                self.current.get_or_insert_with(Default::default).dts = parse_time_value(value);
                None
            }
            "flags" => {
                self.current.get_or_insert_with(Default::default).keyframe = value.contains('K');
                None
            }
            _ => None,
        }
    }

    /// Flush the trailing packet at end of output.
    pub fn finish(&mut self) -> Option<PacketRecord> {
        self.current.take()
    }
}

/// Incremental parser for `ffprobe -show_frames` output.
#[derive(Debug, Default)]
pub struct FrameParser {
    current: Option<FrameRecord>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one output line, returning a frame once it is complete.
    pub fn feed(&mut self, line: &str) -> Option<FrameRecord> {
        let line = line.trim_end();
        if line == "[/FRAME]" {
            return self.current.take();
        }
        let (key, value) = line.split_once('=')?;
        match key {
            "best_effort_timestamp_time" => {
                let done = self.current.take();
                self.current = Some(FrameRecord {
                    timestamp: parse_time_value(value),
                    ..Default::default()
                });
                done
            }
            "pict_type" => {
                self.current.get_or_insert_with(Default::default).picture_type =
                    value.trim().chars().next();
                None
            }
            _ => None,
        }
    }

    /// Flush the trailing frame at end of output.
    pub fn finish(&mut self) -> Option<FrameRecord> {
        self.current.take()
    }
}

/// Find the last `frame=N` progress counter in ffmpeg's stderr.
pub fn last_frame_count(stderr: &str) -> Option<u64> {
    stderr
        .match_indices("frame=")
        .filter_map(|(pos, key)| {
            let digits: String = stderr[pos + key.len()..]
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        })
        .last()
}

fn null_device() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

/// [`MetadataSource`] backed by the ffprobe and ffmpeg executables.
#[derive(Debug, Clone)]
pub struct FfprobeSource {
    tools: ToolPaths,
}

impl FfprobeSource {
    pub fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }

    fn ffprobe_command(&self, path: &Path, section: &str, entries: &str) -> Command {
        let mut cmd = Command::new(&self.tools.ffprobe);
        cmd.args([section, "-show_entries", entries, "-select_streams", "v", "-v", "error"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        cmd
    }

    /// Run `cmd` and hand each stdout line to `on_line`.
    fn stream_lines(mut cmd: Command, mut on_line: impl FnMut(&str)) -> Result<()> {
        debug!("Running {:?}", cmd);
        let mut child = cmd
            .spawn()
            .map_err(|e| CutmarkError::IndexBuild(format!("Failed to spawn ffprobe: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CutmarkError::IndexBuild("Failed to open ffprobe stdout".into()))?;

        for line in BufReader::new(stdout).lines() {
            match line {
                Ok(line) => on_line(&line),
                Err(e) => {
                    warn!("Stopped reading ffprobe output: {}", e);
                    break;
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| CutmarkError::IndexBuild(format!("Failed to wait for ffprobe: {e}")))?;
        if !status.success() {
            return Err(CutmarkError::IndexBuild(format!(
                "ffprobe exited with status: {}",
                status
            )));
        }
        Ok(())
    }

}

impl MetadataSource for FfprobeSource {
    fn read_packets(&self, path: &Path, sink: &mut dyn FnMut(PacketRecord)) -> Result<()> {
        let cmd = self.ffprobe_command(path, "-show_packets", "packet=pts_time,dts_time,flags");
        let mut parser = PacketParser::new();
        Self::stream_lines(cmd, |line| {
            if let Some(packet) = parser.feed(line) {
                sink(packet);
            }
        })?;
        if let Some(packet) = parser.finish() {
            sink(packet);
        }
        Ok(())
    }

    fn read_frames(&self, path: &Path, sink: &mut dyn FnMut(FrameRecord)) -> Result<()> {
        let cmd = self.ffprobe_command(
            path,
            "-show_frames",
            "frame=best_effort_timestamp_time,pict_type",
        );
        let mut parser = FrameParser::new();
        Self::stream_lines(cmd, |line| {
            if let Some(frame) = parser.feed(line) {
                sink(frame);
            }
        })?;
        if let Some(frame) = parser.finish() {
            sink(frame);
        }
        Ok(())
    }

    fn frame_count_hint(&self, path: &Path) -> Option<u64> {
        let output = Command::new(&self.tools.ffmpeg)
            .arg("-i")
            .arg(path)
            .args(["-c", "copy", "-f", "null", null_device()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(output) => last_frame_count(&String::from_utf8_lossy(&output.stderr)),
            Err(e) => {
                warn!("Could not count frames of {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Recorded records, replayed instead of running ffprobe.
#[derive(Debug, Clone, Default)]
pub struct RecordedSource {
    pub packets: Option<Vec<PacketRecord>>,
    pub frames: Option<Vec<FrameRecord>>,
    pub frame_count: Option<u64>,
}

impl RecordedSource {
    /// Parse captured `ffprobe -show_packets` output.
    pub fn from_packet_output(output: &str) -> Self {
        let mut parser = PacketParser::new();
        let mut packets: Vec<PacketRecord> = output.lines().filter_map(|l| parser.feed(l)).collect();
        packets.extend(parser.finish());
        Self {
            packets: Some(packets),
            ..Default::default()
        }
    }

    /// Parse captured `ffprobe -show_frames` output.
    pub fn from_frame_output(output: &str) -> Self {
        let mut parser = FrameParser::new();
        let mut frames: Vec<FrameRecord> = output.lines().filter_map(|l| parser.feed(l)).collect();
        frames.extend(parser.finish());
        Self {
            frames: Some(frames),
            ..Default::default()
        }
    }
}

impl MetadataSource for RecordedSource {
    fn read_packets(&self, path: &Path, sink: &mut dyn FnMut(PacketRecord)) -> Result<()> {
        let packets = self.packets.as_ref().ok_or_else(|| {
            CutmarkError::IndexBuild(format!("No packet data for {}", path.display()))
        })?;
        packets.iter().copied().for_each(sink);
        Ok(())
    }

    fn read_frames(&self, path: &Path, sink: &mut dyn FnMut(FrameRecord)) -> Result<()> {
        let frames = self.frames.as_ref().ok_or_else(|| {
            CutmarkError::IndexBuild(format!("No frame data for {}", path.display()))
        })?;
        frames.iter().copied().for_each(sink);
        Ok(())
    }

    fn frame_count_hint(&self, _path: &Path) -> Option<u64> {
        self.frame_count
    }
}

/// Path of the default null sink, for commands that discard output.
pub fn null_output() -> PathBuf {
    PathBuf::from(null_device())
}
