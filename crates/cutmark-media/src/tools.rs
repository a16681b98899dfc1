//! Locating the FFmpeg executables.

use std::path::{Path, PathBuf};
use tracing::warn;

/// Paths of the ffmpeg and ffprobe executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    /// Resolve tool paths, preferring explicit overrides.
    ///
    /// Without overrides ffmpeg comes from ffmpeg-sidecar's lookup and
    /// ffprobe is expected next to it.
    pub fn resolve(ffmpeg: Option<PathBuf>, ffprobe: Option<PathBuf>) -> Self {
        let ffmpeg = ffmpeg.unwrap_or_else(ffmpeg_sidecar::paths::ffmpeg_path);
        let ffprobe = ffprobe.unwrap_or_else(|| sibling_ffprobe(&ffmpeg));
        Self { ffmpeg, ffprobe }
    }

    /// Whether ffmpeg can be executed.
    pub fn ffmpeg_available(&self) -> bool {
        is_executable(&self.ffmpeg)
    }

    /// Whether ffprobe can be executed. Index building needs it.
    pub fn ffprobe_available(&self) -> bool {
        is_executable(&self.ffprobe)
    }

    /// Log a warning for every missing tool.
    pub fn report_missing(&self) {
        if !self.ffmpeg_available() {
            warn!("FFmpeg wasn't found at {}", self.ffmpeg.display());
        }
        if !self.ffprobe_available() {
            warn!(
                "FFprobe wasn't found at {}, frame index won't be built",
                self.ffprobe.display()
            );
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self::resolve(None, None)
    }
}

fn sibling_ffprobe(ffmpeg: &Path) -> PathBuf {
    let name = if cfg!(windows) { "ffprobe.exe" } else { "ffprobe" };
    if ffmpeg.parent().map_or(true, |p| p.as_os_str().is_empty()) {
        PathBuf::from(name)
    } else {
        ffmpeg.with_file_name(name)
    }
}

fn is_executable(path: &Path) -> bool {
    which::which(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_paths_win() {
        let tools = ToolPaths::resolve(
            Some(PathBuf::from("/opt/ff/ffmpeg")),
            Some(PathBuf::from("/usr/bin/ffprobe")),
        );
        assert_eq!(tools.ffmpeg, PathBuf::from("/opt/ff/ffmpeg"));
        assert_eq!(tools.ffprobe, PathBuf::from("/usr/bin/ffprobe"));
    }

    #[test]
    fn test_ffprobe_next_to_ffmpeg() {
        let tools = ToolPaths::resolve(Some(PathBuf::from("/opt/ff/ffmpeg")), None);
        let name = if cfg!(windows) { "ffprobe.exe" } else { "ffprobe" };
        assert_eq!(tools.ffprobe, PathBuf::from("/opt/ff").join(name));
    }

    #[test]
    fn test_bare_ffmpeg_name() {
        let tools = ToolPaths::resolve(Some(PathBuf::from("ffmpeg")), None);
        let name = if cfg!(windows) { "ffprobe.exe" } else { "ffprobe" };
        assert_eq!(tools.ffprobe, PathBuf::from(name));
    }

    #[test]
    fn test_missing_tool_not_available() {
        let tools = ToolPaths::resolve(
            Some(PathBuf::from("/nonexistent/cutmark/ffmpeg")),
            Some(PathBuf::from("/nonexistent/cutmark/ffprobe")),
        );
        assert!(!tools.ffmpeg_available());
        assert!(!tools.ffprobe_available());
    }
}
