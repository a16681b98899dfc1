use clap::{Parser, Subcommand, ValueEnum};
use cutmark_core::EditMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cutmark")]
#[command(author, version, about = "Mark segments of a video and cut them losslessly")]
pub struct Cli {
    /// Media file being edited
    pub input: PathBuf,

    /// Editing state file (default: <basename>.cutmark)
    #[arg(short, long, global = true)]
    pub save_file: Option<PathBuf>,

    /// Frame index cache directory
    #[arg(long, env = "CUTMARK_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long, env = "CUTMARK_FFMPEG", global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe executable
    #[arg(long, env = "CUTMARK_FFPROBE", global = true)]
    pub ffprobe: Option<PathBuf>,

    /// Skip building the frame index (no snapping or keyframe jumps)
    #[arg(long, global = true)]
    pub no_index: bool,

    /// Whether segments are kept or removed
    #[arg(long, global = true)]
    pub mode: Option<EditMode>,

    /// Re-encode instead of stream copy
    #[arg(long, value_name = "BOOL", global = true)]
    pub encode: Option<bool>,

    /// Two-pass encoding
    #[arg(long, value_name = "BOOL", global = true)]
    pub two_pass: Option<bool>,

    /// Output arguments, `out:` / `out-args:` / `in-args:` lines
    #[arg(long, global = true)]
    pub ffargs: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show media and tool information, and test stream copy seeking
    Info {
        /// Position the stream copy seek test cuts at
        #[arg(long, default_value = "0")]
        at: String,
    },

    /// Build (or load) the frame index
    Index,

    /// Print the segments, anchor and settings
    Show,

    /// Pick a boundary at a position (S, M:S or H:M:S)
    Put {
        position: String,

        /// Don't join two segments when both picks fall inside them
        #[arg(long)]
        no_join: bool,
    },

    /// Delete the anchor or segment boundary closest to a position
    Del { position: String },

    /// Print the next anchor or keyframe from a position
    Jump {
        position: String,

        #[arg(long, value_enum, default_value = "anchor")]
        to: JumpTarget,

        /// Search backwards
        #[arg(long)]
        back: bool,
    },

    /// Print the ffmpeg commands that would produce the cut
    Plan,

    /// Run the ffmpeg commands
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JumpTarget {
    Anchor,
    Keyframe,
}
