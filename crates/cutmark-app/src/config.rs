//! Runtime configuration assembled from flags and environment.

use cutmark_media::{IndexCache, ToolPaths};
use cutmark_timeline::default_save_path;
use std::path::PathBuf;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub tools: ToolPaths,
    pub cache_dir: PathBuf,
    pub save_file: PathBuf,
    pub use_index: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            input: cli.input.clone(),
            tools: ToolPaths::resolve(cli.ffmpeg.clone(), cli.ffprobe.clone()),
            cache_dir: cli.cache_dir.clone().unwrap_or_else(IndexCache::default_dir),
            save_file: cli
                .save_file
                .clone()
                .unwrap_or_else(|| default_save_path(&cli.input)),
            use_index: !cli.no_index,
        }
    }

    /// Directory for concat lists and two-pass logs.
    pub fn work_dir(&self) -> PathBuf {
        self.cache_dir.join("work")
    }
}
