//! One editing session: the save file, the editor and the frame index.
//!
//! The editor itself has no side effects; the session persists after each
//! edit.

use anyhow::{Context, Result};
use cutmark_core::EditMode;
use cutmark_media::{
    FfprobeSource, InFlightBuilds, IndexCache, MediaProbe, TimestampIndex, TimestampIndexBuilder,
};
use cutmark_timeline::{EditSettings, SavedState, SegmentEditor};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::Config;

pub struct Session {
    pub config: Config,
    pub editor: SegmentEditor,
    pub settings: EditSettings,
    in_flight: InFlightBuilds,
    dirty: bool,
}

impl Session {
    /// Load the save file and apply setting overrides from the command line.
    pub fn open(config: Config, cli: &Cli) -> Self {
        let state = SavedState::load_or_default(&config.save_file);
        let mut editor = SegmentEditor::new();
        editor.restore(&state);

        let mut settings = state.settings;
        let before = settings.clone();
        if let Some(mode) = cli.mode {
            settings.mode = mode;
        }
        if let Some(encode) = cli.encode {
            settings.encode = encode;
        }
        if let Some(two_pass) = cli.two_pass {
            settings.two_pass = two_pass;
        }
        if let Some(ffargs) = &cli.ffargs {
            settings.ffargs = ffargs.clone();
        }
        let dirty = settings != before;

        Self {
            config,
            editor,
            settings,
            in_flight: InFlightBuilds::new(),
            dirty,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Write the save file if anything changed.
    pub fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        SavedState::capture(&self.editor, &self.settings)
            .save_to_file(&self.config.save_file)
            .with_context(|| format!("Failed to save {}", self.config.save_file.display()))?;
        self.dirty = false;
        Ok(())
    }

    pub fn mode(&self) -> EditMode {
        self.settings.mode
    }

    pub fn probe(&self) -> Result<MediaProbe> {
        MediaProbe::probe(&self.config.tools, &self.config.input)
            .with_context(|| format!("Failed to probe {}", self.config.input.display()))
    }

    /// Build or load the frame index in the background and wait for it.
    ///
    /// Fails with `BuildInProgress` while another build of the same file runs.
    pub fn build_index(&self) -> Result<TimestampIndex> {
        let source = FfprobeSource::new(self.config.tools.clone());
        let builder = Arc::new(
            TimestampIndexBuilder::new(Arc::new(source))
                .with_cache(IndexCache::new(&self.config.cache_dir)),
        );

        let job = builder.spawn(self.config.input.clone(), &self.in_flight)?;
        let progress = job.progress.clone();
        let reporter = std::thread::spawn(move || {
            for update in progress.iter() {
                info!("{}", update);
            }
        });

        let index = job.wait();
        let _ = reporter.join();
        Ok(index?)
    }

    /// The frame index, or an empty one when it is disabled or can't be built.
    pub fn index_or_empty(&self) -> TimestampIndex {
        if !self.config.use_index {
            return TimestampIndex::default();
        }
        if !self.config.tools.ffprobe_available() {
            self.config.tools.report_missing();
            return TimestampIndex::default();
        }
        match self.build_index() {
            Ok(index) => index,
            Err(e) => {
                warn!("Continuing without frame index: {:#}", e);
                TimestampIndex::default()
            }
        }
    }
}
