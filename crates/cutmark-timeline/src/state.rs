//! Saved editing state.
//!
//! A small JSON document next to the media file, rewritten after every edit:
//!
//! ```json
//! {
//!   "2-pass": false,
//!   "anchor": null,
//!   "encode": false,
//!   "ffargs": "out: result.mkv",
//!   "mode": "keep",
//!   "segments": [[10.0, 20.0]]
//! }
//! ```

use cutmark_core::{CutmarkError, EditMode, Result, Segment};
use cutmark_media::{EncodeMode, UserArgs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::editor::SegmentEditor;

/// Export settings chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSettings {
    /// Whether segments mark footage to keep or to remove.
    pub mode: EditMode,
    /// Free-form `out:` / `out-args:` / `in-args:` text.
    pub ffargs: String,
    /// Re-encode instead of stream copy.
    pub encode: bool,
    /// Two-pass encoding, only meaningful with `encode`.
    #[serde(rename = "2-pass")]
    pub two_pass: bool,
}

impl EditSettings {
    pub fn encode_mode(&self) -> EncodeMode {
        EncodeMode::from_flags(self.encode, self.two_pass)
    }

    pub fn user_args(&self) -> UserArgs {
        UserArgs::parse(&self.ffargs)
    }
}

/// Persisted timeline plus settings. Every field is optional on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedState {
    pub segments: Vec<Segment>,
    pub anchor: Option<f64>,
    #[serde(flatten)]
    pub settings: EditSettings,
}

impl SavedState {
    /// Snapshot the editor's timeline together with the settings.
    pub fn capture(editor: &SegmentEditor, settings: &EditSettings) -> Self {
        let timeline = editor.timeline();
        Self {
            segments: timeline.segments().to_vec(),
            anchor: timeline.anchor(),
            settings: settings.clone(),
        }
    }

    /// Serialize to pretty JSON with keys in sorted order.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        // Going through a Value sorts the object keys.
        let value = serde_json::to_value(self)
            .map_err(|e| CutmarkError::Serialization(format!("Failed to serialize state: {}", e)))?;
        serde_json::to_vec_pretty(&value)
            .map_err(|e| CutmarkError::Serialization(format!("Failed to serialize state: {}", e)))
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| CutmarkError::Serialization(format!("Failed to parse state: {}", e)))
    }

    /// Save state to a file path.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data)?;
        debug!("State saved to {}", path.display());
        Ok(())
    }

    /// Load state from a file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }

    /// Load state, starting empty when the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring save file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// `<basename>.cutmark` in the working directory.
pub fn default_save_path(media: &Path) -> PathBuf {
    let name = media
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string());
    PathBuf::from(format!("{name}.cutmark"))
}
