use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::auto_scroll::{
    AutoScrollConfig, DEFAULT_FOLLOW_THRESHOLD, DEFAULT_SETTLE_DELAY,
    DEFAULT_SMOOTH_SCROLL_MAX_MESSAGES, DEFAULT_STREAM_DEBOUNCE,
};
use crate::error::{Result, ViewError};

pub const DEFAULT_MAX_TREE_DEPTH: usize = 8;
/// Scroll units per terminal row.
pub const ROW_HEIGHT_UNITS: u32 = 16;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub scroll: ScrollConfig,
    pub tree: TreeConfig,
    pub paths: PathsConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub follow_threshold: u32,
    pub stream_debounce_ms: u64,
    pub settle_ms: u64,
    pub smooth_scroll_max_messages: usize,
    pub row_height_units: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub max_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub catalog: Option<PathBuf>,
    pub theme: Option<PathBuf>,
    pub outbox: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Keep reading a feed file as the host appends to it.
    pub follow: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            follow_threshold: DEFAULT_FOLLOW_THRESHOLD,
            stream_debounce_ms: DEFAULT_STREAM_DEBOUNCE.as_millis() as u64,
            settle_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            smooth_scroll_max_messages: DEFAULT_SMOOTH_SCROLL_MAX_MESSAGES,
            row_height_units: ROW_HEIGHT_UNITS,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_TREE_DEPTH,
        }
    }
}

impl ScrollConfig {
    pub fn auto_scroll(&self) -> AutoScrollConfig {
        AutoScrollConfig {
            threshold: self.follow_threshold,
            stream_debounce: Duration::from_millis(self.stream_debounce_ms),
            settle_delay: Duration::from_millis(self.settle_ms),
            smooth_scroll_max_messages: self.smooth_scroll_max_messages,
        }
    }
}

impl ViewConfig {
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(s)?;
        config.tree.max_depth = config.tree.max_depth.max(1);
        config.scroll.row_height_units = config.scroll.row_height_units.max(1);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| ViewError::io(path, err))?;
        Self::from_toml_str(&text).map_err(|err| ViewError::toml(path, err))
    }

    /// A missing or invalid config file degrades to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "using default view config");
                Self::default()
            }
        }
    }
}
