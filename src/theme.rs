use std::fs;
use std::path::Path;

use ratatui::style::Color;
use serde::Deserialize;
use tracing::warn;

use crate::step_tree::StepStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub chat_bg: Color,
    pub tree_bg: Color,
    pub input_bg: Color,
    pub panel_bg: Color,
    pub status_bg: Color,
    pub text_fg: Color,
    pub muted_fg: Color,
    pub active_fg: Color,
    pub user_fg: Color,
    pub assistant_fg: Color,
    pub system_fg: Color,
    pub pending_fg: Color,
    pub running_fg: Color,
    pub completed_fg: Color,
    pub error_fg: Color,
    pub gauge_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            chat_bg: Color::Rgb(54, 54, 54),
            tree_bg: Color::Rgb(48, 48, 48),
            input_bg: Color::Rgb(62, 62, 62),
            panel_bg: Color::Rgb(40, 40, 40),
            status_bg: Color::Rgb(36, 36, 36),
            text_fg: Color::Rgb(225, 225, 225),
            muted_fg: Color::Rgb(150, 150, 150),
            active_fg: Color::Rgb(255, 255, 255),
            user_fg: Color::Rgb(130, 190, 255),
            assistant_fg: Color::Rgb(170, 230, 170),
            system_fg: Color::Rgb(230, 200, 120),
            pending_fg: Color::Rgb(150, 150, 150),
            running_fg: Color::Rgb(110, 180, 255),
            completed_fg: Color::Rgb(120, 210, 120),
            error_fg: Color::Rgb(240, 110, 110),
            gauge_fg: Color::Rgb(110, 180, 255),
        }
    }
}

impl Theme {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        match fs::read_to_string(path_ref) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(theme) => theme,
                Err(err) => {
                    warn!(path = %path_ref.display(), error = %err, "failed to parse theme, using defaults");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(path = %path_ref.display(), error = %err, "failed to read theme, using defaults");
                Self::default()
            }
        }
    }

    /// Parses a `[colors]` table. Colors left out keep their default.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let cfg: ThemeToml = toml::from_str(s)?;
        let colors = cfg.colors;
        let base = Self::default();
        let pick = |value: Option<RgbToml>, fallback: Color| value.map_or(fallback, RgbToml::to_color);
        Ok(Self {
            chat_bg: pick(colors.chat_bg, base.chat_bg),
            tree_bg: pick(colors.tree_bg, base.tree_bg),
            input_bg: pick(colors.input_bg, base.input_bg),
            panel_bg: pick(colors.panel_bg, base.panel_bg),
            status_bg: pick(colors.status_bg, base.status_bg),
            text_fg: pick(colors.text_fg, base.text_fg),
            muted_fg: pick(colors.muted_fg, base.muted_fg),
            active_fg: pick(colors.active_fg, base.active_fg),
            user_fg: pick(colors.user_fg, base.user_fg),
            assistant_fg: pick(colors.assistant_fg, base.assistant_fg),
            system_fg: pick(colors.system_fg, base.system_fg),
            pending_fg: pick(colors.pending_fg, base.pending_fg),
            running_fg: pick(colors.running_fg, base.running_fg),
            completed_fg: pick(colors.completed_fg, base.completed_fg),
            error_fg: pick(colors.error_fg, base.error_fg),
            gauge_fg: pick(colors.gauge_fg, base.gauge_fg),
        })
    }

    pub fn status_fg(&self, status: StepStatus) -> Color {
        match status {
            StepStatus::Pending => self.pending_fg,
            StepStatus::Running => self.running_fg,
            StepStatus::Completed => self.completed_fg,
            StepStatus::Error => self.error_fg,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThemeToml {
    colors: ThemeColorsToml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThemeColorsToml {
    chat_bg: Option<RgbToml>,
    tree_bg: Option<RgbToml>,
    input_bg: Option<RgbToml>,
    panel_bg: Option<RgbToml>,
    status_bg: Option<RgbToml>,
    text_fg: Option<RgbToml>,
    muted_fg: Option<RgbToml>,
    active_fg: Option<RgbToml>,
    user_fg: Option<RgbToml>,
    assistant_fg: Option<RgbToml>,
    system_fg: Option<RgbToml>,
    pending_fg: Option<RgbToml>,
    running_fg: Option<RgbToml>,
    completed_fg: Option<RgbToml>,
    error_fg: Option<RgbToml>,
    gauge_fg: Option<RgbToml>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RgbToml {
    r: u8,
    g: u8,
    b: u8,
}

impl RgbToml {
    fn to_color(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}
