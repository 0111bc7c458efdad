//! Startup configuration loaded from a JSON file.
//!
//! Everything here is optional: a missing file or missing keys fall back to
//! [`AppConfig::default`]. UI preferences that change while the app runs
//! (theme, grid, dock layout) are persisted separately through eframe storage.

use crate::error::Result;
use crate::ui::Theme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file to load.
pub const CONFIG_ENV_VAR: &str = "FLOWSHEET_EDITOR_CONFIG";

/// Font settings applied once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Optional TTF/OTF file used as the primary proportional font
    pub font_path: Option<PathBuf>,
    /// Body text size in points; other text styles scale with it
    pub font_size: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 14.0,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Native window title
    pub window_title: String,
    /// Share of the whole dock area given to the left column
    pub left_ratio: f32,
    /// Share of the remaining dock area given to the right column
    pub right_ratio: f32,
    /// Theme used until the user picks another one
    pub theme: Theme,
    /// Font settings
    pub fonts: FontConfig,
    /// Initial native window size in logical points
    pub initial_window_size: (f32, f32),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "Stokesian".to_string(),
            left_ratio: 0.25,
            right_ratio: 0.5,
            theme: Theme::Darcula,
            fonts: FontConfig::default(),
            initial_window_size: (1280.0, 800.0),
        }
    }
}

impl AppConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.sanitize();
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], falling back to defaults.
    ///
    /// A file that exists but cannot be parsed is reported and ignored rather
    /// than preventing startup.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from) else {
            log::debug!("{CONFIG_ENV_VAR} not set, using default configuration");
            return Self::default();
        };
        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!(
                    "Ignoring configuration file {}: {err}",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Clamps values that would produce an unusable layout.
    fn sanitize(&mut self) {
        self.left_ratio = self.left_ratio.clamp(0.05, 0.9);
        self.right_ratio = self.right_ratio.clamp(0.05, 0.95);
        if !(6.0..=48.0).contains(&self.fonts.font_size) {
            self.fonts.font_size = FontConfig::default().font_size;
        }
        if self.window_title.trim().is_empty() {
            self.window_title = Self::default().window_title;
        }
    }
}
