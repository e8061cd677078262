/// Configuration loading
///
/// Settings come from, highest priority first:
/// 1. Command-line arguments
/// 2. TOML config file (`--config`, or the platform config directory)
/// 3. Compiled defaults
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::export::pdf::text::Fonts;
use crate::state::page::DEFAULT_ROWS_PER_PAGE;

/// Application settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logo drawn at the top-left of every report page
    pub letterhead: Option<PathBuf>,
    /// TrueType font for report text (e.g. THSarabunNew for Thai); builtin Helvetica if unset
    pub font: Option<PathBuf>,
    /// Bold face for headers and labels; the regular font is reused if unset
    pub bold_font: Option<PathBuf>,
    /// Where exports are written when no destination is picked
    pub output_dir: Option<PathBuf>,
    /// Records per page in the review view
    pub rows_per_page: usize,
    /// tracing filter directive used when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            letterhead: None,
            font: None,
            bold_font: None,
            output_dir: None,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from an explicit file, or from the default location if present
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        let text = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        if config.rows_per_page == 0 {
            return Err(Error::Config("rows_per_page must be at least 1".to_string()));
        }
        if config.bold_font.is_some() && config.font.is_none() {
            return Err(Error::Config("bold_font needs font to be set".to_string()));
        }
        Ok(config)
    }

    /// Directory for exports: configured, else Documents, else the working directory
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::document_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Letterhead image bytes; an unreadable file is logged and skipped
    pub fn letterhead_bytes(&self) -> Option<Vec<u8>> {
        let path = self.letterhead.as_ref()?;
        std::fs::read(path)
            .map_err(|e| tracing::warn!(path = %path.display(), error = %e, "letterhead not readable"))
            .ok()
    }

    /// Report fonts: the configured TrueType pair, else builtin Helvetica
    ///
    /// A font file that cannot be read or parsed is logged and skipped.
    pub fn fonts(&self) -> Fonts {
        let Some(regular) = &self.font else {
            return Fonts::builtin();
        };
        let load = || -> Result<Fonts> {
            let data = std::fs::read(regular)?;
            let bold = self.bold_font.as_ref().map(std::fs::read).transpose()?;
            Fonts::embedded(data, bold)
        };
        load().unwrap_or_else(|e| {
            tracing::warn!(font = %regular.display(), error = %e, "report font not usable, using Helvetica");
            Fonts::builtin()
        })
    }
}

/// `~/.config/clash-report/config.toml` on Linux, the platform equivalent elsewhere
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("clash-report").join("config.toml"))
}
