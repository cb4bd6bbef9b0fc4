use std::fs;
use std::io;
use std::path::Path;

use image::Rgba;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::model::{Tier, TIER_COUNT};
use crate::render::DEFAULT_OUTPUT_SUFFIX;

/// An opaque RGB color, written as `[r, g, b]` in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.0, self.1, self.2, 255])
    }
}

/// Visual parameters of the overlay.
///
/// Mirrors the sections of the TOML file: `[margins]`, `[columns]`,
/// `[colors]`, `[font]` and `[output]`. Every section is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RenderConfig {
    pub margins: Margins,
    pub columns: Columns,
    pub colors: Colors,
    pub font: FontSettings,
    pub output: OutputSettings,
}

/// Margins as fractions of the image width (`x`) and height (`y`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub x: f64,
    pub y: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Margins { x: 0.01, y: 0.05 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    /// Header of each column, most urgent first.
    pub names: Vec<String>,
}

impl Default for Columns {
    fn default() -> Self {
        Columns {
            names: Tier::ALL
                .iter()
                .map(|tier| tier.default_label().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub header: Rgb,
    /// One color per column, parallel to `columns.names`.
    pub text: Vec<Rgb>,
    pub shadow: Rgb,
}

impl Default for Colors {
    fn default() -> Self {
        Colors {
            header: Rgb::WHITE,
            text: vec![Rgb(173, 0, 0), Rgb(255, 230, 0), Rgb(34, 255, 0)],
            shadow: Rgb::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    /// Font file name or path. Bare names are looked up in the system font directories.
    pub name: String,
    /// Font height as a fraction of the image height.
    pub size: f64,
    /// Extra pixels between two rows.
    pub line_spacing: u32,
}

impl Default for FontSettings {
    fn default() -> Self {
        FontSettings {
            name: "arial.ttf".to_string(),
            size: 0.02,
            line_spacing: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Inserted between the file stem and the extension of the rendered copy.
    pub suffix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}

impl RenderConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<RenderConfig, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read the config file at `path`, falling back to the defaults when it
    /// does not exist. The result is validated.
    pub fn load(path: &Path) -> Result<RenderConfig, ConfigError> {
        let config = match fs::read_to_string(path) {
            Ok(text) => RenderConfig::from_toml_str(&text, path)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                RenderConfig::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        let write_err = |source: io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, text).map_err(write_err)?;
        Ok(())
    }

    /// Check everything that does not depend on the image size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let labels = self.columns.names.len();
        if labels != TIER_COUNT {
            return Err(ConfigError::ColumnCount {
                expected: TIER_COUNT,
                actual: labels,
            });
        }
        if self.colors.text.len() != labels {
            return Err(ConfigError::ColorCount {
                labels,
                colors: self.colors.text.len(),
            });
        }
        check_margin('x', self.margins.x)?;
        check_margin('y', self.margins.y)?;
        if !(self.font.size.is_finite() && self.font.size > 0.0) {
            return Err(ConfigError::FontSizeFraction(self.font.size));
        }
        if self.output.suffix.is_empty() {
            return Err(ConfigError::EmptySuffix);
        }
        Ok(())
    }

    /// Header label and text color of column `index`.
    pub fn column(&self, index: usize) -> Option<(&str, Rgb)> {
        let label = self.columns.names.get(index)?;
        let color = self.colors.text.get(index)?;
        Some((label.as_str(), *color))
    }
}

fn check_margin(axis: char, value: f64) -> Result<(), ConfigError> {
    if !(0.0..0.5).contains(&value) {
        return Err(ConfigError::MarginFraction { axis, value });
    }
    Ok(())
}
