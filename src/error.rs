use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// An event that does not hold its field invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("event name cannot be empty")]
    EmptyName,
    #[error("event description cannot be empty")]
    EmptyDescription,
    #[error("starting date {start} is after ending date {end}")]
    DatesOutOfOrder { start: NaiveDate, end: NaiveDate },
    #[error("{field} cannot contain a comma or a line break: {value:?}")]
    ForbiddenCharacter { field: &'static str, value: String },
}

/// Structural problems with the render configuration or the geometry it
/// produces for a given image.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("expected {expected} column labels (one per urgency tier), got {actual}")]
    ColumnCount { expected: usize, actual: usize },
    #[error("{labels} column labels but {colors} text colors")]
    ColorCount { labels: usize, colors: usize },
    #[error("margin fraction {axis} = {value} must lie in [0, 0.5)")]
    MarginFraction { axis: char, value: f64 },
    #[error("font size fraction must be a positive number, got {0}")]
    FontSizeFraction(f64),
    #[error("output suffix cannot be empty, the original image would be overwritten")]
    EmptySuffix,
    #[error("column count must be positive")]
    NoColumns,
    #[error("horizontal margins of {margin_x}px leave no room in a {width}px wide image")]
    MarginsTooWide { margin_x: u32, width: u32 },
    #[error("{columns} columns do not fit in {usable}px of usable width")]
    ColumnsTooNarrow { columns: usize, usable: u32 },
    #[error("font size fraction {fraction} gives 0px on a {height}px tall image")]
    FontTooSmall { fraction: f64, height: u32 },
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Files and external programs the renderer depends on.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to open image {path}: {source}")]
    OpenImage {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to write image {path}: {source}")]
    WriteImage {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("desktop background command `{command}` failed: {detail}")]
    Apply { command: String, detail: String },
}

impl ResourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ResourceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Everything that can stop a render.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Failures of the flat-file event store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("line {line}: {reason}")]
    Line { line: usize, reason: String },
    #[error("line {line}: {source}")]
    Invalid {
        line: usize,
        source: ValidationError,
    },
    #[error("no event at position {position}, there are {count} events")]
    NoSuchEvent { position: usize, count: usize },
}
