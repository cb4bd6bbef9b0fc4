use tracing::debug;

use crate::error::ConfigError;

/// Column geometry for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub margin_x: u32,
    pub margin_y: u32,
    pub column_width: u32,
    /// Horizontal center of each column, left to right.
    pub centers: Vec<u32>,
}

impl ColumnLayout {
    /// y coordinate shared by every column header.
    pub fn top(&self) -> u32 {
        self.margin_y
    }
}

/// Split an image into `columns` equal columns inside proportional margins.
///
/// Margins are floored fractions of the image size; the usable width left
/// between the horizontal margins is divided evenly (flooring again) and
/// each column is addressed by its center.
pub fn compute_columns(
    width: u32,
    height: u32,
    columns: usize,
    margin_x_fraction: f64,
    margin_y_fraction: f64,
) -> Result<ColumnLayout, ConfigError> {
    if columns == 0 {
        return Err(ConfigError::NoColumns);
    }

    let margin_x = proportion(width, margin_x_fraction);
    let margin_y = proportion(height, margin_y_fraction);

    if u64::from(margin_x) * 2 >= u64::from(width) {
        return Err(ConfigError::MarginsTooWide { margin_x, width });
    }
    let usable = width - 2 * margin_x;
    let column_width = usable / columns as u32;
    if column_width == 0 {
        return Err(ConfigError::ColumnsTooNarrow { columns, usable });
    }

    let centers = (0..columns as u32)
        .map(|i| margin_x + column_width / 2 + column_width * i)
        .collect();

    let layout = ColumnLayout {
        margin_x,
        margin_y,
        column_width,
        centers,
    };
    debug!(width, height, ?layout, "computed column layout");
    Ok(layout)
}

/// Pixel size of the overlay font for an image `height` pixels tall.
pub fn font_pixel_size(height: u32, size_fraction: f64) -> Result<u32, ConfigError> {
    let px = proportion(height, size_fraction);
    if px == 0 {
        return Err(ConfigError::FontTooSmall {
            fraction: size_fraction,
            height,
        });
    }
    Ok(px)
}

/// Vertical distance between two consecutive rows of a column.
pub fn line_advance(font_px: u32, line_spacing: u32) -> u32 {
    font_px + line_spacing
}

fn proportion(length: u32, fraction: f64) -> u32 {
    (f64::from(length) * fraction).floor() as u32
}
