//! Text overlay rendering.
//!
//! Rendering happens in two stages. [`plan`] turns categorized events into a
//! list of [`DrawOp`]s without touching any pixels, and [`paint`] executes
//! them on a canvas. [`render`] ties both to the files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};
use tracing::{debug, info};

use crate::config::{RenderConfig, Rgb};
use crate::error::{ConfigError, RenderError, ResourceError};
use crate::font::{fill_rect, resolve_font, ResolvedFont};
use crate::layout::{compute_columns, font_pixel_size, line_advance, ColumnLayout};
use crate::model::Tiers;

/// Appended to the file stem of the rendered copy.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "with_text";

/// Shadow displacement, right and down, in pixels.
pub const SHADOW_OFFSET: i32 = 2;

/// Strike-through thickness relative to the font pixel size.
pub const STRIKE_WIDTH_RATIO: f64 = 0.15;

/// One drawing primitive of the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    /// `text` centered on `x` with its ascender line at `y`.
    Text {
        text: String,
        x: i32,
        y: i32,
        color: Rgb,
        shadow: bool,
    },
    /// Horizontal bar over [`x0`, `x1`), `width` pixels thick, centered on `y`.
    Strike {
        x0: i32,
        x1: i32,
        y: i32,
        width: u32,
        color: Rgb,
    },
}

/// Thickness of the strike-through drawn over done events:
/// `round(font_px * 0.15)`, never thinner than 1px so small fonts still show it.
pub fn strike_width(font_px: u32) -> u32 {
    ((f64::from(font_px) * STRIKE_WIDTH_RATIO).round() as u32).max(1)
}

/// Where the rendered copy of `background` is written: `<stem><suffix><ext>`
/// in the same directory.
pub fn output_path(background: &Path, suffix: &str) -> PathBuf {
    let stem = background
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match background.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    background.with_file_name(name)
}

/// Lay out headers, numbered event lines, shadows and strikes for every tier.
///
/// Each column starts with its header at the layout's top margin and moves
/// down one line advance per row. Shadows always precede the text they
/// belong to so that they end up behind it.
pub fn plan(
    tiers: &Tiers<'_>,
    layout: &ColumnLayout,
    config: &RenderConfig,
    font: &ResolvedFont,
) -> Result<Vec<DrawOp>, ConfigError> {
    let columns = config.columns.names.len();
    if columns != tiers.tier_count() {
        return Err(ConfigError::ColumnCount {
            expected: tiers.tier_count(),
            actual: columns,
        });
    }
    if layout.centers.len() != columns {
        return Err(ConfigError::ColumnCount {
            expected: columns,
            actual: layout.centers.len(),
        });
    }

    let advance = line_advance(font.px(), config.font.line_spacing) as i32;
    let stroke = strike_width(font.px());
    let mut ops = Vec::new();

    for (tier, events) in tiers.iter() {
        let column = tier.index();
        let (label, text_color) = config.column(column).ok_or(ConfigError::ColorCount {
            labels: columns,
            colors: config.colors.text.len(),
        })?;
        let x = layout.centers[column] as i32;
        let mut y = layout.top() as i32;

        push_text(&mut ops, label, x, y, config.colors.header, config.colors.shadow);
        y += advance;

        for (rank, event) in events.iter().enumerate() {
            let line = format!("{}.{}", rank + 1, event.name());
            push_text(&mut ops, &line, x, y, text_color, config.colors.shadow);
            if event.is_done() {
                let bb = font.text_box(&line, x, y);
                ops.push(DrawOp::Strike {
                    x0: bb.left,
                    x1: bb.right,
                    y: bb.mid_y(),
                    width: stroke,
                    color: text_color,
                });
            }
            y += advance;
        }
    }

    debug!(ops = ops.len(), "planned overlay");
    Ok(ops)
}

fn push_text(ops: &mut Vec<DrawOp>, text: &str, x: i32, y: i32, color: Rgb, shadow: Rgb) {
    ops.push(DrawOp::Text {
        text: text.to_string(),
        x: x + SHADOW_OFFSET,
        y: y + SHADOW_OFFSET,
        color: shadow,
        shadow: true,
    });
    ops.push(DrawOp::Text {
        text: text.to_string(),
        x,
        y,
        color,
        shadow: false,
    });
}

/// Execute `ops` in order on `canvas`.
pub fn paint(canvas: &mut RgbaImage, ops: &[DrawOp], font: &ResolvedFont) {
    for op in ops {
        match op {
            DrawOp::Text {
                text, x, y, color, ..
            } => font.draw(canvas, text, *x, *y, color.to_rgba()),
            DrawOp::Strike {
                x0,
                x1,
                y,
                width,
                color,
            } => {
                let top = *y - (*width as i32) / 2;
                fill_rect(canvas, *x0, top, *x1, top + *width as i32, color.to_rgba());
            }
        }
    }
}

/// Draw the categorized events over a copy of `background` and return the
/// path of the copy. The background file itself is never modified.
pub fn render(
    background: &Path,
    tiers: &Tiers<'_>,
    config: &RenderConfig,
) -> Result<PathBuf, RenderError> {
    config.validate()?;

    let source = image::open(background).map_err(|source| ResourceError::OpenImage {
        path: background.to_path_buf(),
        source,
    })?;
    let keep_alpha = source.color().has_alpha();
    let mut canvas = source.to_rgba8();
    let (width, height) = canvas.dimensions();

    let layout = compute_columns(
        width,
        height,
        config.columns.names.len(),
        config.margins.x,
        config.margins.y,
    )?;
    let px = font_pixel_size(height, config.font.size)?;
    let font = resolve_font(&config.font.name, px);
    let ops = plan(tiers, &layout, config, &font)?;

    paint(&mut canvas, &ops, &font);

    let output = output_path(background, &config.output.suffix);
    save(canvas, keep_alpha, &output)?;
    info!(
        output = %output.display(),
        events = tiers.len(),
        font = ?font.source(),
        "rendered overlay"
    );
    Ok(output)
}

fn save(canvas: RgbaImage, keep_alpha: bool, output: &Path) -> Result<(), ResourceError> {
    let image = if keep_alpha {
        DynamicImage::ImageRgba8(canvas)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    };
    if let Err(source) = image.save(output) {
        if output.exists() {
            let _ = fs::remove_file(output);
        }
        return Err(ResourceError::WriteImage {
            path: output.to_path_buf(),
            source,
        });
    }
    Ok(())
}
