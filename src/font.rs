//! Font resolution and text rasterizing.
//!
//! Resolution is two explicit steps: [`load_named`] looks for the configured
//! font file, and [`built_in`] provides an 8x8 bitmap face that is always
//! available. [`resolve_font`] chains them, so a render never fails because
//! a font is missing.
//!
//! Text is positioned with a "middle, ascender" anchor: the given x is the
//! horizontal center of the text's advance, the given y is the ascender line.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, UserDirs};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};
use rusttype::{point, Font, PositionedGlyph, Scale};
use tracing::{debug, warn};

/// Side of a glyph cell of the built-in face, in font units.
pub const BUILT_IN_CELL: u32 = 8;

/// Where the glyphs of a [`ResolvedFont`] come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    BuiltIn,
}

enum Face {
    Outline(Font<'static>),
    Bitmap { scale: u32 },
}

/// A font ready to draw at a fixed pixel size.
pub struct ResolvedFont {
    face: Face,
    px: u32,
    source: FontSource,
}

impl fmt::Debug for ResolvedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFont")
            .field("px", &self.px)
            .field("source", &self.source)
            .finish()
    }
}

/// Inked area of a drawn string. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl TextBox {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn mid_y(&self) -> i32 {
        (self.top + self.bottom) / 2
    }

    fn union(self, other: TextBox) -> TextBox {
        TextBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Load the named font, or the built-in face if it cannot be loaded.
pub fn resolve_font(name: &str, px: u32) -> ResolvedFont {
    match load_named(name, px) {
        Some(font) => font,
        None => {
            warn!(font = name, "font not found or unreadable, using the built-in face");
            built_in(px)
        }
    }
}

/// Look `name` up as a path, then in the usual font directories, and parse
/// the first readable candidate.
pub fn load_named(name: &str, px: u32) -> Option<ResolvedFont> {
    for path in candidates(name) {
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(_) => continue,
        };
        match Font::try_from_vec(data) {
            Some(font) => {
                debug!(path = %path.display(), px, "loaded font");
                return Some(ResolvedFont {
                    face: Face::Outline(font),
                    px,
                    source: FontSource::File(path),
                });
            }
            None => debug!(path = %path.display(), "not a usable font file"),
        }
    }
    None
}

/// The bitmap face, scaled by the largest whole factor that fits in `px`.
pub fn built_in(px: u32) -> ResolvedFont {
    ResolvedFont {
        face: Face::Bitmap {
            scale: (px / BUILT_IN_CELL).max(1),
        },
        px,
        source: FontSource::BuiltIn,
    }
}

fn candidates(name: &str) -> Vec<PathBuf> {
    let given = Path::new(name);
    let mut paths = vec![given.to_path_buf()];
    if given.is_absolute() || given.components().count() > 1 {
        return paths;
    }
    paths.extend(font_dirs().into_iter().map(|dir| dir.join(name)));
    paths
}

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(windir) = env::var_os("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    if let Some(user) = UserDirs::new() {
        if let Some(fonts) = user.font_dir() {
            dirs.push(fonts.to_path_buf());
        }
    }
    if let Some(base) = BaseDirs::new() {
        dirs.push(base.home_dir().join(".fonts"));
        dirs.push(base.data_local_dir().join("Microsoft/Windows/Fonts"));
    }
    for dir in &[
        "/Library/Fonts",
        "/System/Library/Fonts",
        "/usr/share/fonts",
        "/usr/share/fonts/truetype",
        "/usr/share/fonts/TTF",
        "/usr/share/fonts/truetype/dejavu",
        "/usr/local/share/fonts",
    ] {
        dirs.push(PathBuf::from(dir));
    }
    dirs
}

impl ResolvedFont {
    pub fn px(&self) -> u32 {
        self.px
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }

    /// Box covering the ink of `text` anchored at (`center_x`, `top`).
    pub fn text_box(&self, text: &str, center_x: i32, top: i32) -> TextBox {
        match &self.face {
            Face::Outline(font) => {
                let (glyphs, empty) = self.layout_outline(font, text, center_x, top);
                glyphs
                    .iter()
                    .filter_map(|glyph| glyph.pixel_bounding_box())
                    .map(|bb| TextBox {
                        left: bb.min.x,
                        top: bb.min.y,
                        right: bb.max.x,
                        bottom: bb.max.y,
                    })
                    .reduce(TextBox::union)
                    .unwrap_or(empty)
            }
            Face::Bitmap { scale } => {
                let (left, cell) = bitmap_origin(text, center_x, *scale);
                bitmap_pixels(text, left, top, *scale)
                    .map(|(x, y)| TextBox {
                        left: x,
                        top: y,
                        right: x + *scale as i32,
                        bottom: y + *scale as i32,
                    })
                    .reduce(TextBox::union)
                    .unwrap_or(TextBox {
                        left,
                        top,
                        right: left + cell * text.chars().count() as i32,
                        bottom: top + cell,
                    })
            }
        }
    }

    /// Draw `text` anchored at (`center_x`, `top`). Pixels outside the canvas are dropped.
    pub fn draw(&self, canvas: &mut RgbaImage, text: &str, center_x: i32, top: i32, color: Rgba<u8>) {
        match &self.face {
            Face::Outline(font) => {
                let (glyphs, _) = self.layout_outline(font, text, center_x, top);
                for glyph in &glyphs {
                    if let Some(bb) = glyph.pixel_bounding_box() {
                        glyph.draw(|gx, gy, coverage| {
                            blend(
                                canvas,
                                bb.min.x + gx as i32,
                                bb.min.y + gy as i32,
                                color,
                                coverage,
                            );
                        });
                    }
                }
            }
            Face::Bitmap { scale } => {
                let (left, _) = bitmap_origin(text, center_x, *scale);
                let side = *scale as i32;
                for (x, y) in bitmap_pixels(text, left, top, *scale) {
                    fill_rect(canvas, x, y, x + side, y + side, color);
                }
            }
        }
    }

    /// Glyphs placed for drawing, plus the box to report when none of them has ink.
    fn layout_outline<'f>(
        &self,
        font: &'f Font<'static>,
        text: &str,
        center_x: i32,
        top: i32,
    ) -> (Vec<PositionedGlyph<'f>>, TextBox) {
        let scale = Scale::uniform(self.px as f32);
        let v_metrics = font.v_metrics(scale);
        let advance = font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);

        let left = (center_x as f32 - advance / 2.0).round();
        let baseline = top as f32 + v_metrics.ascent;
        let glyphs = font.layout(text, scale, point(left, baseline)).collect();

        let empty = TextBox {
            left: left as i32,
            top,
            right: (left + advance).ceil() as i32,
            bottom: top + (v_metrics.ascent - v_metrics.descent).ceil() as i32,
        };
        (glyphs, empty)
    }
}

/// Left edge and cell size of a bitmap string centered on `center_x`.
fn bitmap_origin(text: &str, center_x: i32, scale: u32) -> (i32, i32) {
    let cell = (BUILT_IN_CELL * scale) as i32;
    let width = cell * text.chars().count() as i32;
    (center_x - width / 2, cell)
}

fn bitmap_glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Top-left corner of every inked `scale`-sized square of a bitmap string.
fn bitmap_pixels(text: &str, left: i32, top: i32, scale: u32) -> impl Iterator<Item = (i32, i32)> + '_ {
    let side = scale as i32;
    let cell = BUILT_IN_CELL as i32 * side;
    text.chars().enumerate().flat_map(move |(i, ch)| {
        let rows = bitmap_glyph(ch);
        let origin = left + i as i32 * cell;
        (0..8).flat_map(move |row| {
            (0..8)
                .filter(move |col| rows[row] & (1 << col) != 0)
                .map(move |col| (origin + col * side, top + row as i32 * side))
        })
    })
}

/// Mix `color` into the pixel at (x, y) by `coverage` in [0, 1].
pub(crate) fn blend(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0);
    if alpha == 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let inv = 1.0 - alpha;
    for channel in 0..3 {
        dst.0[channel] = (color.0[channel] as f32 * alpha + dst.0[channel] as f32 * inv).round() as u8;
    }
    dst.0[3] = 255;
}

/// Paint the half-open rectangle [x0, x1) x [y0, y1) with `color`.
pub(crate) fn fill_rect(canvas: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    for y in y0..y1 {
        for x in x0..x1 {
            blend(canvas, x, y, color, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_falls_back_to_built_in() {
        let font = resolve_font("no-such-font-anywhere.ttf", 16);
        assert_eq!(font.source(), &FontSource::BuiltIn);
        assert_eq!(font.px(), 16);
    }

    #[test]
    fn garbage_font_file_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"definitely not a font").unwrap();
        assert!(load_named(path.to_str().unwrap(), 16).is_none());
        assert_eq!(
            resolve_font(path.to_str().unwrap(), 16).source(),
            &FontSource::BuiltIn
        );
    }

    #[test]
    fn built_in_box_is_centered_and_top_aligned() {
        let font = built_in(16);
        // 'H' inks columns 0..=5 and rows 0..=6 of its 8x8 cell, at scale 2.
        let bb = font.text_box("H", 100, 40);
        assert_eq!(bb.left, 92);
        assert_eq!(bb.top, 40);
        assert_eq!(bb.right, 92 + 12);
        assert_eq!(bb.bottom, 40 + 14);
        assert_eq!(bb.mid_y(), 47);
    }

    #[test]
    fn built_in_box_spans_every_character() {
        let font = built_in(8);
        let one = font.text_box("H", 0, 0);
        let three = font.text_box("HHH", 0, 0);
        assert_eq!(three.width(), one.width() + 16);
        assert_eq!(three.height(), one.height());
    }

    #[test]
    fn blank_text_still_has_a_box() {
        let font = built_in(16);
        let bb = font.text_box("  ", 50, 10);
        assert_eq!(bb, TextBox { left: 34, top: 10, right: 66, bottom: 26 });
    }

    #[test]
    fn draw_paints_inside_the_box_only() {
        let font = built_in(16);
        let mut canvas = RgbaImage::from_pixel(200, 80, Rgba([0, 0, 0, 255]));
        let red = Rgba([255, 0, 0, 255]);
        font.draw(&mut canvas, "Hi", 100, 20, red);

        let bb = font.text_box("Hi", 100, 20);
        let mut painted = 0;
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if *pixel == red {
                painted += 1;
                let (x, y) = (x as i32, y as i32);
                assert!(x >= bb.left && x < bb.right && y >= bb.top && y < bb.bottom);
            }
        }
        assert!(painted > 0);
    }

    #[test]
    fn drawing_off_canvas_is_clipped() {
        let font = built_in(16);
        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        font.draw(&mut canvas, "WWWWWW", 5, -4, Rgba([255, 255, 255, 255]));
        fill_rect(&mut canvas, -3, -3, 30, 2, Rgba([1, 2, 3, 255]));
        assert_eq!(*canvas.get_pixel(9, 1), Rgba([1, 2, 3, 255]));
    }

    const OUTLINE_CANDIDATES: &[&str] = &[
        "DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "arial.ttf",
        "Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
    ];

    fn outline_font(px: u32) -> Option<ResolvedFont> {
        let font = OUTLINE_CANDIDATES
            .iter()
            .find_map(|name| load_named(name, px));
        if font.is_none() {
            eprintln!("no TrueType font installed, skipping");
        }
        font
    }

    #[test]
    fn outline_text_is_centered_below_the_ascender() {
        let font = match outline_font(40) {
            Some(font) => font,
            None => return,
        };
        assert!(matches!(font.source(), FontSource::File(_)));

        let bb = font.text_box("Hello", 200, 50);
        assert!(bb.top >= 50, "{:?}", bb);
        assert!(bb.bottom <= 50 + 2 * 40, "{:?}", bb);
        assert!(bb.width() > 0 && bb.height() > 0, "{:?}", bb);
        let ink_center = (bb.left + bb.right) / 2;
        assert!((ink_center - 200).abs() <= 10, "{:?}", bb);
    }

    #[test]
    fn outline_drawing_stays_inside_its_box() {
        let font = match outline_font(40) {
            Some(font) => font,
            None => return,
        };
        let background = Rgba([0, 0, 0, 255]);
        let mut canvas = RgbaImage::from_pixel(400, 160, background);
        font.draw(&mut canvas, "Hello", 200, 50, Rgba([255, 255, 255, 255]));

        let bb = font.text_box("Hello", 200, 50);
        let mut painted = 0;
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if *pixel != background {
                painted += 1;
                let (x, y) = (x as i32, y as i32);
                assert!(
                    x >= bb.left && x < bb.right && y >= bb.top && y < bb.bottom,
                    "({}, {}) outside {:?}",
                    x,
                    y,
                    bb
                );
            }
        }
        assert!(painted > 0);
    }
}
