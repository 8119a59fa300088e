//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Integer scaling truncates toward zero, matching the codec's own geometry
//! arithmetic, and uses 64-bit intermediates. Geometry that does not fit in
//! `u32` yields `None` rather than wrapping.

use super::params::{CropRect, MontageParams, MONTAGE_SHADOW_OFFSET};

/// Scale `other` by `target / reference`, truncating.
fn scale(other: u32, target: u32, reference: u32) -> Option<u32> {
    u32::try_from(other as u64 * target as u64 / reference as u64).ok()
}

/// Calculate thumbnail dimensions: the longer side becomes `max_size`.
///
/// Returns `None` for an empty source or a zero target.
///
/// ```
/// # use postpic::imaging::calculations::thumbnail_dimensions;
/// assert_eq!(thumbnail_dimensions((1600, 1200), 400), Some((400, 300)));
/// assert_eq!(thumbnail_dimensions((1200, 1600), 400), Some((300, 400)));
/// ```
pub fn thumbnail_dimensions(source: (u32, u32), max_size: u32) -> Option<(u32, u32)> {
    let (w, h) = source;
    if w == 0 || h == 0 || max_size == 0 {
        return None;
    }
    if w >= h {
        Some((max_size, scale(h, max_size, w)?.max(1)))
    } else {
        Some((scale(w, max_size, h)?.max(1), max_size))
    }
}

/// Resize-then-crop plan that turns any source into a `size × size` square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquarePlan {
    /// Intermediate size: the shorter side equals the target size.
    pub scaled: (u32, u32),
    /// Centered window on the longer axis.
    pub crop: CropRect,
}

/// Calculate the square-crop plan for a source.
///
/// The shorter side is scaled to `size`; the longer side is scaled by the
/// same factor and then center-cropped with offset `(scaled_longer - size) / 2`.
/// Returns `None` when the scaled longer side would not fit in `u32`.
pub fn square_plan(source: (u32, u32), size: u32) -> Option<SquarePlan> {
    let (w, h) = source;
    if w == 0 || h == 0 || size == 0 {
        return None;
    }
    let (scaled, x, y) = if w >= h {
        let scaled_w = scale(w, size, h)?;
        ((scaled_w, size), (scaled_w - size) / 2, 0)
    } else {
        let scaled_h = scale(h, size, w)?;
        ((size, scaled_h), 0, (scaled_h - size) / 2)
    };
    Some(SquarePlan {
        scaled,
        crop: CropRect {
            x,
            y,
            width: size,
            height: size,
        },
    })
}

/// Clamp a crop window to the source bounds.
///
/// Returns `None` when the window does not overlap the image at all.
pub fn clamp_crop(source: (u32, u32), rect: CropRect) -> Option<CropRect> {
    let (w, h) = source;
    if rect.x >= w || rect.y >= h || rect.width == 0 || rect.height == 0 {
        return None;
    }
    Some(CropRect {
        x: rect.x,
        y: rect.y,
        width: rect.width.min(w - rect.x),
        height: rect.height.min(h - rect.y),
    })
}

/// Number of clockwise quarter turns when `degrees` is a multiple of 90.
pub fn quarter_turns(degrees: f64) -> Option<u32> {
    let normalized = degrees.rem_euclid(360.0);
    let turns = (normalized / 90.0).round();
    if (normalized - turns * 90.0).abs() < 1e-9 {
        Some(turns as u32 % 4)
    } else {
        None
    }
}

/// Canvas size that holds a `width × height` image rotated by `degrees`.
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    match quarter_turns(degrees) {
        Some(0) | Some(2) => (width, height),
        Some(_) => (height, width),
        None => {
            let theta = degrees.to_radians();
            let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
            let (w, h) = (width as f64, height as f64);
            // Shave float noise so exact fits are not rounded up a pixel.
            let bw = (w * cos + h * sin - 1e-6).ceil().max(1.0);
            let bh = (w * sin + h * cos - 1e-6).ceil().max(1.0);
            (bw as u32, bh as u32)
        }
    }
}

/// Grid geometry of a montage.
///
/// ```text
/// ┌──────────────────────────────┐
/// │ title band (if any)          │
/// ├──────────┬──────────┬────────┤
/// │ spacing  │          │        │
/// │  ┌cell┐  │  ┌cell┐  │  ...   │
/// │  └────┘  │  └────┘  │        │
/// └──────────┴──────────┴────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MontageLayout {
    pub columns: u32,
    pub rows: u32,
    /// Cell size: the largest tile plus room for its shadow.
    pub cell_width: u32,
    pub cell_height: u32,
    pub spacing: u32,
    pub title_height: u32,
    pub shadow_offset: u32,
    pub width: u32,
    pub height: u32,
}

impl MontageLayout {
    /// Plan a grid for tiles of the given sizes.
    ///
    /// Returns `None` for no tiles, zero columns, or a sheet whose size does
    /// not fit in `u32`.
    pub fn plan(tiles: &[(u32, u32)], params: &MontageParams) -> Option<Self> {
        if tiles.is_empty() || params.columns == 0 {
            return None;
        }
        let count = u32::try_from(tiles.len()).ok()?;
        let columns = params.columns;
        let rows = count.div_ceil(columns);
        let shadow_offset = if params.shadow { MONTAGE_SHADOW_OFFSET } else { 0 };
        let cell_width = tiles.iter().map(|t| t.0).max()?.checked_add(shadow_offset)?;
        let cell_height = tiles.iter().map(|t| t.1).max()?.checked_add(shadow_offset)?;
        let spacing = params.spacing;
        let margins = spacing.checked_mul(2)?;
        let title_height = if params.title.trim().is_empty() {
            0
        } else {
            let band = (params.title_font_size * 1.2).ceil();
            if !(0.0..=u32::MAX as f32).contains(&band) {
                return None;
            }
            (band as u32).checked_add(spacing)?
        };
        let width = columns.checked_mul(cell_width.checked_add(margins)?)?;
        let height = rows
            .checked_mul(cell_height.checked_add(margins)?)?
            .checked_add(title_height)?;

        Some(Self {
            columns,
            rows,
            cell_width,
            cell_height,
            spacing,
            title_height,
            shadow_offset,
            width,
            height,
        })
    }

    /// Top-left corner of the cell holding tile `index` (row-major).
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        let (col, row) = (index % self.columns, index / self.columns);
        (
            col * (self.cell_width + 2 * self.spacing) + self.spacing,
            self.title_height + row * (self.cell_height + 2 * self.spacing) + self.spacing,
        )
    }

    /// Where a tile of `size` is drawn so it sits centered in its cell.
    pub fn tile_origin(&self, index: usize, size: (u32, u32)) -> (u32, u32) {
        let (cx, cy) = self.cell_origin(index);
        let free_w = self.cell_width - self.shadow_offset - size.0;
        let free_h = self.cell_height - self.shadow_offset - size.1;
        (cx + free_w / 2, cy + free_h / 2)
    }
}
