//! Uniform thumbnail grid.
//!
//! Every tile gets the same box: the largest width and height over all tiles,
//! rounded up. Columns are filled greedily for whatever width the container
//! turns out to have, so the grid reflows without a second measuring pass.
//! Rows past the row limit keep their geometry but are not painted, which
//! keeps tile indices and navigation positions identical.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::layout_engine::graph::TextDirection;
use crate::sys::geometry::{Point, Rect, Size};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    pub spacing: f64,
    pub row_limit: Option<usize>,
    pub column_limit: Option<usize>,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            spacing: 10.0,
            row_limit: None,
            column_limit: None,
        }
    }
}

/// Minimum and natural extent along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRequest {
    pub min: f64,
    pub natural: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileFrame {
    pub frame: Rect,
    pub painted: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridGeometry {
    pub tile_size: Size,
    pub columns: usize,
    pub rows: usize,
    pub used_width: f64,
    pub left_padding: f64,
    pub tiles: Vec<TileFrame>,
}

impl GridGeometry {
    /// Index of the painted tile under `pt`.
    pub fn tile_at(&self, pt: Point) -> Option<usize> {
        self.tiles.iter().position(|t| t.painted && t.frame.contains(pt))
    }

    pub fn painted_count(&self) -> usize { self.tiles.iter().filter(|t| t.painted).count() }
}

#[derive(Debug, Clone)]
pub struct GridLayoutEngine {
    settings: GridSettings,
    tile_size: Size,
    columns: usize,
    rows: usize,
}

impl GridLayoutEngine {
    pub fn new(settings: GridSettings) -> Self {
        Self {
            settings,
            tile_size: Size::new(1.0, 1.0),
            columns: 0,
            rows: 0,
        }
    }

    pub fn settings(&self) -> &GridSettings { &self.settings }

    pub fn set_column_limit(&mut self, limit: Option<usize>) { self.settings.column_limit = limit; }

    /// Grows the uniform tile box to fit every size given. Never shrinks.
    pub fn measure(&mut self, sizes: impl IntoIterator<Item = Size>) -> Size {
        for size in sizes {
            self.tile_size.width = self.tile_size.width.max(size.width);
            self.tile_size.height = self.tile_size.height.max(size.height);
        }
        self.tile_size = self.tile_size.ceil();
        self.tile_size
    }

    pub fn tile_size(&self) -> Size { self.tile_size }

    /// Columns after the last allocation.
    pub fn columns(&self) -> usize { self.columns }

    /// Rows after the last allocation, including rows that are not painted.
    pub fn rows(&self) -> usize { self.rows }

    /// Greedily fits columns into `for_width`. Returns the column count and the
    /// width they use, spacing included between but not after columns.
    pub fn compute_layout(&self, for_width: f64) -> (usize, f64) {
        let tile_width = self.tile_size.width;
        let mut columns = 0;
        let mut used_width = 0.0;
        // Left edge of the next column.
        let mut next = 0.0;
        while self.settings.column_limit.is_none_or(|limit| columns < limit)
            && next + tile_width <= for_width
        {
            used_width = next + tile_width;
            next += tile_width + self.settings.spacing;
            columns += 1;
        }
        (columns, used_width)
    }

    /// Rows needed for `count` tiles in `columns`, clamped by the row limit.
    pub fn rows_for(&self, count: usize, columns: usize) -> usize {
        let rows = if columns > 0 { count.div_ceil(columns) } else { 0 };
        match self.settings.row_limit {
            Some(limit) => rows.min(limit),
            None => rows,
        }
    }

    /// Width the grid would like, before any width constraint applies.
    pub fn preferred_width(&self, count: usize) -> SizeRequest {
        let columns = match self.settings.column_limit {
            Some(limit) => limit.min(count),
            None => count,
        };
        SizeRequest {
            min: self.tile_size.width,
            natural: span(columns, self.tile_size.width, self.settings.spacing),
        }
    }

    /// Height for `count` tiles once the grid is `for_width` wide.
    pub fn preferred_height(&self, count: usize, for_width: f64) -> SizeRequest {
        let (columns, _) = self.compute_layout(for_width);
        let rows = self.rows_for(count, columns);
        let height = span(rows, self.tile_size.height, self.settings.spacing);
        SizeRequest { min: height, natural: height }
    }

    /// Places `count` tiles inside `container`, below a header of
    /// `header_height`, and records the resulting columns and rows.
    pub fn allocate(
        &mut self,
        count: usize,
        container: Rect,
        header_height: f64,
        direction: TextDirection,
    ) -> GridGeometry {
        let (columns, used_width) = self.compute_layout(container.width());
        let left_padding = ((container.width() - used_width) / 2.0).floor();
        let Size { width: tile_w, height: tile_h } = self.tile_size;

        if columns == 0 {
            trace!(count, width = container.width(), "grid has no room for a single column");
            self.columns = 0;
            self.rows = 0;
            return GridGeometry {
                tile_size: self.tile_size,
                columns: 0,
                rows: 0,
                used_width: 0.0,
                left_padding,
                tiles: vec![
                    TileFrame {
                        frame: Rect::new(container.origin, self.tile_size),
                        painted: false,
                    };
                    count
                ],
            };
        }

        let row_start = container.min_x() + left_padding;
        let mut x = row_start;
        let mut y = container.min_y() + header_height;
        let mut column = 0;
        let mut row = 0;
        let mut tiles = Vec::with_capacity(count);

        for _ in 0..count {
            let x1 = match direction {
                TextDirection::Ltr => x.floor(),
                TextDirection::Rtl => (container.min_x() + container.max_x() - x - tile_w).floor(),
            };
            let painted = self.settings.row_limit.is_none_or(|limit| row < limit);
            tiles.push(TileFrame {
                frame: Rect::new(Point::new(x1, y.floor()), self.tile_size),
                painted,
            });

            column += 1;
            if column == columns {
                column = 0;
                row += 1;
                x = row_start;
                y += tile_h + self.settings.spacing;
            } else {
                x += tile_w + self.settings.spacing;
            }
        }

        self.columns = columns;
        self.rows = row + usize::from(column != 0);
        trace!(columns, rows = self.rows, used_width, "allocated grid");

        GridGeometry {
            tile_size: self.tile_size,
            columns,
            rows: self.rows,
            used_width,
            left_padding,
            tiles,
        }
    }
}

/// Extent of `n` cells of `cell` with `spacing` between them. Accumulates
/// the same way as [`GridLayoutEngine::compute_layout`] so that a span always
/// fits back into the same number of columns.
fn span(n: usize, cell: f64, spacing: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (1..n).fold(0.0, |edge, _| edge + (cell + spacing)) + cell
}

/// Constraints for a one-shot layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConstraints {
    pub settings: GridSettings,
    pub container: Rect,
    pub header_height: f64,
    pub direction: TextDirection,
}

/// Lays out tiles of the given sizes in one go.
pub fn layout(sizes: &[Size], constraints: &GridConstraints) -> GridGeometry {
    let mut engine = GridLayoutEngine::new(constraints.settings);
    engine.measure(sizes.iter().copied());
    engine.allocate(
        sizes.len(),
        constraints.container,
        constraints.header_height,
        constraints.direction,
    )
}
