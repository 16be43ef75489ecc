use std::num::NonZeroU32;

use crate::image_util::Rect;

#[derive(Debug, Clone, thiserror::Error)]
#[error("a {rows}x{columns} grid is too fine for a {width}x{height}px source, parts would be {part_width}x{part_height}px")]
pub struct GridError {
    pub rows: u32,
    pub columns: u32,
    pub width: u32,
    pub height: u32,
    pub part_width: u32,
    pub part_height: u32,
}

/// Rows x columns partition applied to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: NonZeroU32,
    columns: NonZeroU32,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(NonZeroU32::MIN, NonZeroU32::MIN)
    }
}

impl Grid {
    pub const fn new(rows: NonZeroU32, columns: NonZeroU32) -> Self {
        Self { rows, columns }
    }

    pub fn try_new(rows: u32, columns: u32) -> Option<Self> {
        Some(Self::new(NonZeroU32::new(rows)?, NonZeroU32::new(columns)?))
    }

    pub const fn rows(&self) -> u32 {
        self.rows.get()
    }

    pub const fn columns(&self) -> u32 {
        self.columns.get()
    }

    pub const fn cell_count(&self) -> usize {
        self.rows() as usize * self.columns() as usize
    }

    /// Computes the part size for a `width` x `height` source.
    pub fn layout(&self, width: u32, height: u32) -> Result<GridLayout, GridError> {
        let part_width = width / self.columns();
        let part_height = height / self.rows();

        if part_width == 0 || part_height == 0 {
            return Err(GridError {
                rows: self.rows(),
                columns: self.columns(),
                width,
                height,
                part_width,
                part_height,
            });
        }

        Ok(GridLayout {
            grid: *self,
            source_width: width,
            source_height: height,
            part_width,
            part_height,
        })
    }
}

/// A single grid cell. Cells are numbered in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartCell {
    pub row: u32,
    pub column: u32,
    pub index: usize,
}

/// A [`Grid`] resolved against concrete source dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    grid: Grid,
    source_width: u32,
    source_height: u32,
    part_width: u32,
    part_height: u32,
}

impl GridLayout {
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    pub const fn part_width(&self) -> u32 {
        self.part_width
    }

    pub const fn part_height(&self) -> u32 {
        self.part_height
    }

    pub fn cells(&self) -> impl Iterator<Item = PartCell> {
        let columns = self.grid.columns();

        (0..self.grid.rows()).flat_map(move |row| {
            (0..columns).map(move |column| PartCell {
                row,
                column,
                index: row as usize * columns as usize + column as usize,
            })
        })
    }

    pub const fn rect(&self, cell: PartCell) -> Rect {
        Rect::new(
            cell.column * self.part_width,
            cell.row * self.part_height,
            self.part_width,
            self.part_height,
        )
    }

    /// Area of the source that ends up in any part, anchored at the origin.
    pub const fn covered(&self) -> (u32, u32) {
        (
            self.part_width * self.grid.columns(),
            self.part_height * self.grid.rows(),
        )
    }

    /// Number of trailing source columns and rows that no part includes.
    pub const fn dropped(&self) -> (u32, u32) {
        let (width, height) = self.covered();
        (self.source_width - width, self.source_height - height)
    }
}
