//! Row Abstraction
//!
//! The segment writer appends rows one at a time, but rows reach it in two shapes:
//! - [`OwnedRow`]: a vector of cells built by the caller
//! - [`BlockRow`](crate::block::BlockRow): a view of one row inside a columnar
//!   [`RowBlock`](crate::block::RowBlock)
//!
//! Both implement [`Row`], so `SegmentWriter::append_row` is written once.
//! A cell is `None` when the value is null.

use crate::types::Datum;

/// Indexable cell accessor
pub trait Row {
    fn num_cells(&self) -> usize;

    /// Cell at `index`, `None` for null
    fn cell(&self, index: usize) -> Option<&Datum>;
}

/// Row that owns its cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnedRow {
    cells: Vec<Option<Datum>>,
}

impl OwnedRow {
    pub fn new(cells: Vec<Option<Datum>>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<Datum>] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Option<Datum>> {
        self.cells
    }
}

impl From<Vec<Option<Datum>>> for OwnedRow {
    fn from(cells: Vec<Option<Datum>>) -> Self {
        Self::new(cells)
    }
}

impl Row for OwnedRow {
    fn num_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, index: usize) -> Option<&Datum> {
        self.cells.get(index).and_then(Option::as_ref)
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn num_cells(&self) -> usize {
        (**self).num_cells()
    }

    fn cell(&self, index: usize) -> Option<&Datum> {
        (**self).cell(index)
    }
}
