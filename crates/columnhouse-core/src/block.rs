//! Column and Row Blocks
//!
//! [`ColumnBlock`] is the caller-owned buffer a column iterator fills on each
//! `next_batch` call. [`RowBlock`] groups one `ColumnBlock` per schema column and
//! is what the segment iterator fills; [`BlockRow`] views one of its rows through
//! the [`Row`] trait, so a decoded block can be written straight back out.

use crate::error::{Error, Result};
use crate::row::Row;
use crate::types::Datum;

/// A run of cells from one column; `None` marks a null
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnBlock {
    cells: Vec<Option<Datum>>,
}

impl ColumnBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn push(&mut self, cell: Option<Datum>) {
        self.cells.push(cell);
    }

    pub fn extend_from_slice(&mut self, cells: &[Option<Datum>]) {
        self.cells.extend_from_slice(cells);
    }

    pub fn cells(&self) -> &[Option<Datum>] {
        &self.cells
    }

    /// Value at `index`, `None` if null or out of range
    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.cells.get(index), Some(None))
    }

    pub fn into_cells(self) -> Vec<Option<Datum>> {
        self.cells
    }
}

impl From<Vec<Option<Datum>>> for ColumnBlock {
    fn from(cells: Vec<Option<Datum>>) -> Self {
        Self { cells }
    }
}

/// Equal-length column blocks, one per schema column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBlock {
    columns: Vec<ColumnBlock>,
}

impl RowBlock {
    pub fn new(num_columns: usize) -> Self {
        Self {
            columns: vec![ColumnBlock::new(); num_columns],
        }
    }

    pub fn from_columns(columns: Vec<ColumnBlock>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().position(|c| c.len() != rows) {
                return Err(Error::InvalidArgument(format!(
                    "column {} has {} rows, expected {}",
                    bad,
                    columns[bad].len(),
                    rows
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, ColumnBlock::len)
    }

    pub fn column(&self, index: usize) -> Option<&ColumnBlock> {
        self.columns.get(index)
    }

    pub fn column_mut(&mut self, index: usize) -> Option<&mut ColumnBlock> {
        self.columns.get_mut(index)
    }

    /// Clear every column, resizing to `num_columns`
    pub fn reset(&mut self, num_columns: usize) {
        self.columns.resize_with(num_columns, ColumnBlock::new);
        for column in &mut self.columns {
            column.clear();
        }
    }

    pub fn row(&self, index: usize) -> Option<BlockRow<'_>> {
        (index < self.num_rows()).then_some(BlockRow { block: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = BlockRow<'_>> {
        (0..self.num_rows()).map(move |index| BlockRow { block: self, index })
    }
}

/// One row of a [`RowBlock`]
#[derive(Debug, Clone, Copy)]
pub struct BlockRow<'a> {
    block: &'a RowBlock,
    index: usize,
}

impl BlockRow<'_> {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Row for BlockRow<'_> {
    fn num_cells(&self) -> usize {
        self.block.num_columns()
    }

    fn cell(&self, column: usize) -> Option<&Datum> {
        self.block.columns.get(column).and_then(|c| c.get(self.index))
    }
}
