//! Column runs (the Y-axis leaves) and row runs (X-axis containers of columns).
//!
//! Rows are indexed by X (the first row is X=0) and each row is composed of
//! column runs that together span the full grid resolution along Y.

use crate::block::BlockId;
use crate::run::{Content, FindResult, Run};

/// Leaf run along the Y axis. Always uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnRun {
    /// Length along Y, in cells.
    pub span: u8,
    /// Block filling the run.
    pub block: BlockId,
}

impl ColumnRun {
    /// Creates a column run of `span` cells of `block`.
    pub fn new(span: u8, block: BlockId) -> Self {
        Self { span, block }
    }
}

impl Run for ColumnRun {
    fn span(&self) -> u8 {
        self.span
    }

    fn with_span(&self, span: u8) -> Self {
        Self::new(span, self.block)
    }

    fn uniform(span: u8, block: BlockId) -> Self {
        Self::new(span, block)
    }

    fn uniform_block(&self) -> Option<BlockId> {
        Some(self.block)
    }
}

/// Run along the X axis whose content is partitioned along Y.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowRun {
    span: u8,
    content: Content<ColumnRun>,
}

impl RowRun {
    /// Creates a uniform row run of `span` rows of `block`.
    pub fn new(span: u8, block: BlockId) -> Self {
        Self {
            span,
            content: Content::Uniform(block),
        }
    }

    /// Creates a unit row run from explicit column runs, merged.
    ///
    /// # Panics
    ///
    /// Panics if `columns` is empty, holds a zero-span run, or does not
    /// span exactly `resolution` cells.
    pub fn from_columns(columns: Vec<ColumnRun>, resolution: u8) -> Self {
        assert!(!columns.is_empty(), "row needs at least one column run");
        assert!(
            columns.iter().all(|c| c.span > 0),
            "row holds a zero-span column run"
        );
        let total: u16 = columns.iter().map(|c| u16::from(c.span)).sum();
        assert!(
            total == u16::from(resolution),
            "column runs span {total} cells, expected {resolution}"
        );

        let mut row = Self {
            span: 1,
            content: Content::Partitioned(columns),
        };
        row.merge();
        row
    }

    /// Column contents of this run.
    pub fn content(&self) -> &Content<ColumnRun> {
        &self.content
    }

    /// Column runs in Y order (empty when uniform).
    pub fn columns(&self) -> &[ColumnRun] {
        self.content.children()
    }

    /// Returns the block at `y`.
    pub fn get(&self, y: u8) -> BlockId {
        match self.content.child_at(y) {
            Some((_, column)) => column.block,
            None => self.content.uniform_block().unwrap_or_default(),
        }
    }

    /// Locates the column run covering `y`.
    pub fn find_column(&self, y: u8, resolution: u8) -> FindResult<ColumnRun> {
        self.content.find(y, resolution)
    }

    /// Overwrites the block at `y`, splitting the covering column run if needed.
    pub fn set(&mut self, y: u8, block: BlockId, resolution: u8) {
        self.content.unit_child_mut(y, resolution).block = block;
    }

    /// Coalesces adjacent column runs. Returns `true` if the row became uniform.
    pub fn merge(&mut self) -> bool {
        self.content.merge()
    }

    /// Returns a span-1 column run holding the block at `y`.
    pub fn unit_column(&self, y: u8) -> ColumnRun {
        ColumnRun::new(1, self.get(y))
    }
}

impl Run for RowRun {
    fn span(&self) -> u8 {
        self.span
    }

    fn with_span(&self, span: u8) -> Self {
        Self {
            span,
            content: self.content.clone(),
        }
    }

    fn uniform(span: u8, block: BlockId) -> Self {
        Self::new(span, block)
    }

    fn uniform_block(&self) -> Option<BlockId> {
        self.content.uniform_block()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::FindTarget;

    const RES: u8 = 16;

    #[test]
    fn test_uniform_row_get() {
        let row = RowRun::new(3, BlockId(4));
        assert!(row.is_uniform());
        assert_eq!(row.get(0), BlockId(4));
        assert_eq!(row.get(15), BlockId(4));
        assert!(row.columns().is_empty());
    }

    #[test]
    fn test_set_punches_hole() {
        let mut row = RowRun::new(1, BlockId(0));
        row.set(5, BlockId(2), RES);
        assert!(!row.is_uniform());
        assert_eq!(
            row.columns(),
            &[
                ColumnRun::new(5, BlockId(0)),
                ColumnRun::new(1, BlockId(2)),
                ColumnRun::new(10, BlockId(0)),
            ]
        );
        assert_eq!(row.get(5), BlockId(2));
        assert_eq!(row.get(4), BlockId(0));
        assert_eq!(row.get(6), BlockId(0));
    }

    #[test]
    fn test_set_unit_column_overwrites_in_place() {
        let mut row = RowRun::new(1, BlockId(0));
        row.set(5, BlockId(2), RES);
        row.set(5, BlockId(3), RES);
        assert_eq!(row.columns().len(), 3);
        assert_eq!(row.get(5), BlockId(3));
    }

    #[test]
    fn test_merge_restores_uniform() {
        let mut row = RowRun::new(1, BlockId(0));
        row.set(5, BlockId(2), RES);
        row.set(5, BlockId(0), RES);
        assert!(row.merge());
        assert_eq!(row, RowRun::new(1, BlockId(0)));
    }

    #[test]
    fn test_find_column_offsets() {
        let mut row = RowRun::new(1, BlockId(0));
        assert!(matches!(
            row.find_column(7, RES).target,
            FindTarget::SynthesizedWhole(ColumnRun { span: 16, .. })
        ));
        row.set(7, BlockId(1), RES);
        let found = row.find_column(9, RES);
        assert_eq!(found.offset, 8);
        assert_eq!(found.target, FindTarget::Existing(2));
    }

    #[test]
    fn test_from_columns_merges() {
        let row = RowRun::from_columns(
            vec![
                ColumnRun::new(4, BlockId(1)),
                ColumnRun::new(4, BlockId(1)),
                ColumnRun::new(8, BlockId(0)),
            ],
            RES,
        );
        assert_eq!(
            row.columns(),
            &[ColumnRun::new(8, BlockId(1)), ColumnRun::new(8, BlockId(0))]
        );
        assert_eq!(row.get(7), BlockId(1));
        assert_eq!(row.get(8), BlockId(0));

        let whole = RowRun::from_columns(vec![ColumnRun::new(16, BlockId(3))], RES);
        assert_eq!(whole, RowRun::new(1, BlockId(3)));
    }

    #[test]
    #[should_panic(expected = "at least one column run")]
    fn test_from_columns_rejects_empty() {
        RowRun::from_columns(Vec::new(), RES);
    }

    #[test]
    #[should_panic(expected = "expected 16")]
    fn test_from_columns_rejects_short_partition() {
        RowRun::from_columns(vec![ColumnRun::new(10, BlockId(1))], RES);
    }

    #[test]
    #[should_panic(expected = "zero-span")]
    fn test_from_columns_rejects_zero_span() {
        RowRun::from_columns(
            vec![ColumnRun::new(16, BlockId(1)), ColumnRun::new(0, BlockId(2))],
            RES,
        );
    }

    #[test]
    fn test_unit_column() {
        let mut row = RowRun::new(1, BlockId(0));
        row.set(3, BlockId(8), RES);
        assert_eq!(row.unit_column(3), ColumnRun::new(1, BlockId(8)));
        assert_eq!(row.unit_column(12), ColumnRun::new(1, BlockId(0)));
    }
}
