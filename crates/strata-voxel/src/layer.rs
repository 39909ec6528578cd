//! Layer runs: Z-axis runs whose content is partitioned into rows along X.

use crate::block::BlockId;
use crate::row::RowRun;
use crate::run::{Content, FindResult, Run};

/// Run along the Z axis whose content is partitioned along X.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerRun {
    span: u8,
    content: Content<RowRun>,
}

impl LayerRun {
    /// Creates a uniform layer run of `span` layers of `block`.
    pub fn new(span: u8, block: BlockId) -> Self {
        Self {
            span,
            content: Content::Uniform(block),
        }
    }

    /// Row contents of this run.
    pub fn content(&self) -> &Content<RowRun> {
        &self.content
    }

    /// Row runs in X order (empty when uniform).
    pub fn rows(&self) -> &[RowRun] {
        self.content.children()
    }

    /// Returns the block at `(x, y)` within this layer.
    pub fn get(&self, x: u8, y: u8) -> BlockId {
        match self.content.child_at(x) {
            Some((_, row)) => row.get(y),
            None => self.content.uniform_block().unwrap_or_default(),
        }
    }

    /// Locates the row run covering `x`.
    pub fn find_row(&self, x: u8, resolution: u8) -> FindResult<RowRun> {
        self.content.find(x, resolution)
    }

    /// Overwrites the block at `(x, y)` without merging.
    pub fn set(&mut self, x: u8, y: u8, block: BlockId, resolution: u8) {
        self.content
            .unit_child_mut(x, resolution)
            .set(y, block, resolution);
    }

    /// Merges the row covering `x`; if it collapsed, merges this layer's rows.
    ///
    /// Returns `true` if the layer is uniform afterwards.
    pub fn cascade_merge_from(&mut self, x: u8) -> bool {
        let Some(row) = self.content.child_at_mut(x) else {
            return true;
        };
        if !row.merge() {
            return false;
        }
        self.content.merge()
    }

    /// Merges every row, then the rows themselves.
    ///
    /// Returns `true` if the layer is uniform afterwards.
    pub fn full_merge(&mut self) -> bool {
        for row in self.content.children_mut() {
            row.merge();
        }
        self.content.merge()
    }

    /// Returns a span-1 copy of the row covering `x`.
    pub fn unit_row(&self, x: u8) -> RowRun {
        match self.content.child_at(x) {
            Some((_, row)) => row.with_span(1),
            None => RowRun::new(1, self.content.uniform_block().unwrap_or_default()),
        }
    }
}

impl Run for LayerRun {
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
