//! Run-length machinery shared by every level of the hierarchy.
//!
//! Each level compresses one axis. Its content is either a single uniform run
//! covering the whole extent, or an ordered partition into child runs whose
//! spans add up to that extent. Split, find, and merge are written once here
//! and reused by column, row, and layer runs alike.

use crate::block::BlockId;

/// A contiguous span of cells along one axis.
pub trait Run: Clone {
    /// Length of this run along its axis, in cells.
    fn span(&self) -> u8;

    /// Copy of this run (content included) with a different span.
    fn with_span(&self, span: u8) -> Self;

    /// A uniform run of `block` covering `span` cells.
    fn uniform(span: u8, block: BlockId) -> Self;

    /// The block filling this run, or `None` if it is partitioned further.
    fn uniform_block(&self) -> Option<BlockId>;

    /// Returns `true` if the run holds a single block and no children.
    fn is_uniform(&self) -> bool {
        self.uniform_block().is_some()
    }

    /// Punches a one-cell hole into this run at absolute coordinate `at`.
    ///
    /// `run_start` is the absolute coordinate of the first cell of the run.
    /// Returns up to three runs: the cells before `at`, the unit run at `at`,
    /// and the cells after it. Every piece carries a copy of this run's content.
    ///
    /// # Panics
    ///
    /// Panics if the run has zero span or `at` lies outside it.
    fn split(&self, at: u8, run_start: u8) -> Split<Self> {
        let span = self.span();
        let end = u16::from(run_start) + u16::from(span);
        assert!(span > 0, "cannot split a run of zero span");
        assert!(
            at >= run_start && u16::from(at) < end,
            "split point {at} outside run [{run_start}, {end})"
        );

        let before = (at > run_start).then(|| self.with_span(at - run_start));
        let main = self.with_span(1);
        let after_span = (end - u16::from(at) - 1) as u8;
        let after = (after_span > 0).then(|| self.with_span(after_span));

        Split {
            before,
            main,
            after,
        }
    }
}

/// The result of [`Run::split`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split<C> {
    /// Cells between the run start and the split point, if any.
    pub before: Option<C>,
    /// The unit run at the split point.
    pub main: C,
    /// Cells after the split point, if any.
    pub after: Option<C>,
}

impl<C> Split<C> {
    /// Position of `main` in [`Split::into_vec`].
    pub fn main_index(&self) -> usize {
        usize::from(self.before.is_some())
    }

    /// All pieces in axis order.
    pub fn into_vec(self) -> Vec<C> {
        let mut runs = Vec::with_capacity(3);
        runs.extend(self.before);
        runs.push(self.main);
        runs.extend(self.after);
        runs
    }
}

/// Where the run covering a coordinate lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FindTarget<C> {
    /// Index into the stored children.
    Existing(usize),
    /// The level is uniform: a temporary run standing for the whole extent.
    /// It is not attached to any children sequence.
    SynthesizedWhole(C),
}

/// The run covering a coordinate together with its starting offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindResult<C> {
    /// Absolute coordinate of the first cell of the run.
    pub offset: u8,
    /// The run itself.
    pub target: FindTarget<C>,
}

/// Contents of one level: a single block, or an ordered partition into runs.
///
/// A `Partitioned` sequence is never empty and its spans sum to the extent of
/// the level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content<C> {
    /// Every cell holds the same block.
    Uniform(BlockId),
    /// Mixed: defer to the child runs.
    Partitioned(Vec<C>),
}

impl<C: Run> Content<C> {
    /// The block filling the level, or `None` when partitioned.
    pub fn uniform_block(&self) -> Option<BlockId> {
        match self {
            Self::Uniform(block) => Some(*block),
            Self::Partitioned(_) => None,
        }
    }

    /// Returns `true` if the level holds a single block and no children.
    pub fn is_uniform(&self) -> bool {
        matches!(self, Self::Uniform(_))
    }

    /// The child runs in axis order (empty when uniform).
    pub fn children(&self) -> &[C] {
        match self {
            Self::Uniform(_) => &[],
            Self::Partitioned(children) => children,
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut [C] {
        match self {
            Self::Uniform(_) => &mut [],
            Self::Partitioned(children) => children,
        }
    }

    /// Sum of the child spans (0 when uniform).
    pub fn span_total(&self) -> u16 {
        self.children().iter().map(|c| u16::from(c.span())).sum()
    }

    /// Returns the stored child covering `coord` and its start offset.
    ///
    /// Returns `None` only when the level is uniform.
    ///
    /// # Panics
    ///
    /// Panics if the partition does not cover `coord`; the structure is corrupt.
    pub fn child_at(&self, coord: u8) -> Option<(u8, &C)> {
        let Self::Partitioned(children) = self else {
            return None;
        };
        let index = covering_index(children, coord);
        Some((index.0, &children[index.1]))
    }

    /// Mutable variant of [`Content::child_at`].
    pub fn child_at_mut(&mut self, coord: u8) -> Option<&mut C> {
        let Self::Partitioned(children) = self else {
            return None;
        };
        let (_, index) = covering_index(children, coord);
        Some(&mut children[index])
    }

    /// Locates the run covering `coord` within a level spanning `extent` cells.
    ///
    /// A uniform level yields [`FindTarget::SynthesizedWhole`].
    ///
    /// # Panics
    ///
    /// Panics if `coord` is not covered.
    pub fn find(&self, coord: u8, extent: u8) -> FindResult<C> {
        match self {
            Self::Uniform(block) => {
                assert!(coord < extent, "coordinate {coord} outside extent {extent}");
                FindResult {
                    offset: 0,
                    target: FindTarget::SynthesizedWhole(C::uniform(extent, *block)),
                }
            }
            Self::Partitioned(children) => {
                let (offset, index) = covering_index(children, coord);
                FindResult {
                    offset,
                    target: FindTarget::Existing(index),
                }
            }
        }
    }

    /// Returns the unit run at `coord`, splitting the covering run if needed.
    ///
    /// A uniform level becomes partitioned. The caller owns merging afterwards.
    pub fn unit_child_mut(&mut self, coord: u8, extent: u8) -> &mut C {
        let FindResult { offset, target } = self.find(coord, extent);
        let index = match target {
            FindTarget::Existing(index) => index,
            FindTarget::SynthesizedWhole(whole) => {
                *self = Self::Partitioned(vec![whole]);
                0
            }
        };
        let Self::Partitioned(children) = self else {
            unreachable!("content partitioned above");
        };

        if children[index].span() == 1 {
            return &mut children[index];
        }

        let split = children[index].split(coord, offset);
        let main = index + split.main_index();
        children.splice(index..=index, split.into_vec());
        &mut children[main]
    }

    /// Coalesces adjacent uniform children with equal blocks and collapses the
    /// level to uniform when a single uniform run remains.
    ///
    /// Returns `true` if the level is uniform afterwards.
    pub fn merge(&mut self) -> bool {
        let Self::Partitioned(children) = self else {
            return true;
        };
        let merged = merge_adjacent(std::mem::take(children));
        assert!(!merged.is_empty(), "merged an empty run partition");

        let collapsed = match merged.as_slice() {
            [only] => only.uniform_block(),
            _ => None,
        };
        *self = match collapsed {
            Some(block) => Self::Uniform(block),
            None => Self::Partitioned(merged),
        };
        self.is_uniform()
    }
}

/// Returns `(offset, index)` of the child covering `coord`.
fn covering_index<C: Run>(children: &[C], coord: u8) -> (u8, usize) {
    let mut offset: u16 = 0;
    for (index, child) in children.iter().enumerate() {
        let end = offset + u16::from(child.span());
        if u16::from(coord) < end {
            return (offset as u8, index);
        }
        offset = end;
    }
    panic!("coordinate {coord} not covered by runs spanning {offset} cells");
}

/// Scans `children` left to right, joining consecutive uniform runs that hold
/// the same block into one run with the summed span.
///
/// Partitioned children break the pending run and pass through unchanged.
pub fn merge_adjacent<C: Run>(children: Vec<C>) -> Vec<C> {
    let mut merged = Vec::with_capacity(children.len());
    let mut pending: Option<(BlockId, u8)> = None;

    for child in children {
        match child.uniform_block() {
            Some(block) => {
                if let Some((pending_block, span)) = pending.as_mut()
                    && *pending_block == block
                {
                    *span += child.span();
                } else if let Some((block, span)) = pending.replace((block, child.span())) {
                    merged.push(C::uniform(span, block));
                }
            }
            None => {
                if let Some((block, span)) = pending.take() {
                    merged.push(C::uniform(span, block));
                }
                merged.push(child);
            }
        }
    }

    if let Some((block, span)) = pending {
        merged.push(C::uniform(span, block));
    }
    merged
}
