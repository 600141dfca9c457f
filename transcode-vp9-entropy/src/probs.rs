//! Coefficient probability and branch count tables.
//!
//! Both tables are flat arenas of 144 cells, one per
//! `(plane, ref, band, context)`, each holding the eleven tree nodes.

use crate::default_probs::DEFAULT_COEF_PROBS;
use crate::error::{CoefError, Result};
use crate::model;
use crate::scan::TxSize;
use crate::token::NodeCounts;
use crate::{
    PlaneType, RefType, BAND_ZERO_CONTEXTS, BLOCK_TYPES, COEF_BANDS, ENTROPY_NODES,
    PREV_COEF_CONTEXTS, REF_TYPES, TX_SIZES,
};

/// Number of `(plane, ref, band, context)` cells.
pub const COEF_CELLS: usize = BLOCK_TYPES * REF_TYPES * COEF_BANDS * PREV_COEF_CONTEXTS;

/// Coordinates of one probability cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Plane class.
    pub plane: PlaneType,
    /// Reference class.
    pub ref_type: RefType,
    /// Coefficient band, 0..6.
    pub band: usize,
    /// Context, 0..6 (0..3 in band 0).
    pub ctx: usize,
}

impl Cell {
    /// Create a cell.
    pub fn new(plane: PlaneType, ref_type: RefType, band: usize, ctx: usize) -> Self {
        Self {
            plane,
            ref_type,
            band,
            ctx,
        }
    }

    /// Whether the cell can be reached by the coder.
    pub fn is_used(&self) -> bool {
        self.band < COEF_BANDS
            && self.ctx < PREV_COEF_CONTEXTS
            && (self.band > 0 || self.ctx < BAND_ZERO_CONTEXTS)
    }

    /// Arena index of the cell.
    #[inline]
    pub fn index(&self) -> usize {
        debug_assert!(self.band < COEF_BANDS && self.ctx < PREV_COEF_CONTEXTS);
        ((self.plane as usize * REF_TYPES + self.ref_type as usize) * COEF_BANDS + self.band)
            * PREV_COEF_CONTEXTS
            + self.ctx
    }

    /// Validate decoder-derived coordinates.
    pub fn checked(plane: PlaneType, ref_type: RefType, band: usize, ctx: usize) -> Result<Self> {
        if band >= COEF_BANDS {
            return Err(CoefError::BandOutOfRange(band));
        }
        let max = if band == 0 {
            BAND_ZERO_CONTEXTS
        } else {
            PREV_COEF_CONTEXTS
        };
        if ctx >= max {
            return Err(CoefError::ContextOutOfRange {
                context: ctx,
                max: max - 1,
            });
        }
        Ok(Self::new(plane, ref_type, band, ctx))
    }
}

/// All used cells in bitstream order.
pub fn used_cells() -> impl Iterator<Item = Cell> {
    PlaneType::ALL.into_iter().flat_map(|plane| {
        RefType::ALL.into_iter().flat_map(move |ref_type| {
            (0..COEF_BANDS).flat_map(move |band| {
                let contexts = if band == 0 {
                    BAND_ZERO_CONTEXTS
                } else {
                    PREV_COEF_CONTEXTS
                };
                (0..contexts).map(move |ctx| Cell::new(plane, ref_type, band, ctx))
            })
        })
    })
}

/// Node probabilities of one transform size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefProbs {
    cells: Box<[[u8; ENTROPY_NODES]; COEF_CELLS]>,
}

impl CoefProbs {
    /// Table with every node set to `prob`.
    pub fn uniform(prob: u8) -> Self {
        Self {
            cells: Box::new([[clip_prob(prob as u32); ENTROPY_NODES]; COEF_CELLS]),
        }
    }

    /// Built-in defaults, with constrained nodes expanded from node 2.
    pub fn defaults() -> Self {
        let mut table = Self::uniform(128);
        for plane in PlaneType::ALL {
            for ref_type in RefType::ALL {
                for band in 0..COEF_BANDS {
                    for ctx in 0..PREV_COEF_CONTEXTS {
                        let seed = &DEFAULT_COEF_PROBS[plane as usize][ref_type as usize][band][ctx];
                        let node_probs = table.probs_mut(Cell::new(plane, ref_type, band, ctx));
                        node_probs[..3].copy_from_slice(seed);
                        model::apply(node_probs, 3);
                    }
                }
            }
        }
        table
    }

    /// Node probabilities of a cell.
    #[inline]
    pub fn probs_for(&self, cell: Cell) -> &[u8; ENTROPY_NODES] {
        &self.cells[cell.index()]
    }

    /// Mutable node probabilities of a cell.
    #[inline]
    pub fn probs_mut(&mut self, cell: Cell) -> &mut [u8; ENTROPY_NODES] {
        &mut self.cells[cell.index()]
    }

    /// Set one node probability, clipped to [1, 255].
    pub fn set(&mut self, cell: Cell, node: usize, prob: u32) {
        self.probs_mut(cell)[node] = clip_prob(prob);
    }

    /// Re-expand the constrained nodes of every cell from its pivot node.
    pub fn apply_model(&mut self, unconstrained: usize) {
        for node_probs in self.cells.iter_mut() {
            model::apply(node_probs, unconstrained);
        }
    }

    /// Whether any node below `nodes` differs from `other` in a used cell.
    pub fn differs_from(&self, other: &CoefProbs, nodes: usize) -> bool {
        used_cells().any(|cell| self.probs_for(cell)[..nodes] != other.probs_for(cell)[..nodes])
    }
}

impl Default for CoefProbs {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Clip a probability to [1, 255].
#[inline]
pub fn clip_prob(p: u32) -> u8 {
    p.clamp(1, 255) as u8
}

/// Branch counts of one transform size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefCounts {
    cells: Box<[NodeCounts; COEF_CELLS]>,
}

impl CoefCounts {
    /// Create a zeroed count table.
    pub fn new() -> Self {
        Self {
            cells: Box::new([[[0; 2]; ENTROPY_NODES]; COEF_CELLS]),
        }
    }

    /// Count one branch decision.
    #[inline]
    pub fn record(&mut self, cell: Cell, node: usize, bit: bool) {
        self.cells[cell.index()][node][bit as usize] += 1;
    }

    /// Counts of one cell.
    #[inline]
    pub fn get(&self, cell: Cell) -> &NodeCounts {
        &self.cells[cell.index()]
    }

    /// Mutable counts of one cell.
    #[inline]
    pub fn cell_mut(&mut self, cell: Cell) -> &mut NodeCounts {
        &mut self.cells[cell.index()]
    }

    /// Add another table into this one.
    pub fn merge(&mut self, other: &CoefCounts) {
        for (dst, src) in self.cells.iter_mut().zip(other.cells.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                d[0] += s[0];
                d[1] += s[1];
            }
        }
    }

    /// Zero all counts.
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = [[0; 2]; ENTROPY_NODES]);
    }

    /// Total number of recorded decisions.
    pub fn total(&self) -> u64 {
        self.cells
            .iter()
            .flat_map(|c| c.iter())
            .map(|b| b[0] as u64 + b[1] as u64)
            .sum()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Default for CoefCounts {
    fn default() -> Self {
        Self::new()
    }
}

/// Branch counts of a frame, one table per transform size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameCounts {
    tables: [CoefCounts; TX_SIZES],
}

impl FrameCounts {
    /// Create zeroed frame counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts of one transform size.
    pub fn get(&self, tx_size: TxSize) -> &CoefCounts {
        &self.tables[tx_size.index()]
    }

    /// Mutable counts of one transform size.
    pub fn get_mut(&mut self, tx_size: TxSize) -> &mut CoefCounts {
        &mut self.tables[tx_size.index()]
    }

    /// Add another frame's counts into this one.
    pub fn merge(&mut self, other: &FrameCounts) {
        for (dst, src) in self.tables.iter_mut().zip(other.tables.iter()) {
            dst.merge(src);
        }
    }

    /// Zero all counts.
    pub fn reset(&mut self) {
        self.tables.iter_mut().for_each(CoefCounts::reset);
    }

    /// Total number of recorded decisions.
    pub fn total(&self) -> u64 {
        self.tables.iter().map(CoefCounts::total).sum()
    }
}
