//! Coefficient context derivation.
//!
//! The context of a coefficient is derived from the energy classes of
//! previously coded neighbors in the same block (via the token cache), or,
//! for the first scan position, from the above/left entropy-context flags of
//! neighboring transform blocks.

use crate::error::{CoefError, Result};
use crate::scan::{ScanOrder, TxSize};
use crate::PREV_COEF_CONTEXTS;

/// Largest energy class.
const MAX_ENERGY_CLASS: usize = 5;

/// Number of distinct first-position contexts.
pub const FIRST_POSITION_CONTEXTS: usize = 3;

const fn build_combine() -> [[u8; MAX_ENERGY_CLASS + 1]; MAX_ENERGY_CLASS + 1] {
    let mut table = [[0u8; MAX_ENERGY_CLASS + 1]; MAX_ENERGY_CLASS + 1];
    let mut a = 0;
    while a <= MAX_ENERGY_CLASS {
        let mut b = 0;
        while b <= MAX_ENERGY_CLASS {
            table[a][b] = ((1 + a + b) >> 1) as u8;
            b += 1;
        }
        a += 1;
    }
    table
}

/// Context from the energy classes of two neighbors.
///
/// A single neighbor is stored twice, which makes the entry its own class.
pub static COMBINE: [[u8; MAX_ENERGY_CLASS + 1]; MAX_ENERGY_CLASS + 1] = build_combine();

/// Per-block scratch of energy classes, indexed by raster position.
#[derive(Debug, Clone)]
pub struct TokenCache {
    classes: Vec<u8>,
}

impl TokenCache {
    /// Create a cache large enough for any transform size.
    pub fn new() -> Self {
        Self {
            classes: vec![0; TxSize::Tx32x32.num_coeffs()],
        }
    }

    /// Zero the entries used by a block of `tx_size`.
    pub fn reset(&mut self, tx_size: TxSize) {
        self.classes[..tx_size.num_coeffs()].fill(0);
    }

    /// Store the energy class of the token coded at `pos`.
    #[inline]
    pub fn set(&mut self, pos: usize, class: u8) {
        self.classes[pos] = class;
    }

    /// Energy class stored at `pos`.
    #[inline]
    pub fn get(&self, pos: usize) -> u8 {
        self.classes[pos]
    }

    fn try_get(&self, pos: usize) -> Result<usize> {
        let class = *self
            .classes
            .get(pos)
            .ok_or_else(|| CoefError::index_out_of_range("token cache position", pos))?;
        Ok(class as usize)
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Context of scan index `c`.
///
/// `entropy_ctx` is the first-position context from [`EntropyContext::context`]
/// and is only used when `c == 0`.
#[inline]
pub fn context_for(scan: &ScanOrder, cache: &TokenCache, c: usize, entropy_ctx: usize) -> usize {
    if c == 0 {
        debug_assert!(entropy_ctx < FIRST_POSITION_CONTEXTS);
        return entropy_ctx;
    }
    let nb = scan.neighbors(c);
    let a = cache.get(nb.positions()[0] as usize) as usize;
    let b = cache.get(*nb.positions().last().unwrap_or(&0) as usize) as usize;
    COMBINE[a][b] as usize
}

/// Range-checked [`context_for`] used on the decode path.
pub fn try_context_for(
    scan: &ScanOrder,
    cache: &TokenCache,
    c: usize,
    entropy_ctx: usize,
) -> Result<usize> {
    if c == 0 {
        if entropy_ctx >= FIRST_POSITION_CONTEXTS {
            return Err(CoefError::ContextOutOfRange {
                context: entropy_ctx,
                max: FIRST_POSITION_CONTEXTS - 1,
            });
        }
        return Ok(entropy_ctx);
    }
    if c >= scan.len() {
        return Err(CoefError::index_out_of_range("scan index", c));
    }

    let positions = scan.neighbors(c).positions();
    let (first, last) = match positions {
        [] => return Err(CoefError::index_out_of_range("neighbor count", 0)),
        [only] => (*only, *only),
        [first, .., last] => (*first, *last),
    };
    let a = cache.try_get(first as usize)?;
    let b = cache.try_get(last as usize)?;
    let ctx = COMBINE
        .get(a)
        .and_then(|row| row.get(b))
        .map(|&ctx| ctx as usize)
        .ok_or(CoefError::ContextOutOfRange {
            context: (1 + a + b) >> 1,
            max: PREV_COEF_CONTEXTS - 1,
        })?;
    Ok(ctx)
}

/// Above/left nonzero flags of one plane, in 4x4 units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntropyContext {
    above: Vec<bool>,
    left: Vec<bool>,
}

impl EntropyContext {
    /// Create a context covering `cols` x `rows` 4x4 units.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            above: vec![false; cols],
            left: vec![false; rows],
        }
    }

    /// Width in 4x4 units.
    pub fn cols(&self) -> usize {
        self.above.len()
    }

    /// Height in 4x4 units.
    pub fn rows(&self) -> usize {
        self.left.len()
    }

    /// Clear all flags.
    pub fn reset(&mut self) {
        self.reset_above();
        self.reset_left();
    }

    /// Clear the above flags (tile start).
    pub fn reset_above(&mut self) {
        self.above.fill(false);
    }

    /// Clear the left flags (superblock row start).
    pub fn reset_left(&mut self) {
        self.left.fill(false);
    }

    fn any(flags: &[bool], start: usize, units: usize) -> bool {
        let end = (start + units).min(flags.len());
        flags.get(start..end).is_some_and(|f| f.iter().any(|&nz| nz))
    }

    fn fill(flags: &mut [bool], start: usize, units: usize, value: bool) {
        let end = (start + units).min(flags.len());
        if let Some(f) = flags.get_mut(start..end) {
            f.fill(value);
        }
    }

    /// First-position context of a transform block at (`col`, `row`).
    ///
    /// Units past the plane edge read as zero.
    pub fn context(&self, col: usize, row: usize, tx_size: TxSize) -> usize {
        let units = tx_size.units();
        Self::any(&self.above, col, units) as usize + Self::any(&self.left, row, units) as usize
    }

    /// Record the end-of-block position of a coded transform block.
    pub fn set(&mut self, col: usize, row: usize, tx_size: TxSize, eob: usize) {
        let units = tx_size.units();
        Self::fill(&mut self.above, col, units, eob > 0);
        Self::fill(&mut self.left, row, units, eob > 0);
    }
}
