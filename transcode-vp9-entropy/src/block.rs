//! Per-block coefficient token coding.
//!
//! A transform block is coded in scan order: each position derives its band
//! and context, codes one token with the cell's node probabilities, and
//! stores its energy class in the token cache for later contexts. Coding
//! stops after the last nonzero coefficient with an EOB token, unless the
//! block is full.

use crate::bool_coder::{BitSink, BitSource};
use crate::context::{context_for, try_context_for, TokenCache};
use crate::error::Result;
use crate::probs::{Cell, CoefCounts, CoefProbs};
use crate::scan::{scan_for, ScanOrder, TxSize, TxType};
use crate::token::{count_token, decode_token, encode_token, Token, TokenValue};
use crate::{PlaneType, RefType, TX_SIZES};

/// Geometry and classification of one transform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Transform size.
    pub tx_size: TxSize,
    /// Predicted transform type.
    pub tx_type: TxType,
    /// Plane class.
    pub plane: PlaneType,
    /// Reference class.
    pub ref_type: RefType,
}

impl BlockInfo {
    /// Create block info.
    pub fn new(tx_size: TxSize, tx_type: TxType, plane: PlaneType, ref_type: RefType) -> Self {
        Self {
            tx_size,
            tx_type,
            plane,
            ref_type,
        }
    }

    /// Scan order of the block.
    pub fn scan_order(&self) -> &'static ScanOrder {
        scan_for(self.tx_size, self.tx_type)
    }

    fn cell(&self, band: usize, ctx: usize) -> Cell {
        Cell::new(self.plane, self.ref_type, band, ctx)
    }
}

/// A tokenized coefficient waiting to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodedToken {
    /// Token, extra bits and sign.
    pub value: TokenValue,
    /// Transform size selecting the probability table.
    pub tx_size: TxSize,
    /// Probability cell.
    pub cell: Cell,
    /// Whether the EOB branch is implied.
    pub skip_eob: bool,
}

impl CodedToken {
    /// Sentinel closing the tokens of one superblock.
    pub const END_OF_SUPERBLOCK: Self = Self {
        value: TokenValue {
            token: Token::EndOfSuperblock,
            extra: 0,
            negative: false,
        },
        tx_size: TxSize::Tx4x4,
        cell: Cell {
            plane: PlaneType::Y,
            ref_type: RefType::Intra,
            band: 0,
            ctx: 0,
        },
        skip_eob: false,
    };

    /// Whether this is the superblock sentinel.
    pub fn is_end_of_superblock(&self) -> bool {
        self.value.token == Token::EndOfSuperblock
    }
}

/// End of block: one past the last nonzero coefficient in scan order.
pub fn eob_of(scan: &ScanOrder, coeffs: &[i32]) -> usize {
    (0..scan.len())
        .rev()
        .find(|&c| coeffs[scan.position(c)] != 0)
        .map_or(0, |c| c + 1)
}

/// Walk the tokens of a block in coding order.
///
/// `emit` receives the cell, the token and the skip-EOB flag of every token,
/// including the final EOB when the block is not full. Returns the eob.
fn visit_tokens(
    block: &BlockInfo,
    coeffs: &[i32],
    entropy_ctx: usize,
    cache: &mut TokenCache,
    mut emit: impl FnMut(Cell, TokenValue, bool),
) -> usize {
    let scan = block.scan_order();
    assert!(
        coeffs.len() >= scan.len(),
        "coefficient buffer holds {} values, block needs {}",
        coeffs.len(),
        scan.len()
    );

    let eob = eob_of(scan, coeffs);
    let mut skip_eob = false;
    for c in 0..eob {
        let pos = scan.position(c);
        let ctx = context_for(scan, cache, c, entropy_ctx);
        let value = TokenValue::from_coefficient(coeffs[pos]);
        emit(block.cell(scan.band(c), ctx), value, skip_eob);
        cache.set(pos, value.token.energy_class());
        skip_eob = value.token == Token::Zero;
    }

    if eob < scan.len() {
        let ctx = context_for(scan, cache, eob, entropy_ctx);
        emit(block.cell(scan.band(eob), ctx), TokenValue::EOB, false);
    }
    eob
}

/// Code the coefficients of one block, given in raster order.
///
/// Branch decisions are counted into `counts` when given. Returns the eob,
/// which the caller stores in the entropy context.
pub fn encode_block<W: BitSink + ?Sized>(
    writer: &mut W,
    block: &BlockInfo,
    probs: &CoefProbs,
    coeffs: &[i32],
    entropy_ctx: usize,
    cache: &mut TokenCache,
    mut counts: Option<&mut CoefCounts>,
) -> usize {
    visit_tokens(block, coeffs, entropy_ctx, cache, |cell, value, skip_eob| {
        let node_counts = counts.as_deref_mut().map(|t| t.cell_mut(cell));
        encode_token(writer, &value, probs.probs_for(cell), skip_eob, node_counts);
    })
}

/// Tokenize a block for later writing with [`write_tokens`].
///
/// Counts are recorded at tokenization time, so forward updates can be
/// searched before the tokens are written.
pub fn tokenize_block(
    block: &BlockInfo,
    coeffs: &[i32],
    entropy_ctx: usize,
    cache: &mut TokenCache,
    mut counts: Option<&mut CoefCounts>,
    out: &mut Vec<CodedToken>,
) -> usize {
    visit_tokens(block, coeffs, entropy_ctx, cache, |cell, value, skip_eob| {
        if let Some(counts) = counts.as_deref_mut() {
            count_token(value.token, skip_eob, counts.cell_mut(cell));
        }
        out.push(CodedToken {
            value,
            tx_size: block.tx_size,
            cell,
            skip_eob,
        });
    })
}

/// Write tokens up to and including the next superblock sentinel.
///
/// Returns the number of entries consumed.
pub fn write_tokens<W: BitSink + ?Sized>(
    writer: &mut W,
    tokens: &[CodedToken],
    probs: &[CoefProbs; TX_SIZES],
) -> usize {
    for (i, token) in tokens.iter().enumerate() {
        if token.is_end_of_superblock() {
            return i + 1;
        }
        let node_probs = probs[token.tx_size.index()].probs_for(token.cell);
        encode_token(writer, &token.value, node_probs, token.skip_eob, None);
    }
    tokens.len()
}

/// Decode the coefficients of one block into `coeffs` in raster order.
///
/// Positions after the eob are zeroed. Returns the eob.
pub fn decode_block<R: BitSource + ?Sized>(
    reader: &mut R,
    block: &BlockInfo,
    probs: &CoefProbs,
    coeffs: &mut [i32],
    entropy_ctx: usize,
    cache: &mut TokenCache,
    mut counts: Option<&mut CoefCounts>,
) -> Result<usize> {
    let scan = block.scan_order();
    assert!(
        coeffs.len() >= scan.len(),
        "coefficient buffer holds {} values, block needs {}",
        coeffs.len(),
        scan.len()
    );
    coeffs[..scan.len()].fill(0);

    let mut skip_eob = false;
    let mut c = 0;
    while c < scan.len() {
        let ctx = try_context_for(scan, cache, c, entropy_ctx)?;
        let cell = Cell::checked(block.plane, block.ref_type, scan.band(c), ctx)?;
        let node_counts = counts.as_deref_mut().map(|t| t.cell_mut(cell));
        let value = decode_token(reader, probs.probs_for(cell), skip_eob, node_counts)?;
        if value.token == Token::EndOfBlock {
            break;
        }

        let pos = scan.position(c);
        coeffs[pos] = value.coefficient();
        cache.set(pos, value.token.energy_class());
        skip_eob = value.token == Token::Zero;
        c += 1;
    }
    Ok(c)
}
