//! Compact coefficient probability model.
//!
//! Coefficient magnitudes above one are modelled as a geometric family with
//! ratio `q = 1 - p / 256`, where `p` is the probability of the ONE branch.
//! Every constrained node probability is then a closed-form function of `p`,
//! tabulated here for all 256 model values. Only the unconstrained nodes are
//! signalled or adapted; the rest are expanded from the pivot node.
//!
//! The reference VP9 codec uses a tabulated Pareto family instead. Both sides
//! of this crate expand through the same table, so coding is self-consistent,
//! but expanded probabilities differ from the reference and streams are not
//! interchangeable with it.

use crate::ENTROPY_NODES;

/// Number of model values.
pub const COEFPROB_MODELS: usize = 256;

/// Unity in the Q16 arithmetic used to build the table.
const ONE_Q16: u64 = 1 << 16;

/// Nodes covered by a table row: 1..=10.
pub const MODEL_NODES: usize = ENTROPY_NODES - 1;

const fn pow_q16(q: u64, n: u32) -> u64 {
    let mut acc = ONE_Q16;
    let mut i = 0;
    while i < n {
        acc = (acc * q + (ONE_Q16 >> 1)) >> 16;
        i += 1;
    }
    acc
}

/// `P(magnitude < base + k | magnitude >= base) = 1 - q^k` in Q16.
const fn head(q: u64, k: u32) -> u64 {
    ONE_Q16 - pow_q16(q, k)
}

/// `num / den` as a probability in 1/256 units, clipped to [1, 255].
const fn ratio_prob(num: u64, den: u64) -> u8 {
    let p = if den == 0 { 128 } else { (num * 256 + (den >> 1)) / den };
    if p < 1 {
        1
    } else if p > 255 {
        255
    } else {
        p as u8
    }
}

const fn model_row(model: usize) -> [u8; MODEL_NODES] {
    let p = if model == 0 { 1 } else { model as u64 };
    let q = ONE_Q16 - (p << 8);
    let m = p as u8;

    [
        m,
        m,
        ratio_prob(head(q, 3), ONE_Q16),
        ratio_prob(head(q, 1), head(q, 3)),
        ratio_prob(head(q, 1), head(q, 2)),
        ratio_prob(head(q, 6), ONE_Q16),
        ratio_prob(head(q, 2), head(q, 6)),
        ratio_prob(head(q, 24), ONE_Q16),
        ratio_prob(head(q, 8), head(q, 24)),
        ratio_prob(head(q, 32), ONE_Q16),
    ]
}

const fn build_model_table() -> [[u8; MODEL_NODES]; COEFPROB_MODELS] {
    let mut table = [[0u8; MODEL_NODES]; COEFPROB_MODELS];
    let mut m = 0;
    while m < COEFPROB_MODELS {
        table[m] = model_row(m);
        m += 1;
    }
    table
}

/// Node 1..=10 probabilities for each model value.
pub static MODEL_TABLE: [[u8; MODEL_NODES]; COEFPROB_MODELS] = build_model_table();

/// Expand a model value into probabilities for nodes 1..=10.
#[inline]
pub fn expand(model: u8) -> &'static [u8; MODEL_NODES] {
    &MODEL_TABLE[model as usize]
}

/// Overwrite the constrained nodes of `node_probs` from its pivot node.
///
/// `unconstrained` is the number of explicitly coded nodes (2 or 3); the
/// pivot is the last of them.
pub fn apply(node_probs: &mut [u8; ENTROPY_NODES], unconstrained: usize) {
    debug_assert!((2..=3).contains(&unconstrained));
    let row = expand(node_probs[unconstrained - 1]);
    node_probs[unconstrained..].copy_from_slice(&row[unconstrained - 1..]);
}
