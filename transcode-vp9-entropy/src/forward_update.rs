//! Forward probability updates.
//!
//! Before any coefficient of a frame is coded, each transform size may
//! carry explicit probability updates: one presence bit, then for every
//! coded node of every used cell an update flag and, when set, a
//! subexponential-coded new probability.

use crate::adapt::get_prob;
use crate::bool_coder::{BitSink, BitSource};
use crate::config::CoefCodingConfig;
use crate::error::Result;
use crate::model;
use crate::probs::{used_cells, Cell, CoefCounts, CoefProbs};
use crate::subexp::{
    branch_cost, cost_one, cost_zero, prob_diff_cost, read_prob_diff, write_prob_diff,
};
use crate::COEF_UPDATE_PROB;

/// Encoder-side choice of forward updates for one transform size.
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    /// Target probabilities; equal to the old table where nothing changes.
    pub probs: CoefProbs,
    /// Number of node updates.
    pub updates: usize,
    /// Estimated net savings in 1/256 bit.
    pub savings: i64,
}

impl UpdatePlan {
    /// Whether the plan signals any update.
    pub fn has_updates(&self) -> bool {
        self.updates > 0
    }
}

/// Best new probability for a node and the bits it would save.
///
/// Candidates run from the empirical probability towards `old`; the saving
/// accounts for the update flag and the subexponential code.
pub fn savings_search(ct: [u32; 2], old: u8) -> (i64, u8) {
    let old_cost = branch_cost(ct, old) as i64;
    let flag_cost = cost_one(COEF_UPDATE_PROB) as i64 - cost_zero(COEF_UPDATE_PROB) as i64;
    let start = get_prob(ct[0] as u64, ct[0] as u64 + ct[1] as u64);

    let mut best = (0i64, old);
    let mut candidate = start;
    while candidate != old {
        let new_cost = branch_cost(ct, candidate) as i64;
        let update_cost = prob_diff_cost(candidate, old) as i64 + flag_cost;
        let savings = old_cost - new_cost - update_cost;
        if savings > best.0 {
            best = (savings, candidate);
        }
        candidate = if candidate > old {
            candidate - 1
        } else {
            candidate + 1
        };
    }
    best
}

/// Choose forward updates for one transform size from the frame's counts.
pub fn search_updates(old: &CoefProbs, counts: &CoefCounts, config: &CoefCodingConfig) -> UpdatePlan {
    let nodes = config.coded_nodes();
    let flag_zero = cost_zero(COEF_UPDATE_PROB) as i64;
    let mut probs = old.clone();
    let mut updates = 0;
    let mut savings = 0i64;

    for cell in used_cells() {
        let ct = counts.get(cell);
        for node in 0..nodes {
            let oldp = old.probs_for(cell)[node];
            let (s, newp) = savings_search(ct[node], oldp);
            if s > 0 && newp != oldp {
                savings += s - flag_zero;
                probs.probs_mut(cell)[node] = newp;
                updates += 1;
            } else {
                savings -= flag_zero;
            }
        }
    }

    if updates == 0 || savings < 0 {
        return UpdatePlan {
            probs: old.clone(),
            updates: 0,
            savings: 0,
        };
    }

    if config.compact_model {
        for cell in used_cells() {
            if probs.probs_for(cell)[..nodes] != old.probs_for(cell)[..nodes] {
                model::apply(probs.probs_mut(cell), config.unconstrained_nodes);
            }
        }
    }

    UpdatePlan {
        probs,
        updates,
        savings,
    }
}

fn set_coded(probs: &mut CoefProbs, cell: Cell, node: usize, prob: u8) {
    probs.probs_mut(cell)[node] = prob;
}

/// Write the updates taking `probs` to `target`, and apply them to `probs`.
///
/// Only coded nodes are compared; with the compact model the constrained
/// nodes of updated cells are re-expanded exactly as the decoder does.
/// Returns the number of node updates written.
pub fn encode_updates<W: BitSink + ?Sized>(
    writer: &mut W,
    probs: &mut CoefProbs,
    target: &CoefProbs,
    config: &CoefCodingConfig,
) -> usize {
    let nodes = config.coded_nodes();
    if !target.differs_from(probs, nodes) {
        writer.write_bit(false);
        return 0;
    }
    writer.write_bit(true);

    let mut updates = 0;
    for cell in used_cells() {
        let mut cell_updated = false;
        for node in 0..nodes {
            let oldp = probs.probs_for(cell)[node];
            let newp = target.probs_for(cell)[node];
            let update = newp != oldp;
            writer.write_bool(update, COEF_UPDATE_PROB);
            if update {
                write_prob_diff(writer, newp, oldp);
                set_coded(probs, cell, node, newp);
                cell_updated = true;
                updates += 1;
            }
        }
        if cell_updated && config.compact_model {
            model::apply(probs.probs_mut(cell), config.unconstrained_nodes);
        }
    }
    updates
}

/// Read updates for one transform size and apply them to `probs`.
///
/// Returns the number of node updates read.
pub fn decode_updates<R: BitSource + ?Sized>(
    reader: &mut R,
    probs: &mut CoefProbs,
    config: &CoefCodingConfig,
) -> Result<usize> {
    if !reader.read_bit()? {
        return Ok(0);
    }

    let nodes = config.coded_nodes();
    let mut updates = 0;
    for cell in used_cells() {
        let mut cell_updated = false;
        for node in 0..nodes {
            if reader.read_bool(COEF_UPDATE_PROB)? {
                let oldp = probs.probs_for(cell)[node];
                let newp = read_prob_diff(reader, oldp)?;
                set_coded(probs, cell, node, newp);
                cell_updated = true;
                updates += 1;
            }
        }
        if cell_updated && config.compact_model {
            model::apply(probs.probs_mut(cell), config.unconstrained_nodes);
        }
    }
    Ok(updates)
}
