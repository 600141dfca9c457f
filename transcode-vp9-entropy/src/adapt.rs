//! Backward probability adaptation.
//!
//! After a frame, every coded node probability is blended with the
//! empirical branch frequency observed while coding the frame. The blend
//! weight grows with the number of observations up to a saturation count.

use crate::config::CoefCodingConfig;
use crate::probs::{used_cells, CoefCounts, CoefProbs};

/// Observation count at which the update factor saturates.
pub const COUNT_SAT: u32 = 24;

/// Update factor for key frames and regular inter frames.
pub const MAX_UPDATE_FACTOR: u32 = 112;

/// Update factor for the first frame after a key frame.
pub const MAX_UPDATE_FACTOR_AFTER_KEY: u32 = 128;

/// Frame classification driving the update factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Key frame; probabilities start from defaults.
    Key,
    /// First inter frame after a key frame.
    AfterKey,
    /// Any other inter frame.
    Inter,
}

impl FrameKind {
    /// Maximum blend weight, out of 256.
    pub fn update_factor(&self) -> u32 {
        match self {
            Self::Key | Self::Inter => MAX_UPDATE_FACTOR,
            Self::AfterKey => MAX_UPDATE_FACTOR_AFTER_KEY,
        }
    }
}

/// Probability of a `false` branch given `num` of `den` observations.
pub fn get_prob(num: u64, den: u64) -> u8 {
    if den == 0 {
        return 128;
    }
    let p = (num as u128 * 256 + (den as u128 >> 1)) / den as u128;
    p.clamp(1, 255) as u8
}

/// Blend `pre` with the branch frequency of `ct`.
pub fn merge_prob(pre: u8, ct: [u32; 2], update_factor: u32) -> u8 {
    let den = ct[0] as u64 + ct[1] as u64;
    let prob = get_prob(ct[0] as u64, den) as u32;
    let count = den.min(COUNT_SAT as u64) as u32;
    let factor = update_factor * count / COUNT_SAT;
    ((pre as u32 * (256 - factor) + prob * factor + 128) >> 8) as u8
}

/// Adapt `probs` from the pre-frame table and the frame's branch counts.
///
/// With the compact model only the unconstrained nodes are merged; the
/// remaining nodes are re-expanded from the pivot.
pub fn adapt(
    probs: &mut CoefProbs,
    pre_probs: &CoefProbs,
    counts: &CoefCounts,
    kind: FrameKind,
    config: &CoefCodingConfig,
) {
    let nodes = config.coded_nodes();
    let factor = kind.update_factor();

    for cell in used_cells() {
        let pre = pre_probs.probs_for(cell);
        let ct = counts.get(cell);
        let node_probs = probs.probs_mut(cell);
        for node in 0..nodes {
            node_probs[node] = merge_prob(pre[node], ct[node], factor);
        }
        if config.compact_model {
            crate::model::apply(node_probs, config.unconstrained_nodes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probs::Cell;
    use crate::{PlaneType, RefType};

    #[test]
    fn test_get_prob() {
        assert_eq!(get_prob(0, 0), 128);
        assert_eq!(get_prob(10, 10), 255);
        assert_eq!(get_prob(0, 10), 1);
        assert_eq!(get_prob(5, 10), 128);
        assert_eq!(get_prob(1, 3), 85);
    }

    #[test]
    fn test_merge_huge_counts() {
        // Balanced saturated counts pull towards 128, not away from it.
        let p = merge_prob(1, [u32::MAX, u32::MAX], 128);
        assert_eq!(p, 65);
        assert_eq!(merge_prob(200, [0, u32::MAX], 128), 101);
        assert_eq!(merge_prob(1, [u32::MAX, 0], 112), 112);
        assert_eq!(get_prob(u32::MAX as u64, 2 * u32::MAX as u64), 128);
    }

    #[test]
    fn test_merge_zero_counts_keeps_prior() {
        for pre in 1..=255u8 {
            assert_eq!(merge_prob(pre, [0, 0], MAX_UPDATE_FACTOR), pre);
        }
    }

    #[test]
    fn test_merge_saturated() {
        // 100 zeros, no ones: factor 112, empirical 255.
        assert_eq!(merge_prob(128, [100, 0], 112), 184);
        assert_eq!(merge_prob(128, [100, 0], 128), 192);
    }

    #[test]
    fn test_merge_partial_count() {
        // 12 observations: factor 56.
        let expected = (128 * (256 - 56) + 255 * 56 + 128) >> 8;
        assert_eq!(merge_prob(128, [12, 0], 112) as u32, expected);
    }

    #[test]
    fn test_update_factor() {
        assert_eq!(FrameKind::Key.update_factor(), 112);
        assert_eq!(FrameKind::Inter.update_factor(), 112);
        assert_eq!(FrameKind::AfterKey.update_factor(), 128);
    }

    #[test]
    fn test_adapt_full_tree() {
        let config = CoefCodingConfig::default().with_compact_model(false);
        let pre = CoefProbs::uniform(128);
        let mut probs = pre.clone();
        let mut counts = CoefCounts::new();
        let cell = Cell::new(PlaneType::Y, RefType::Inter, 2, 3);
        for _ in 0..100 {
            counts.record(cell, 7, false);
        }
        adapt(&mut probs, &pre, &counts, FrameKind::Inter, &config);
        assert_eq!(probs.probs_for(cell)[7], 184);
        assert_eq!(probs.probs_for(cell)[6], 128);
        let other = Cell::new(PlaneType::Uv, RefType::Inter, 2, 3);
        assert_eq!(probs.probs_for(other), pre.probs_for(other));
    }

    #[test]
    fn test_adapt_compact_model() {
        let config = CoefCodingConfig::default();
        let pre = CoefProbs::defaults();
        let mut probs = pre.clone();
        let mut counts = CoefCounts::new();
        let cell = Cell::new(PlaneType::Y, RefType::Intra, 1, 0);
        for _ in 0..50 {
            counts.record(cell, 2, true);
            counts.record(cell, 7, false);
        }
        adapt(&mut probs, &pre, &counts, FrameKind::Key, &config);

        let node_probs = probs.probs_for(cell);
        assert!(node_probs[2] < pre.probs_for(cell)[2]);
        assert_eq!(&node_probs[3..], &crate::model::expand(node_probs[2])[2..]);
    }
}
