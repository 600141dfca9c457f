//! Property-based tests for coefficient entropy coding.
//!
//! Uses proptest to verify encoder/decoder agreement for blocks, forward
//! updates and adaptation, and the invariants of the derived tables.

use proptest::prelude::*;
use transcode_vp9_entropy::adapt::{get_prob, merge_prob, MAX_UPDATE_FACTOR};
use transcode_vp9_entropy::block::{decode_block, encode_block};
use transcode_vp9_entropy::context::context_for;
use transcode_vp9_entropy::forward_update::{decode_updates, encode_updates};
use transcode_vp9_entropy::probs::{used_cells, Cell};
use transcode_vp9_entropy::subexp::{inv_remap_prob, remap_prob};
use transcode_vp9_entropy::{
    BlockInfo, BoolDecoder, BoolEncoder, CoefCodingConfig, CoefCounts, CoefProbs, PlaneType,
    RefType, TokenCache, TokenValue, TxSize, TxType, DCT_MAX_VALUE,
};

fn tx_size_strategy() -> impl Strategy<Value = TxSize> {
    prop_oneof![
        Just(TxSize::Tx4x4),
        Just(TxSize::Tx8x8),
        Just(TxSize::Tx16x16),
        Just(TxSize::Tx32x32),
    ]
}

fn tx_type_strategy() -> impl Strategy<Value = TxType> {
    prop_oneof![
        Just(TxType::DctDct),
        Just(TxType::AdstDct),
        Just(TxType::DctAdst),
        Just(TxType::AdstAdst),
    ]
}

/// Sparse coefficient blocks with mostly small magnitudes.
fn block_strategy() -> impl Strategy<Value = (BlockInfo, Vec<i32>)> {
    (tx_size_strategy(), tx_type_strategy(), any::<bool>(), any::<bool>()).prop_flat_map(
        |(tx_size, tx_type, chroma, inter)| {
            let tx_type = if tx_size == TxSize::Tx32x32 {
                TxType::DctDct
            } else {
                tx_type
            };
            let block = BlockInfo::new(
                tx_size,
                tx_type,
                PlaneType::from_plane(chroma as usize),
                RefType::from_inter(inter),
            );
            let n = tx_size.num_coeffs();
            let coeff = prop_oneof![
                6 => Just(0i32),
                3 => -4i32..=4,
                1 => -(DCT_MAX_VALUE as i32)..=(DCT_MAX_VALUE as i32),
            ];
            (Just(block), prop::collection::vec(coeff, n))
        },
    )
}

/// Branch counts including the saturated extremes.
fn count_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        4 => 0u32..1000,
        1 => Just(0u32),
        1 => Just(u32::MAX),
        1 => any::<u32>(),
    ]
}

// =============================================================================
// Block Round-Trip Tests
// =============================================================================

proptest! {
    /// Decoding an encoded block reproduces the coefficients and the eob.
    #[test]
    fn roundtrip_block((block, coeffs) in block_strategy(), entropy_ctx in 0usize..3) {
        let probs = CoefProbs::defaults();
        let mut enc_counts = CoefCounts::new();
        let mut encoder = BoolEncoder::new();
        let eob = encode_block(
            &mut encoder, &block, &probs, &coeffs, entropy_ctx,
            &mut TokenCache::new(), Some(&mut enc_counts),
        );
        let data = encoder.finish();

        let mut dec_counts = CoefCounts::new();
        let mut decoded = vec![0i32; coeffs.len()];
        let mut decoder = BoolDecoder::new(&data).unwrap();
        let decoded_eob = decode_block(
            &mut decoder, &block, &probs, &mut decoded, entropy_ctx,
            &mut TokenCache::new(), Some(&mut dec_counts),
        ).unwrap();

        prop_assert_eq!(eob, decoded_eob);
        prop_assert_eq!(decoded, coeffs);
        prop_assert_eq!(enc_counts, dec_counts);
    }

    /// Every representable coefficient survives tokenization.
    #[test]
    fn token_value_reconstructs(coeff in -(DCT_MAX_VALUE as i32)..=(DCT_MAX_VALUE as i32)) {
        let value = TokenValue::from_coefficient(coeff);
        prop_assert_eq!(value.coefficient(), coeff);
        prop_assert!((value.extra as usize) < (1usize << value.token.extra_bit_count()).max(1));
    }

    /// Contexts always fall in 0..6, whatever the token cache holds.
    #[test]
    fn context_in_range(
        tx_size in tx_size_strategy(),
        classes in prop::collection::vec(0u8..=5, 1024),
        entropy_ctx in 0usize..3,
    ) {
        let scan = transcode_vp9_entropy::scan_for(tx_size, TxType::DctDct);
        let mut cache = TokenCache::new();
        for (pos, class) in classes.iter().enumerate() {
            cache.set(pos, *class);
        }
        for c in 0..scan.len() {
            let ctx = context_for(scan, &cache, c, entropy_ctx);
            prop_assert!(ctx < 6);
            prop_assert!(Cell::checked(PlaneType::Y, RefType::Intra, scan.band(c), ctx).is_ok());
        }
    }
}

// =============================================================================
// Probability Update Tests
// =============================================================================

proptest! {
    /// Remapping is invertible for every distinct pair.
    #[test]
    fn remap_roundtrip(old in 1u8..=255, new in 1u8..=255) {
        prop_assume!(old != new);
        prop_assert_eq!(inv_remap_prob(remap_prob(new, old), old), new);
    }

    /// Arbitrary forward updates decode to the encoder's table.
    #[test]
    fn roundtrip_forward_updates(
        changes in prop::collection::vec((0usize..132, 0usize..11, 1u8..=255), 0..40),
        compact in any::<bool>(),
    ) {
        let config = CoefCodingConfig::default().with_compact_model(compact);
        let cells: Vec<Cell> = used_cells().collect();
        let mut target = CoefProbs::defaults();
        for (cell, node, prob) in changes {
            target.set(cells[cell], node, prob as u32);
        }

        let mut probs = CoefProbs::defaults();
        let mut encoder = BoolEncoder::new();
        let written = encode_updates(&mut encoder, &mut probs, &target, &config);
        let data = encoder.finish();

        let mut decoded = CoefProbs::defaults();
        let mut decoder = BoolDecoder::new(&data).unwrap();
        let read = decode_updates(&mut decoder, &mut decoded, &config).unwrap();

        prop_assert_eq!(written, read);
        prop_assert_eq!(decoded, probs);
    }

    /// Merged probabilities stay in range and between prior and evidence.
    #[test]
    fn merge_prob_bounded(pre in 1u8..=255, c0 in count_strategy(), c1 in count_strategy()) {
        let p = merge_prob(pre, [c0, c1], MAX_UPDATE_FACTOR);
        prop_assert!(p >= 1);
        if c0 == 0 && c1 == 0 {
            prop_assert_eq!(p, pre);
        }
        let evidence = get_prob(c0 as u64, c0 as u64 + c1 as u64);
        prop_assert!(p >= pre.min(evidence) && p <= pre.max(evidence));
    }
}
