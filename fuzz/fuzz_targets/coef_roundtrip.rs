#![no_main]

//! Fuzz target for encoder/decoder agreement.
//!
//! Encodes arbitrary coefficient blocks and checks the decoder reproduces
//! them together with the branch counts.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use transcode_vp9_entropy::block::{decode_block, encode_block};
use transcode_vp9_entropy::{
    BlockInfo, BoolDecoder, BoolEncoder, CoefCounts, CoefProbs, PlaneType, RefType, TokenCache,
    TxSize, TxType, DCT_MAX_VALUE,
};

#[derive(Arbitrary, Debug)]
struct RoundtripInput {
    tx_size: u8,
    tx_type: u8,
    chroma: bool,
    inter: bool,
    entropy_ctx: u8,
    coeffs: Vec<(u16, i16)>,
}

fuzz_target!(|input: RoundtripInput| {
    let tx_size = TxSize::ALL[input.tx_size as usize % 4];
    let tx_type = [TxType::DctDct, TxType::AdstDct, TxType::DctAdst, TxType::AdstAdst]
        [input.tx_type as usize % 4];
    // 32x32 transforms are always DCT_DCT.
    let tx_type = if tx_size == TxSize::Tx32x32 { TxType::DctDct } else { tx_type };
    let block = BlockInfo::new(
        tx_size,
        tx_type,
        PlaneType::from_plane(input.chroma as usize),
        RefType::from_inter(input.inter),
    );

    let n = tx_size.num_coeffs();
    let mut coeffs = vec![0i32; n];
    for (pos, value) in input.coeffs.iter().take(n) {
        let limit = DCT_MAX_VALUE as i32;
        coeffs[*pos as usize % n] = (*value as i32).clamp(-limit, limit);
    }
    let entropy_ctx = input.entropy_ctx as usize % 3;

    let probs = CoefProbs::defaults();
    let mut enc_counts = CoefCounts::new();
    let mut writer = BoolEncoder::new();
    let eob = encode_block(
        &mut writer,
        &block,
        &probs,
        &coeffs,
        entropy_ctx,
        &mut TokenCache::new(),
        Some(&mut enc_counts),
    );
    let data = writer.finish();

    let mut dec_counts = CoefCounts::new();
    let mut decoded = vec![0i32; n];
    let mut reader = BoolDecoder::new(&data).unwrap();
    let decoded_eob = decode_block(
        &mut reader,
        &block,
        &probs,
        &mut decoded,
        entropy_ctx,
        &mut TokenCache::new(),
        Some(&mut dec_counts),
    )
    .unwrap();

    assert_eq!(eob, decoded_eob);
    assert_eq!(coeffs, decoded);
    assert_eq!(enc_counts, dec_counts);
});
