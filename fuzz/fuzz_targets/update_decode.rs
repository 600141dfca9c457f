#![no_main]

//! Fuzz target for forward probability update parsing.
//!
//! Every probability that survives an update pass must stay within 1..=255.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use transcode_vp9_entropy::probs::used_cells;
use transcode_vp9_entropy::{BoolDecoder, CoefCodingConfig, FrameCoefContext, FrameKind, TxSize};

#[derive(Arbitrary, Debug)]
struct UpdateInput {
    data: Vec<u8>,
    max_tx_size: u8,
    compact_model: bool,
    three_nodes: bool,
}

fuzz_target!(|input: UpdateInput| {
    if input.data.len() > 64 * 1024 {
        return;
    }

    let config = CoefCodingConfig::default()
        .with_compact_model(input.compact_model)
        .with_unconstrained_nodes(if input.three_nodes { 3 } else { 2 });
    let Ok(mut ctx) = FrameCoefContext::new(config) else {
        return;
    };
    ctx.begin_frame(FrameKind::Key);

    let Ok(mut reader) = BoolDecoder::new(&input.data) else {
        return;
    };
    let max_tx_size = TxSize::ALL[input.max_tx_size as usize % 4];
    if ctx.read_updates(&mut reader, max_tx_size).is_err() {
        return;
    }

    for tx_size in TxSize::ALL {
        for cell in used_cells() {
            assert!(ctx.probs(tx_size).probs_for(cell).iter().all(|&p| p >= 1));
        }
    }
});
