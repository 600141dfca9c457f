#![no_main]

//! Fuzz target for coefficient token decoding.
//!
//! Decodes arbitrary data as a sequence of transform blocks. Decoding must
//! fail cleanly or produce coefficients within the representable range.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use transcode_vp9_entropy::{
    BlockInfo, BoolDecoder, CoefCodingConfig, EntropyContext, FrameCoefContext, FrameKind,
    PlaneType, RefType, TokenCache, TxSize, TxType, DCT_MAX_VALUE,
};

#[derive(Arbitrary, Debug)]
struct CoefInput {
    data: Vec<u8>,
    blocks: Vec<BlockShape>,
    mode: DecodeMode,
}

#[derive(Arbitrary, Debug)]
struct BlockShape {
    tx_size: u8,
    tx_type: u8,
    chroma: bool,
    inter: bool,
}

#[derive(Arbitrary, Debug)]
enum DecodeMode {
    /// Default probabilities
    Defaults,
    /// Forward updates precede the tokens
    WithUpdates,
    /// Tokens, then adaptation and a second pass
    Adapt,
}

impl BlockShape {
    fn info(&self) -> BlockInfo {
        let tx_size = TxSize::ALL[self.tx_size as usize % 4];
        let tx_type = [TxType::DctDct, TxType::AdstDct, TxType::DctAdst, TxType::AdstAdst]
            [self.tx_type as usize % 4];
        // 32x32 transforms are always DCT_DCT.
        let tx_type = if tx_size == TxSize::Tx32x32 { TxType::DctDct } else { tx_type };
        BlockInfo::new(
            tx_size,
            tx_type,
            PlaneType::from_plane(self.chroma as usize),
            RefType::from_inter(self.inter),
        )
    }
}

fn decode_blocks(ctx: &mut FrameCoefContext, reader: &mut BoolDecoder, blocks: &[BlockShape]) {
    let mut entropy = EntropyContext::new(16, 16);
    let mut cache = TokenCache::new();
    let mut coeffs = [0i32; 1024];
    for (i, shape) in blocks.iter().enumerate() {
        let info = shape.info();
        let col = (i * info.tx_size.units()) % 16;
        let entropy_ctx = entropy.context(col, 0, info.tx_size);
        match ctx.decode_block(reader, &info, &mut coeffs, entropy_ctx, &mut cache) {
            Ok(eob) => {
                assert!(eob <= info.tx_size.num_coeffs());
                assert!(coeffs.iter().all(|c| c.unsigned_abs() <= DCT_MAX_VALUE));
                entropy.set(col, 0, info.tx_size, eob);
            }
            Err(_) => return,
        }
    }
}

fuzz_target!(|input: CoefInput| {
    // Limit input size to prevent OOM
    if input.data.len() > 1024 * 1024 || input.blocks.len() > 256 {
        return;
    }

    let Ok(mut ctx) = FrameCoefContext::new(CoefCodingConfig::default()) else {
        return;
    };
    ctx.begin_frame(FrameKind::Key);
    let Ok(mut reader) = BoolDecoder::new(&input.data) else {
        return;
    };

    match input.mode {
        DecodeMode::Defaults => decode_blocks(&mut ctx, &mut reader, &input.blocks),
        DecodeMode::WithUpdates => {
            if ctx.read_updates(&mut reader, TxSize::Tx32x32).is_ok() {
                decode_blocks(&mut ctx, &mut reader, &input.blocks);
            }
        }
        DecodeMode::Adapt => {
            decode_blocks(&mut ctx, &mut reader, &input.blocks);
            ctx.end_frame();
            ctx.begin_frame(FrameKind::AfterKey);
            decode_blocks(&mut ctx, &mut reader, &input.blocks);
            ctx.end_frame();
        }
    }
});
