//! Per-frame coefficient coding state.
//!
//! [`FrameCoefContext`] owns the probability tables of every transform
//! size, the pre-frame snapshot used by backward adaptation, and the frame's
//! branch counts. Encoder and decoder drive it through the same lifecycle:
//!
//! 1. `begin_frame`: key frames reload the defaults; the tables are snapshotted
//! 2. `write_updates` / `read_updates`: forward updates for each transform size
//! 3. block coding, which records branch counts
//! 4. `end_frame`: backward adaptation

use tracing::{debug, trace, warn};

use crate::adapt::{adapt, FrameKind};
use crate::block::{decode_block, encode_block, tokenize_block, write_tokens, BlockInfo, CodedToken};
use crate::bool_coder::{BitSink, BitSource};
use crate::config::CoefCodingConfig;
use crate::context::TokenCache;
use crate::error::Result;
use crate::forward_update::{decode_updates, encode_updates, search_updates};
use crate::probs::{CoefProbs, FrameCounts};
use crate::scan::TxSize;
use crate::TX_SIZES;

/// Coefficient probability state carried from frame to frame.
#[derive(Debug, Clone)]
pub struct FrameCoefContext {
    /// Coding configuration shared with the peer.
    config: CoefCodingConfig,
    /// Current probabilities, per transform size.
    probs: [CoefProbs; TX_SIZES],
    /// Probabilities at the start of the frame, before forward updates.
    pre_probs: [CoefProbs; TX_SIZES],
    /// Branch counts of the current frame.
    counts: FrameCounts,
    /// Kind of the current frame.
    frame_kind: FrameKind,
    /// Frames completed since the last reset.
    frames_coded: u64,
}

fn default_tables() -> [CoefProbs; TX_SIZES] {
    [
        CoefProbs::defaults(),
        CoefProbs::defaults(),
        CoefProbs::defaults(),
        CoefProbs::defaults(),
    ]
}

impl FrameCoefContext {
    /// Create a context loaded with the default probabilities.
    pub fn new(config: CoefCodingConfig) -> Result<Self> {
        config.validate()?;
        let probs = default_tables();
        Ok(Self {
            config,
            pre_probs: probs.clone(),
            probs,
            counts: FrameCounts::new(),
            frame_kind: FrameKind::Key,
            frames_coded: 0,
        })
    }

    /// Coding configuration.
    pub fn config(&self) -> &CoefCodingConfig {
        &self.config
    }

    /// Fail unless `peer` was configured identically.
    pub fn check_compatible(&self, peer: &CoefCodingConfig) -> Result<()> {
        self.config.check_compatible(peer)
    }

    /// Reload the default probabilities and clear the counts.
    pub fn reset_to_defaults(&mut self) {
        if self.counts.total() > 0 {
            warn!(
                pending = self.counts.total(),
                "Resetting coefficient probabilities with unadapted counts"
            );
        }
        self.probs = default_tables();
        self.pre_probs = self.probs.clone();
        self.counts.reset();
        self.frames_coded = 0;
    }

    /// Start a frame: reset on key frames, snapshot the tables, clear counts.
    pub fn begin_frame(&mut self, kind: FrameKind) {
        if kind == FrameKind::Key {
            self.reset_to_defaults();
        }
        self.frame_kind = kind;
        self.pre_probs = self.probs.clone();
        self.counts.reset();
        trace!(?kind, frame = self.frames_coded, "Begin coefficient frame");
    }

    /// Kind of the current frame.
    pub fn frame_kind(&self) -> FrameKind {
        self.frame_kind
    }

    /// Current probabilities of one transform size.
    pub fn probs(&self, tx_size: TxSize) -> &CoefProbs {
        &self.probs[tx_size.index()]
    }

    /// Current probabilities of every transform size.
    pub fn probs_set(&self) -> &[CoefProbs; TX_SIZES] {
        &self.probs
    }

    /// Branch counts recorded so far in this frame.
    pub fn counts(&self) -> &FrameCounts {
        &self.counts
    }

    /// Mutable branch counts, e.g. for merging tile counts.
    pub fn counts_mut(&mut self) -> &mut FrameCounts {
        &mut self.counts
    }

    /// Search and write forward updates for transform sizes up to `max_tx_size`.
    ///
    /// The search uses the counts recorded so far, so blocks should be
    /// tokenized first. Returns the number of node updates written.
    pub fn write_updates<W: BitSink + ?Sized>(&mut self, writer: &mut W, max_tx_size: TxSize) -> usize {
        let mut total = 0;
        for tx_size in TxSize::ALL.into_iter().filter(|t| *t <= max_tx_size) {
            let idx = tx_size.index();
            let plan = search_updates(&self.probs[idx], self.counts.get(tx_size), &self.config);
            let updates = encode_updates(writer, &mut self.probs[idx], &plan.probs, &self.config);
            trace!(?tx_size, updates, savings = plan.savings, "Wrote coefficient updates");
            total += updates;
        }
        debug!(updates = total, "Forward coefficient updates written");
        total
    }

    /// Read forward updates for transform sizes up to `max_tx_size`.
    ///
    /// Returns the number of node updates read.
    pub fn read_updates<R: BitSource + ?Sized>(&mut self, reader: &mut R, max_tx_size: TxSize) -> Result<usize> {
        let mut total = 0;
        for tx_size in TxSize::ALL.into_iter().filter(|t| *t <= max_tx_size) {
            let updates = decode_updates(reader, &mut self.probs[tx_size.index()], &self.config)?;
            trace!(?tx_size, updates, "Read coefficient updates");
            total += updates;
        }
        debug!(updates = total, "Forward coefficient updates read");
        Ok(total)
    }

    /// Code one block with the current probabilities, recording counts.
    pub fn encode_block<W: BitSink + ?Sized>(
        &mut self,
        writer: &mut W,
        block: &BlockInfo,
        coeffs: &[i32],
        entropy_ctx: usize,
        cache: &mut TokenCache,
    ) -> usize {
        encode_block(
            writer,
            block,
            &self.probs[block.tx_size.index()],
            coeffs,
            entropy_ctx,
            cache,
            Some(self.counts.get_mut(block.tx_size)),
        )
    }

    /// Tokenize one block, recording counts.
    pub fn tokenize_block(
        &mut self,
        block: &BlockInfo,
        coeffs: &[i32],
        entropy_ctx: usize,
        cache: &mut TokenCache,
        out: &mut Vec<CodedToken>,
    ) -> usize {
        tokenize_block(
            block,
            coeffs,
            entropy_ctx,
            cache,
            Some(self.counts.get_mut(block.tx_size)),
            out,
        )
    }

    /// Write tokenized blocks up to the next superblock sentinel.
    pub fn write_tokens<W: BitSink + ?Sized>(&self, writer: &mut W, tokens: &[CodedToken]) -> usize {
        write_tokens(writer, tokens, &self.probs)
    }

    /// Decode one block with the current probabilities, recording counts.
    pub fn decode_block<R: BitSource + ?Sized>(
        &mut self,
        reader: &mut R,
        block: &BlockInfo,
        coeffs: &mut [i32],
        entropy_ctx: usize,
        cache: &mut TokenCache,
    ) -> Result<usize> {
        decode_block(
            reader,
            block,
            &self.probs[block.tx_size.index()],
            coeffs,
            entropy_ctx,
            cache,
            Some(self.counts.get_mut(block.tx_size)),
        )
    }

    /// Finish a frame, adapting the probabilities from its counts.
    pub fn end_frame(&mut self) {
        if self.config.backward_adaptation {
            for tx_size in TxSize::ALL {
                let idx = tx_size.index();
                adapt(
                    &mut self.probs[idx],
                    &self.pre_probs[idx],
                    self.counts.get(tx_size),
                    self.frame_kind,
                    &self.config,
                );
            }
            debug!(
                kind = ?self.frame_kind,
                decisions = self.counts.total(),
                "Adapted coefficient probabilities"
            );
        }
        self.counts.reset();
        self.frames_coded += 1;
    }

    /// Frames completed since the last reset.
    pub fn frames_coded(&self) -> u64 {
        self.frames_coded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool_coder::{BoolDecoder, BoolEncoder};
    use crate::error::CoefError;
    use crate::scan::TxType;
    use crate::{PlaneType, RefType};

    fn test_blocks() -> Vec<(BlockInfo, Vec<i32>)> {
        let mut out = Vec::new();
        for (i, (tx_size, tx_type)) in [
            (TxSize::Tx4x4, TxType::DctDct),
            (TxSize::Tx8x8, TxType::AdstDct),
            (TxSize::Tx4x4, TxType::DctAdst),
            (TxSize::Tx16x16, TxType::DctDct),
        ]
        .into_iter()
        .enumerate()
        {
            let n = tx_size.num_coeffs();
            let coeffs: Vec<i32> = (0..n)
                .map(|p| match (p * 7 + i) % 11 {
                    0 => 3,
                    1 => -1,
                    _ if p < 3 => 20 - i as i32,
                    _ => 0,
                })
                .collect();
            let plane = PlaneType::from_plane(i % 2);
            out.push((BlockInfo::new(tx_size, tx_type, plane, RefType::from_inter(i > 1)), coeffs));
        }
        out
    }

    /// Encoder flow: tokenize, write updates, write tokens, adapt.
    fn encode_frame(ctx: &mut FrameCoefContext, kind: FrameKind) -> Vec<u8> {
        ctx.begin_frame(kind);
        let mut cache = TokenCache::new();
        let mut tokens = Vec::new();
        for (block, coeffs) in test_blocks() {
            ctx.tokenize_block(&block, &coeffs, 1, &mut cache, &mut tokens);
        }
        tokens.push(CodedToken::END_OF_SUPERBLOCK);

        let mut writer = BoolEncoder::new();
        ctx.write_updates(&mut writer, TxSize::Tx32x32);
        ctx.write_tokens(&mut writer, &tokens);
        ctx.end_frame();
        writer.finish()
    }

    fn decode_frame(ctx: &mut FrameCoefContext, kind: FrameKind, data: &[u8]) -> Result<()> {
        ctx.begin_frame(kind);
        let mut reader = BoolDecoder::new(data)?;
        ctx.read_updates(&mut reader, TxSize::Tx32x32)?;
        let mut cache = TokenCache::new();
        for (block, coeffs) in test_blocks() {
            let mut decoded = vec![0; coeffs.len()];
            ctx.decode_block(&mut reader, &block, &mut decoded, 1, &mut cache)?;
            assert_eq!(decoded, coeffs);
        }
        ctx.end_frame();
        Ok(())
    }

    #[test]
    fn test_new_validates() {
        let config = CoefCodingConfig::default().with_unconstrained_nodes(1);
        assert!(matches!(
            FrameCoefContext::new(config),
            Err(CoefError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_multi_frame_roundtrip() {
        let config = CoefCodingConfig::default();
        let mut encoder = FrameCoefContext::new(config).unwrap();
        let mut decoder = FrameCoefContext::new(config).unwrap();

        for kind in [FrameKind::Key, FrameKind::AfterKey, FrameKind::Inter, FrameKind::Inter] {
            let data = encode_frame(&mut encoder, kind);
            decode_frame(&mut decoder, kind, &data).unwrap();
            for tx_size in TxSize::ALL {
                assert_eq!(encoder.probs(tx_size), decoder.probs(tx_size));
            }
        }
        assert_eq!(decoder.frames_coded(), 4);
    }

    #[test]
    fn test_roundtrip_without_compact_model() {
        let config = CoefCodingConfig::default().with_compact_model(false);
        let mut encoder = FrameCoefContext::new(config).unwrap();
        let mut decoder = FrameCoefContext::new(config).unwrap();
        for kind in [FrameKind::Key, FrameKind::Inter] {
            let data = encode_frame(&mut encoder, kind);
            decode_frame(&mut decoder, kind, &data).unwrap();
        }
        assert_eq!(encoder.probs_set(), decoder.probs_set());
    }

    #[test]
    fn test_adaptation_disabled() {
        let config = CoefCodingConfig::default().with_backward_adaptation(false);
        let mut ctx = FrameCoefContext::new(config).unwrap();
        ctx.begin_frame(FrameKind::Key);
        let mut cache = TokenCache::new();
        let mut writer = BoolEncoder::new();
        for (block, coeffs) in test_blocks() {
            ctx.encode_block(&mut writer, &block, &coeffs, 0, &mut cache);
        }
        assert!(ctx.counts().total() > 0);
        let before = ctx.probs_set().clone();
        ctx.end_frame();
        assert_eq!(ctx.probs_set(), &before);
        assert_eq!(ctx.counts().total(), 0);
    }

    #[test]
    fn test_adaptation_changes_probs() {
        let mut ctx = FrameCoefContext::new(CoefCodingConfig::default()).unwrap();
        ctx.begin_frame(FrameKind::Key);
        let mut cache = TokenCache::new();
        let mut writer = BoolEncoder::new();
        for (block, coeffs) in test_blocks() {
            ctx.encode_block(&mut writer, &block, &coeffs, 0, &mut cache);
        }
        ctx.end_frame();
        assert_ne!(ctx.probs(TxSize::Tx4x4), &CoefProbs::defaults());
        // Unused transform sizes see no counts and keep their priors.
        assert_eq!(ctx.probs(TxSize::Tx32x32), &CoefProbs::defaults());
    }

    #[test]
    fn test_key_frame_resets() {
        let mut ctx = FrameCoefContext::new(CoefCodingConfig::default()).unwrap();
        let data = encode_frame(&mut ctx, FrameKind::Key);
        assert!(!data.is_empty());
        assert_ne!(ctx.probs(TxSize::Tx4x4), &CoefProbs::defaults());
        ctx.begin_frame(FrameKind::Key);
        assert_eq!(ctx.probs(TxSize::Tx4x4), &CoefProbs::defaults());
        assert_eq!(ctx.frames_coded(), 0);
    }

    #[test]
    fn test_frame_kind_tracks_begin_frame() {
        let mut ctx = FrameCoefContext::new(CoefCodingConfig::default()).unwrap();
        assert_eq!(ctx.frame_kind(), FrameKind::Key);
        for kind in [FrameKind::AfterKey, FrameKind::Inter, FrameKind::Key] {
            ctx.begin_frame(kind);
            assert_eq!(ctx.frame_kind(), kind);
            ctx.end_frame();
        }
    }

    #[test]
    fn test_max_tx_size_limits_updates() {
        let mut ctx = FrameCoefContext::new(CoefCodingConfig::default()).unwrap();
        ctx.begin_frame(FrameKind::Key);
        let mut writer = BoolEncoder::new();
        assert_eq!(ctx.write_updates(&mut writer, TxSize::Tx8x8), 0);
        let data = writer.finish();

        let mut reader = BoolDecoder::new(&data).unwrap();
        // Two presence bits, both clear.
        assert!(!reader.read_bit().unwrap());
        assert!(!reader.read_bit().unwrap());
    }

    #[test]
    fn test_check_compatible() {
        let ctx = FrameCoefContext::new(CoefCodingConfig::default()).unwrap();
        assert!(ctx.check_compatible(&CoefCodingConfig::default()).is_ok());
        assert!(matches!(
            ctx.check_compatible(&CoefCodingConfig::default().with_compact_model(false)),
            Err(CoefError::ConfigMismatch(_))
        ));
    }
}
