//! # transcode-vp9-entropy
//!
//! VP9 coefficient entropy coding for the transcode library.
//!
//! This crate turns quantized transform coefficients into a compact boolean
//! coded bitstream and back, bit-exact between encoder and decoder.
//!
//! ## Features
//!
//! - **Token Trees**: 12-token alphabet with category extra bits and signs
//! - **Scan Orders**: Zig-zag, row and column scans for 4x4 to 32x32 transforms
//! - **Contexts**: Neighbor energy classes and above/left entropy contexts
//! - **Forward Updates**: Subexponential probability deltas in the frame header
//! - **Backward Adaptation**: Count-based probability merging after each frame
//! - **Compact Model**: One-parameter expansion of the constrained tree nodes
//! - **Tile Parallelism**: Per-tile count accumulation on the rayon pool
//!
//! ## Example
//!
//! ```
//! use transcode_vp9_entropy::{
//!     BlockInfo, BoolDecoder, BoolEncoder, CoefCodingConfig, FrameCoefContext, FrameKind,
//!     PlaneType, RefType, TokenCache, TxSize, TxType,
//! };
//!
//! let block = BlockInfo::new(TxSize::Tx4x4, TxType::DctDct, PlaneType::Y, RefType::Intra);
//! let mut coeffs = [0i32; 16];
//! coeffs[0] = 5;
//! coeffs[1] = -3;
//!
//! let mut encoder_ctx = FrameCoefContext::new(CoefCodingConfig::default()).unwrap();
//! encoder_ctx.begin_frame(FrameKind::Key);
//! let mut writer = BoolEncoder::new();
//! let mut cache = TokenCache::new();
//! encoder_ctx.encode_block(&mut writer, &block, &coeffs, 0, &mut cache);
//! let data = writer.finish();
//!
//! let mut decoder_ctx = FrameCoefContext::new(CoefCodingConfig::default()).unwrap();
//! decoder_ctx.begin_frame(FrameKind::Key);
//! let mut reader = BoolDecoder::new(&data).unwrap();
//! let mut decoded = [0i32; 16];
//! let eob = decoder_ctx
//!     .decode_block(&mut reader, &block, &mut decoded, 0, &mut cache)
//!     .unwrap();
//! assert_eq!(eob, 2);
//! assert_eq!(decoded, coeffs);
//! ```
//!
//! ## Frame Lifecycle
//!
//! 1. [`FrameCoefContext::begin_frame`] resets to defaults on key frames and
//!    snapshots the pre-frame probabilities
//! 2. Forward updates are written or read once per frame
//! 3. Blocks are coded, recording branch counts
//! 4. [`FrameCoefContext::end_frame`] adapts the probabilities from the counts

#![warn(missing_docs)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

pub mod adapt;
pub mod block;
pub mod bool_coder;
pub mod config;
pub mod context;
pub mod default_probs;
pub mod error;
pub mod forward_update;
pub mod frame;
pub mod model;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod probs;
pub mod scan;
pub mod subexp;
pub mod token;

// Re-export main types
pub use adapt::FrameKind;
pub use block::{BlockInfo, CodedToken};
pub use bool_coder::{BitSink, BitSource, BoolDecoder, BoolEncoder};
pub use config::CoefCodingConfig;
pub use context::{EntropyContext, TokenCache};
pub use error::{CoefError, Result};
pub use forward_update::UpdatePlan;
pub use frame::FrameCoefContext;
pub use probs::{Cell, CoefCounts, CoefProbs, FrameCounts};
pub use scan::{scan_for, ScanOrder, TxSize, TxType};
pub use token::{Token, TokenValue};

/// Plane classes (luma, chroma).
pub const BLOCK_TYPES: usize = 2;

/// Reference classes (intra, inter).
pub const REF_TYPES: usize = 2;

/// Coefficient bands.
pub const COEF_BANDS: usize = 6;

/// Contexts per band.
pub const PREV_COEF_CONTEXTS: usize = 6;

/// Contexts used by band 0.
pub const BAND_ZERO_CONTEXTS: usize = 3;

/// Internal nodes of the coefficient tree.
pub const ENTROPY_NODES: usize = 11;

/// Signalled tokens.
pub const MAX_ENTROPY_TOKENS: usize = 12;

/// Context neighbors per scan position.
pub const MAX_NEIGHBORS: usize = 2;

/// Largest quantized coefficient magnitude.
pub const DCT_MAX_VALUE: u32 = 16384;

/// Number of transform sizes.
pub const TX_SIZES: usize = 4;

/// Probability of the per-node forward update flag being zero.
pub const COEF_UPDATE_PROB: u8 = 252;

/// Largest probability value.
pub const MAX_PROB: u8 = 255;

/// Plane class of a transform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneType {
    /// Luma.
    Y = 0,
    /// Chroma.
    Uv = 1,
}

impl PlaneType {
    /// All plane classes in table order.
    pub const ALL: [PlaneType; BLOCK_TYPES] = [Self::Y, Self::Uv];

    /// Plane class of a plane index (0 = Y, 1 and 2 = UV).
    pub fn from_plane(plane: usize) -> Self {
        if plane == 0 {
            Self::Y
        } else {
            Self::Uv
        }
    }
}

/// Reference class of a transform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefType {
    /// Intra-predicted block.
    Intra = 0,
    /// Inter-predicted block.
    Inter = 1,
}

impl RefType {
    /// All reference classes in table order.
    pub const ALL: [RefType; REF_TYPES] = [Self::Intra, Self::Inter];

    /// Reference class from the block's inter flag.
    pub fn from_inter(is_inter: bool) -> Self {
        if is_inter {
            Self::Inter
        } else {
            Self::Intra
        }
    }
}
