//! Coefficient token alphabet and tree coding.
//!
//! Coefficient magnitudes are coded as one of twelve tokens walked through
//! a fixed binary tree with eleven context-dependent node probabilities.
//! Category tokens are followed by fixed-length extra bits with their own
//! position-independent probabilities, and every nonzero token by a sign bit.

use crate::bool_coder::{BitSink, BitSource};
use crate::error::{CoefError, Result};
use crate::{DCT_MAX_VALUE, ENTROPY_NODES};

/// Per-node branch counts of one probability cell: `[node][branch]`.
pub type NodeCounts = [[u32; 2]; ENTROPY_NODES];

/// Coefficient token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Token {
    /// Magnitude 0.
    Zero = 0,
    /// Magnitude 1.
    One = 1,
    /// Magnitude 2.
    Two = 2,
    /// Magnitude 3.
    Three = 3,
    /// Magnitude 4.
    Four = 4,
    /// Magnitudes 5-6.
    Category1 = 5,
    /// Magnitudes 7-10.
    Category2 = 6,
    /// Magnitudes 11-18.
    Category3 = 7,
    /// Magnitudes 19-34.
    Category4 = 8,
    /// Magnitudes 35-66.
    Category5 = 9,
    /// Magnitudes 67 and above.
    Category6 = 10,
    /// All remaining coefficients in the block are zero.
    EndOfBlock = 11,
    /// Encoder-side superblock terminator; never signalled.
    EndOfSuperblock = 127,
}

/// Extra-bit description of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraBits {
    /// Probabilities of the extra bits, MSB first.
    pub probs: &'static [u8],
    /// Minimum magnitude the token represents.
    pub base_value: u16,
}

impl ExtraBits {
    /// Number of extra bits.
    pub const fn len(&self) -> usize {
        self.probs.len()
    }

    /// Whether the token carries no extra bits.
    pub const fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }
}

const CAT1_PROBS: [u8; 1] = [159];
const CAT2_PROBS: [u8; 2] = [165, 145];
const CAT3_PROBS: [u8; 3] = [173, 148, 140];
const CAT4_PROBS: [u8; 4] = [176, 155, 140, 135];
const CAT5_PROBS: [u8; 5] = [180, 157, 141, 134, 130];
const CAT6_PROBS: [u8; 14] = [254, 254, 254, 252, 249, 243, 230, 196, 177, 153, 140, 133, 130, 129];

const fn plain(base_value: u16) -> ExtraBits {
    ExtraBits {
        probs: &[],
        base_value,
    }
}

/// Extra bits indexed by signalled token value.
pub static EXTRA_BITS: [ExtraBits; 12] = [
    plain(0),
    plain(1),
    plain(2),
    plain(3),
    plain(4),
    ExtraBits { probs: &CAT1_PROBS, base_value: 5 },
    ExtraBits { probs: &CAT2_PROBS, base_value: 7 },
    ExtraBits { probs: &CAT3_PROBS, base_value: 11 },
    ExtraBits { probs: &CAT4_PROBS, base_value: 19 },
    ExtraBits { probs: &CAT5_PROBS, base_value: 35 },
    ExtraBits { probs: &CAT6_PROBS, base_value: 67 },
    plain(0),
];

/// Neighbor energy class of each signalled token.
pub const ENERGY_CLASS: [u8; 12] = [0, 1, 2, 3, 3, 4, 4, 5, 5, 5, 5, 5];

impl Token {
    /// Tokens that can appear in the bitstream, in value order.
    pub const SIGNALLED: [Token; 12] = [
        Self::Zero,
        Self::One,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Category1,
        Self::Category2,
        Self::Category3,
        Self::Category4,
        Self::Category5,
        Self::Category6,
        Self::EndOfBlock,
    ];

    /// Extra-bit description.
    ///
    /// # Panics
    ///
    /// `EndOfSuperblock` has no bitstream representation.
    pub fn extra_bits(&self) -> &'static ExtraBits {
        assert!(*self != Self::EndOfSuperblock, "END_OF_SUPERBLOCK is never signalled");
        &EXTRA_BITS[*self as usize]
    }

    /// Number of extra bits following the tree code.
    pub fn extra_bit_count(&self) -> usize {
        self.extra_bits().len()
    }

    /// Minimum magnitude represented by the token.
    pub fn base_value(&self) -> u16 {
        self.extra_bits().base_value
    }

    /// Energy class stored in the token cache.
    pub fn energy_class(&self) -> u8 {
        ENERGY_CLASS[*self as usize]
    }

    /// Whether the token represents a nonzero coefficient.
    pub const fn is_nonzero(&self) -> bool {
        !matches!(self, Self::Zero | Self::EndOfBlock | Self::EndOfSuperblock)
    }

    /// Token and extra-bit value representing `magnitude`.
    pub fn from_magnitude(magnitude: u32) -> (Token, u16) {
        let token = match magnitude {
            0 => Self::Zero,
            1 => Self::One,
            2 => Self::Two,
            3 => Self::Three,
            4 => Self::Four,
            5..=6 => Self::Category1,
            7..=10 => Self::Category2,
            11..=18 => Self::Category3,
            19..=34 => Self::Category4,
            35..=66 => Self::Category5,
            _ => Self::Category6,
        };
        let extra = magnitude - token.base_value() as u32;
        (token, extra as u16)
    }
}

/// A coded coefficient: token, extra-bit value and sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenValue {
    /// The token.
    pub token: Token,
    /// Extra-bit value added to the token's base value.
    pub extra: u16,
    /// Sign of a nonzero coefficient.
    pub negative: bool,
}

impl TokenValue {
    /// End-of-block marker.
    pub const EOB: Self = Self {
        token: Token::EndOfBlock,
        extra: 0,
        negative: false,
    };

    /// Tokenize a quantized coefficient.
    ///
    /// # Panics
    ///
    /// Magnitudes above `DCT_MAX_VALUE` cannot come out of quantization.
    pub fn from_coefficient(coeff: i32) -> Self {
        let magnitude = coeff.unsigned_abs();
        assert!(
            magnitude <= DCT_MAX_VALUE,
            "coefficient {coeff} exceeds DCT_MAX_VALUE"
        );
        let (token, extra) = Token::from_magnitude(magnitude);
        Self {
            token,
            extra,
            negative: coeff < 0,
        }
    }

    /// Unsigned magnitude.
    pub fn magnitude(&self) -> u32 {
        match self.token {
            Token::EndOfBlock | Token::EndOfSuperblock => 0,
            t => t.base_value() as u32 + self.extra as u32,
        }
    }

    /// Reconstructed signed coefficient.
    pub fn coefficient(&self) -> i32 {
        let magnitude = self.magnitude() as i32;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// Child of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Leaf(Token),
    Node(u8),
}

/// Coefficient tree: `COEF_TREE[node][bit]`.
const COEF_TREE: [[Branch; 2]; ENTROPY_NODES] = {
    use Branch::{Leaf, Node};
    [
        [Leaf(Token::EndOfBlock), Node(1)],
        [Leaf(Token::Zero), Node(2)],
        [Leaf(Token::One), Node(3)],
        [Node(4), Node(6)],
        [Leaf(Token::Two), Node(5)],
        [Leaf(Token::Three), Leaf(Token::Four)],
        [Node(7), Node(8)],
        [Leaf(Token::Category1), Leaf(Token::Category2)],
        [Node(9), Node(10)],
        [Leaf(Token::Category3), Leaf(Token::Category4)],
        [Leaf(Token::Category5), Leaf(Token::Category6)],
    ]
};

/// Root-to-leaf `(node, bit)` path of each signalled token.
static TOKEN_PATHS: [&[(u8, bool)]; 12] = [
    &[(0, true), (1, false)],
    &[(0, true), (1, true), (2, false)],
    &[(0, true), (1, true), (2, true), (3, false), (4, false)],
    &[(0, true), (1, true), (2, true), (3, false), (4, true), (5, false)],
    &[(0, true), (1, true), (2, true), (3, false), (4, true), (5, true)],
    &[(0, true), (1, true), (2, true), (3, true), (6, false), (7, false)],
    &[(0, true), (1, true), (2, true), (3, true), (6, false), (7, true)],
    &[(0, true), (1, true), (2, true), (3, true), (6, true), (8, false), (9, false)],
    &[(0, true), (1, true), (2, true), (3, true), (6, true), (8, false), (9, true)],
    &[(0, true), (1, true), (2, true), (3, true), (6, true), (8, true), (10, false)],
    &[(0, true), (1, true), (2, true), (3, true), (6, true), (8, true), (10, true)],
    &[(0, false)],
];

fn token_path(token: Token, skip_eob: bool) -> &'static [(u8, bool)] {
    assert!(token != Token::EndOfSuperblock, "END_OF_SUPERBLOCK is never signalled");
    let path = TOKEN_PATHS[token as usize];
    if skip_eob {
        assert!(token != Token::EndOfBlock, "EOB cannot follow a ZERO token");
        &path[1..]
    } else {
        path
    }
}

/// Write a token's tree code.
///
/// With `skip_eob` the EOB branch is implied (the previous token was ZERO)
/// and coding starts at node 1. Each traversed branch is counted in
/// `counts` when given.
///
/// # Panics
///
/// Coding `EndOfSuperblock`, or EOB with `skip_eob`, is a caller bug.
pub fn write_token_tree<W: BitSink + ?Sized>(
    writer: &mut W,
    token: Token,
    probs: &[u8; ENTROPY_NODES],
    skip_eob: bool,
    mut counts: Option<&mut NodeCounts>,
) {
    for &(node, bit) in token_path(token, skip_eob) {
        let node = node as usize;
        writer.write_bool(bit, probs[node]);
        if let Some(counts) = counts.as_deref_mut() {
            counts[node][bit as usize] += 1;
        }
    }
}

/// Count the branches a token's tree code would take, without coding it.
pub fn count_token(token: Token, skip_eob: bool, counts: &mut NodeCounts) {
    for &(node, bit) in token_path(token, skip_eob) {
        counts[node as usize][bit as usize] += 1;
    }
}

/// Read a token's tree code; the inverse of [`write_token_tree`].
pub fn read_token_tree<R: BitSource + ?Sized>(
    reader: &mut R,
    probs: &[u8; ENTROPY_NODES],
    skip_eob: bool,
    mut counts: Option<&mut NodeCounts>,
) -> Result<Token> {
    let mut node = if skip_eob { 1 } else { 0 };
    loop {
        let prob = *probs.get(node).ok_or(CoefError::InvalidTreeNode(node))?;
        let bit = reader.read_bool(prob)?;
        if let Some(counts) = counts.as_deref_mut() {
            counts[node][bit as usize] += 1;
        }
        match COEF_TREE[node][bit as usize] {
            Branch::Leaf(token) => return Ok(token),
            Branch::Node(next) => node = next as usize,
        }
    }
}

/// Write a complete token: tree code, extra bits and sign.
pub fn encode_token<W: BitSink + ?Sized>(
    writer: &mut W,
    value: &TokenValue,
    probs: &[u8; ENTROPY_NODES],
    skip_eob: bool,
    counts: Option<&mut NodeCounts>,
) {
    write_token_tree(writer, value.token, probs, skip_eob, counts);
    if value.token == Token::EndOfBlock {
        return;
    }

    let extra = value.token.extra_bits();
    let len = extra.len();
    for (i, &prob) in extra.probs.iter().enumerate() {
        writer.write_bool((value.extra >> (len - 1 - i)) & 1 != 0, prob);
    }

    if value.token.is_nonzero() {
        writer.write_bit(value.negative);
    }
}

/// Read a complete token: tree code, extra bits and sign.
pub fn decode_token<R: BitSource + ?Sized>(
    reader: &mut R,
    probs: &[u8; ENTROPY_NODES],
    skip_eob: bool,
    counts: Option<&mut NodeCounts>,
) -> Result<TokenValue> {
    let token = read_token_tree(reader, probs, skip_eob, counts)?;
    if token == Token::EndOfBlock {
        return Ok(TokenValue::EOB);
    }

    let bits = token.extra_bits();
    let mut extra = 0u16;
    for &prob in bits.probs {
        extra = (extra << 1) | reader.read_bool(prob)? as u16;
    }

    let magnitude = bits.base_value as u32 + extra as u32;
    if magnitude > DCT_MAX_VALUE {
        return Err(CoefError::MagnitudeOverflow(magnitude));
    }

    let negative = token.is_nonzero() && reader.read_bit()?;
    Ok(TokenValue {
        token,
        extra,
        negative,
    })
}
