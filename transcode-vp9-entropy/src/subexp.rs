//! Subexponential coding of probability deltas.
//!
//! A new probability is first remapped relative to the old one so small
//! changes get small indices, then the index is written with a terminated
//! subexponential code (`k = 4`, 255 symbols).

use crate::bool_coder::{BitSink, BitSource};
use crate::error::Result;
use crate::MAX_PROB;

/// Subexponential code parameter.
pub const SUBEXP_PARAM: u8 = 4;

/// Modulus of the remapping index interleave.
pub const MODULUS_PARAM: usize = 13;

/// Residue of the indices moved to the front of the remapping.
const MODULUS_OFFSET: usize = MODULUS_PARAM / 2 + 1;

/// Number of remapped indices.
const REMAP_SYMBOLS: usize = MAX_PROB as usize;

/// Bits of the uniform tail code.
const UNIFORM_BITS: u8 = 8;

/// Tail values coded with one bit less.
const UNIFORM_SHORT: u32 = (1 << UNIFORM_BITS) - 191;

/// Every `MODULUS_PARAM`-th recentered value goes first, the rest follow.
const fn build_inv_map() -> [u8; REMAP_SYMBOLS] {
    let mut table = [0u8; REMAP_SYMBOLS];
    let mut n = 0;
    let mut v = MODULUS_OFFSET;
    while v < REMAP_SYMBOLS {
        table[n] = v as u8;
        n += 1;
        v += MODULUS_PARAM;
    }
    let mut v = 1;
    while v < REMAP_SYMBOLS - 1 {
        if v % MODULUS_PARAM != MODULUS_OFFSET {
            table[n] = v as u8;
            n += 1;
        }
        v += 1;
    }
    table[n] = (REMAP_SYMBOLS - 2) as u8;
    table
}

/// Remapped index to recentered value.
static INV_MAP_TABLE: [u8; REMAP_SYMBOLS] = build_inv_map();

const fn build_map() -> [u8; REMAP_SYMBOLS - 1] {
    let inv = build_inv_map();
    let mut table = [0u8; REMAP_SYMBOLS - 1];
    // The trailing duplicate is never produced by the encoder.
    let mut i = 0;
    while i < REMAP_SYMBOLS - 1 {
        table[inv[i] as usize - 1] = i as u8;
        i += 1;
    }
    table
}

/// Recentered value minus one to remapped index.
static MAP_TABLE: [u8; REMAP_SYMBOLS - 1] = build_map();

fn recenter_nonneg(v: u32, m: u32) -> u32 {
    if v > m << 1 {
        v
    } else if v >= m {
        (v - m) << 1
    } else {
        ((m - v) << 1) - 1
    }
}

fn inv_recenter_nonneg(v: u32, m: u32) -> u32 {
    if v > m << 1 {
        v
    } else if v & 1 != 0 {
        m - ((v + 1) >> 1)
    } else {
        m + (v >> 1)
    }
}

/// Index of `new` relative to `old`; both in [1, 255] and distinct.
pub fn remap_prob(new: u8, old: u8) -> u32 {
    debug_assert!(new != old && new >= 1 && old >= 1);
    let max = MAX_PROB as u32;
    let v = new as u32 - 1;
    let m = old as u32 - 1;
    let r = if m << 1 <= max {
        recenter_nonneg(v, m)
    } else {
        recenter_nonneg(max - 1 - v, max - 1 - m)
    };
    MAP_TABLE[r as usize - 1] as u32
}

/// Probability coded by remapped index `index` relative to `old`.
pub fn inv_remap_prob(index: u32, old: u8) -> u8 {
    let max = MAX_PROB as u32;
    let v = INV_MAP_TABLE[(index as usize).min(REMAP_SYMBOLS - 1)] as u32;
    let m = old.max(1) as u32 - 1;
    let p = if m << 1 <= max {
        1 + inv_recenter_nonneg(v, m)
    } else {
        max - inv_recenter_nonneg(v, max - 1 - m)
    };
    p.clamp(1, max) as u8
}

fn write_uniform<W: BitSink + ?Sized>(writer: &mut W, v: u32) {
    if v < UNIFORM_SHORT {
        writer.write_literal(v, UNIFORM_BITS - 1);
    } else {
        let d = v - UNIFORM_SHORT;
        writer.write_literal(UNIFORM_SHORT + (d >> 1), UNIFORM_BITS - 1);
        writer.write_bit(d & 1 != 0);
    }
}

fn read_uniform<R: BitSource + ?Sized>(reader: &mut R) -> Result<u32> {
    let v = reader.read_literal(UNIFORM_BITS - 1)?;
    if v < UNIFORM_SHORT {
        Ok(v)
    } else {
        Ok((v << 1) - UNIFORM_SHORT + reader.read_bit()? as u32)
    }
}

/// Write a remapped index with the terminated subexponential code.
pub fn write_term_subexp<W: BitSink + ?Sized>(writer: &mut W, word: u32) {
    debug_assert!((word as usize) < REMAP_SYMBOLS);
    let k = SUBEXP_PARAM;
    if word < 16 {
        writer.write_bit(false);
        writer.write_literal(word, k);
    } else if word < 32 {
        writer.write_bit(true);
        writer.write_bit(false);
        writer.write_literal(word - 16, k);
    } else if word < 64 {
        writer.write_literal(0b110, 3);
        writer.write_literal(word - 32, k + 1);
    } else {
        writer.write_literal(0b111, 3);
        write_uniform(writer, word - 64);
    }
}

/// Read a remapped index written by [`write_term_subexp`].
pub fn read_term_subexp<R: BitSource + ?Sized>(reader: &mut R) -> Result<u32> {
    let k = SUBEXP_PARAM;
    if !reader.read_bit()? {
        return reader.read_literal(k);
    }
    if !reader.read_bit()? {
        return Ok(reader.read_literal(k)? + 16);
    }
    if !reader.read_bit()? {
        return Ok(reader.read_literal(k + 1)? + 32);
    }
    Ok(read_uniform(reader)? + 64)
}

/// Length in bits of the subexponential code for `word`.
pub fn term_subexp_bits(word: u32) -> u32 {
    match word {
        0..=15 => 5,
        16..=31 => 6,
        32..=63 => 8,
        _ if word - 64 < UNIFORM_SHORT => 3 + UNIFORM_BITS as u32 - 1,
        _ => 3 + UNIFORM_BITS as u32,
    }
}

/// Write a probability update from `old` to `new`.
pub fn write_prob_diff<W: BitSink + ?Sized>(writer: &mut W, new: u8, old: u8) {
    write_term_subexp(writer, remap_prob(new, old));
}

/// Read a probability update relative to `old`.
pub fn read_prob_diff<R: BitSource + ?Sized>(reader: &mut R, old: u8) -> Result<u8> {
    let index = read_term_subexp(reader)?;
    Ok(inv_remap_prob(index, old))
}

/// Cost in 1/256 bit of signalling `new` relative to `old`.
pub fn prob_diff_cost(new: u8, old: u8) -> u32 {
    term_subexp_bits(remap_prob(new, old)) * 256
}

/// `-log2(p / 256)` in 1/256 bit units, for `p` in 1..=255.
const fn prob_cost(p: u32) -> u16 {
    // Integer part of log2(p) and a Q16 mantissa in [1, 2).
    let int = 31 - p.leading_zeros();
    let mut y = (p as u64) << (16 - int);
    let mut frac = 0u32;
    let mut bit = 0;
    // Nine fractional bits, rounded to eight.
    while bit < 9 {
        y = (y * y) >> 16;
        frac <<= 1;
        if y >= 2 << 16 {
            y >>= 1;
            frac |= 1;
        }
        bit += 1;
    }
    let log2_q8 = (int << 8) + ((frac + 1) >> 1);
    ((8 << 8) - log2_q8) as u16
}

const fn build_cost_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    table[0] = 8 << 8;
    let mut p = 1;
    while p < 256 {
        table[p] = prob_cost(p as u32);
        p += 1;
    }
    table
}

/// Bit cost of coding a zero with probability `p`, in 1/256 bit.
pub static PROB_COST: [u16; 256] = build_cost_table();

/// Cost of a `false` decision.
#[inline]
pub fn cost_zero(prob: u8) -> u32 {
    PROB_COST[prob as usize] as u32
}

/// Cost of a `true` decision.
#[inline]
pub fn cost_one(prob: u8) -> u32 {
    PROB_COST[256 - prob.max(1) as usize] as u32
}

/// Cost of coding the branch counts `ct` with probability `prob`.
pub fn branch_cost(ct: [u32; 2], prob: u8) -> u64 {
    ct[0] as u64 * cost_zero(prob) as u64 + ct[1] as u64 * cost_one(prob) as u64
}
