//! Boolean range coding for VP9.
//!
//! The coefficient core never touches raw bits; it emits and consumes
//! probability-weighted binary decisions through [`BitSink`] and
//! [`BitSource`]. [`BoolEncoder`] and [`BoolDecoder`] are the bit-exact
//! VP9 bool coder implementing those traits.

use crate::error::{CoefError, Result};

/// Number of bits in the decoder value window.
const BD_VALUE_SIZE: i32 = 64;

/// Renormalization shift for a range in `1..=255`.
#[inline]
fn norm(range: u32) -> u32 {
    range.leading_zeros() - 24
}

/// Destination of probability-weighted binary decisions.
pub trait BitSink {
    /// Write one decision; `prob` is the probability of `false` in 1/256 units.
    fn write_bool(&mut self, bit: bool, prob: u8);

    /// Write an equiprobable bit.
    fn write_bit(&mut self, bit: bool) {
        self.write_bool(bit, 128);
    }

    /// Write `bits` equiprobable bits, MSB first.
    fn write_literal(&mut self, value: u32, bits: u8) {
        for i in (0..bits).rev() {
            self.write_bit((value >> i) & 1 != 0);
        }
    }
}

/// Source of probability-weighted binary decisions.
pub trait BitSource {
    /// Read one decision; `prob` is the probability of `false` in 1/256 units.
    fn read_bool(&mut self, prob: u8) -> Result<bool>;

    /// Read an equiprobable bit.
    fn read_bit(&mut self) -> Result<bool> {
        self.read_bool(128)
    }

    /// Read `bits` equiprobable bits, MSB first.
    fn read_literal(&mut self, bits: u8) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..bits {
            value = (value << 1) | self.read_bit()? as u32;
        }
        Ok(value)
    }
}

/// VP9 boolean encoder.
///
/// Output starts with a zero marker bit and is padded on
/// [`finish`](Self::finish) so a decoder never reads past the end.
#[derive(Debug, Clone)]
pub struct BoolEncoder {
    /// Output buffer.
    buffer: Vec<u8>,
    /// Low end of the coding interval.
    low: u64,
    /// Current range, 128..=255 between calls.
    range: u32,
    /// Shifts accumulated before the next output byte (negative = pending).
    count: i32,
}

impl BoolEncoder {
    /// Create a new encoder and write the marker bit.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new encoder with a preallocated output buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut encoder = Self {
            buffer: Vec::with_capacity(capacity),
            low: 0,
            range: 255,
            count: -24,
        };
        encoder.write_bool(false, 128);
        encoder
    }

    /// Propagate a carry into the bytes already written.
    fn add_carry(&mut self) {
        for byte in self.buffer.iter_mut().rev() {
            if *byte == 0xFF {
                *byte = 0;
            } else {
                *byte += 1;
                return;
            }
        }
    }

    /// Bytes written so far (excluding pending bits).
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no byte has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Flush the pending state and return the coded bytes.
    pub fn finish(mut self) -> Vec<u8> {
        for _ in 0..32 {
            self.write_bool(false, 128);
        }
        // Avoid a trailing byte that looks like a superframe index marker.
        if self.buffer.last().is_some_and(|&b| b & 0xE0 == 0xC0) {
            self.buffer.push(0);
        }
        self.buffer
    }
}

impl Default for BoolEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BitSink for BoolEncoder {
    fn write_bool(&mut self, bit: bool, prob: u8) {
        let split = 1 + (((self.range - 1) * prob as u32) >> 8);
        let mut low = self.low;
        let mut range = split;

        if bit {
            low += split as u64;
            range = self.range - split;
        }

        let mut shift = norm(range) as i32;
        range <<= shift;
        let mut count = self.count + shift;

        if count >= 0 {
            let offset = shift - count;

            if (low << (offset - 1)) & 0x8000_0000 != 0 {
                self.add_carry();
            }

            self.buffer.push(((low >> (24 - offset)) & 0xFF) as u8);
            low <<= offset;
            shift = count;
            low &= 0xFF_FFFF;
            count -= 8;
        }

        self.low = low << shift;
        self.count = count;
        self.range = range;
    }
}

/// VP9 boolean decoder.
#[derive(Debug, Clone)]
pub struct BoolDecoder<'a> {
    /// Input data buffer.
    data: &'a [u8],
    /// Next byte to load; may run past the end while zero padding is fed in.
    pos: usize,
    /// Left-aligned value window.
    value: u64,
    /// Buffered bits beyond the top byte of `value`.
    count: i32,
    /// Current range.
    range: u32,
}

impl<'a> BoolDecoder<'a> {
    /// Create a new bool decoder and consume the marker bit.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(CoefError::BoolDecoderError("Empty data".into()));
        }

        let mut decoder = Self {
            data,
            pos: 0,
            value: 0,
            count: -8,
            range: 255,
        };
        decoder.fill();

        if decoder.read_bool(128)? {
            return Err(CoefError::BoolDecoderError("Marker bit set".into()));
        }

        Ok(decoder)
    }

    /// Load bytes into the value window, zero-padding past the end.
    fn fill(&mut self) {
        let mut shift = BD_VALUE_SIZE - 16 - self.count;
        while shift >= 0 {
            let byte = self.data.get(self.pos).copied().unwrap_or(0);
            self.value |= (byte as u64) << shift;
            self.pos += 1;
            self.count += 8;
            shift -= 8;
        }
    }

    /// Number of bits shifted out of the value window so far.
    pub fn consumed_bits(&self) -> usize {
        (self.pos * 8).saturating_sub((self.count + 8) as usize)
    }

    /// Whether decoding has consumed bits past the end of the input.
    pub fn has_overrun(&self) -> bool {
        self.consumed_bits() > self.data.len() * 8
    }
}

impl BitSource for BoolDecoder<'_> {
    fn read_bool(&mut self, prob: u8) -> Result<bool> {
        let prob = prob as u32;
        let split = (self.range * prob + (256 - prob)) >> 8;

        if self.count < 0 {
            self.fill();
        }

        let big_split = (split as u64) << (BD_VALUE_SIZE - 8);
        let bit = if self.value >= big_split {
            self.range -= split;
            self.value -= big_split;
            true
        } else {
            self.range = split;
            false
        };

        let shift = norm(self.range);
        self.range <<= shift;
        self.value <<= shift;
        self.count -= shift as i32;

        if self.has_overrun() {
            return Err(CoefError::UnexpectedEndOfStream);
        }

        Ok(bit)
    }
}
