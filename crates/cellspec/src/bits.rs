//! Low-level bit buffer and read utilities.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first byte.

use std::fmt;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

use crate::errors::CellError;

/// Reads a single bit at `bit_pos` (0 = MSB of first byte). Returns 0 or 1.
pub fn read_bit_at(data: &[u8], bit_pos: usize) -> u8 {
    (data[bit_pos / 8] >> (7 - bit_pos % 8)) & 1
}

/// Sign-extends an `n`-bit two's complement value held in `value`.
pub fn sign_extend(value: BigUint, bits: usize) -> BigInt {
    if bits == 0 || !value.bit(bits as u64 - 1) {
        return BigInt::from(value);
    }

    BigInt::from(value) - (BigInt::one() << bits)
}

/// Growable MSB-first sequence of bits.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BitString {
    data: Vec<u8>,
    len: usize,
}

impl BitString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the first `len` bits of `data`.
    ///
    /// Panics if `data` holds fewer than `len` bits.
    pub fn from_bytes(data: &[u8], len: usize) -> Self {
        assert!(len <= data.len() * 8, "bit length exceeds buffer");

        let mut data = data[..len.div_ceil(8)].to_vec();
        if len % 8 != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xFFu8 << (8 - len % 8);
            }
        }

        BitString { data, len }
    }

    /// Parses a string of `0`/`1` characters, ignoring `_` separators.
    pub fn from_binary(text: &str) -> Option<Self> {
        let mut out = BitString::new();
        for c in text.chars() {
            match c {
                '0' => out.push(false),
                '1' => out.push(true),
                '_' => {}
                _ => return None,
            }
        }

        Some(out)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| read_bit_at(&self.data, index) == 1)
    }

    pub fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            self.data[self.len / 8] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    pub fn extend(&mut self, other: &BitString) {
        for i in 0..other.len {
            self.push(read_bit_at(&other.data, i) == 1);
        }
    }

    /// Copies `len` bits starting at `start`.
    pub fn range(&self, start: usize, len: usize) -> Result<BitString, CellError> {
        self.check(start, len)?;

        let mut out = BitString::new();
        for i in start..start + len {
            out.push(read_bit_at(&self.data, i) == 1);
        }

        Ok(out)
    }

    /// Reads `len` bits starting at `start` as an unsigned big-endian integer.
    pub fn read_uint(&self, start: usize, len: usize) -> Result<BigUint, CellError> {
        self.check(start, len)?;
        if len == 0 {
            return Ok(BigUint::zero());
        }

        let n_bytes = len.div_ceil(8);
        let pad = n_bytes * 8 - len;
        let mut out = vec![0u8; n_bytes];
        for i in 0..len {
            if read_bit_at(&self.data, start + i) == 1 {
                let at = pad + i;
                out[at / 8] |= 0x80 >> (at % 8);
            }
        }

        Ok(BigUint::from_bytes_be(&out))
    }

    fn check(&self, start: usize, len: usize) -> Result<(), CellError> {
        let available = self.len.saturating_sub(start);
        if len > available {
            return Err(CellError::BitUnderrun {
                requested: len,
                available,
            });
        }

        Ok(())
    }
}

/// Uppercase hex with a `_` completion tag when the length is not a multiple of 4.
impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut padded = self.clone();
        let partial = self.len % 4 != 0;
        if partial {
            padded.push(true);
            while padded.len % 4 != 0 {
                padded.push(false);
            }
        }

        for nibble in 0..padded.len / 4 {
            let byte = padded.data[nibble / 2];
            let digit = if nibble % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            write!(f, "{:X}", digit)?;
        }

        if partial {
            write!(f, "_")?;
        }

        Ok(())
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{{{}}}", self)
    }
}
