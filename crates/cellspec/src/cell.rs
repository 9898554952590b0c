//! Minimal in-memory cell tree: immutable [Cell]s, a [CellBuilder] for
//! writing them and a [Slice] cursor for reading them back.

use std::{fmt, sync::Arc};

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::{
    bits::{BitString, sign_extend},
    errors::CellError,
};

/// Data bit capacity of one cell.
pub const MAX_BITS: usize = 1023;
/// Child reference capacity of one cell.
pub const MAX_REFS: usize = 4;

#[derive(PartialEq, Eq)]
struct CellData {
    bits: BitString,
    refs: Vec<Cell>,
}

/// Immutable node of the cell tree: a bit sequence and up to four children.
///
/// Cloning is cheap; clones share the same node.
#[derive(Clone, PartialEq, Eq)]
pub struct Cell {
    inner: Arc<CellData>,
}

impl Cell {
    pub fn bits(&self) -> &BitString {
        &self.inner.bits
    }

    pub fn refs(&self) -> &[Cell] {
        &self.inner.refs
    }

    /// Starts reading this cell from its first bit and first reference.
    pub fn begin_parse(&self) -> Slice {
        Slice {
            cell: self.clone(),
            position: Position::default(),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            inner: Arc::new(CellData {
                bits: BitString::new(),
                refs: Vec::new(),
            }),
        }
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{{{}}}", self.inner.bits)?;
        if !self.inner.refs.is_empty() {
            f.debug_list().entries(self.inner.refs.iter()).finish()?;
        }

        Ok(())
    }
}

/// Writes bits and references into a new [Cell].
#[derive(Debug, Default)]
pub struct CellBuilder {
    bits: BitString,
    refs: Vec<Cell>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        self.reserve(1)?;
        self.bits.push(bit);
        Ok(self)
    }

    /// Stores `value` as a `bits`-wide unsigned big-endian integer.
    pub fn store_uint(
        &mut self,
        value: impl Into<BigUint>,
        bits: usize,
    ) -> Result<&mut Self, CellError> {
        let value = value.into();
        if value.bits() > bits as u64 {
            return Err(CellError::ValueTooWide { bits });
        }
        self.reserve(bits)?;

        for i in (0..bits).rev() {
            self.bits.push(value.bit(i as u64));
        }

        Ok(self)
    }

    /// Stores `value` as a `bits`-wide two's complement integer.
    pub fn store_int(&mut self, value: impl Into<BigInt>, bits: usize) -> Result<&mut Self, CellError> {
        let value = value.into();
        if bits == 0 {
            return if value.is_zero() {
                Ok(self)
            } else {
                Err(CellError::ValueTooWide { bits })
            };
        }

        let limit = BigInt::one() << (bits - 1);
        if value >= limit || value < -limit.clone() {
            return Err(CellError::ValueTooWide { bits });
        }

        let unsigned = match value.sign() {
            Sign::Minus => (BigInt::one() << bits) + value,
            _ => value,
        };

        // Non-negative after the wrap above.
        let magnitude = unsigned.magnitude().clone();
        self.store_uint(magnitude, bits)
    }

    pub fn store_bits(&mut self, bits: &BitString) -> Result<&mut Self, CellError> {
        self.reserve(bits.len())?;
        self.bits.extend(bits);
        Ok(self)
    }

    pub fn store_ref(&mut self, cell: Cell) -> Result<&mut Self, CellError> {
        if self.refs.len() >= MAX_REFS {
            return Err(CellError::Overflow("too many references"));
        }
        self.refs.push(cell);
        Ok(self)
    }

    pub fn build(&mut self) -> Cell {
        Cell {
            inner: Arc::new(CellData {
                bits: std::mem::take(&mut self.bits),
                refs: std::mem::take(&mut self.refs),
            }),
        }
    }

    fn reserve(&self, bits: usize) -> Result<(), CellError> {
        if self.bits.len() + bits > MAX_BITS {
            return Err(CellError::Overflow("too many data bits"));
        }

        Ok(())
    }
}

/// Read position inside one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub bits: usize,
    pub refs: usize,
}

/// Cursor over one cell's bits and child references.
///
/// A slice owns a handle to its cell, so snapshots taken with `clone` stay
/// valid independently of the cursor they were taken from.
#[derive(Clone, PartialEq, Eq)]
pub struct Slice {
    cell: Cell,
    position: Position,
}

impl Slice {
    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Rewinds (or advances) the cursor to a position taken from [Slice::position].
    pub fn restore(&mut self, position: Position) {
        self.position = position;
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bits().len() - self.position.bits
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs().len() - self.position.refs
    }

    pub fn read_bit(&mut self) -> Result<bool, CellError> {
        let bit = self
            .cell
            .bits()
            .get(self.position.bits)
            .ok_or(CellError::BitUnderrun {
                requested: 1,
                available: 0,
            })?;
        self.position.bits += 1;
        Ok(bit)
    }

    pub fn read_uint(&mut self, bits: usize) -> Result<BigUint, CellError> {
        let value = self.cell.bits().read_uint(self.position.bits, bits)?;
        self.position.bits += bits;
        Ok(value)
    }

    pub fn read_int(&mut self, bits: usize) -> Result<BigInt, CellError> {
        Ok(sign_extend(self.read_uint(bits)?, bits))
    }

    pub fn read_bits(&mut self, bits: usize) -> Result<BitString, CellError> {
        let value = self.cell.bits().range(self.position.bits, bits)?;
        self.position.bits += bits;
        Ok(value)
    }

    /// Reads `bits` bits as an unsigned integer without moving the cursor.
    pub fn peek_uint(&self, bits: usize) -> Result<BigUint, CellError> {
        self.cell.bits().read_uint(self.position.bits, bits)
    }

    pub fn skip_bits(&mut self, bits: usize) -> Result<(), CellError> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(CellError::BitUnderrun {
                requested: bits,
                available,
            });
        }
        self.position.bits += bits;
        Ok(())
    }

    /// Takes the next child reference and returns a fresh cursor over it.
    pub fn load_ref(&mut self) -> Result<Slice, CellError> {
        let child = self
            .cell
            .refs()
            .get(self.position.refs)
            .ok_or(CellError::RefUnderrun {
                total: self.cell.refs().len(),
            })?;
        self.position.refs += 1;
        Ok(child.begin_parse())
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("cell", &self.cell)
            .field("bits", &self.position.bits)
            .field("refs", &self.position.refs)
            .finish()
    }
}
