use num_bigint::BigUint;

use crate::{ast::Declaration, cell::Slice, errors::CompileError};

/// Bit pattern selecting a constructor. Tags may be arbitrarily long.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledTag {
    pub len_bits: usize,
    pub value: BigUint,
}

impl CompiledTag {
    /// True when the next `len_bits` bits equal the tag. Never consumes.
    pub fn matches(&self, slice: &Slice) -> bool {
        if self.len_bits == 0 {
            return true;
        }

        slice.peek_uint(self.len_bits).is_ok_and(|v| v == self.value)
    }
}

impl TryFrom<&Declaration> for CompiledTag {
    type Error = CompileError;

    fn try_from(decl: &Declaration) -> Result<Self, Self::Error> {
        let Some(tag) = decl.tag.as_deref() else {
            return Ok(CompiledTag::default());
        };

        let invalid = || CompileError::InvalidTag {
            constructor: decl.constructor.clone(),
            tag: tag.to_string(),
        };

        let (radix, digits): (u32, &str) = match tag.split_at_checked(1) {
            Some(("$", digits)) => (2, digits),
            Some(("#", digits)) => (16, digits),
            _ => return Err(invalid()),
        };

        if digits == "_" {
            return Ok(CompiledTag::default());
        }
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(invalid());
        }

        let len_bits = if radix == 2 { digits.len() } else { digits.len() * 4 };
        let value = BigUint::parse_bytes(digits.as_bytes(), radix).ok_or_else(invalid)?;

        Ok(CompiledTag { len_bits, value })
    }
}

/// A declaration with its tag parsed.
#[derive(Debug, Clone)]
pub struct CompiledDeclaration {
    pub decl: Declaration,
    pub tag: CompiledTag,
}

impl CompiledDeclaration {
    /// Tag text for record metadata; empty when the declaration has none.
    pub fn tag_text(&self) -> &str {
        self.decl.tag.as_deref().unwrap_or("")
    }
}

impl TryFrom<Declaration> for CompiledDeclaration {
    type Error = CompileError;

    fn try_from(decl: Declaration) -> Result<Self, Self::Error> {
        let tag = CompiledTag::try_from(&decl)?;
        Ok(CompiledDeclaration { decl, tag })
    }
}
