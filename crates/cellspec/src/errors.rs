//! Error types for schema compilation, cell access and decoding.

use std::fmt;

use crate::{ast::Location, cell::Slice, value::Value};

/// Errors produced when compiling a [crate::ast::Program] into a [crate::Schema].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Tag literal is neither `$<binary>`, `#<hex>`, `$_` nor `#_`.
    #[error("invalid tag `{tag}` on constructor `{constructor}`")]
    InvalidTag { constructor: String, tag: String },
    /// Declaration has an empty constructor or combinator name.
    #[error("declaration #{index} has an empty name")]
    EmptyName { index: usize },
}

/// Errors produced by the cell primitive when reading or building cells.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    /// Requested more bits than remain in the cell.
    #[error("bit underrun: requested {requested} bits, {available} available")]
    BitUnderrun { requested: usize, available: usize },
    /// No child reference is left to descend into.
    #[error("no child reference left ({total} total)")]
    RefUnderrun { total: usize },
    /// Builder exceeded the data bit or reference capacity of one cell.
    #[error("cell overflow: {0}")]
    Overflow(&'static str),
    /// Value does not fit into the requested number of bits.
    #[error("value does not fit into {bits} bits")]
    ValueTooWide { bits: usize },
}

/// Reasons a decode step can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    /// Neither a combinator family nor a constructor carries this name.
    #[error("type {0} not found")]
    UnknownType(String),
    /// No alternative's tag matched the upcoming bits.
    #[error("no matching constructor for {0}")]
    NoMatchingConstructor(String),
    #[error(transparent)]
    CursorUnderrun(#[from] CellError),
    /// The evaluator does not implement this expression kind.
    #[error("unsupported expression {what} at {location}")]
    UnsupportedExpression { what: String, location: Location },
    #[error("unsupported operator {0}")]
    UnsupportedOperator(String),
    /// Numeric reference to a name bound neither as generic nor as field.
    #[error("unknown identifier {0}")]
    UnknownIdentifier(String),
    /// A value used in a numeric position is not an integer.
    #[error("value of {0} is not numeric")]
    NotNumeric(String),
    /// A computed bit width is negative or does not fit in `usize`.
    #[error("invalid bit width {0}")]
    WidthOverflow(String),
    #[error("maximum decode depth {0} exceeded")]
    DepthExceeded(usize),
}

/// A failed decode: what went wrong, the deepest partial value reached and
/// the cursor at the point of failure.
#[derive(Debug, Clone)]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    /// Everything decoded before the failure, if anything was.
    pub partial: Option<Value>,
    /// Cursor snapshot taken where the failure happened.
    pub remaining: Slice,
}

impl DecodeError {
    pub fn new(kind: impl Into<DecodeErrorKind>, remaining: &Slice) -> Self {
        DecodeError {
            kind: kind.into(),
            partial: None,
            remaining: remaining.clone(),
        }
    }

    /// Replaces the partial value, keeping kind and cursor snapshot.
    pub fn with_partial(mut self, partial: Value) -> Self {
        self.partial = Some(partial);
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            DecodeErrorKind::CursorUnderrun(e) => Some(e),
            _ => None,
        }
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;
