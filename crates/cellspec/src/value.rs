//! Decoded values and records.

use indexmap::IndexMap;
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;

use crate::{
    bits::BitString,
    cell::Slice,
    errors::{DecodeError, DecodeErrorKind},
};

/// Key under which unnamed fields and unnamed groups are stored.
pub const UNNAMED: &str = "_";

/// Field values in declaration order.
pub type Fields = IndexMap<String, Value>;

/// A value produced by decoding one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint(BigUint),
    Int(BigInt),
    Bool(bool),
    Bits(BitString),
    Record(Record),
    /// `Cell`/`Any` passthrough: the cursor where the field starts.
    Slice(Slice),
    /// A conditional field whose guard was false.
    Absent,
}

impl Value {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<&BigUint> {
        match self {
            Value::Uint(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Integer view used by numeric evaluation. Booleans count as 0 or 1.
    pub fn to_integer(&self) -> Option<BigInt> {
        match self {
            Value::Uint(value) => Some(BigInt::from(value.clone())),
            Value::Int(value) => Some(value.clone()),
            Value::Bool(value) => Some(BigInt::from(*value as u8)),
            _ => None,
        }
    }

    /// Presence flag of a conditional guard without a bit index.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Uint(value) => !value.is_zero(),
            Value::Int(value) => !value.is_zero(),
            Value::Bool(value) => *value,
            Value::Absent => false,
            Value::Bits(_) | Value::Record(_) | Value::Slice(_) => true,
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// Identity of the constructor a record was decoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorInfo {
    pub name: String,
    /// Tag literal as written in the schema, empty when there is none.
    pub tag: String,
    pub combinator: String,
}

/// Failure recorded inside a record at a containment boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedError {
    pub kind: DecodeErrorKind,
    pub remaining: Slice,
}

/// A decoded constructor or group: named fields plus metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub constructor: Option<ConstructorInfo>,
    pub fields: Fields,
    pub error: Option<Box<EmbeddedError>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns a failure into a value: the partial record (if the failure
    /// carried one) with the error attached.
    pub fn contained(error: DecodeError) -> Self {
        let mut record = match error.partial {
            Some(Value::Record(record)) => record,
            _ => Record::new(),
        };
        record.error = Some(Box::new(EmbeddedError {
            kind: error.kind,
            remaining: error.remaining,
        }));
        record
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn constructor_name(&self) -> Option<&str> {
        self.constructor.as_ref().map(|c| c.name.as_str())
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Every embedded error in this record and its nested records, children
    /// before parents.
    pub fn errors(&self) -> Vec<ErrorReport> {
        let mut out = Vec::new();
        collect_errors(self, &mut Vec::new(), &mut out);
        out
    }
}

/// One embedded error found by [Record::errors].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Field names leading from the root record to the failed record.
    pub path: Vec<String>,
    pub kind: DecodeErrorKind,
    pub message: String,
    pub remaining: Slice,
}

fn collect_errors(record: &Record, path: &mut Vec<String>, out: &mut Vec<ErrorReport>) {
    for (name, value) in &record.fields {
        if let Value::Record(child) = value {
            path.push(name.clone());
            collect_errors(child, path, out);
            path.pop();
        }
    }

    if let Some(error) = &record.error {
        out.push(ErrorReport {
            path: path.clone(),
            kind: error.kind.clone(),
            message: error.kind.to_string(),
            remaining: error.remaining.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::{cell::Cell, errors::CellError};

    use super::*;

    fn failure(kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(kind, &Cell::default().begin_parse())
    }

    #[test]
    fn test_contained_keeps_partial_fields() {
        let mut partial = Record::new();
        partial.insert("a", Value::Bool(true));

        let error = failure(DecodeErrorKind::UnknownType("X".to_string())).with_partial(partial.into());
        let record = Record::contained(error);

        assert_eq!(record.get("a"), Some(&Value::Bool(true)));
        assert_eq!(
            record.error.unwrap().kind,
            DecodeErrorKind::UnknownType("X".to_string())
        );
    }

    #[test]
    fn test_contained_drops_scalar_partial() {
        let error = failure(DecodeErrorKind::UnknownIdentifier("n".to_string()))
            .with_partial(Value::Uint(BigUint::from(1u8)));
        let record = Record::contained(error);
        assert!(record.fields.is_empty());
        assert!(record.has_error());
    }

    #[test]
    fn test_errors_post_order_with_paths() {
        let underrun = DecodeErrorKind::CursorUnderrun(CellError::RefUnderrun { total: 0 });

        let inner = Record::contained(failure(underrun.clone()));
        let mut middle = Record::new();
        middle.insert("inner", inner.into());
        let mut root = Record::contained(failure(DecodeErrorKind::NoMatchingConstructor("T".to_string())));
        root.insert("middle", middle.into());
        root.insert("flag", Value::Bool(false));

        let errors = root.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, vec!["middle".to_string(), "inner".to_string()]);
        assert_eq!(errors[0].kind, underrun);
        assert!(errors[1].path.is_empty());
        assert_eq!(errors[1].message, "no matching constructor for T");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Absent.is_truthy());
        assert!(!Value::Uint(BigUint::zero()).is_truthy());
        assert!(Value::Int(BigInt::from(-1)).is_truthy());
        assert_eq!(Value::Bool(true).to_integer(), Some(BigInt::from(1)));
        assert_eq!(Value::Absent.to_integer(), None);
    }
}
