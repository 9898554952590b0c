//! # cellspec
//!
//! Schema-interpreted decoding of tree-structured binary cells.
//!
//! A schema is a [Program](ast::Program) of typed constructors: tagged sum
//! types with bit-level layouts, generic parameters and fields whose width or
//! presence depends on earlier fields. [Schema::compile] prepares it once;
//! [Schema::decode] and [Schema::try_decode] then walk a [Cell](cell::Cell)'s
//! bits and child references, pick constructors by tag and produce
//! [Record](value::Record)s.
//!
//! Decoding of a damaged cell still yields the deepest correct prefix:
//! failures behind a cell reference are embedded in the record where they
//! happened, and [Schema::try_decode] lists all of them.
//!
//! ## Example
//!
//! ```
//! use cellspec::ast::{Declaration, Expr, FieldDef, Program};
//! use cellspec::cell::CellBuilder;
//! use cellspec::Schema;
//!
//! let program = Program::new(vec![
//!     Declaration::new("nothing", Some("$0"), "Maybe").field(FieldDef::type_param("X")),
//!     Declaration::new("just", Some("$1"), "Maybe")
//!         .field(FieldDef::type_param("X"))
//!         .field(FieldDef::named("value", Expr::name("X"))),
//! ]);
//! let schema = Schema::compile(&program).unwrap();
//!
//! let cell = CellBuilder::new()
//!     .store_bit(true).unwrap()
//!     .store_uint(7u32, 32).unwrap()
//!     .build();
//!
//! let record = schema.decode(&cell, "Maybe", &[Expr::name("uint32")]).unwrap();
//! assert_eq!(record.constructor_name(), Some("just"));
//! assert_eq!(record.get("value").and_then(|v| v.as_uint()), Some(&7u32.into()));
//! ```

pub mod ast;
pub mod bits;
pub mod cell;
pub mod compiled;
mod decoder;
pub mod env;
pub mod errors;
pub mod eval;
pub mod options;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;

pub use errors::{DecodeError, DecodeErrorKind};
pub use options::DecodeOptions;
pub use schema::{Decoded, Schema};
pub use value::{Record, Value};
