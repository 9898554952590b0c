//! JSON loading of compiled schema programs.
//!
//! The schema-grammar compiler can hand its output over as JSON in the shape
//! of [crate::ast::Program]: a `declarations` array whose field and
//! expression nodes use serde's externally tagged enum form, e.g.
//! `{ "Named": { "name": "value", "expr": { "kind": { "Name": "uint32" } } } }`.
//! Expression locations are optional.

use crate::{ast::Program, errors::CompileError, schema::Schema};

/// Errors produced by [Schema::from_json].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("malformed schema json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl Schema {
    /// Deserializes a [Program] from JSON and compiles it.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let program: Program = serde_json::from_str(json)?;
        Ok(Schema::compile(&program)?)
    }
}

impl Program {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
