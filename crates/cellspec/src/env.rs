//! Environments threaded through a decode.

use std::collections::BTreeMap;

use crate::{
    ast::Expr,
    value::{Fields, Value},
};

/// Generic parameter name to the expression bound to it. Each declaration
/// level works on its own copy.
pub type Bindings = BTreeMap<String, Expr>;

/// Fields already decoded and visible to dependent fields.
///
/// Scopes form an immutable chain: a declaration starts an empty chain, and an
/// inline or referenced group extends its parent's chain with the parent's
/// fields decoded so far. Inner names shadow outer ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    fields: Option<&'a Fields>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&'a self, fields: &'a Fields) -> Scope<'a> {
        Scope {
            fields: Some(fields),
            parent: Some(self),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.fields
            .and_then(|fields| fields.get(name))
            .or_else(|| self.parent.and_then(|parent| parent.get(name)))
    }
}
