//! Schema AST as produced by the schema-grammar compiler.
//!
//! A [Program] is an ordered list of [Declaration]s. Declarations that share a
//! combinator name form a sum type whose variants are told apart by their tag.
//! The helper constructors below exist so programs can be assembled in code;
//! with the `serde` feature they can also be loaded from JSON.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source position of an expression in the schema text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One-argument builtin types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Builtin {
    /// `## n`: fixed-width unsigned integer.
    FixedWidth,
    /// `#< n`: integer in `0..n`.
    LessThan,
    /// `#<= n`: integer in `0..=n`.
    LessOrEqual,
}

/// A type or value expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExprKind {
    /// Builtin type, named type, generic parameter or earlier field.
    Name(String),
    Number(u64),
    /// Binary arithmetic; only `+` and `*` evaluate.
    Math {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `guard?then` or `guard.bit?then`.
    Cond {
        guard: Box<Expr>,
        bit: Option<u32>,
        then: Box<Expr>,
    },
    Builtin { builtin: Builtin, arg: Box<Expr> },
    /// Bare `#`, a 32-bit unsigned integer.
    Nat,
    /// Combinator application `(Name arg...)`.
    Apply { name: String, args: Vec<Expr> },
    /// `^T`: `T` stored in the next child cell.
    CellRef(Box<Expr>),
    /// `~x`: output-negated parameter.
    Negate(Box<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            location: Location::default(),
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Location { line, column };
        self
    }

    pub fn name(name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Name(name.into()))
    }

    pub fn number(value: u64) -> Self {
        Expr::new(ExprKind::Number(value))
    }

    pub fn math(op: impl Into<String>, left: Expr, right: Expr) -> Self {
        Expr::new(ExprKind::Math {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `n * Bit`: a raw bit string of length `n`.
    pub fn bits_of(len: Expr) -> Self {
        Expr::math("*", len, Expr::name("Bit"))
    }

    pub fn cond(guard: Expr, bit: Option<u32>, then: Expr) -> Self {
        Expr::new(ExprKind::Cond {
            guard: Box::new(guard),
            bit,
            then: Box::new(then),
        })
    }

    pub fn builtin(builtin: Builtin, arg: Expr) -> Self {
        Expr::new(ExprKind::Builtin {
            builtin,
            arg: Box::new(arg),
        })
    }

    pub fn nat() -> Self {
        Expr::new(ExprKind::Nat)
    }

    pub fn apply(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Apply {
            name: name.into(),
            args,
        })
    }

    pub fn cell_ref(inner: Expr) -> Self {
        Expr::new(ExprKind::CellRef(Box::new(inner)))
    }

    pub fn negate(inner: Expr) -> Self {
        Expr::new(ExprKind::Negate(Box::new(inner)))
    }

    /// Short name of the expression kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Name(_) => "name",
            ExprKind::Number(_) => "number",
            ExprKind::Math { .. } => "math",
            ExprKind::Cond { .. } => "conditional",
            ExprKind::Builtin { .. } => "builtin",
            ExprKind::Nat => "nat",
            ExprKind::Apply { .. } => "application",
            ExprKind::CellRef(_) => "cell reference",
            ExprKind::Negate(_) => "negation",
        }
    }
}

/// Kind of an implicit parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParamKind {
    /// `{X:Type}`
    Type,
    /// `{n:#}`
    Nat,
}

/// One entry of a constructor's field list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldDef {
    /// Implicit parameter, bound from the caller's generic arguments.
    Param { name: String, kind: ParamKind },
    /// Curly-brace equation. Never evaluated.
    Constraint(Expr),
    Named { name: String, expr: Expr },
    /// Bare trailing expression, stored under `_`.
    Unnamed(Expr),
    /// Bracketed field list, inline or behind a reference.
    Group {
        name: Option<String>,
        is_ref: bool,
        fields: Vec<FieldDef>,
    },
}

impl FieldDef {
    pub fn named(name: impl Into<String>, expr: Expr) -> Self {
        FieldDef::Named {
            name: name.into(),
            expr,
        }
    }

    pub fn type_param(name: impl Into<String>) -> Self {
        FieldDef::Param {
            name: name.into(),
            kind: ParamKind::Type,
        }
    }

    pub fn nat_param(name: impl Into<String>) -> Self {
        FieldDef::Param {
            name: name.into(),
            kind: ParamKind::Nat,
        }
    }

    pub fn group(name: Option<&str>, fields: Vec<FieldDef>) -> Self {
        FieldDef::Group {
            name: name.map(str::to_string),
            is_ref: false,
            fields,
        }
    }

    pub fn ref_group(name: Option<&str>, fields: Vec<FieldDef>) -> Self {
        FieldDef::Group {
            name: name.map(str::to_string),
            is_ref: true,
            fields,
        }
    }
}

/// One constructor of a combinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Declaration {
    pub constructor: String,
    /// Tag literal as written: `$0101`, `#a1`, `$_`, `#_`, or none.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tag: Option<String>,
    pub combinator: String,
    pub fields: Vec<FieldDef>,
}

impl Declaration {
    pub fn new(constructor: impl Into<String>, tag: Option<&str>, combinator: impl Into<String>) -> Self {
        Declaration {
            constructor: constructor.into(),
            tag: tag.map(str::to_string),
            combinator: combinator.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

/// Ordered list of declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Program { declarations }
    }
}
