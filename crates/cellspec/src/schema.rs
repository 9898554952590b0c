//! Schema: compiled set of declarations used to decode cells into records.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    ast::{Declaration, Expr, ExprKind, Program},
    cell::Cell,
    compiled::CompiledDeclaration,
    decoder::Decoder,
    env::Bindings,
    errors::{CompileError, DecodeError},
    options::DecodeOptions,
    value::{ErrorReport, Record},
};

/// A compiled schema. Use [Schema::compile] to build one from a [Program],
/// then [Schema::decode] or [Schema::try_decode] to decode cells.
///
/// A schema is immutable once compiled and can be shared between threads;
/// every decode call works on its own cursor.
#[derive(Debug, Clone)]
pub struct Schema {
    declarations: Vec<CompiledDeclaration>,
    families: HashMap<String, Vec<usize>>,
    constructors: HashMap<String, usize>,
}

/// Declarations found for a type name.
#[derive(Debug)]
pub enum Resolved<'s> {
    /// Every constructor of the combinator, in declaration order.
    Family(Vec<&'s CompiledDeclaration>),
    /// A single constructor named directly.
    Constructor(&'s CompiledDeclaration),
}

/// Result of [Schema::try_decode].
#[derive(Debug, Clone)]
pub struct Decoded {
    /// Best record that could be decoded, possibly carrying embedded errors.
    pub record: Record,
    /// All embedded errors of `record`, children before parents.
    pub errors: Vec<ErrorReport>,
}

impl Decoded {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Schema {
    /// Compiles `program`. Fails on malformed tags or unnamed declarations.
    pub fn compile(program: &Program) -> Result<Self, CompileError> {
        let mut declarations = Vec::with_capacity(program.declarations.len());
        let mut families: HashMap<String, Vec<usize>> = HashMap::new();
        let mut constructors = HashMap::new();

        for (index, decl) in program.declarations.iter().enumerate() {
            if decl.constructor.is_empty() || decl.combinator.is_empty() {
                return Err(CompileError::EmptyName { index });
            }

            let compiled = CompiledDeclaration::try_from(decl.clone())?;

            families
                .entry(compiled.decl.combinator.clone())
                .or_default()
                .push(index);
            constructors
                .entry(compiled.decl.constructor.clone())
                .or_insert(index);

            declarations.push(compiled);
        }

        Ok(Self {
            declarations,
            families,
            constructors,
        })
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().map(|compiled| &compiled.decl)
    }

    /// Looks `name` up as a combinator first, then as a constructor.
    pub fn resolve(&self, name: &str) -> Option<Resolved<'_>> {
        if let Some(indices) = self.families.get(name) {
            return Some(Resolved::Family(
                indices.iter().map(|&i| &self.declarations[i]).collect(),
            ));
        }

        self.constructors
            .get(name)
            .map(|&i| Resolved::Constructor(&self.declarations[i]))
    }

    /// Decodes `cell` as `type_name` instantiated with `args`. Fails on the
    /// first error that is not contained by a cell reference.
    pub fn decode(&self, cell: &Cell, type_name: &str, args: &[Expr]) -> Result<Record, DecodeError> {
        self.decode_with_options(cell, type_name, args, &DecodeOptions::default())
    }

    pub fn decode_with_options(
        &self,
        cell: &Cell,
        type_name: &str,
        args: &[Expr],
        options: &DecodeOptions,
    ) -> Result<Record, DecodeError> {
        let mut slice = cell.begin_parse();
        Decoder::new(self, options).decode_type(&mut slice, type_name, args, &Bindings::new())
    }

    /// Decodes as much of `cell` as possible. Never fails: a top-level failure
    /// becomes an embedded error on the returned record.
    pub fn try_decode(&self, cell: &Cell, type_name: &str, args: &[Expr]) -> Decoded {
        self.try_decode_with_options(cell, type_name, args, &DecodeOptions::default())
    }

    pub fn try_decode_with_options(
        &self,
        cell: &Cell,
        type_name: &str,
        args: &[Expr],
        options: &DecodeOptions,
    ) -> Decoded {
        let record = match self.decode_with_options(cell, type_name, args, options) {
            Ok(record) => record,
            Err(e) => {
                debug!("decode of {} failed: {}", type_name, e);
                Record::contained(e)
            }
        };
        let errors = record.errors();

        Decoded { record, errors }
    }
}

/// Substitutes bound generic names in `expr`, following chains of bindings
/// and descending into combinator arguments.
pub fn resolve_type(expr: &Expr, bindings: &Bindings) -> Expr {
    match &expr.kind {
        ExprKind::Name(name) => match bindings.get(name) {
            Some(bound) => resolve_type(bound, bindings),
            None => expr.clone(),
        },
        ExprKind::Apply { name, args } => Expr {
            kind: ExprKind::Apply {
                name: name.clone(),
                args: args.iter().map(|arg| resolve_type(arg, bindings)).collect(),
            },
            location: expr.location,
        },
        _ => expr.clone(),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::FieldDef;

    use super::*;

    fn maybe_program() -> Program {
        Program::new(vec![
            Declaration::new("nothing", Some("$0"), "Maybe").field(FieldDef::type_param("X")),
            Declaration::new("just", Some("$1"), "Maybe")
                .field(FieldDef::type_param("X"))
                .field(FieldDef::named("value", Expr::name("X"))),
        ])
    }

    #[test]
    fn test_resolve_family_in_order() {
        let schema = Schema::compile(&maybe_program()).unwrap();
        match schema.resolve("Maybe") {
            Some(Resolved::Family(decls)) => {
                let names: Vec<_> = decls.iter().map(|d| d.decl.constructor.as_str()).collect();
                assert_eq!(names, vec!["nothing", "just"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resolve_constructor() {
        let schema = Schema::compile(&maybe_program()).unwrap();
        match schema.resolve("just") {
            Some(Resolved::Constructor(decl)) => assert_eq!(decl.decl.combinator, "Maybe"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(schema.resolve("Either").is_none());
    }

    #[test]
    fn test_family_wins_over_constructor() {
        let program = Program::new(vec![
            Declaration::new("Pair", None, "Other"),
            Declaration::new("pair", None, "Pair"),
        ]);
        let schema = Schema::compile(&program).unwrap();
        match schema.resolve("Pair") {
            Some(Resolved::Family(decls)) => assert_eq!(decls[0].decl.constructor, "pair"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_compile_rejects_bad_tag() {
        let program = Program::new(vec![Declaration::new("c", Some("$12"), "T")]);
        assert!(matches!(
            Schema::compile(&program),
            Err(CompileError::InvalidTag { .. })
        ));
    }

    #[test]
    fn test_compile_rejects_empty_name() {
        let program = Program::new(vec![Declaration::new("", None, "T")]);
        assert_eq!(
            Schema::compile(&program).unwrap_err(),
            CompileError::EmptyName { index: 0 }
        );
    }

    #[test]
    fn test_resolve_type_follows_chains() {
        let bindings = Bindings::from([
            ("X".to_string(), Expr::name("Y")),
            ("Y".to_string(), Expr::name("uint8")),
        ]);
        let expr = Expr::apply("Maybe", vec![Expr::name("X"), Expr::name("Z")]);

        assert_eq!(
            resolve_type(&expr, &bindings),
            Expr::apply("Maybe", vec![Expr::name("uint8"), Expr::name("Z")])
        );
        assert_eq!(resolve_type(&Expr::number(3), &bindings), Expr::number(3));
    }
}
