//! Recursive descent over the schema: constructor selection, generic binding,
//! field decoding and the expression dispatch that reads from the cursor.
//!
//! Failures travel up as [DecodeError]s carrying the partial record built so
//! far. Each level adds its own decoded siblings and constructor metadata.
//! Failures stop at cell references (`^T` fields and referenced groups), where
//! they become embedded-error records and decoding of the enclosing record
//! continues, and at [crate::Schema::try_decode].

use num_bigint::{BigInt, BigUint};
use tracing::{debug, trace};

use crate::{
    ast::{Builtin, Expr, ExprKind, FieldDef},
    cell::Slice,
    compiled::CompiledDeclaration,
    env::{Bindings, Scope},
    errors::{CellError, DecodeError, DecodeErrorKind, DecodeResult},
    eval::{eval_numeric, range_width, to_width, unsupported},
    options::DecodeOptions,
    schema::{Resolved, Schema, resolve_type},
    value::{ConstructorInfo, Record, UNNAMED, Value},
};

pub(crate) struct Decoder<'s> {
    schema: &'s Schema,
    options: &'s DecodeOptions,
    depth: usize,
}

/// Integer layouts selected by builtin names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Uint(usize),
    Int(usize),
    Bits(usize),
}

impl<'s> Decoder<'s> {
    pub(crate) fn new(schema: &'s Schema, options: &'s DecodeOptions) -> Self {
        Decoder {
            schema,
            options,
            depth: 0,
        }
    }

    /// Decodes the combinator or constructor called `name`.
    pub(crate) fn decode_type(
        &mut self,
        slice: &mut Slice,
        name: &str,
        args: &[Expr],
        bindings: &Bindings,
    ) -> DecodeResult<Record> {
        if let Some(max) = self.options.max_depth {
            if self.depth >= max {
                return Err(DecodeError::new(DecodeErrorKind::DepthExceeded(max), slice));
            }
        }

        self.depth += 1;
        let result = self.select_variant(slice, name, args, bindings);
        self.depth -= 1;
        result
    }

    fn select_variant(
        &mut self,
        slice: &mut Slice,
        name: &str,
        args: &[Expr],
        bindings: &Bindings,
    ) -> DecodeResult<Record> {
        let schema = self.schema;
        match schema.resolve(name) {
            Some(Resolved::Family(candidates)) => {
                let mut last_error = None;

                for candidate in candidates {
                    if !candidate.tag.matches(slice) {
                        continue;
                    }

                    trace!("trying {} for {}", candidate.decl.constructor, name);
                    let start = slice.position();
                    match self.decode_declaration(slice, candidate, args, bindings, true) {
                        Ok(record) => return Ok(record),
                        Err(e) => {
                            trace!("{} rejected: {}", candidate.decl.constructor, e);
                            slice.restore(start);
                            last_error = Some(e);
                        }
                    }
                }

                Err(last_error.unwrap_or_else(|| {
                    DecodeError::new(DecodeErrorKind::NoMatchingConstructor(name.to_string()), slice)
                }))
            }
            // The caller chose the constructor, so its tag is neither checked nor read.
            Some(Resolved::Constructor(decl)) => {
                self.decode_declaration(slice, decl, args, bindings, false)
            }
            None => Err(DecodeError::new(DecodeErrorKind::UnknownType(name.to_string()), slice)),
        }
    }

    /// Binds generic parameters and decodes the fields of one constructor.
    /// With `read_tag` the tag, which must already have matched, is consumed
    /// first.
    fn decode_declaration(
        &mut self,
        slice: &mut Slice,
        compiled: &CompiledDeclaration,
        args: &[Expr],
        bindings: &Bindings,
        read_tag: bool,
    ) -> DecodeResult<Record> {
        let decl = &compiled.decl;
        if read_tag {
            slice
                .skip_bits(compiled.tag.len_bits)
                .map_err(|e| DecodeError::new(e, slice))?;
        }

        let mut local = bindings.clone();
        let params = decl.fields.iter().filter_map(|field| match field {
            FieldDef::Param { name, .. } => Some(name),
            _ => None,
        });
        for (name, arg) in params.zip(args) {
            // An unresolved `X` passed as `X` would bind the name to itself.
            if is_name(arg, name) {
                continue;
            }
            local.insert(name.clone(), arg.clone());
        }

        let info = ConstructorInfo {
            name: decl.constructor.clone(),
            tag: compiled.tag_text().to_string(),
            combinator: decl.combinator.clone(),
        };

        match self.decode_fields(slice, &decl.fields, &local, &Scope::root()) {
            Ok(mut record) => {
                record.constructor = Some(info);
                Ok(record)
            }
            Err(mut e) => {
                let mut partial = match e.partial.take() {
                    Some(Value::Record(record)) => record,
                    _ => Record::new(),
                };
                partial.constructor = Some(info);
                e.partial = Some(partial.into());
                Err(e)
            }
        }
    }

    fn decode_fields(
        &mut self,
        slice: &mut Slice,
        fields: &[FieldDef],
        bindings: &Bindings,
        parent: &Scope<'_>,
    ) -> DecodeResult<Record> {
        let mut record = Record::new();

        for field in fields {
            match field {
                FieldDef::Param { .. } | FieldDef::Constraint(_) => {}
                FieldDef::Named { name, expr } => {
                    self.decode_field(slice, &mut record, name, expr, bindings, parent)?
                }
                FieldDef::Unnamed(expr) => {
                    self.decode_field(slice, &mut record, UNNAMED, expr, bindings, parent)?
                }
                FieldDef::Group {
                    name,
                    is_ref: true,
                    fields: inner,
                } => {
                    let key = name.as_deref().unwrap_or(UNNAMED);
                    let mut child = match slice.load_ref() {
                        Ok(child) => child,
                        Err(e) => {
                            return Err(DecodeError::new(e, slice).with_partial(record.into()));
                        }
                    };

                    let scope = parent.child(&record.fields);
                    let value = match self.decode_fields(&mut child, inner, bindings, &scope) {
                        Ok(group) => group,
                        Err(e) => {
                            debug!("contained failure in referenced group {}: {}", key, e);
                            Record::contained(e)
                        }
                    };
                    record.insert(key, value.into());
                }
                FieldDef::Group {
                    name,
                    is_ref: false,
                    fields: inner,
                } => {
                    let key = name.as_deref().unwrap_or(UNNAMED);
                    let scope = parent.child(&record.fields);
                    match self.decode_fields(slice, inner, bindings, &scope) {
                        Ok(group) => record.insert(key, group.into()),
                        Err(e) => return Err(attach_partial(record, key, e)),
                    }
                }
            }
        }

        Ok(record)
    }

    fn decode_field(
        &mut self,
        slice: &mut Slice,
        record: &mut Record,
        name: &str,
        expr: &Expr,
        bindings: &Bindings,
        parent: &Scope<'_>,
    ) -> DecodeResult<()> {
        let scope = parent.child(&record.fields);
        match self.decode_expr(slice, expr, bindings, &scope) {
            Ok(value) => {
                record.insert(name, value);
                Ok(())
            }
            Err(e) => Err(attach_partial(std::mem::take(record), name, e)),
        }
    }

    fn decode_expr(
        &mut self,
        slice: &mut Slice,
        expr: &Expr,
        bindings: &Bindings,
        scope: &Scope<'_>,
    ) -> DecodeResult<Value> {
        match &expr.kind {
            ExprKind::Math { op, left, right } if op == "*" && is_name(right, "Bit") => {
                let len = numeric_width(left, bindings, scope, slice)?;
                read(slice, |s| s.read_bits(len)).map(Value::Bits)
            }
            ExprKind::Cond { guard, bit, then } => {
                self.decode_conditional(slice, guard, *bit, then, bindings, scope)
            }
            ExprKind::CellRef(inner) => {
                let mut child = read(slice, Slice::load_ref)?;
                match self.decode_expr(&mut child, inner, bindings, scope) {
                    Ok(value) => Ok(value),
                    Err(e) => {
                        debug!("contained failure behind reference: {}", e);
                        Ok(Record::contained(e).into())
                    }
                }
            }
            ExprKind::Builtin { builtin, arg } => {
                let limit = numeric(arg, bindings, scope, slice)?;
                let width = match builtin {
                    Builtin::FixedWidth => to_width(&limit),
                    Builtin::LessThan => range_width(&limit, false),
                    Builtin::LessOrEqual => range_width(&limit, true),
                }
                .map_err(|kind| DecodeError::new(kind, slice))?;
                read_sized(slice, Layout::Uint(width))
            }
            ExprKind::Apply { name, args } => match (name.as_str(), args.as_slice()) {
                ("uint", [arg]) => {
                    let width = numeric_width(arg, bindings, scope, slice)?;
                    read_sized(slice, Layout::Uint(width))
                }
                ("int", [arg]) => {
                    let width = numeric_width(arg, bindings, scope, slice)?;
                    read_sized(slice, Layout::Int(width))
                }
                ("bits", [arg]) => {
                    let width = numeric_width(arg, bindings, scope, slice)?;
                    read_sized(slice, Layout::Bits(width))
                }
                _ => {
                    let args: Vec<Expr> = args.iter().map(|arg| resolve_type(arg, bindings)).collect();
                    self.decode_type(slice, name, &args, bindings)
                        .map(Value::Record)
                }
            },
            ExprKind::Name(name) => self.decode_name(slice, name, bindings, scope),
            ExprKind::Number(n) => Ok(Value::Uint(BigUint::from(*n))),
            ExprKind::Nat => read_sized(slice, Layout::Uint(32)),
            ExprKind::Math { .. } | ExprKind::Negate(_) => Err(DecodeError::new(unsupported(expr), slice)),
        }
    }

    fn decode_name(
        &mut self,
        slice: &mut Slice,
        name: &str,
        bindings: &Bindings,
        scope: &Scope<'_>,
    ) -> DecodeResult<Value> {
        if let Some(bound) = bindings.get(name) {
            return self.decode_expr(slice, bound, bindings, scope);
        }
        if let Some(known) = scope.get(name) {
            return Ok(known.clone());
        }
        if let Some(layout) = parse_layout(name) {
            return read_sized(slice, layout);
        }

        match name {
            "Bool" => read(slice, Slice::read_bit).map(Value::Bool),
            "Bit" => read(slice, |s| s.read_bits(1)).map(Value::Bits),
            "Cell" | "Any" => Ok(Value::Slice(slice.clone())),
            _ => self
                .decode_type(slice, name, &[], bindings)
                .map(Value::Record),
        }
    }

    fn decode_conditional(
        &mut self,
        slice: &mut Slice,
        guard: &Expr,
        bit: Option<u32>,
        then: &Expr,
        bindings: &Bindings,
        scope: &Scope<'_>,
    ) -> DecodeResult<Value> {
        let known = match &guard.kind {
            ExprKind::Name(name) => scope.get(name),
            _ => None,
        };
        let guard_value = match known {
            Some(value) => value.clone(),
            None => self.decode_expr(slice, guard, bindings, scope)?,
        };

        let present = match bit {
            Some(bit) => guard_value
                .to_integer()
                .is_some_and(|value| value.bit(bit as u64)),
            None => guard_value.is_truthy(),
        };
        if !present {
            return Ok(Value::Absent);
        }

        self.decode_expr(slice, then, bindings, scope)
    }
}

/// Stores the failed field's own partial value (if any) next to its decoded
/// siblings and makes the result the error's partial record.
fn attach_partial(mut record: Record, name: &str, mut error: DecodeError) -> DecodeError {
    if let Some(partial) = error.partial.take() {
        record.insert(name, partial);
    }
    error.with_partial(record.into())
}

fn is_name(expr: &Expr, name: &str) -> bool {
    matches!(&expr.kind, ExprKind::Name(n) if n == name)
}

/// Recognizes `intN`, `uintN` and `bitsN`.
fn parse_layout(name: &str) -> Option<Layout> {
    let digits = |rest: &str| -> Option<usize> {
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    };

    if let Some(rest) = name.strip_prefix("int") {
        return digits(rest).map(Layout::Int);
    }
    if let Some(rest) = name.strip_prefix("uint") {
        return digits(rest).map(Layout::Uint);
    }
    if let Some(rest) = name.strip_prefix("bits") {
        return digits(rest).map(Layout::Bits);
    }

    None
}

fn read<T>(slice: &mut Slice, op: impl FnOnce(&mut Slice) -> Result<T, CellError>) -> DecodeResult<T> {
    op(&mut *slice).map_err(|e| DecodeError::new(e, slice))
}

fn read_sized(slice: &mut Slice, layout: Layout) -> DecodeResult<Value> {
    match layout {
        Layout::Uint(bits) => read(slice, |s| s.read_uint(bits)).map(Value::Uint),
        Layout::Int(bits) => read(slice, |s| s.read_int(bits)).map(Value::Int),
        Layout::Bits(bits) => read(slice, |s| s.read_bits(bits)).map(Value::Bits),
    }
}

fn numeric(expr: &Expr, bindings: &Bindings, scope: &Scope<'_>, slice: &Slice) -> DecodeResult<BigInt> {
    eval_numeric(expr, bindings, scope).map_err(|kind| DecodeError::new(kind, slice))
}

fn numeric_width(expr: &Expr, bindings: &Bindings, scope: &Scope<'_>, slice: &Slice) -> DecodeResult<usize> {
    let value = numeric(expr, bindings, scope, slice)?;
    to_width(&value).map_err(|kind| DecodeError::new(kind, slice))
}
