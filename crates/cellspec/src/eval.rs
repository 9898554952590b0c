//! Numeric evaluation of schema expressions. Never touches a cursor.

use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};

use crate::{
    ast::{Expr, ExprKind},
    env::{Bindings, Scope},
    errors::DecodeErrorKind,
};

/// Evaluates `expr` to an integer, looking names up in `bindings` first and
/// then in `scope`.
pub fn eval_numeric(expr: &Expr, bindings: &Bindings, scope: &Scope<'_>) -> Result<BigInt, DecodeErrorKind> {
    match &expr.kind {
        ExprKind::Number(n) => Ok(BigInt::from(*n)),
        ExprKind::Name(name) => {
            if let Some(bound) = bindings.get(name) {
                return eval_numeric(bound, bindings, scope);
            }
            match scope.get(name) {
                Some(value) => value
                    .to_integer()
                    .ok_or_else(|| DecodeErrorKind::NotNumeric(name.clone())),
                None => Err(DecodeErrorKind::UnknownIdentifier(name.clone())),
            }
        }
        ExprKind::Math { op, left, right } => {
            let left = eval_numeric(left, bindings, scope)?;
            let right = eval_numeric(right, bindings, scope)?;
            match op.as_str() {
                "+" => Ok(left + right),
                "*" => Ok(left * right),
                _ => Err(DecodeErrorKind::UnsupportedOperator(op.clone())),
            }
        }
        ExprKind::Cond { guard, bit, then } => {
            let guard = eval_numeric(guard, bindings, scope)?;
            let flag = match bit {
                Some(bit) => guard.bit(*bit as u64),
                None => guard != BigInt::ZERO,
            };
            if !flag {
                return Ok(BigInt::ZERO);
            }
            eval_numeric(then, bindings, scope)
        }
        _ => Err(unsupported(expr)),
    }
}

/// Converts an evaluated width into a bit count.
pub fn to_width(value: &BigInt) -> Result<usize, DecodeErrorKind> {
    value
        .to_usize()
        .ok_or_else(|| DecodeErrorKind::WidthOverflow(value.to_string()))
}

/// Bits needed to store any value below `limit` (or up to it when `inclusive`):
/// `ceil(log2(limit))`, zero for limits of 0 and 1.
pub fn range_width(limit: &BigInt, inclusive: bool) -> Result<usize, DecodeErrorKind> {
    let count = if inclusive { limit + BigInt::one() } else { limit.clone() };
    if count <= BigInt::one() {
        return Ok(0);
    }

    to_width(&BigInt::from((count - BigInt::one()).bits()))
}

pub fn unsupported(expr: &Expr) -> DecodeErrorKind {
    DecodeErrorKind::UnsupportedExpression {
        what: expr.kind_name().to_string(),
        location: expr.location,
    }
}
