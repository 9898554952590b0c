use cellspec::{
    Schema, Value,
    ast::{Declaration, Expr, FieldDef, Program},
    cell::{Cell, CellBuilder},
};
use num_bigint::{BigInt, BigUint};
use proptest::prelude::*;

fn record_schema() -> Schema {
    let program = Program::new(vec![
        Declaration::new("rec", Some("$101"), "Rec")
            .field(FieldDef::named("a", Expr::name("uint64")))
            .field(FieldDef::named("b", Expr::name("int32")))
            .field(FieldDef::named("flag", Expr::name("Bool")))
            .field(FieldDef::named(
                "opt",
                Expr::cond(Expr::name("flag"), None, Expr::name("uint8")),
            ))
            .field(FieldDef::named("width", Expr::name("uint4")))
            .field(FieldDef::named(
                "tail",
                Expr::apply("uint", vec![Expr::name("width")]),
            )),
    ]);
    Schema::compile(&program).unwrap()
}

fn encode(a: u64, b: i32, opt: Option<u8>, width: u8, tail: u16) -> Cell {
    let mut builder = CellBuilder::new();
    builder
        .store_uint(0b101u8, 3)
        .unwrap()
        .store_uint(a, 64)
        .unwrap()
        .store_int(b, 32)
        .unwrap()
        .store_bit(opt.is_some())
        .unwrap();
    if let Some(opt) = opt {
        builder.store_uint(opt, 8).unwrap();
    }
    builder
        .store_uint(width, 4)
        .unwrap()
        .store_uint(tail, width as usize)
        .unwrap();
    builder.build()
}

prop_compose! {
    fn width_and_tail()(width in 0u8..16)(width in Just(width), tail in 0u16..(1u16 << width)) -> (u8, u16) {
        (width, tail)
    }
}

proptest! {
    #[test]
    fn test_fields_decode_to_stored_values(
        a in any::<u64>(),
        b in any::<i32>(),
        opt in proptest::option::of(any::<u8>()),
        (width, tail) in width_and_tail(),
    ) {
        let schema = record_schema();
        let cell = encode(a, b, opt, width, tail);

        let record = schema.decode(&cell, "Rec", &[]).unwrap();
        prop_assert_eq!(record.constructor_name(), Some("rec"));
        prop_assert_eq!(record.get("a"), Some(&Value::Uint(BigUint::from(a))));
        prop_assert_eq!(record.get("b"), Some(&Value::Int(BigInt::from(b))));
        prop_assert_eq!(record.get("flag"), Some(&Value::Bool(opt.is_some())));
        let expected_opt = match opt {
            Some(v) => Value::Uint(BigUint::from(v)),
            None => Value::Absent,
        };
        prop_assert_eq!(record.get("opt"), Some(&expected_opt));
        prop_assert_eq!(record.get("tail"), Some(&Value::Uint(BigUint::from(tail))));
    }

    #[test]
    fn test_decode_is_deterministic(
        a in any::<u64>(),
        b in any::<i32>(),
        opt in proptest::option::of(any::<u8>()),
    ) {
        let schema = record_schema();
        let cell = encode(a, b, opt, 0, 0);

        let first = schema.try_decode(&cell, "Rec", &[]);
        let second = schema.try_decode(&cell, "Rec", &[]);
        prop_assert!(first.is_complete());
        prop_assert_eq!(first.record, second.record);
    }

    #[test]
    fn test_truncation_never_panics(a in any::<u64>(), cut in 0usize..3 + 64 + 32) {
        let schema = record_schema();
        let full = encode(a, -1, None, 0, 0);
        let bits = full.bits().range(0, cut).unwrap();
        let cell = CellBuilder::new().store_bits(&bits).unwrap().build();

        let decoded = schema.try_decode(&cell, "Rec", &[]);
        prop_assert!(!decoded.is_complete());
        prop_assert_eq!(decoded.errors.len(), 1);
    }
}
