use cellspec::{
    Schema,
    ast::{Declaration, Expr, FieldDef, Program},
    cell::{Cell, CellBuilder},
};
use criterion::{Criterion, criterion_group, criterion_main};

fn gen_schema(field_count: usize) -> Schema {
    let mut decl = Declaration::new("flat", Some("#ab"), "Flat");
    for i in 0..field_count {
        decl = decl.field(FieldDef::named(format!("f{}", i), Expr::name("uint16")));
    }

    let chain = vec![
        Declaration::new("chain_end", Some("$0"), "Chain"),
        Declaration::new("chain_link", Some("$1"), "Chain")
            .field(FieldDef::named("value", Expr::name("uint32")))
            .field(FieldDef::named("next", Expr::cell_ref(Expr::name("Chain")))),
    ];

    let mut declarations = vec![decl];
    declarations.extend(chain);
    Schema::compile(&Program::new(declarations)).unwrap()
}

fn gen_flat_cell(field_count: usize) -> Cell {
    let mut builder = CellBuilder::new();
    builder.store_uint(0xabu8, 8).unwrap();

    // Deterministic but non-trivial pattern
    for i in 0..field_count {
        builder.store_uint((i * 31 % 65536) as u32, 16).unwrap();
    }

    builder.build()
}

fn gen_chain_cell(len: usize) -> Cell {
    let mut cell = CellBuilder::new().store_bit(false).unwrap().build();
    for i in 0..len {
        cell = CellBuilder::new()
            .store_bit(true)
            .unwrap()
            .store_uint(i as u32, 32)
            .unwrap()
            .store_ref(cell)
            .unwrap()
            .build();
    }
    cell
}

fn bench_decode_flat(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50] {
        let schema = gen_schema(field_count);
        let cell = gen_flat_cell(field_count);

        c.bench_function(&format!("decode_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = schema.decode(&cell, "Flat", &[]).unwrap();
            })
        });
    }
}

fn bench_decode_chain(c: &mut Criterion) {
    let schema = gen_schema(0);

    for &len in &[1usize, 16, 64] {
        let cell = gen_chain_cell(len);

        c.bench_function(&format!("decode_chain_{}", len), |b| {
            b.iter(|| {
                let _ = schema.try_decode(&cell, "Chain", &[]);
            })
        });
    }
}

criterion_group!(benches, bench_decode_flat, bench_decode_chain);
criterion_main!(benches);
