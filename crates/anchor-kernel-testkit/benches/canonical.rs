use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use anchor_kernel_core::{
    canonicalize, decode_blob, derive_identifier, EntityKind, Keypair, NetworkScope, PropertyType,
    SchemaBuilder, SchemaRecord, Uri,
};

fn bench_canonicalize(c: &mut Criterion) {
    let record = json!({
        "name": "Ada Lovelace",
        "age": 36,
        "tags": ["math", "engines", "notes"],
        "address": {"city": "London", "street": "St James's Square", "number": 12},
        "score": 99.5
    });
    c.bench_function("canonicalize", |b| {
        b.iter(|| canonicalize(black_box(&record)).unwrap())
    });

    let blob = canonicalize(&record).unwrap().to_blob();
    c.bench_function("decode_blob", |b| b.iter(|| decode_blob(black_box(&blob)).unwrap()));
}

fn bench_identifiers(c: &mut Criterion) {
    let creator = Keypair::from_seed(&[1; 32]).did();
    let scope = NetworkScope::default();
    let registry = Uri::from_id(EntityKind::Registry, scope.clone(), [2; 32]);
    let canonical = canonicalize(&json!({"serial": 42, "batch": "A"})).unwrap();

    c.bench_function("derive_identifier", |b| {
        b.iter(|| {
            derive_identifier(
                EntityKind::Entry,
                black_box(&canonical),
                &[registry.id_bytes().as_slice(), creator.address().as_slice()],
                &scope,
            )
        })
    });

    let namespace = Uri::from_id(EntityKind::Namespace, scope.clone(), [3; 32]);
    let definition = SchemaBuilder::new("Person")
        .property("name", PropertyType::string())
        .property("age", PropertyType::Integer)
        .required(["name", "age"])
        .build()
        .unwrap();
    c.bench_function("schema_record_build", |b| {
        b.iter(|| SchemaRecord::build(black_box(&definition), &namespace, &creator, &scope).unwrap())
    });
}

criterion_group!(benches, bench_canonicalize, bench_identifiers);
criterion_main!(benches);
