use criterion::{black_box, criterion_group, criterion_main, Criterion};

use berium::gen::CollectSink;
use berium::schema::{
    Builtin, Literal, MemberDefinition, Module, TagSpec, TaggingDefault, TypeDefinition, TypeKind, TypeRef,
    ValueAssignment,
};
use berium::{Generator, GeneratorConfig};

fn schema(width: usize) -> Module {
    let mut module = Module::new("Inventory", TaggingDefault::Automatic);
    for i in 0..width {
        let members = vec![
            MemberDefinition::new("id", TypeRef::Builtin(Builtin::Integer)),
            MemberDefinition::new("name", TypeRef::Builtin(Builtin::Utf8String)).optional(),
            MemberDefinition::new("tags", TypeRef::Inline(Box::new(TypeDefinition::new(
                "",
                TypeKind::SequenceOf(TypeRef::Builtin(Builtin::PrintableString)),
            )))),
            MemberDefinition::new("next", TypeRef::named(&format!("Item{}", (i + 1) % width))).optional(),
        ];
        module.types.push(TypeDefinition::new(&format!("Item{i}"), TypeKind::Sequence).with_members(members));
        module.types.push(
            TypeDefinition::new(&format!("Choice{i}"), TypeKind::Choice).with_members(vec![
                MemberDefinition::new("item", TypeRef::named(&format!("Item{i}"))),
                MemberDefinition::new("code", TypeRef::Builtin(Builtin::Integer)).tagged(TagSpec::context(9)),
            ]),
        );
        module.values.push(ValueAssignment::new(
            &format!("limit-{i}"),
            TypeRef::Builtin(Builtin::Integer),
            Literal::Integer((i as i64).into()),
        ));
    }
    module
}

fn generate_bench(c: &mut Criterion) {
    let module = schema(50);
    c.bench_function("generate_module", |b| {
        b.iter(|| {
            let mut sink = CollectSink::new();
            black_box(Generator::new(GeneratorConfig::default(), &mut sink).generate(&module))
        })
    });
}

criterion_group! {
    name = generate_benches;
    config = Criterion::default();
    targets = generate_bench
}

criterion_main!(generate_benches);
