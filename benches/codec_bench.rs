use criterion::{black_box, criterion_group, criterion_main, Criterion};

use berium::{Ber, Decode, Der, Encode, Integer, OctetString, SequenceOf, Utf8String};

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
struct Entry {
    serial: Integer,
    #[asn1(tag = "[0] IMPLICIT")]
    label: Option<Utf8String>,
    payload: OctetString,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
struct Batch {
    version: u8,
    entries: SequenceOf<Entry>,
}

fn sample() -> Batch {
    let entries = (0..64u32)
        .map(|i| Entry {
            serial: Integer::from(i64::from(i) * 1_000_003),
            label: (i % 2 == 0).then(|| Utf8String::new("entry").unwrap()),
            payload: OctetString::from(vec![i as u8; 48]),
        })
        .collect();
    Batch { version: 2, entries }
}

fn encode_bench(c: &mut Criterion) {
    let batch = sample();
    c.bench_function("encode_der", |b| b.iter(|| black_box(batch.to_der().unwrap())));
    c.bench_function("encode_ber", |b| b.iter(|| black_box(batch.to_ber().unwrap())));
    let mut out = vec![0u8; batch.encoded_len::<Der>().unwrap()];
    c.bench_function("encode_into_slice", |b| {
        b.iter(|| black_box(berium::encode::<Der, _>(&mut out, &batch)))
    });
}

fn decode_bench(c: &mut Criterion) {
    let bytes = sample().to_der().unwrap();
    c.bench_function("decode_der", |b| b.iter(|| black_box(Batch::from_der(&bytes).unwrap())));
    c.bench_function("decode_ber", |b| b.iter(|| black_box(Batch::decode_all::<Ber>(&bytes).unwrap())));
}

criterion_group! {
    name = codec_benches;
    config = Criterion::default();
    targets = encode_bench, decode_bench
}

criterion_main!(codec_benches);
