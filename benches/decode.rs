use criterion::{criterion_group, criterion_main, Criterion};
use elfchain::{Chain, Chunk};
use std::hint::black_box;

fn decode(c: &mut Criterion) {
    let mut sled = vec![0x90u8; 4096];
    *sled.last_mut().unwrap() = 0xc3;

    c.bench_function("chain:decode_4k_sled", |b| {
        b.iter(|| Chain::from_chunk(0x400000, Chunk::new(black_box(&sled))).unwrap());
    });

    let chain = Chain::from_chunk(0x400000, Chunk::new(&sled)).unwrap();
    c.bench_function("chain:prefix_map_4k", |b| {
        b.iter(|| chain.map_prefix(Chunk::new(black_box(&[0x90]))));
    });
}

criterion_group!(benches, decode);
criterion_main!(benches);
