use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    dispatch::bench_tokenize,
    dispatch::bench_dispatch,
    dispatch::bench_ingest_and_execute,
    dispatch::bench_keyword_hash
);
criterion_main!(benches);
