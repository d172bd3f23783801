#[macro_use]
extern crate criterion;

use kvd::{KvStore, KvsEngine, Record};

use criterion::black_box;
use criterion::Criterion;

fn kv_store_benchmark(c: &mut Criterion) {
    c.bench_function("KvStore set/get", |b| {
        b.iter_batched_ref(
            KvStore::new,
            |ref mut store| {
                for i in 0..1000 {
                    store
                        .set(format!("key-{}", i), format!("value-{}", i))
                        .unwrap();
                }
                for i in 0..1000 {
                    black_box(store.get(&format!("key-{}", i)).unwrap());
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });

    c.bench_function("KvStore bulk set/get", |b| {
        let keys: Vec<String> = (0..1000).map(|i| format!("key-{}", i)).collect();

        b.iter_batched_ref(
            || {
                let records = keys
                    .iter()
                    .map(|k| Record::new(k.as_str(), "value"))
                    .collect::<Vec<_>>();
                (KvStore::new(), records)
            },
            |(store, records)| {
                store.bulk_set(std::mem::replace(records, Vec::new())).unwrap();
                black_box(store.bulk_get(&keys).unwrap());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, kv_store_benchmark);
criterion_main!(benches);
