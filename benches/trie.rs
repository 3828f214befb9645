use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{thread_rng, Rng};

use dartrie::DoubleArrayTrie;

fn random_keys(count: usize, rng: &mut impl Rng) -> Vec<Vec<u8>> {
    (0..count)
        .map(|_| {
            let len = rng.gen_range(5..40);
            (0..len).map(|_| rng.gen_range(1u8..=255)).collect()
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = thread_rng();
    let samples_100 = random_keys(100, &mut rng);
    let samples_1000 = random_keys(1000, &mut rng);
    let samples_10000 = random_keys(10000, &mut rng);
    let samples_100000 = random_keys(100000, &mut rng);

    c.bench_function("insert 100", |b| {
        b.iter(|| {
            let mut t: DoubleArrayTrie<i32> = DoubleArrayTrie::new();
            for k in black_box(&samples_100) {
                t.insert(k);
            }
        })
    });
    c.bench_function("insert 1000", |b| {
        b.iter(|| {
            let mut t: DoubleArrayTrie<i32> = DoubleArrayTrie::new();
            for k in black_box(&samples_1000) {
                t.insert(k);
            }
        })
    });
    c.bench_function("insert 10000", |b| {
        b.iter(|| {
            let mut t: DoubleArrayTrie<i32> = DoubleArrayTrie::new();
            for k in black_box(&samples_10000) {
                t.insert(k);
            }
        })
    });
    c.bench_function("insert 100000", |b| {
        b.iter(|| {
            let mut t: DoubleArrayTrie<i32> = DoubleArrayTrie::new();
            for k in black_box(&samples_100000) {
                t.insert(k);
            }
        })
    });

    let mut lookup_trie: DoubleArrayTrie<i32> = DoubleArrayTrie::new();
    for k in &samples_100000 {
        lookup_trie.insert(k);
    }
    c.bench_function("exact_match hit (100000 keys)", |b| {
        b.iter(|| {
            for k in black_box(&samples_10000) {
                black_box(lookup_trie.exact_match(k));
            }
        })
    });
    c.bench_function("common_prefix_predict (100000 keys)", |b| {
        b.iter(|| {
            for k in black_box(&samples_1000) {
                black_box(lookup_trie.common_prefix_predict(&k[..k.len() / 2]));
            }
        })
    });

    c.bench_function("erase then reinsert (1000 keys)", |b| {
        let mut t: DoubleArrayTrie<i32> = DoubleArrayTrie::new();
        for k in &samples_1000 {
            t.insert(k);
        }
        b.iter(|| {
            for k in black_box(&samples_1000) {
                let _ = t.erase(k);
            }
            for k in black_box(&samples_1000) {
                t.insert(k);
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
