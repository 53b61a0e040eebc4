use criterion::{Criterion, black_box, criterion_group, criterion_main};

use blockpool::{BlockPool, BlockingLock, PoolConfig, PooledList, TypedPool};

fn bench_allocate_deallocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("alloc_cycle");

    let pool = BlockPool::with_config(PoolConfig::production(64, 1024)).unwrap();
    group.bench_function("block_pool", |b| {
        b.iter(|| {
            let block = pool.allocate().unwrap();
            black_box(block.addr());
            pool.deallocate(block);
        });
    });

    let blocking =
        BlockPool::<BlockingLock>::with_config_in(PoolConfig::production(64, 1024)).unwrap();
    group.bench_function("block_pool_blocking_lock", |b| {
        b.iter(|| {
            let block = blocking.allocate().unwrap();
            black_box(block.addr());
            blocking.deallocate(block);
        });
    });

    group.bench_function("system_allocator", |b| {
        b.iter(|| {
            let boxed: Box<[u8; 64]> = Box::new([0u8; 64]);
            black_box(boxed.as_ptr());
        });
    });

    group.finish();
}

fn bench_growth(c: &mut Criterion) {
    c.bench_function("growth_from_two_blocks", |b| {
        b.iter(|| {
            let pool = BlockPool::with_config(PoolConfig::production(64, 2)).unwrap();
            let mut held = Vec::with_capacity(64);
            for _ in 0..64 {
                held.push(pool.allocate().unwrap());
            }
            black_box(pool.capacity());
            for block in held {
                pool.deallocate(block);
            }
        });
    });
}

fn bench_typed_round_trip(c: &mut Criterion) {
    let pool: TypedPool<u64> = TypedPool::new(1024).unwrap();

    c.bench_function("typed_pool_round_trip", |b| {
        b.iter(|| {
            let boxed = pool.allocate(black_box(42u64)).unwrap();
            black_box(*boxed);
        });
    });
}

fn bench_list_sort(c: &mut Criterion) {
    c.bench_function("pooled_list_sort_1k", |b| {
        b.iter(|| {
            let mut list = PooledList::with_capacity(1024).unwrap();
            for n in (0..1024i32).rev() {
                list.push_back(n).unwrap();
            }
            list.sort();
            black_box(list.front().copied());
        });
    });
}

criterion_group!(
    benches,
    bench_allocate_deallocate,
    bench_growth,
    bench_typed_round_trip,
    bench_list_sort
);
criterion_main!(benches);
