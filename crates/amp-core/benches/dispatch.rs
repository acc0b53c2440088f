//! Benchmarks for kernel dispatch and host access on shared arrays

use amp_core::{parallel_for_each, AccessType, Accelerator, Extent, Index, SharedArray};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Device +1 over the whole array, including the fence on the next host read
fn bench_dispatch_add_one(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_add_one");
    let acc = Accelerator::new_cpu().unwrap();
    let view = acc.default_view();

    for side in [16, 64, 256, 1024] {
        let extent = Extent::new([side, side]).unwrap();
        group.throughput(Throughput::Elements(extent.size() as u64));

        group.bench_with_input(BenchmarkId::new("i32", side), &extent, |bencher, &extent| {
            let arr = SharedArray::<i32, 2>::new(extent, &view, AccessType::ReadWrite).unwrap();

            bencher.iter(|| {
                let dev = arr.device_view();
                parallel_for_each(&view, extent, &[&arr], move |idx| dev.update(idx, |v| v + 1)).unwrap();
                arr.fence();
            });
        });
    }

    group.finish();
}

/// Host-side increment through the zero-copy mapping
fn bench_host_increment(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_increment_all");
    let acc = Accelerator::new_cpu().unwrap();
    let view = acc.default_view();

    for side in [16, 64, 256, 1024] {
        let extent = Extent::new([side, side]).unwrap();
        group.throughput(Throughput::Elements(extent.size() as u64));

        group.bench_with_input(BenchmarkId::new("f32", side), &extent, |bencher, &extent| {
            let mut arr = SharedArray::<f32, 2>::new(extent, &view, AccessType::ReadWrite).unwrap();

            bencher.iter(|| {
                arr.increment_all(black_box(1.0)).unwrap();
            });
        });
    }

    group.finish();
}

/// The 100-round device/host ping-pong on a 4x4 array
fn bench_round_trip(c: &mut Criterion) {
    let acc = Accelerator::new_cpu().unwrap();
    let view = acc.default_view();
    let extent = Extent::new([4, 4]).unwrap();

    c.bench_function("ping_pong_100_rounds", |bencher| {
        bencher.iter(|| {
            let mut arr = SharedArray::<i32, 2>::new(extent, &view, AccessType::ReadWrite).unwrap();
            arr.fill(100).unwrap();
            for _ in 0..100 {
                let dev = arr.device_view();
                parallel_for_each(&view, extent, &[&arr], move |idx| dev.update(idx, |v| v + 1)).unwrap();
                arr.increment_all(1).unwrap();
            }
            black_box(arr.read(Index([0, 0])).unwrap())
        });
    });
}

criterion_group!(benches, bench_dispatch_add_one, bench_host_increment, bench_round_trip);
criterion_main!(benches);
