//! Performance benchmarks for the DSP module
//!
//! Run with: cargo bench -p fireq_dsp

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fireq_dsp::{FirConvolver, Kernel, KernelDesigner, KernelStore};

const TAPS: usize = 128;
const BANDS: usize = 12;

fn benchmark_kernel_design(c: &mut Criterion) {
    c.bench_function("design_12_bands_128_taps", |b| {
        let mut designer = KernelDesigner::<TAPS, BANDS>::new(48000.0).unwrap();
        let mut kernel = Kernel::identity();
        let mut gain = -12.0_f32;

        b.iter(|| {
            // Simulate dragging every slider
            designer.commit_gains(&[gain; BANDS]);
            designer.design_into(black_box(&mut kernel));
            gain = if gain >= 12.0 { -12.0 } else { gain + 1.0 };
        });
    });
}

fn benchmark_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("fir_convolver");

    // Common buffer sizes in audio applications
    let buffer_sizes = [64, 128, 256, 512, 1024];

    for size in buffer_sizes {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("process_block_{}_samples", size), |b| {
            let store = Arc::new(KernelStore::<TAPS>::new());
            let mut fir = FirConvolver::<i16, TAPS>::with_store(store);
            let mut buffer: Vec<i16> = (0..size)
                .map(|i| ((i as f32 * 0.01).sin() * 16000.0) as i16)
                .collect();

            b.iter(|| {
                fir.process_block(black_box(&mut buffer));
            });
        });
    }

    group.finish();
}

fn benchmark_publish(c: &mut Criterion) {
    c.bench_function("kernel_store_publish", |b| {
        let store = KernelStore::<TAPS>::new();
        let next = Kernel::<TAPS>::filled(100);

        b.iter(|| {
            store.publish(|staging| staging.clone_from(black_box(&next)));
        });
    });
}

criterion_group!(
    benches,
    benchmark_kernel_design,
    benchmark_convolution,
    benchmark_publish
);

criterion_main!(benches);
