//! Performance benchmarks for the DSP module
//!
//! Run with: cargo bench -p reel_dsp

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use reel_dsp::{
    EqChain, EqGains, FrameProcessor, SampleFrame, SpectrumAnalyzer, FFT_SIZE, NUM_EQ_BANDS,
};

fn boosted_gains() -> EqGains {
    let gains = EqGains::new();
    gains.set_all(&[4.0, 2.0, -1.0, 3.0, 0.0, -2.0, 5.0, 1.0, -3.0, 6.0]);
    gains
}

fn benchmark_eq_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("equalizer");

    // Common buffer sizes in audio applications
    let buffer_sizes = [64, 128, 256, 512, 1024, 2048];

    for size in buffer_sizes {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("process_block_{}_frames", size), |b| {
            let gains = boosted_gains();
            let mut eq = EqChain::new(44100.0, &gains);
            let mut buffer: Vec<SampleFrame> = (0..size)
                .map(|i| SampleFrame::new((i as f32 * 0.001).sin(), (i as f32 * 0.002).sin()))
                .collect();

            b.iter(|| {
                eq.process_block(black_box(&mut buffer));
            });
        });

        group.bench_function(format!("process_flat_{}_frames", size), |b| {
            let gains = EqGains::new();
            let mut eq = EqChain::new(44100.0, &gains);
            let mut buffer = vec![SampleFrame::mono(0.25); size];

            b.iter(|| {
                eq.process_block(black_box(&mut buffer));
            });
        });
    }

    group.finish();
}

fn benchmark_eq_coefficient_update(c: &mut Criterion) {
    c.bench_function("eq_gain_change_per_block", |b| {
        let gains = EqGains::new();
        let mut eq = EqChain::new(44100.0, &gains);
        let mut buffer = vec![SampleFrame::mono(0.5); 64];
        let mut band = 0;
        let mut gain = -12.0_f32;

        b.iter(|| {
            // Simulate dragging a slider while audio runs
            gains.set(band, gain);
            eq.process_block(black_box(&mut buffer));
            band = (band + 1) % NUM_EQ_BANDS;
            gain = if gain >= 12.0 { -12.0 } else { gain + 0.5 };
        });
    });
}

fn benchmark_eq_frame_single(c: &mut Criterion) {
    c.bench_function("eq_process_single_frame", |b| {
        let gains = boosted_gains();
        let mut eq = EqChain::new(44100.0, &gains);

        b.iter(|| {
            black_box(eq.process(black_box(SampleFrame::new(0.5, -0.5))));
        });
    });
}

fn benchmark_spectrum(c: &mut Criterion) {
    c.bench_function("spectrum_analyze_2048", |b| {
        let mut analyzer = SpectrumAnalyzer::new(44100.0);
        let samples: Vec<f32> = (0..FFT_SIZE).map(|i| (i as f32 * 0.07).sin()).collect();

        b.iter(|| {
            black_box(analyzer.analyze(black_box(&samples)));
        });
    });
}

criterion_group!(
    benches,
    benchmark_eq_processing,
    benchmark_eq_coefficient_update,
    benchmark_eq_frame_single,
    benchmark_spectrum
);

criterion_main!(benches);
