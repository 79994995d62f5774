//! Criterion benchmarks for elasticnn-distance: kernel cost with and without a cutoff.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use elasticnn_distance::{ChannelMode, DistanceKernel, KernelSpec, Sequence, Window};

fn make_sine_series(n: usize, offset: f64) -> Sequence {
    let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1).sin() + offset).collect();
    Sequence::new(values).unwrap()
}

fn specs(window: Window) -> [(KernelSpec, &'static str); 3] {
    [
        (KernelSpec::Dtw { window }, "dtw"),
        (KernelSpec::Wdtw { window, g: 0.05 }, "wdtw"),
        (KernelSpec::Erp { window, g: 0.0 }, "erp"),
    ]
}

fn bench_kernels(c: &mut Criterion) {
    let lengths = [64usize, 256, 1024];
    let windows: &[(Window, &str)] = &[(Window::Full, "full"), (Window::Fraction(0.1), "w10")];

    let mut group = c.benchmark_group("kernel_distance");

    for &len in &lengths {
        let a = make_sine_series(len, 0.0);
        let b = make_sine_series(len, 1.0);
        for &(window, window_label) in windows {
            for (spec, name) in specs(window) {
                let kernel = spec.build(ChannelMode::Dependent).unwrap();
                let id = BenchmarkId::new(format!("{name}_len{len}"), window_label);
                group.bench_with_input(id, &(&a, &b, &kernel), |bencher, (a, b, kernel)| {
                    bencher.iter(|| kernel.distance_unbounded(a.as_view(), b.as_view()));
                });
            }
        }
    }

    group.finish();
}

fn bench_early_abandon(c: &mut Criterion) {
    let a = make_sine_series(512, 0.0);
    let b = make_sine_series(512, 1.0);
    let kernel = KernelSpec::dtw().build(ChannelMode::Dependent).unwrap();
    let exact = kernel.distance_unbounded(a.as_view(), b.as_view()).unwrap().value();

    let mut group = c.benchmark_group("dtw_cutoff_512");
    for (label, cutoff) in [("none", f64::INFINITY), ("tight", exact * 0.1)] {
        group.bench_function(label, |bencher| {
            bencher.iter(|| kernel.distance(a.as_view(), b.as_view(), cutoff));
        });
    }
    group.finish();
}

fn bench_independent(c: &mut Criterion) {
    let channels = |offset: f64| {
        Sequence::multivariate(
            (0..3)
                .map(|ch| make_sine_series(128, offset + ch as f64).as_ref().to_vec())
                .collect(),
        )
        .unwrap()
    };
    let a = channels(0.0);
    let b = channels(0.5);
    let spec = KernelSpec::Dtw {
        window: Window::Radius(8),
    };

    for (mode, label) in [
        (ChannelMode::Dependent, "dependent_3x128_r8"),
        (ChannelMode::Independent, "independent_3x128_r8"),
    ] {
        let kernel = spec.build(mode).unwrap();
        c.bench_function(label, |bencher| {
            bencher.iter(|| kernel.distance_unbounded(a.as_view(), b.as_view()));
        });
    }
}

criterion_group!(benches, bench_kernels, bench_early_abandon, bench_independent);
criterion_main!(benches);
