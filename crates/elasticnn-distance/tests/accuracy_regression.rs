//! Accuracy regression tests for elasticnn-distance.
//!
//! These tests pin kernel outputs and the early-abandon contract so that
//! algorithmic changes cannot silently shift distances. Reference values were
//! computed by hand or from the implementation and are hardcoded.

use elasticnn_distance::{
    ChannelMode, DistanceKernel, Dtw, Erp, KernelSpec, Sequence, Wdtw, Window,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ts(values: Vec<f64>) -> Sequence {
    Sequence::new(values).expect("valid test series")
}

fn random_series(rng: &mut ChaCha8Rng, len: usize) -> Sequence {
    ts((0..len).map(|_| rng.gen_range(-2.0..2.0)).collect())
}

fn kernels() -> Vec<Box<dyn DistanceKernel>> {
    vec![
        Box::new(Dtw::unconstrained()),
        Box::new(Dtw::with_sakoe_chiba(2)),
        Box::new(Wdtw::new(Window::Full, Wdtw::DEFAULT_G).expect("valid wdtw")),
        Box::new(Wdtw::new(Window::Radius(3), 0.3).expect("valid wdtw")),
        Box::new(Erp::new(Window::Full, 0.0).expect("valid erp")),
        Box::new(Erp::new(Window::Radius(2), 0.5).expect("valid erp")),
    ]
}

// ---------------------------------------------------------------------------
// a) dtw_distances_match_known_values
// ---------------------------------------------------------------------------

/// Unconstrained DTW returns the accumulated squared cost, never its square root.
#[test]
fn dtw_distances_match_known_values() {
    let pairs: Vec<(Sequence, Sequence)> = vec![
        (ts(vec![0.0, 0.0, 0.0]), ts(vec![1.0, 1.0, 1.0])),           // constant offset
        (ts(vec![0.0, 1.0, 0.0]), ts(vec![0.0, 0.0, 0.0])),           // single peak
        (ts(vec![1.0, 2.0, 3.0, 4.0]), ts(vec![1.0, 2.0, 3.0, 4.0])), // identical
        (ts(vec![1.0, 2.0, 3.0]), ts(vec![3.0, 2.0, 1.0])),           // reversed
        (ts(vec![0.0, 5.0, 0.0, 5.0]), ts(vec![5.0, 0.0, 5.0, 0.0])), // alternating
        (ts(vec![1.0]), ts(vec![5.0])),                               // single point
        (ts(vec![0.0, 0.0, 1.0]), ts(vec![1.0, 0.0, 0.0])),           // shifted peak
        (
            ts(vec![0.0, 1.0, 2.0, 3.0, 4.0]),
            ts(vec![0.0, 0.0, 0.0, 0.0, 4.0]),
        ), // late ramp
        (ts(vec![10.0, 10.0, 10.0]), ts(vec![10.1, 9.9, 10.0])),      // tiny perturbation
        (
            ts(vec![0.0, 3.0, 0.0, 3.0, 0.0]),
            ts(vec![3.0, 0.0, 3.0, 0.0, 3.0]),
        ), // opposite phase
    ];

    let expected: Vec<f64> = vec![3.0, 1.0, 0.0, 8.0, 50.0, 16.0, 2.0, 6.0, 0.02, 18.0];

    let dtw = Dtw::unconstrained();
    for (i, ((a, b), &exp)) in pairs.iter().zip(expected.iter()).enumerate() {
        let dist = dtw.distance_unbounded(a.as_view(), b.as_view()).unwrap().value();
        assert!(
            (dist - exp).abs() < 1e-10,
            "pair {i}: got {dist:.15}, expected {exp:.15}"
        );
    }
}

// ---------------------------------------------------------------------------
// b) dtw_distance_with_band_geq_unconstrained
// ---------------------------------------------------------------------------

/// Banded DTW distance must be >= unconstrained DTW distance.
#[test]
fn dtw_distance_with_band_geq_unconstrained() {
    let pairs: Vec<(Sequence, Sequence)> = vec![
        (ts(vec![0.0, 1.0, 2.0, 3.0]), ts(vec![3.0, 2.0, 1.0, 0.0])),
        (ts(vec![1.0, 5.0, 1.0, 5.0, 1.0]), ts(vec![5.0, 1.0, 5.0, 1.0, 5.0])),
        (ts(vec![0.0, 0.0, 0.0, 1.0]), ts(vec![1.0, 0.0, 0.0, 0.0])),
        (ts(vec![10.0, 0.0, 10.0]), ts(vec![0.0, 10.0, 0.0])),
    ];

    let unconstrained = Dtw::unconstrained();
    let banded = Dtw::with_sakoe_chiba(1);

    for (i, (a, b)) in pairs.iter().enumerate() {
        let d_full = unconstrained.distance_unbounded(a.as_view(), b.as_view()).unwrap();
        let d_band = banded.distance_unbounded(a.as_view(), b.as_view()).unwrap();
        assert!(
            d_band.value() >= d_full.value() - 1e-10,
            "pair {i}: banded {d_band} < unconstrained {d_full}"
        );
    }
}

// ---------------------------------------------------------------------------
// c) radius_zero_equals_squared_euclidean
// ---------------------------------------------------------------------------

#[test]
fn radius_zero_equals_squared_euclidean() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let dtw = Dtw::new(Window::Radius(0)).unwrap();
    for _ in 0..20 {
        let a = random_series(&mut rng, 16);
        let b = random_series(&mut rng, 16);
        let euclid: f64 = a
            .as_ref()
            .iter()
            .zip(b.as_ref())
            .map(|(x, y)| (x - y).powi(2))
            .sum();
        let d = dtw.distance_unbounded(a.as_view(), b.as_view()).unwrap();
        assert!((d.value() - euclid).abs() < 1e-10);
    }
}

// ---------------------------------------------------------------------------
// d) early_abandon_is_exact_or_exceeded
// ---------------------------------------------------------------------------

/// For every kernel: a cutoff at or above the true distance returns the exact
/// value, a cutoff below it returns the exceeded sentinel.
#[test]
fn early_abandon_is_exact_or_exceeded() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for kernel in kernels() {
        for _ in 0..10 {
            let a = random_series(&mut rng, 24);
            let b = random_series(&mut rng, 24);
            let exact = kernel.distance_unbounded(a.as_view(), b.as_view()).unwrap().value();
            assert!(exact.is_finite() && exact >= 0.0);

            for factor in [1.0, 1.5, 10.0] {
                let d = kernel.distance(a.as_view(), b.as_view(), exact * factor).unwrap();
                assert!(
                    (d.value() - exact).abs() < 1e-10,
                    "{}: cutoff {factor}x changed the result",
                    kernel.name()
                );
            }
            for factor in [0.0, 0.25, 0.99] {
                let d = kernel.distance(a.as_view(), b.as_view(), exact * factor).unwrap();
                assert!(
                    d.is_exceeded(),
                    "{}: cutoff {factor}x did not abandon",
                    kernel.name()
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// e) distances_are_symmetric
// ---------------------------------------------------------------------------

#[test]
fn distances_are_symmetric() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for kernel in kernels() {
        let a = random_series(&mut rng, 20);
        let b = random_series(&mut rng, 20);
        let ab = kernel.distance_unbounded(a.as_view(), b.as_view()).unwrap();
        let ba = kernel.distance_unbounded(b.as_view(), a.as_view()).unwrap();
        assert!((ab.value() - ba.value()).abs() < 1e-9, "{}", kernel.name());
    }
}

/// ERP accepts unequal lengths, so symmetry must also hold when the band is
/// scaled to a non-square matrix.
#[test]
fn erp_is_symmetric_on_unequal_lengths() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..200 {
        let n = rng.gen_range(2..=8);
        let m = rng.gen_range(2..=8);
        if n == m {
            continue;
        }
        let a = random_series(&mut rng, n);
        let b = random_series(&mut rng, m);
        let radius = rng.gen_range(0..=3);
        for g in [0.0, 0.5] {
            let erp = Erp::new(Window::Radius(radius), g).unwrap();
            let ab = erp.distance_unbounded(a.as_view(), b.as_view()).unwrap();
            let ba = erp.distance_unbounded(b.as_view(), a.as_view()).unwrap();
            assert!(
                (ab.value() - ba.value()).abs() < 1e-9,
                "n={n} m={m} r={radius} g={g}: {ab} vs {ba}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// f) erp_handles_unequal_lengths
// ---------------------------------------------------------------------------

#[test]
fn erp_handles_unequal_lengths() {
    let a = ts(vec![0.0, 1.0, 2.0, 1.0, 0.0, -1.0]);
    let b = ts(vec![0.0, 2.0, 0.0]);
    for window in [Window::Full, Window::Radius(1), Window::Radius(0)] {
        let erp = Erp::new(window, 0.0).unwrap();
        let d = erp.distance_unbounded(a.as_view(), b.as_view()).unwrap();
        assert!(d.value().is_finite(), "{window:?}");
        let (d_path, _) = erp.alignment(a.as_view(), b.as_view()).unwrap();
        assert!((d.value() - d_path.value()).abs() < 1e-10, "{window:?}");
    }
}

// ---------------------------------------------------------------------------
// g) multivariate_modes
// ---------------------------------------------------------------------------

#[test]
fn multivariate_modes() {
    let a = Sequence::multivariate(vec![
        vec![0.0, 1.0, 2.0, 1.0],
        vec![1.0, 1.0, 0.0, 0.0],
    ])
    .unwrap();
    let b = Sequence::multivariate(vec![
        vec![1.0, 2.0, 1.0, 0.0],
        vec![0.0, 1.0, 1.0, 0.0],
    ])
    .unwrap();

    for spec in [KernelSpec::dtw(), KernelSpec::wdtw(), KernelSpec::erp()] {
        let dependent = spec.build(ChannelMode::Dependent).unwrap();
        let independent = spec.build(ChannelMode::Independent).unwrap();
        let d_dep = dependent.distance_unbounded(a.as_view(), b.as_view()).unwrap();
        let d_ind = independent.distance_unbounded(a.as_view(), b.as_view()).unwrap();
        assert!(
            d_ind.value() <= d_dep.value() + 1e-10,
            "{}: independent {d_ind} > dependent {d_dep}",
            spec_name(&spec)
        );
    }
}

fn spec_name(spec: &KernelSpec) -> &'static str {
    match spec {
        KernelSpec::Dtw { .. } => "dtw",
        KernelSpec::Wdtw { .. } => "wdtw",
        KernelSpec::Erp { .. } => "erp",
    }
}
