//! Reference scenarios with hand-computed answers.

use approx::assert_relative_eq;
use itc::calc::{
    ApertureChoice, ExposureTimeSolver, ImagingS2N, SlitFraction, SlitThroughput, SourceFraction,
};
use itc::hardware::DetectorConfig;
use itc::SampledSpectrum;
use shared::algo::tabulated::TabulatedCurve;
use shared::resource::ResourceLibrary;

fn noiseless_detector(pixel_size: f64) -> DetectorConfig {
    DetectorConfig::new("ideal", pixel_size, 0.0, 0.0, 1e9)
}

fn nine_pixel_aperture() -> SourceFraction {
    SourceFraction {
        source_fraction: 1.0,
        enclosed_pixels: 9.0,
        aperture_diameter: 0.3,
    }
}

#[test]
fn test_flat_spectra_noise() {
    // One nanometre of flat spectrum integrates to its height
    let source = SampledSpectrum::constant(100.0, 500.0, 501.0, 0.5).unwrap();
    let sky = SampledSpectrum::constant(10.0, 500.0, 501.0, 0.5).unwrap();
    assert_relative_eq!(source.integral(), 100.0);

    let s2n = ImagingS2N::new(
        source.integral(),
        sky.integral(),
        nine_pixel_aperture(),
        &noiseless_detector(0.1),
    );
    let budget = s2n.noise_budget(60.0);

    let expected = (100.0f64 * 60.0 + 10.0 * 60.0 * 0.01 * 9.0).sqrt();
    assert_relative_eq!(budget.noise(), expected, max_relative = 1e-12);
    assert_relative_eq!(budget.signal, 6000.0, max_relative = 1e-12);
    assert_relative_eq!(budget.s2n(), 6000.0 / expected, max_relative = 1e-12);
}

#[test]
fn test_solver_returns_one_second_without_real_root() {
    // Read noise dominates a low target, so b² < 4ac
    let detector = DetectorConfig::new("noisy", 0.1, 0.0, 10.0, 1e9);
    let s2n = ImagingS2N::new(100.0, 10.0, nine_pixel_aperture(), &detector);
    let target: f64 = 1.0;

    let a = s2n.signal_rate().powi(2);
    let b = -target.powi(2) * (s2n.signal_rate() + s2n.background_rate() + s2n.dark_rate());
    let c = target.powi(2) * s2n.read_variance();
    assert!(a > 0.0);
    assert!(b * b - 4.0 * a * c <= 0.0);
    assert_eq!(ExposureTimeSolver::new(&s2n).solve(target), 1.0);
}

#[test]
fn test_curve_is_zero_outside_table() {
    let curve = TabulatedCurve::new(vec![400.0, 500.0, 600.0], vec![0.2, 0.9, 0.4]).unwrap();
    assert_eq!(curve.value_at(399.999), 0.0);
    assert_eq!(curve.value_at(600.001), 0.0);
    assert_relative_eq!(curve.value_at(450.0), 0.55);
}

#[test]
fn test_bundled_slit_grid() {
    let library = ResourceLibrary::new(test_helpers::data_dir());
    let narrow = SlitThroughput::from_library(&library, ApertureChoice::Auto, 0.8, 0.1, 0.3)
        .expect("slit throughput grid should load");
    let wide = SlitThroughput::from_library(&library, ApertureChoice::Auto, 0.8, 0.1, 1.5)
        .expect("slit throughput grid should load");

    assert!(narrow.throughput() > 0.0);
    assert!(wide.throughput() <= 1.0);
    assert!(wide.throughput() > narrow.throughput());
    assert_eq!(narrow.spatial_pixels(), 11.0);
    assert!(narrow.one_pixel_throughput() < narrow.throughput());
}
