//! End-to-end runs of the bundled demo requests against the bundled data.

use approx::assert_relative_eq;
use itc::calc::CalcError;
use itc::config::{CalculationMethod, ItcRequest};
use itc::photometry::SedTemplate;
use itc::pipeline::PipelineError;
use itc::recipe::Outcome;
use itc::{run, ItcError};
use shared::resource::ResourceLibrary;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn library() -> ResourceLibrary {
    ResourceLibrary::new(test_helpers::data_dir())
}

fn demo(name: &str) -> ItcRequest {
    let path = test_helpers::find_project_root()
        .expect("Failed to find project root")
        .join("demos")
        .join(name);
    ItcRequest::load_from_file(&path).expect("Failed to load demo request")
}

fn imaging_s2n(request: &ItcRequest) -> (f64, f64) {
    let result = run(request, &library()).expect("imaging run failed");
    match result.outcome {
        Outcome::ImagingS2n {
            single_s2n,
            total_s2n,
            ..
        } => (single_s2n, total_s2n),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn test_imaging_demo() {
    init_logging();
    let request = demo("imaging_request.json");
    let result = run(&request, &library()).unwrap();

    let aperture = result.aperture.expect("imaging reports its aperture");
    assert_relative_eq!(
        aperture.aperture_diameter,
        1.18 * result.image_quality_arcsec,
        max_relative = 1e-12
    );
    assert!(aperture.source_fraction > 0.0 && aperture.source_fraction <= 1.0);
    assert!(result.peak_pixel_flux.unwrap() > 0.0);
    assert!(!result.advisories.is_empty());

    match result.outcome {
        Outcome::ImagingS2n {
            budget,
            single_s2n,
            total_s2n,
        } => {
            assert!(single_s2n > 0.0);
            assert_relative_eq!(single_s2n, budget.s2n());
            // Four exposures, but sky subtraction costs a little
            assert!(total_s2n > single_s2n);
            assert!(total_s2n < 2.0 * single_s2n);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn test_imaging_integration_time() {
    init_logging();
    let mut request = demo("imaging_request.json");
    request.method = CalculationMethod::ImagingIntegrationTime {
        target_s2n: 50.0,
        exposure_time: 300.0,
        frac_with_source: 1.0,
        elfn: 1.0,
    };

    let result = run(&request, &library()).unwrap();
    match result.outcome {
        Outcome::ImagingIntegrationTime {
            integration_time,
            exposures,
            ..
        } => {
            assert!(integration_time > 0.0);
            assert!(exposures >= 1);
            assert!(exposures as f64 * 300.0 >= integration_time);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn test_fainter_source_needs_longer() {
    let mut request = demo("imaging_request.json");
    let time_for = |request: &ItcRequest| match run(request, &library()).unwrap().outcome {
        Outcome::ImagingIntegrationTime {
            integration_time, ..
        } => integration_time,
        other => panic!("unexpected outcome {other:?}"),
    };
    request.method = CalculationMethod::ImagingIntegrationTime {
        target_s2n: 100.0,
        exposure_time: 60.0,
        frac_with_source: 1.0,
        elfn: 1.0,
    };
    let bright = time_for(&request);
    request.source.brightness += 1.0;
    let faint = time_for(&request);
    assert!(bright > 1.0, "bright source fell back to {bright} s");
    assert!(faint > bright, "faint {faint} vs bright {bright}");
}

#[test]
fn test_higher_airmass_lowers_s2n() {
    let mut request = demo("imaging_request.json");
    let (_, good) = imaging_s2n(&request);
    request.conditions.airmass = 2.0;
    let (_, poor) = imaging_s2n(&request);
    assert!(poor < good, "airmass 2.0 gave {poor}, airmass 1.2 gave {good}");
}

#[test]
fn test_spectroscopy_demo() {
    init_logging();
    let request = demo("spectroscopy_request.json");
    let result = run(&request, &library()).unwrap();
    assert!(result.aperture.is_none());

    match result.outcome {
        Outcome::Spectroscopy {
            spatial_pixels,
            slit_throughput,
            signal,
            final_s2n,
            exp_s2n,
            peak_final_s2n,
            ..
        } => {
            // 1.4 × 0.8" over 2 × 0.073" pixels
            assert_eq!(spatial_pixels, 8.0);
            assert!(slit_throughput > 0.0 && slit_throughput < 1.0);

            assert_eq!(final_s2n.values.len(), 2001);
            assert_relative_eq!(final_s2n.start_nm, 550.0);
            assert_relative_eq!(final_s2n.sampling_nm, 0.1);
            assert_eq!(signal.values.len(), 2001);

            // Detector ends at pixel 1799
            assert!(final_s2n.values[1800..].iter().all(|&v| v == 0.0));
            assert!(signal.values[1800..].iter().all(|&v| v == 0.0));
            assert!(final_s2n.values[100] > 0.0);

            // Two exposures, less the cost of sky subtraction
            let (single, total) = (exp_s2n.values[500], final_s2n.values[500]);
            assert!(total > single && total <= single * 2f64.sqrt() * (1.0 + 1e-12));
            assert!(peak_final_s2n > 0.0);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn test_unknown_brightness_unit() {
    let mut request = demo("imaging_request.json");
    request.source.unit = "furlongs".to_string();
    assert!(matches!(
        run(&request, &library()),
        Err(ItcError::Pipeline(PipelineError::UnknownUnit(_)))
    ));
}

#[test]
fn test_band_not_covered() {
    let mut request = demo("imaging_request.json");
    request.source.sed = SedTemplate::UserDefined {
        rows: vec![(400.0, 1.0), (550.0, 2.0), (700.0, 1.0)],
    };
    request.source.band = itc::photometry::StandardBand::K;
    assert!(matches!(
        run(&request, &library()),
        Err(ItcError::Pipeline(PipelineError::BandNotCovered { .. }))
    ));
}

#[test]
fn test_non_integral_source_exposures() {
    let mut request = demo("imaging_request.json");
    request.method = CalculationMethod::ImagingS2n {
        exposure_time: 300.0,
        exposures: 5,
        frac_with_source: 0.5,
        elfn: 1.0,
    };
    assert!(matches!(
        run(&request, &library()),
        Err(ItcError::Calc(CalcError::NonIntegralExposures { .. }))
    ));
}

#[test]
fn test_missing_resource() {
    let mut request = demo("imaging_request.json");
    request.instrument.filter = Some("filters/Z.dat".to_string());
    assert!(matches!(
        run(&request, &library()),
        Err(ItcError::Pipeline(PipelineError::Resource(_)))
    ));
}

#[test]
fn test_result_serializes() {
    let request = demo("imaging_request.json");
    let result = run(&request, &library()).unwrap();
    let path = test_helpers::output_path("imaging_result.json");
    std::fs::write(&path, serde_json::to_string_pretty(&result).unwrap()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["outcome"]["kind"], "imaging_s2n");
    assert!(json["outcome"]["budget"]["signal"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_request_survives_save_and_load() {
    let request = demo("spectroscopy_request.json");
    let path = test_helpers::output_path("spectroscopy_request_copy.json");
    request.save_to_file(&path).unwrap();
    assert_eq!(ItcRequest::load_from_file(&path).unwrap(), request);
}
