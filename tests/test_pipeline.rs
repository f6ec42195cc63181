mod common;

use common::*;
use traffic_check::report;

#[test]
fn three_cars_is_clear_without_warnings() -> anyhow::Result<()> {
    let detections = (0..3).map(|i| detection("car", 0.85, i)).collect();
    let (pipeline, _) = stub_pipeline(detections);

    let output = pipeline.run(&png_bytes(64, 48))?;

    assert_eq!(output.report.vehicle_count, 3);
    assert_eq!(output.report.status, TrafficStatus::Clear);
    assert!(!output.report.emergency);
    assert!(output.report.advisories.is_empty());
    Ok(())
}

#[test]
fn seven_vehicles_is_moderate() -> anyhow::Result<()> {
    let (pipeline, _) = stub_pipeline(vehicles(7));

    let output = pipeline.run(&png_bytes(64, 48))?;

    assert_eq!(output.report.vehicle_count, 7);
    assert_eq!(output.report.status, TrafficStatus::Moderate);
    assert!(output.report.advisories.is_empty());
    Ok(())
}

#[test]
fn twenty_vehicles_is_heavy_with_warning_and_reroute() -> anyhow::Result<()> {
    let (pipeline, _) = stub_pipeline(vehicles(20));

    let output = pipeline.run(&png_bytes(64, 48))?;

    assert_eq!(output.report.vehicle_count, 20);
    assert_eq!(output.report.status, TrafficStatus::Heavy);
    assert_eq!(
        output.report.advisories,
        vec![Advisory::CongestionWarning, Advisory::RerouteSuggestion]
    );

    let text = report::render_text(&output.report, false);
    assert!(text.contains("Traffic Status: Heavy Traffic"));
    assert!(text.contains("Detected Vehicles: 20"));
    assert!(text.contains("Suggesting alternate route"));
    assert!(text.contains("bypass road"));
    Ok(())
}

#[test]
fn nothing_above_threshold_is_clear_with_zero_count() -> anyhow::Result<()> {
    let detections = vec![detection("car", 0.69, 0), detection("truck", 0.3, 1)];
    let (pipeline, _) = stub_pipeline(detections);

    let output = pipeline.run(&png_bytes(32, 32))?;

    assert!(output.report.detections.is_empty());
    assert_eq!(output.report.vehicle_count, 0);
    assert_eq!(output.report.status, TrafficStatus::Clear);
    Ok(())
}

#[test]
fn malformed_upload_fails_before_detection() {
    let (pipeline, detector) = stub_pipeline(vehicles(3));

    let result = pipeline.run(b"this is a text file renamed to street.jpg");

    assert!(matches!(result, Err(TrafficError::ImageDecode(_))));
    assert_eq!(detector.calls(), 0);
}

#[test]
fn empty_image_fails_before_detection() {
    let (pipeline, detector) = stub_pipeline(vehicles(3));

    let result = pipeline.run_image(&image::RgbImage::new(0, 0));
    assert!(matches!(result, Err(TrafficError::Inference(_))));

    let result = pipeline.analyze(&image::RgbImage::new(640, 0));
    assert!(matches!(result, Err(TrafficError::Inference(_))));

    assert_eq!(detector.calls(), 0);
}

#[test]
fn thin_strip_upload_still_runs() -> anyhow::Result<()> {
    let (pipeline, detector) = stub_pipeline(vehicles(1));

    let output = pipeline.run(&png_bytes(1, 3000))?;

    assert_eq!(output.annotated.dimensions(), (1, 3000));
    assert_eq!(detector.calls(), 1);
    Ok(())
}

#[test]
fn boundary_counts_through_the_pipeline() -> anyhow::Result<()> {
    for (count, expected) in [
        (4, TrafficStatus::Clear),
        (5, TrafficStatus::Moderate),
        (14, TrafficStatus::Moderate),
        (15, TrafficStatus::Heavy),
    ] {
        let (pipeline, _) = stub_pipeline(vehicles(count));
        let output = pipeline.run(&png_bytes(16, 16))?;
        assert_eq!(output.report.status, expected, "count {}", count);
    }
    Ok(())
}

#[test]
fn non_vehicle_labels_do_not_move_count_or_status() -> anyhow::Result<()> {
    let mut detections = vehicles(4);
    detections.extend((10..30).map(|i| detection("person", 0.95, i)));
    detections.push(detection("traffic light", 0.99, 40));
    let (pipeline, _) = stub_pipeline(detections);

    let output = pipeline.run(&png_bytes(64, 64))?;

    assert_eq!(output.report.detections.len(), 25);
    assert_eq!(output.report.vehicle_count, 4);
    assert_eq!(output.report.status, TrafficStatus::Clear);
    Ok(())
}

#[test]
fn emergency_flag_stays_off_with_default_vocabulary() -> anyhow::Result<()> {
    // Every label the default model can emit, all confident
    let all_labels: DetectionSet = (0..LabelMap::coco().len())
        .map(|id| detection(&LabelMap::coco().name(id), 0.99, id))
        .collect();
    let (pipeline, _) = stub_pipeline(all_labels);

    let output = pipeline.run(&png_bytes(64, 64))?;

    assert!(!output.report.emergency);
    assert!(!output.report.advisories.contains(&Advisory::EmergencyAlert));
    Ok(())
}

#[test]
fn injected_ambulance_raises_the_alert() -> anyhow::Result<()> {
    let mut detections = vehicles(2);
    detections.push(detection("ambulance", 0.92, 5));
    let labels = LabelMap::from_labels(vec!["car".into(), "truck".into(), "ambulance".into()]);
    let detector = StubDetector::new(detections).with_labels(labels);
    let (pipeline, _) = stub_pipeline_with(detector, TrafficConfig::default());

    let output = pipeline.run(&png_bytes(64, 64))?;

    assert!(output.report.emergency);
    assert_eq!(output.report.vehicle_count, 2);
    assert_eq!(output.report.advisories, vec![Advisory::EmergencyAlert]);
    assert!(report::render_text(&output.report, false).contains("Grant emergency passage"));
    Ok(())
}

#[test]
fn same_bytes_give_identical_results() -> anyhow::Result<()> {
    let (pipeline, detector) = stub_pipeline(vehicles(9));
    let bytes = png_bytes(80, 60);

    let first = pipeline.run(&bytes)?;
    let second = pipeline.run(&bytes)?;

    assert_eq!(first.report, second.report);
    assert_eq!(first.annotated, second.annotated);
    assert_eq!(detector.calls(), 2);
    Ok(())
}

#[test]
fn custom_thresholds_move_the_breakpoints() -> anyhow::Result<()> {
    let config = TrafficConfig::from_toml(
        r#"
        [congestion]
        moderate_at = 2
        heavy_at = 3
        "#,
    )?;
    let (pipeline, _) = stub_pipeline_with(StubDetector::new(vehicles(3)), config);

    let output = pipeline.run(&png_bytes(16, 16))?;
    assert_eq!(output.report.status, TrafficStatus::Heavy);
    Ok(())
}

#[test]
fn annotation_marks_vehicles_and_leaves_report_alone() -> anyhow::Result<()> {
    let detections = vec![Detection::new("car", 0.9, BoundingBox::new(4.0, 4.0, 20.0, 20.0))];
    let (pipeline, _) = stub_pipeline(detections.clone());

    let output = pipeline.run(&png_bytes(32, 32))?;

    assert_eq!(*output.annotated.get_pixel(4, 4), image::Rgb([255, 0, 0]));
    assert_eq!(*output.annotated.get_pixel(12, 4), image::Rgb([255, 0, 0]));
    assert_eq!(output.annotated.dimensions(), (32, 32));
    assert_eq!(output.report.detections, detections);
    Ok(())
}

#[test]
fn debug_mode_writes_each_stage() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");
    let (pipeline, _) = stub_pipeline(vehicles(2));
    let pipeline = pipeline.with_debug(debug_dir.clone())?;

    pipeline.run(&png_bytes(40, 30))?;

    assert!(debug_dir.join("00_input/01.png").exists());
    assert!(debug_dir.join("01_model_input/01.png").exists());
    assert!(debug_dir.join("02_annotated/01.png").exists());
    Ok(())
}

#[test]
fn debug_mode_refuses_a_non_empty_directory() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;
    let (pipeline, _) = stub_pipeline(Vec::new());

    let result = pipeline.with_debug(dir.path().to_path_buf());
    assert!(matches!(result, Err(TrafficError::Config(_))));
    Ok(())
}
