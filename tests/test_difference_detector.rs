//! Integration tests for the motion-based position detector.
//!
//! Tests cover:
//! - First-frame behavior and identical frames
//! - The single-block scenario and threshold monotonicity
//! - Contour selection order and color weighting
//! - Configuration through the detector type tag
//! - Stage fallback and tuning image output

mod common;

use common::*;
use image::{Rgb, RgbImage};
use trackpipe::config::DifferenceSettings;
use trackpipe::detection::preprocessing::{foreground_area, motion_mask, to_grayscale};
use trackpipe::{ConfigError, DetectorKind, DetectorStage, DifferenceDetector2D, PositionDetector};

fn detector(blur: u32, diff_threshold: u16) -> DifferenceDetector2D {
    DifferenceDetector2D::with_settings(DifferenceSettings {
        blur,
        diff_threshold,
        tune: false,
    })
}

#[test]
fn test_first_call_is_always_invalid() -> anyhow::Result<()> {
    for threshold in [0, 1, 20, 256] {
        let mut det = detector(2, threshold);
        let first = frame_with_block(0, (64, 64), 10, (5, 5, 20), 250);
        assert!(!det.detect_position(&first)?.valid);
    }
    Ok(())
}

#[test]
fn test_identical_frames_yield_invalid() -> anyhow::Result<()> {
    let frame = frame_with_block(0, (64, 64), 30, (10, 10, 12), 200);
    for threshold in [1, 5, 50, 255, 256] {
        for blur in [0, 3] {
            let mut det = detector(blur, threshold);
            det.detect_position(&frame)?;
            let position = det.detect_position(&frame)?;
            assert!(!position.valid, "threshold {} blur {}", threshold, blur);
        }
    }
    Ok(())
}

#[test]
fn test_single_block_scenario() -> anyhow::Result<()> {
    let mut det = detector(0, 20);
    det.detect_position(&flat_frame(0, 100, 100, 100))?;

    let moved = frame_with_block(1, (100, 100), 100, (40, 40, 10), 150);
    let position = det.detect_position(&moved)?;

    assert!(position.valid);
    assert!((position.x - 45.0).abs() < 1e-9);
    assert!((position.y - 45.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_history_advances_each_frame() -> anyhow::Result<()> {
    let mut det = detector(0, 20);
    let background = flat_frame(0, 100, 100, 100);
    let moved = frame_with_block(1, (100, 100), 100, (40, 40, 10), 150);

    det.detect_position(&background)?;
    assert!(det.detect_position(&moved)?.valid);
    // Same frame again: history now equals it, so nothing moved
    assert!(!det.detect_position(&moved)?.valid);
    // Back to the background: the block disappears where it was
    let position = det.detect_position(&background)?;
    assert!(position.valid);
    assert_eq!((position.x, position.y), (45.0, 45.0));
    Ok(())
}

#[test]
fn test_higher_threshold_never_grows_foreground() -> anyhow::Result<()> {
    let previous = flat_frame(0, 64, 64, 0);
    let mut current = flat_frame(1, 64, 64, 0);
    // blocks with differing contrast
    paint_block(&mut current, (2, 2, 10), 40);
    paint_block(&mut current, (20, 20, 8), 90);
    paint_block(&mut current, (40, 5, 6), 160);
    paint_block(&mut current, (45, 45, 12), 255);

    let prev_gray = to_grayscale(&previous.image);
    let cur_gray = to_grayscale(&current.image);

    for blur in [0, 1, 4] {
        let mut last_area = usize::MAX;
        for threshold in 0..=256u16 {
            let area = foreground_area(&motion_mask(&cur_gray, &prev_gray, threshold, blur)?);
            assert!(area <= last_area, "blur {} threshold {} grew the mask", blur, threshold);
            last_area = area;
        }
        assert_eq!(last_area, 0);
    }
    Ok(())
}

/// The detector reports the topmost blob, not the largest one. A small blob
/// near the top wins over a large blob further down.
#[test]
fn test_topmost_contour_wins_over_largest() -> anyhow::Result<()> {
    let mut det = detector(0, 20);
    det.detect_position(&flat_frame(0, 100, 100, 0))?;

    let mut moved = flat_frame(1, 100, 100, 0);
    paint_block(&mut moved, (70, 5, 4), 200);
    paint_block(&mut moved, (10, 50, 30), 200);

    let position = det.detect_position(&moved)?;
    assert!(position.valid);
    assert_eq!((position.x, position.y), (72.0, 7.0));
    assert_ne!((position.x, position.y), (25.0, 65.0));
    Ok(())
}

#[test]
fn test_colored_motion_uses_luma_weights() -> anyhow::Result<()> {
    // Pure red at 60 is gray 18, above the default threshold of 15
    let mut det = DifferenceDetector2D::new();
    det.detect_position(&flat_frame(0, 20, 20, 0))?;

    let red = Frame::new(1, RgbImage::from_pixel(20, 20, Rgb([60, 0, 0])));
    let position = det.detect_position(&red)?;
    assert!(position.valid);
    assert_eq!((position.x, position.y), (10.0, 10.0));
    Ok(())
}

#[test]
fn test_configure_from_file() -> anyhow::Result<()> {
    let file = config_file(
        r#"
[diff]
blur = 0
diff_threshold = 20
tune = false
unknown = "ignored"
"#,
    );
    let config = load_config(&file);

    let mut det = DetectorKind::Diff.build();
    det.configure(&config, "diff")?;

    det.detect_position(&flat_frame(0, 100, 100, 100))?;
    let position = det.detect_position(&frame_with_block(1, (100, 100), 100, (40, 40, 10), 150))?;
    assert_eq!((position.x, position.y, position.valid), (45.0, 45.0, true));
    Ok(())
}

#[test]
fn test_configure_rejects_bad_values() {
    let file = config_file("[neg]\ndiff_threshold = -4\n[blur]\nblur = -1\n");
    let config = load_config(&file);

    let mut det = DetectorKind::Diff.build();
    assert!(matches!(
        det.configure(&config, "neg"),
        Err(ConfigError::InvalidValue { field: "diff_threshold", .. })
    ));
    assert!(matches!(
        det.configure(&config, "blur"),
        Err(ConfigError::InvalidValue { field: "blur", .. })
    ));
    assert!(matches!(
        det.configure(&config, "missing"),
        Err(ConfigError::MissingSection { .. })
    ));
}

#[test]
fn test_stage_repeats_previous_position_on_failure() -> anyhow::Result<()> {
    let frames = vec![
        flat_frame(0, 100, 100, 100),
        frame_with_block(1, (100, 100), 100, (40, 40, 10), 150),
        flat_frame(2, 50, 50, 0),
        frame_with_block(3, (100, 100), 100, (40, 40, 10), 150),
    ];
    let (sink, output) = channel::<Position2D>("pos");

    let mut stage = DetectorStage::new(
        detector(0, 20),
        Box::new(preloaded("raw", frames)),
        Box::new(sink),
    );
    assert_eq!(run(&mut stage, &CancellationToken::new()), 5);
    drop(stage);

    let published = drain(output);
    assert_eq!(published.len(), 4);
    assert!(!published[0].valid);
    assert_eq!(published[1], Position2D::new(45.0, 45.0));
    // size mismatch: previous output repeated
    assert_eq!(published[2], published[1]);
    // history was still frame 1, identical to frame 3
    assert!(!published[3].valid);
    Ok(())
}

#[test]
fn test_stage_saves_tuning_images() -> anyhow::Result<()> {
    let debug_dir = tempfile::TempDir::new()?;
    let debug = trackpipe::DebugConfig::new(debug_dir.path().join("masks"))?;

    let frames = vec![
        flat_frame(0, 32, 32, 0),
        frame_with_block(1, (32, 32), 0, (4, 4, 8), 200),
    ];
    let (sink, _output) = channel::<Position2D>("pos");
    let tuned = DifferenceDetector2D::with_settings(DifferenceSettings {
        blur: 0,
        diff_threshold: 20,
        tune: true,
    });

    let mut stage = DetectorStage::new(tuned, Box::new(preloaded("raw", frames)), Box::new(sink))
        .with_debug(debug);
    run(&mut stage, &CancellationToken::new());

    let mask = image::open(debug_dir.path().join("masks").join("000001.png"))?.to_luma8();
    assert_eq!(mask.get_pixel(5, 5)[0], 255);
    assert_eq!(mask.get_pixel(20, 20)[0], 0);
    assert!(debug_dir.path().join("masks").join("000000.png").exists());
    Ok(())
}

#[test]
fn test_failed_detection_saves_no_tuning_image() -> anyhow::Result<()> {
    let debug_dir = tempfile::TempDir::new()?;
    let masks = debug_dir.path().join("masks");
    let debug = trackpipe::DebugConfig::new(masks.clone())?;

    let frames = vec![
        flat_frame(0, 32, 32, 0),
        frame_with_block(1, (32, 32), 0, (4, 4, 8), 200),
        flat_frame(2, 16, 16, 0),
    ];
    let (sink, output) = channel::<Position2D>("pos");
    let tuned = DifferenceDetector2D::with_settings(DifferenceSettings {
        blur: 0,
        diff_threshold: 20,
        tune: true,
    });

    let mut stage = DetectorStage::new(tuned, Box::new(preloaded("raw", frames)), Box::new(sink))
        .with_debug(debug);
    run(&mut stage, &CancellationToken::new());
    drop(stage);

    assert_eq!(drain(output).len(), 3);
    assert!(masks.join("000001.png").exists());
    assert!(!masks.join("000002.png").exists());
    Ok(())
}
