use std::collections::HashMap;

use streamsafe::detect::backends::StubTextEngine;
use streamsafe::detect::TextDetection;
use streamsafe::{
    ChannelOrder, DetectionSettings, DetectorKind, Frame, FrameError, Pipeline, PipelineConfig,
    RawGeometry, Region,
};

const WHITE: [u8; 3] = [255, 255, 255];

/// White 100x100 frame with dark "105" strokes inside the detected box.
fn white_frame_with_digits() -> Frame {
    let mut frame = Frame::filled(100, 100, WHITE, ChannelOrder::Bgr).unwrap();
    for &(x0, x1) in &[(42, 44), (47, 52), (54, 59)] {
        for y in 43..57 {
            for x in x0..x1 {
                frame.put_pixel(x, y, [20, 20, 20]);
            }
        }
    }
    frame
}

fn engine() -> StubTextEngine {
    let polygon = RawGeometry::Polygon(vec![
        vec![40.0, 40.0],
        vec![60.0, 40.0],
        vec![60.0, 60.0],
        vec![40.0, 60.0],
    ]);
    StubTextEngine::repeating(vec![TextDetection::new(polygon, "1O5", 0.9)])
}

#[test]
fn block_number_is_blurred_and_nothing_else_changes() {
    let mut pipeline =
        Pipeline::with_backends(&PipelineConfig::default(), None, Some(Box::new(engine()))).unwrap();
    let settings = DetectionSettings::from_map(HashMap::from([("block_numbers".to_string(), true)]));

    let input = white_frame_with_digits();
    for _ in 0..29 {
        let mut output = input.clone();
        pipeline.process(&mut output, &settings);
        assert_eq!(output, input);
    }

    let mut output = input.clone();
    let report = pipeline.process(&mut output, &settings);
    assert!(report.was_refreshed(DetectorKind::BlockNumbers));
    assert_eq!(report.redacted, 1);

    let expected = Region {
        x1: 30,
        y1: 30,
        x2: 70,
        y2: 70,
    };
    assert_eq!(
        pipeline.cache(DetectorKind::BlockNumbers).regions(),
        &[expected]
    );

    let mut changed_inside = 0;
    for y in 0..100 {
        for x in 0..100 {
            if expected.contains(x, y) {
                if output.pixel(x, y) != input.pixel(x, y) {
                    changed_inside += 1;
                }
            } else {
                assert_eq!(output.pixel(x, y), WHITE, "pixel ({x}, {y})");
            }
        }
    }
    assert!(changed_inside > 0);
    assert_eq!((output.width(), output.height()), (100, 100));
    assert_eq!(output.channel_order(), ChannelOrder::Bgr);
}

#[test]
fn raw_buffers_keep_shape_and_disabled_frames_pass_through() {
    let mut pipeline =
        Pipeline::with_backends(&PipelineConfig::default(), None, Some(Box::new(engine()))).unwrap();
    let input = white_frame_with_digits();
    let bytes = input.as_bytes().to_vec();

    let untouched = pipeline
        .process_raw(&bytes, 100, 100, ChannelOrder::Bgr, &DetectionSettings::default())
        .unwrap();
    assert_eq!(untouched, bytes);

    let all = DetectionSettings::all();
    for _ in 0..30 {
        let out = pipeline
            .process_raw(&bytes, 100, 100, ChannelOrder::Bgr, &all)
            .unwrap();
        assert_eq!(out.len(), bytes.len());
    }
    assert_eq!(pipeline.cache(DetectorKind::BlockNumbers).regions().len(), 1);

    assert_eq!(
        pipeline.process_raw(&bytes, 0, 100, ChannelOrder::Bgr, &all),
        Err(FrameError::ZeroArea {
            width: 0,
            height: 100
        })
    );
}
