//! End-to-end scenarios: frame directory -> mocked tagging service ->
//! word2vec model -> RocksDB records.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;

use autoss_pipeline::{Pass, RunReport};
use autoss_types::{vector, FrameId, FrameVectorRecord, SequenceInputRecord};
use e2e_tests::{one_hot, TestHarness, DIMENSION};

/// Two frames: "car" then nothing. The car disappears between them.
#[tokio::test]
async fn test_car_leaves_the_scene() {
    let harness = TestHarness::new().await;
    harness.add_frame("vid1_1_1.jpg", b"frame-one");
    harness.add_frame("vid1_1_2.jpg", b"frame-two");
    harness.tag_image(b"frame-one", &["car"]).await;
    harness.tag_image(b"frame-two", &[]).await;

    let store = harness.open_store();
    let report = harness
        .pipeline(&store)
        .run(&harness.frame_dir, "vid1", 1, Pass::All)
        .await
        .unwrap();

    assert_eq!(
        report,
        RunReport {
            frames_catalogued: 2,
            vectors_written: 2,
            tagless_frames: 1,
            sequence_inputs_written: 1,
            ..RunReport::default()
        }
    );

    let vectors = TestHarness::vectors(&store);
    let frame1 = FrameId::new("vid1", 1, 1);
    let frame2 = FrameId::new("vid1", 1, 2);

    let car = one_hot(0, 1.0);
    assert_eq!(
        vectors.find_by_key(&frame1).await.unwrap(),
        FrameVectorRecord::new(
            &frame1,
            BTreeMap::from([("car".to_string(), car.clone())]),
            car.clone(),
            vec!["car".to_string()],
        )
    );
    assert_eq!(
        vectors.find_by_key(&frame2).await.unwrap(),
        FrameVectorRecord::new(&frame2, BTreeMap::new(), vector::zeros(DIMENSION), vec![])
    );

    let inputs = TestHarness::sequence_inputs(&store);
    let gone = one_hot(0, -1.0);
    assert_eq!(
        inputs.find_by_key(&frame1).await.unwrap(),
        SequenceInputRecord::new(&frame1, car, gone.clone(), gone)
    );
    // Last frame has no successor
    assert!(inputs.find_by_key(&frame2).await.is_none());
}

/// A non-integer camera token never reaches the tagger or the store.
#[tokio::test]
async fn test_malformed_camera_token_rejected() {
    let harness = TestHarness::new().await;
    harness.add_frame("vid1_x_1.jpg", b"bad-camera");
    harness.add_frame("vid1_1_1.jpg", b"frame-one");
    harness.add_frame("vid1_1_2.jpg", b"frame-two");
    harness.never_tag(b"bad-camera").await;
    harness.tag_image(b"frame-one", &["road"]).await;
    harness.tag_image(b"frame-two", &["road", "car"]).await;

    let store = harness.open_store();
    let report = harness
        .pipeline(&store)
        .run(&harness.frame_dir, "vid1", 1, Pass::All)
        .await
        .unwrap();

    assert_eq!(report.frames_catalogued, 2);
    assert_eq!(report.files_rejected, 1);
    assert_eq!(report.vectors_written, 2);
    assert_eq!(report.sequence_inputs_written, 1);

    let inputs = TestHarness::sequence_inputs(&store);
    let input = inputs
        .find_by_key(&FrameId::new("vid1", 1, 1))
        .await
        .unwrap();
    assert_eq!(input.diffvector, one_hot(0, 1.0));
    assert_eq!(input.normvector, one_hot(0, 1.0));
}

/// A stalled tagging call leaves that frame tagless; the run carries on.
#[tokio::test]
async fn test_tagging_timeout_is_tagless_frame() {
    let harness = TestHarness::new().await;
    harness.add_frame("vid1_1_1.jpg", b"frame-one");
    harness.add_frame("vid1_1_2.jpg", b"frame-two");
    harness.add_frame("vid1_1_3.jpg", b"frame-three");
    harness.tag_image(b"frame-one", &["car"]).await;
    harness.stall_image(b"frame-two").await;
    harness.tag_image(b"frame-three", &["car", "road"]).await;

    let store = harness.open_store();
    let report = harness
        .pipeline(&store)
        .run(&harness.frame_dir, "vid1", 1, Pass::All)
        .await
        .unwrap();

    assert_eq!(report.vectors_written, 3);
    assert_eq!(report.tag_failures, 1);
    assert_eq!(report.sequence_inputs_written, 2);

    let vectors = TestHarness::vectors(&store);
    let frame2 = FrameId::new("vid1", 1, 2);
    let stalled = vectors.find_by_key(&frame2).await.unwrap();
    assert!(stalled.tags.is_empty());
    assert!(stalled.vectors.is_empty());
    assert_eq!(stalled.sumvector, vector::zeros(DIMENSION));

    let frame3 = vectors
        .find_by_key(&FrameId::new("vid1", 1, 3))
        .await
        .unwrap();
    assert_eq!(frame3.tags, vec!["car".to_string(), "road".to_string()]);

    // 2 -> 3: both components rise by one, normalized to 1/sqrt(2)
    let inputs = TestHarness::sequence_inputs(&store);
    let input = inputs.find_by_key(&frame2).await.unwrap();
    let expected = std::f64::consts::FRAC_1_SQRT_2;
    assert!((input.normvector[0] - expected).abs() < 1e-12);
    assert!((input.normvector[1] - expected).abs() < 1e-12);
    assert!((vector::l2_norm(&input.normvector) - 1.0).abs() < 1e-12);
}

/// Records are created once; a second vectorize run leaves them untouched.
#[tokio::test]
async fn test_rerun_keeps_first_records() {
    let harness = TestHarness::new().await;
    harness.add_frame("vid1_1_1.jpg", b"frame-one");
    harness.tag_image(b"frame-one", &["car"]).await;

    let store = harness.open_store();
    let pipeline = harness.pipeline(&store);
    let first = pipeline
        .run(&harness.frame_dir, "vid1", 1, Pass::Vectorize)
        .await
        .unwrap();
    assert_eq!(first.vectors_written, 1);

    let second = pipeline
        .run(&harness.frame_dir, "vid1", 1, Pass::Vectorize)
        .await
        .unwrap();
    assert_eq!(second.vectors_written, 0);
    assert_eq!(second.vector_write_failures, 1);

    let record = TestHarness::vectors(&store)
        .find_by_key(&FrameId::new("vid1", 1, 1))
        .await
        .unwrap();
    assert_eq!(record.tags, vec!["car".to_string()]);
}

/// Records survive reopening the store, so pass 2 can run on its own later.
#[tokio::test]
async fn test_difference_pass_after_reopen() {
    let harness = TestHarness::new().await;
    harness.add_frame("vid1_1_1.jpg", b"frame-one");
    harness.add_frame("vid1_1_2.jpg", b"frame-two");
    harness.tag_image(b"frame-one", &["road"]).await;
    harness.tag_image(b"frame-two", &["car"]).await;

    {
        let store = harness.open_store();
        let report = harness
            .pipeline(&store)
            .run(&harness.frame_dir, "vid1", 1, Pass::Vectorize)
            .await
            .unwrap();
        assert_eq!(report.vectors_written, 2);
    }

    let store = harness.open_store();
    let report = harness
        .pipeline(&store)
        .run(&harness.frame_dir, "vid1", 1, Pass::Difference)
        .await
        .unwrap();
    assert_eq!(report.sequence_inputs_written, 1);

    let input = TestHarness::sequence_inputs(&store)
        .find_by_key(&FrameId::new("vid1", 1, 1))
        .await
        .unwrap();
    let mut expected = one_hot(0, 1.0);
    expected[1] = -1.0;
    assert_eq!(input.diffvector, expected);
}
