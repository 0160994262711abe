use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use media_annotator::{
    plain_text, subtitle_document, AnalysisMode, AnalysisOutcome, AnnotationRecord,
    AnnotationSession, AnnotationSource, AnnotatorError, MediaHandle, ModelReply,
    NullMediaElement, PlainTextMode, PlaybackController, PlaybackPhase, TimecodeInput,
};

fn media() -> MediaHandle {
    MediaHandle {
        uri: "files/clip".to_string(),
        name: "clip".to_string(),
        mime_type: "video/mp4".to_string(),
    }
}

/// Annotation source that replies with a canned batch after an optional
/// number of empty replies.
struct CannedSource {
    empties_first: std::sync::atomic::AtomicU32,
    batch: Vec<AnnotationRecord>,
}

#[async_trait]
impl AnnotationSource for CannedSource {
    async fn annotate(
        &self,
        _media: &MediaHandle,
        _mode: &AnalysisMode,
    ) -> Result<ModelReply, AnnotatorError> {
        use std::sync::atomic::Ordering;
        if self
            .empties_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(ModelReply::Empty);
        }
        Ok(ModelReply::Records(self.batch.clone()))
    }
}

fn canned_batch() -> Vec<AnnotationRecord> {
    vec![
        AnnotationRecord::text("0:00", "Hi"),
        AnnotationRecord::text("0:05", "Bye"),
    ]
}

#[tokio::test]
async fn test_analysis_results_drive_playback_and_export() {
    let source = CannedSource {
        empties_first: std::sync::atomic::AtomicU32::new(1),
        batch: canned_batch(),
    };
    let session = AnnotationSession::new(Arc::new(source), 3, Duration::from_millis(1));

    let outcome = session
        .analyze(&media(), &AnalysisMode::Captions)
        .await
        .unwrap()
        .expect("non-superseded request must apply");

    let records = match outcome {
        AnalysisOutcome::Records(records) => records,
        other => panic!("expected records, got {:?}", other),
    };

    // Feed the batch into the playback controller.
    let mut controller = PlaybackController::new(Box::new(NullMediaElement));
    controller.load_metadata(10.0);
    controller.set_annotations(records.clone());

    controller.on_position_tick(1.0);
    assert_eq!(controller.caption().unwrap().caption(), "Hi");
    controller.on_position_tick(6.0);
    assert_eq!(controller.caption().unwrap().caption(), "Bye");

    // Click-to-seek on the first marker.
    controller.jump_to_record(0);
    assert_eq!(controller.position(), 0.0);
    assert_eq!(controller.caption().unwrap().caption(), "Hi");

    // Export the same batch the controller is showing.
    let srt = subtitle_document(controller.annotations().records(), controller.duration());
    assert!(srt.contains("1\n00:00:00,000 --> 00:00:05,000\nHi"));
    assert!(srt.contains("2\n00:00:05,000 --> 00:00:10,000\nBye"));

    let clipboard = plain_text(
        controller.annotations().records(),
        PlainTextMode::WithTimestamps,
    );
    assert_eq!(clipboard, "0:00 - Hi\n0:05 - Bye");
}

#[tokio::test]
async fn test_repeated_empty_replies_surface_as_user_facing_error() {
    let source = CannedSource {
        empties_first: std::sync::atomic::AtomicU32::new(10),
        batch: canned_batch(),
    };
    let session = AnnotationSession::new(Arc::new(source), 2, Duration::from_millis(1));

    let err = session
        .analyze(&media(), &AnalysisMode::Captions)
        .await
        .unwrap_err();
    assert!(matches!(err, AnnotatorError::EmptyReply { attempts: 2 }));
}

#[test]
fn test_scrub_cycle_against_live_annotations() {
    let mut controller = PlaybackController::new(Box::new(NullMediaElement));
    controller.load_metadata(60.0);
    controller.set_annotations(vec![
        AnnotationRecord::text("0:10", "first"),
        AnnotationRecord::text("0:30", "second"),
    ]);

    controller.toggle_play();
    controller.on_position_tick(12.0);
    assert_eq!(controller.caption().unwrap().caption(), "first");

    // While scrubbing, native ticks are suppressed but a seek still lands.
    controller.begin_scrub();
    controller.on_position_tick(45.0);
    assert_eq!(controller.position(), 12.0);
    controller.seek(31.0);
    assert_eq!(controller.caption().unwrap().caption(), "second");

    controller.end_scrub();
    assert_eq!(controller.phase(), PlaybackPhase::Playing);

    // Jump by a timecode string as a table-row click would.
    controller.jump_to_timecode(&TimecodeInput::Text("0:10".to_string()));
    assert_eq!(controller.caption().unwrap().caption(), "first");
}

#[test]
fn test_value_records_flow_through_chart_exports() {
    let records = vec![
        AnnotationRecord::value("0:00", 1.0),
        AnnotationRecord::value("0:10", 7.5),
    ];

    let mut controller = PlaybackController::new(Box::new(NullMediaElement));
    controller.load_metadata(20.0);
    controller.set_annotations(records);

    controller.on_position_tick(15.0);
    assert_eq!(controller.caption().unwrap().caption(), "7.5");

    let srt = subtitle_document(controller.annotations().records(), 20.0);
    assert!(srt.contains("00:00:10,000 --> 00:00:20,000\n7.5"));
}
