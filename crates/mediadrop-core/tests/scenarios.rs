//! End-to-end flows through the public API.

mod support;

use std::rc::Rc;

use mediadrop_core::crop::CropRect;
use mediadrop_core::notify::NotificationLog;
use mediadrop_core::preview::InMemoryPreviews;
use mediadrop_core::{
    CropScope, Dropzone, DropzoneConfig, DropzoneError, EntryStatus, FileEntryStore, FileIntake,
    Notification, NotificationKind, PreviewGenerator, UploadError, UploadOrchestrator,
    ValidationError,
};
use support::{quadrant_png, sized_file, GatedSink, ObserverLog, ScriptedSink};

const MB: usize = 1024 * 1024;

fn dropzone(config: DropzoneConfig, sink: Rc<ScriptedSink>) -> (Dropzone, Rc<NotificationLog>) {
    let log = Rc::new(NotificationLog::new());
    let dropzone = Dropzone::new(config, Rc::new(InMemoryPreviews::new()), sink, log.clone()).unwrap();
    (dropzone, log)
}

#[tokio::test]
async fn three_valid_files_are_queued_then_uploaded() {
    let config = DropzoneConfig::default();
    let store = FileEntryStore::shared(config.max_files);
    let log = Rc::new(NotificationLog::new());
    let sink = Rc::new(ScriptedSink::accepting());
    let intake = FileIntake::new(
        config,
        store.clone(),
        PreviewGenerator::new(Rc::new(InMemoryPreviews::new())),
        log.clone(),
    )
    .unwrap();
    let orchestrator = UploadOrchestrator::new(store.clone(), sink.clone(), log.clone());

    let outcome = intake
        .receive(vec![
            quadrant_png("a.png", 4, 4),
            quadrant_png("b.png", 4, 4),
            quadrant_png("c.png", 4, 4),
        ])
        .unwrap();
    assert_eq!(outcome.to_upload.len(), 3);
    assert!(store
        .borrow()
        .iter()
        .all(|e| e.status() == EntryStatus::Queued && e.progress() == 0));

    orchestrator.submit(&outcome.to_upload).await.unwrap();

    assert!(store
        .borrow()
        .iter()
        .all(|e| e.status() == EntryStatus::Success && e.progress() == 100));
    assert_eq!(sink.batches.borrow().len(), 1);
    assert_eq!(log.entries(), vec![Notification::success("Uploaded 3 files")]);
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let config = DropzoneConfig {
        max_size: 5 * MB as u64,
        ..DropzoneConfig::default()
    };
    let sink = Rc::new(ScriptedSink::accepting());
    let (dropzone, log) = dropzone(config, sink.clone());

    let outcome = dropzone
        .drop_files(vec![sized_file("huge.png", "image/png", 10 * MB)])
        .await
        .unwrap();

    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].reason, ValidationError::SizeExceeded);
    assert!(dropzone.snapshots().is_empty());
    assert!(sink.batches.borrow().is_empty());
    let notes = log.entries();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Error);
    assert_eq!(
        notes[0].message,
        "huge.png is too large (10 MB); the maximum size is 5 MB"
    );
}

#[tokio::test]
async fn first_image_is_cropped_and_second_uploads_directly() {
    let config = DropzoneConfig {
        enable_crop: true,
        aspect_ratio: 4.0 / 3.0,
        ..DropzoneConfig::default()
    };
    let sink = Rc::new(ScriptedSink::accepting());
    let (dropzone, log) = dropzone(config, sink.clone());

    let outcome = dropzone
        .drop_files(vec![quadrant_png("a.png", 80, 60), quadrant_png("b.png", 4, 4)])
        .await
        .unwrap();
    let (first, second) = (outcome.accepted[0], outcome.accepted[1]);

    assert_eq!(dropzone.pending_crops(), vec![first]);
    assert_eq!(sink.uploaded_names(), vec!["b.png"]);

    let mut session = dropzone.open_crop(first).unwrap();
    session.set_rotation(90.0);
    session.set_crop_rect(CropRect::full(80, 60));
    dropzone.sync_crop(first, &session).unwrap();
    dropzone
        .commit_crop(first, &session, 1_712_345_678_901)
        .await
        .unwrap();

    let store = dropzone.store();
    let store = store.borrow();
    let cropped = store.get(first).unwrap();
    assert_eq!(cropped.name(), "cropped-1712345678901.jpg");
    assert_eq!(cropped.mime_type(), "image/jpeg");
    assert_eq!(cropped.status(), EntryStatus::Success);
    assert_eq!(store.get(second).unwrap().status(), EntryStatus::Success);

    assert_eq!(
        sink.uploaded_names(),
        vec!["b.png", "cropped-1712345678901.jpg"]
    );
    let uploaded = &sink.batches.borrow()[1][0];
    let decoded = image::load_from_memory(&uploaded.bytes).unwrap().into_rgb8();
    assert_eq!(decoded.dimensions(), (80, 60));

    // Turned clockwise: out(u, v) shows src(v + 10, 69 - u), so the source's
    // bottom-left (blue) quadrant lands top-left, and the source's left and
    // right edges are cut off by the 80x60 frame.
    let assert_near = |u: u32, v: u32, rgb: [u8; 3]| {
        let got = decoded.get_pixel(u, v).0;
        let close = got
            .iter()
            .zip(rgb)
            .all(|(&g, want)| (g as i32 - want as i32).abs() <= 40);
        assert!(close, "pixel ({}, {}): got {:?}, want {:?}", u, v, got, rgb);
    };
    assert_near(20, 10, [0, 0, 255]);
    assert_near(60, 10, [255, 0, 0]);
    assert_near(20, 50, [255, 255, 255]);
    assert_near(60, 50, [0, 255, 0]);
    assert_near(2, 15, [0, 0, 0]);
    assert_near(77, 15, [0, 0, 0]);

    assert_eq!(
        log.entries(),
        vec![
            Notification::success("Uploaded 1 file"),
            Notification::success("Uploaded 1 file"),
        ]
    );
}

#[tokio::test]
async fn rejected_batch_marks_every_entry_failed() {
    let sink = Rc::new(ScriptedSink::failing("network down"));
    let observer = Rc::new(ObserverLog::default());
    let (dropzone, log) = dropzone(DropzoneConfig::default(), sink);
    let dropzone = dropzone.with_observer(observer.clone());

    dropzone
        .drop_files(vec![quadrant_png("a.png", 4, 4), quadrant_png("b.png", 4, 4)])
        .await
        .unwrap();

    let snapshots = dropzone.snapshots();
    assert_eq!(snapshots.len(), 2);
    for snapshot in &snapshots {
        assert_eq!(snapshot.status, EntryStatus::Error);
        assert_eq!(snapshot.error.as_deref(), Some("network down"));
    }
    assert_eq!(*observer.errors.borrow(), vec!["network down".to_string()]);
    assert_eq!(log.entries(), vec![Notification::error("network down")]);
}

#[tokio::test]
async fn drop_beyond_max_files_is_refused() {
    let config = DropzoneConfig {
        max_files: 2,
        enable_crop: true,
        crop_scope: CropScope::EveryImage,
        ..DropzoneConfig::default()
    };
    let sink = Rc::new(ScriptedSink::accepting());
    let (dropzone, log) = dropzone(config, sink);

    dropzone
        .drop_files(vec![quadrant_png("a.png", 4, 4), quadrant_png("b.png", 4, 4)])
        .await
        .unwrap();
    assert!(log.is_empty());

    let outcome = dropzone
        .drop_files(vec![quadrant_png("c.png", 4, 4)])
        .await
        .unwrap();

    assert_eq!(outcome.rejected[0].reason, ValidationError::CountExceeded);
    assert_eq!(dropzone.snapshots().len(), 2);
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn drop_while_uploading_is_refused() {
    let (sink, gate) = GatedSink::new();
    let log = Rc::new(NotificationLog::new());
    let dropzone = Dropzone::new(
        DropzoneConfig::default(),
        Rc::new(InMemoryPreviews::new()),
        Rc::new(sink),
        log.clone(),
    )
    .unwrap();

    let first = dropzone.drop_files(vec![quadrant_png("a.png", 4, 4)]);
    let second = async {
        let refused = dropzone.drop_files(vec![quadrant_png("b.png", 4, 4)]).await;
        gate.send(()).unwrap();
        refused
    };
    let (first, second) = futures::join!(first, second);

    assert!(first.is_ok());
    assert_eq!(second, Err(DropzoneError::Upload(UploadError::Busy)));
    assert_eq!(dropzone.snapshots().len(), 1);
    assert_eq!(
        log.entries(),
        vec![
            Notification::error("An upload is already in progress"),
            Notification::success("Uploaded 1 file"),
        ]
    );
}

#[tokio::test]
async fn cancelled_upload_fails_the_batch() {
    let (sink, _gate) = GatedSink::new();
    let log = Rc::new(NotificationLog::new());
    let dropzone = Dropzone::new(
        DropzoneConfig::default(),
        Rc::new(InMemoryPreviews::new()),
        Rc::new(sink),
        log.clone(),
    )
    .unwrap();

    let upload = dropzone.drop_files(vec![quadrant_png("a.png", 4, 4)]);
    let cancel = async { dropzone.cancel_upload() };
    let (outcome, cancelled) = futures::join!(upload, cancel);

    assert!(outcome.is_ok());
    assert!(cancelled);
    let snapshot = &dropzone.snapshots()[0];
    assert_eq!(snapshot.status, EntryStatus::Error);
    assert_eq!(snapshot.error.as_deref(), Some("Upload cancelled"));
    assert_eq!(log.entries(), vec![Notification::error("Upload cancelled")]);
    assert!(!dropzone.is_uploading());
}

#[tokio::test]
async fn progress_is_reported_in_steps_of_ten() {
    let observer = Rc::new(ObserverLog::default());
    let (dropzone, _log) = dropzone(DropzoneConfig::default(), Rc::new(ScriptedSink::accepting()));
    let dropzone = dropzone.with_observer(observer.clone());

    dropzone
        .drop_files(vec![quadrant_png("a.png", 4, 4)])
        .await
        .unwrap();

    let progress = observer.progress.borrow();
    assert_eq!(progress.first(), Some(&0));
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.windows(2).all(|w| w[1] == w[0] + 10));
}

#[tokio::test]
async fn retry_after_failure_is_allowed() {
    let sink = Rc::new(ScriptedSink::failing("offline"));
    let (dropzone, log) = dropzone(DropzoneConfig::default(), sink.clone());

    let outcome = dropzone
        .drop_files(vec![quadrant_png("a.png", 4, 4)])
        .await
        .unwrap();
    let err = dropzone.upload(&outcome.accepted).await.unwrap_err();

    assert_eq!(err.to_string(), "offline");
    assert_eq!(sink.batches.borrow().len(), 2);
    assert_eq!(log.len(), 2);
}
