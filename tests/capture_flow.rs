// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture controller

use pocket_camera::app::{CameraController, CaptureState, PermissionStatus};
use pocket_camera::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraFrame, CaptureSession, DisplayTarget,
    SensorRotation, TestPatternBackend, UseCase,
};
use pocket_camera::errors::{AppError, CameraError, CaptureError, StorageError, TransitionError};
use pocket_camera::pipelines::photo::PhotoEncoder;
use pocket_camera::storage::{
    DirectoryMediaStore, EntryMetadata, GalleryRecord, GalleryWriter, MediaStore, PendingEntry,
};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SAVED_DISPLAY: Duration = Duration::from_millis(2000);

fn display() -> DisplayTarget {
    DisplayTarget::new(7, 640, 480)
}

fn controller_with_store(
    backend: impl CameraBackend + 'static,
    store: Arc<dyn MediaStore>,
) -> CameraController {
    let writer = GalleryWriter::new(store, PhotoEncoder::new(), 0);
    CameraController::with_parts(
        CaptureSession::new(Box::new(backend)),
        writer,
        SAVED_DISPLAY,
    )
}

fn controller(backend: impl CameraBackend + 'static, dir: &Path) -> CameraController {
    controller_with_store(backend, Arc::new(DirectoryMediaStore::new(dir)))
}

fn gallery_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Directory store that reports a fixed amount of free space
struct LowSpaceStore {
    inner: DirectoryMediaStore,
    space: u64,
}

impl MediaStore for LowSpaceStore {
    fn create_entry(&self, metadata: &EntryMetadata) -> io::Result<PendingEntry> {
        self.inner.create_entry(metadata)
    }
    fn open_write(&self, entry: &PendingEntry) -> io::Result<Box<dyn Write + Send>> {
        self.inner.open_write(entry)
    }
    fn publish(&self, entry: PendingEntry, size_bytes: u64) -> io::Result<GalleryRecord> {
        self.inner.publish(entry, size_bytes)
    }
    fn discard(&self, entry: PendingEntry) {
        self.inner.discard(entry)
    }
    fn available_space(&self) -> io::Result<u64> {
        Ok(self.space)
    }
    fn location(&self) -> &Path {
        self.inner.location()
    }
}

/// Backend whose first bind fails
struct FlakyBackend {
    inner: TestPatternBackend,
    failures_left: usize,
}

impl CameraBackend for FlakyBackend {
    fn name(&self) -> &str {
        "flaky"
    }
    fn bind(&mut self, target: &DisplayTarget, use_cases: &[UseCase]) -> BackendResult<()> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(BackendError::DeviceNotFound("no camera attached".into()));
        }
        self.inner.bind(target, use_cases)
    }
    fn unbind(&mut self) {
        self.inner.unbind()
    }
    fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }
    fn capture_frame(&mut self) -> BackendResult<CameraFrame> {
        self.inner.capture_frame()
    }
}

#[tokio::test(start_paused = true)]
async fn test_photo_saved_then_resumes_after_delay() {
    let dir = TempDir::new().unwrap();
    let backend = TestPatternBackend::new()
        .with_size(64, 48)
        .with_rotation(SensorRotation::Rotate90);
    let probe = backend.probe();
    let controller = controller(backend, dir.path());
    let mut updates = controller.subscribe();

    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();
    assert_eq!(controller.state(), CaptureState::Ready);

    let record = controller.take_picture().await.unwrap();
    assert_eq!(controller.state(), CaptureState::PhotoSaved);
    assert_eq!((record.width, record.height), (48, 64));
    assert!(record.path.exists());
    assert!(record.uri.starts_with("media://gallery/IMG_"));
    assert_eq!(gallery_files(dir.path()).len(), 1);
    assert_eq!(probe.outstanding_frames(), 0);

    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.state, CaptureState::PhotoSaved);
    assert_eq!(snapshot.last_record, Some(record.clone()));

    tokio::time::sleep(Duration::from_millis(1999)).await;
    assert_eq!(controller.state(), CaptureState::PhotoSaved);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(controller.state(), CaptureState::Ready);
    assert_eq!(controller.snapshot().last_record, Some(record));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_take_picture_still_completes() {
    let dir = TempDir::new().unwrap();
    let backend = TestPatternBackend::new()
        .with_size(16, 16)
        .with_capture_delay(Duration::from_millis(300));
    let writer = GalleryWriter::new(
        Arc::new(DirectoryMediaStore::new(dir.path())),
        PhotoEncoder::new(),
        0,
    );
    let controller = CameraController::with_parts(
        CaptureSession::new(Box::new(backend)),
        writer,
        Duration::from_millis(200),
    );
    let mut updates = controller.subscribe();
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();

    // The caller gives up long before the sensor answers
    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), controller.take_picture()).await;
    assert!(abandoned.is_err());
    assert_eq!(controller.state(), CaptureState::Taking);

    let saved = tokio::time::timeout(
        Duration::from_secs(5),
        updates.wait_for(|s| s.last_record.is_some()),
    )
    .await
    .expect("capture never reached PhotoSaved")
    .unwrap()
    .clone();
    assert!(saved.last_record.unwrap().path.exists());

    tokio::time::timeout(
        Duration::from_secs(5),
        updates.wait_for(|s| s.state == CaptureState::Ready),
    )
    .await
    .expect("PhotoSaved never resumed")
    .unwrap();
    assert_eq!(gallery_files(dir.path()).len(), 1);
    assert!(controller.can_capture());
}

#[tokio::test]
async fn test_capture_rejected_when_not_ready() {
    let dir = TempDir::new().unwrap();
    let backend = TestPatternBackend::new();
    let probe = backend.probe();
    let controller = controller(backend, dir.path());

    let err = controller.take_picture().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Transition(TransitionError::NotReady(CaptureState::Idle))
    ));
    assert_eq!(controller.state(), CaptureState::Idle);
    assert_eq!(probe.captures(), 0);
    assert!(gallery_files(dir.path()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_capture_rejected_while_photo_saved() {
    let dir = TempDir::new().unwrap();
    let controller = controller(TestPatternBackend::new().with_size(16, 16), dir.path());
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();
    controller.take_picture().await.unwrap();

    let err = controller.take_picture().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Transition(TransitionError::NotReady(CaptureState::PhotoSaved))
    ));
    assert_eq!(gallery_files(dir.path()).len(), 1);
}

#[tokio::test]
async fn test_low_space_skips_write() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(LowSpaceStore {
        inner: DirectoryMediaStore::new(dir.path()),
        space: 1024,
    });
    let writer = GalleryWriter::new(store, PhotoEncoder::new(), 5 * 1024 * 1024);
    let controller = CameraController::with_parts(
        CaptureSession::new(Box::new(TestPatternBackend::new().with_size(16, 16))),
        writer,
        SAVED_DISPLAY,
    );
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();

    let err = controller.take_picture().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Storage(StorageError::InsufficientSpace { available: 1024, .. })
    ));
    assert_eq!(controller.state(), CaptureState::Ready);
    let message = controller.snapshot().message.unwrap();
    assert!(message.contains("Not enough free space"));
    assert!(gallery_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_write_failure_returns_to_ready() {
    let dir = TempDir::new().unwrap();
    // A regular file where the gallery directory should be
    let blocked = dir.path().join("gallery");
    std::fs::write(&blocked, b"not a directory").unwrap();
    let controller = controller(TestPatternBackend::new().with_size(16, 16), &blocked);
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();

    let err = controller.take_picture().await.unwrap_err();
    assert!(matches!(err, AppError::Write(_)));
    assert_eq!(controller.state(), CaptureState::Ready);
    assert_eq!(
        controller.snapshot().message.as_deref(),
        Some("Photo could not be saved to the gallery")
    );
    assert_eq!(controller.snapshot().last_record, None);
}

#[tokio::test]
async fn test_capture_failure_returns_to_ready() {
    let dir = TempDir::new().unwrap();
    let controller = controller(
        TestPatternBackend::new().failing_capture("shutter jammed"),
        dir.path(),
    );
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();

    let err = controller.take_picture().await.unwrap_err();
    assert!(matches!(err, AppError::Capture(CaptureError::Hardware(_))));
    assert_eq!(controller.state(), CaptureState::Ready);
    assert!(
        controller
            .snapshot()
            .message
            .unwrap()
            .contains("shutter jammed")
    );
    assert!(gallery_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_corrupt_frame_still_saves_blank_photo() {
    let dir = TempDir::new().unwrap();
    let controller = controller(
        TestPatternBackend::new().with_size(20, 10).corrupt_frames(),
        dir.path(),
    );
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();

    let record = controller.take_picture().await.unwrap();
    assert_eq!((record.width, record.height), (20, 10));
    assert!(record.path.exists());
}

#[tokio::test]
async fn test_device_error_then_retry() {
    let dir = TempDir::new().unwrap();
    let backend = FlakyBackend {
        inner: TestPatternBackend::new().with_size(16, 16),
        failures_left: 1,
    };
    let controller = controller(backend, dir.path());

    let err = controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Camera(CameraError::Unavailable(_))));
    assert_eq!(controller.state(), CaptureState::Error);
    assert!(controller.snapshot().message.is_some());

    // Initialize is only accepted from Idle
    assert!(
        controller
            .initialize(display(), PermissionStatus::Granted)
            .await
            .is_err()
    );
    assert_eq!(controller.state(), CaptureState::Error);

    controller.retry(display()).await.unwrap();
    assert_eq!(controller.state(), CaptureState::Ready);
    assert_eq!(controller.snapshot().message, None);
    assert!(controller.session().is_bound());
}

#[tokio::test]
async fn test_permission_denied_leaves_idle() {
    let dir = TempDir::new().unwrap();
    let backend = TestPatternBackend::new();
    let probe = backend.probe();
    let controller = controller(backend, dir.path());

    let err = controller
        .initialize(display(), PermissionStatus::Denied)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Camera(CameraError::PermissionDenied)));
    assert_eq!(controller.state(), CaptureState::Idle);
    assert_eq!(
        controller.snapshot().message.as_deref(),
        Some("Camera permission not granted")
    );
    assert_eq!(probe.binds(), 0);

    // Granted afterwards: binding proceeds and the message is cleared
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();
    assert_eq!(controller.state(), CaptureState::Ready);
    assert_eq!(controller.snapshot().message, None);
}

#[tokio::test]
async fn test_release_when_never_bound() {
    let dir = TempDir::new().unwrap();
    let backend = TestPatternBackend::new();
    let probe = backend.probe();
    let controller = controller(backend, dir.path());

    controller.release().unwrap();
    controller.release().unwrap();
    assert_eq!(controller.state(), CaptureState::Idle);
    assert_eq!(probe.unbinds(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_release_during_photo_saved_cancels_resume() {
    let dir = TempDir::new().unwrap();
    let backend = TestPatternBackend::new().with_size(16, 16);
    let probe = backend.probe();
    let controller = controller(backend, dir.path());
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();
    controller.take_picture().await.unwrap();

    controller.release().unwrap();
    assert_eq!(controller.state(), CaptureState::Idle);
    assert_eq!(probe.unbinds(), 1);

    tokio::time::sleep(SAVED_DISPLAY * 2).await;
    assert_eq!(controller.state(), CaptureState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_resume_timer_from_earlier_session_is_ignored() {
    let dir = TempDir::new().unwrap();
    let controller = controller(TestPatternBackend::new().with_size(16, 16), dir.path());
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();
    controller.take_picture().await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    controller.release().unwrap();
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    controller.take_picture().await.unwrap();
    assert_eq!(controller.state(), CaptureState::PhotoSaved);

    // The first save's timer fires here and must not end the second period
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(controller.state(), CaptureState::PhotoSaved);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(controller.state(), CaptureState::Ready);
    assert_eq!(gallery_files(dir.path()).len(), 2);
}

#[tokio::test]
async fn test_latest_photo_follows_saves() {
    let dir = TempDir::new().unwrap();
    let controller = controller_with_store(
        TestPatternBackend::new().with_size(16, 16),
        Arc::new(DirectoryMediaStore::new(dir.path())),
    );
    assert_eq!(controller.latest_photo().await, None);

    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();
    let record = controller.take_picture().await.unwrap();

    let latest = controller.latest_photo().await.unwrap();
    assert_eq!(latest.path, record.path);
    assert_eq!(latest.uri, record.uri);
}

#[tokio::test]
async fn test_advice_channel_stays_empty() {
    let dir = TempDir::new().unwrap();
    let controller = controller(TestPatternBackend::new().with_size(16, 16), dir.path());
    let advice = controller.advice();
    controller
        .initialize(display(), PermissionStatus::Granted)
        .await
        .unwrap();
    controller.take_picture().await.unwrap();

    assert_eq!(*advice.borrow(), None);
}
