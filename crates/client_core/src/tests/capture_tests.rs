use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[derive(Clone, Copy)]
enum StartMode {
    Ok,
    Unsupported,
    Fail,
}

struct FakeBackend {
    mode: StartMode,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl FakeBackend {
    fn new(mode: StartMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SpeechCapture for FakeBackend {
    async fn start(&self, _locale: &str) -> Result<(), CaptureError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            StartMode::Ok => Ok(()),
            StartMode::Unsupported => Err(CaptureError::Unsupported),
            StartMode::Fail => Err(CaptureError::Failed("mic busy".to_string())),
        }
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn take_event_stream(&self) -> Option<mpsc::UnboundedReceiver<CaptureEvent>> {
        None
    }
}

#[tokio::test]
async fn toggle_starts_a_single_session() {
    let backend = FakeBackend::new(StartMode::Ok);
    let mut controller = CaptureController::new(backend.clone());

    let outcome = controller.toggle("en-US").await.expect("toggle");
    assert_eq!(outcome, MicToggle::Started);
    assert!(controller.is_listening());
    assert_eq!(backend.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn toggle_while_listening_requests_stop_without_second_session() {
    let backend = FakeBackend::new(StartMode::Ok);
    let mut controller = CaptureController::new(backend.clone());

    controller.toggle("en-US").await.expect("first toggle");
    let outcome = controller.toggle("en-US").await.expect("second toggle");

    assert_eq!(outcome, MicToggle::StopRequested);
    assert_eq!(backend.starts.load(Ordering::SeqCst), 1);
    assert_eq!(backend.stops.load(Ordering::SeqCst), 1);
    // The session lives until its terminal event fires.
    assert!(controller.is_listening());
}

#[tokio::test]
async fn toggle_while_processing_is_a_no_op() {
    let backend = FakeBackend::new(StartMode::Ok);
    let mut controller = CaptureController::new(backend.clone());

    controller.toggle("en-US").await.expect("toggle");
    assert!(controller.finalize());

    let outcome = controller.toggle("en-US").await.expect("toggle");
    assert_eq!(outcome, MicToggle::Busy);
    assert_eq!(backend.starts.load(Ordering::SeqCst), 1);
    assert_eq!(backend.stops.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn finalize_is_guarded_against_stray_events() {
    let backend = FakeBackend::new(StartMode::Ok);
    let mut controller = CaptureController::new(backend);

    assert!(!controller.finalize());
    assert_eq!(*controller.state(), CaptureState::Idle);
}

#[tokio::test]
async fn settle_returns_to_idle_after_dispatch() {
    let backend = FakeBackend::new(StartMode::Ok);
    let mut controller = CaptureController::new(backend);

    controller.toggle("es-ES").await.expect("toggle");
    assert!(controller.finalize());
    controller.settle();
    assert_eq!(*controller.state(), CaptureState::Idle);
}

#[tokio::test]
async fn unsupported_backend_is_reported_once_then_silent() {
    let backend = FakeBackend::new(StartMode::Unsupported);
    let mut controller = CaptureController::new(backend.clone());

    let first = controller.toggle("en-US").await;
    assert!(matches!(first, Err(CaptureError::Unsupported)));

    let second = controller.toggle("en-US").await.expect("silent no-op");
    assert_eq!(second, MicToggle::Unavailable);
    assert_eq!(backend.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_start_leaves_controller_startable() {
    let backend = FakeBackend::new(StartMode::Fail);
    let mut controller = CaptureController::new(backend.clone());

    let outcome = controller.toggle("en-US").await;
    assert!(matches!(outcome, Err(CaptureError::Failed(_))));
    assert!(matches!(controller.state(), CaptureState::Error(_)));

    // A later press attempts a fresh session.
    let _ = controller.toggle("en-US").await;
    assert_eq!(backend.starts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn session_error_destroys_session_and_allows_restart() {
    let backend = FakeBackend::new(StartMode::Ok);
    let mut controller = CaptureController::new(backend.clone());

    controller.toggle("en-US").await.expect("toggle");
    controller.fail("no-speech");
    assert_eq!(*controller.state(), CaptureState::Error("no-speech".to_string()));
    assert!(!controller.is_listening());

    let outcome = controller.toggle("en-US").await.expect("restart");
    assert_eq!(outcome, MicToggle::Started);
    assert_eq!(backend.starts.load(Ordering::SeqCst), 2);
}
