//! Speech-capture capability seam and session lifecycle.
//!
//! The platform speech facility is injected as a [`SpeechCapture`] trait
//! object so tests and headless builds can substitute their own backend.
//! [`CaptureController`] wraps it in an explicit state machine: a session is
//! created by a user-initiated start and destroyed by exactly one terminal
//! event (transcript or error), with at most one session active at a time.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Terminal event of one capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    Transcript(String),
    Error(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("speech capture is not supported on this device")]
    Unsupported,
    #[error("capture failed: {0}")]
    Failed(String),
}

/// Platform speech-to-text facility.
///
/// Contract: a successful `start` is followed by exactly one [`CaptureEvent`]
/// on the stream, even when the session is cut short by `stop`.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Begin a single-shot capture session for `locale` (e.g. `en-US`).
    async fn start(&self, locale: &str) -> Result<(), CaptureError>;

    /// End an active session early; the terminal event still fires.
    async fn stop(&self);

    /// Single-subscriber stream of terminal events. Returns `None` once the
    /// stream has been taken, or when the backend has no facility at all.
    fn take_event_stream(&self) -> Option<mpsc::UnboundedReceiver<CaptureEvent>>;
}

/// Fallback when the platform offers no speech facility.
pub struct MissingSpeechCapture;

#[async_trait]
impl SpeechCapture for MissingSpeechCapture {
    async fn start(&self, _locale: &str) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported)
    }

    async fn stop(&self) {}

    fn take_event_stream(&self) -> Option<mpsc::UnboundedReceiver<CaptureEvent>> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Listening,
    Processing,
    Error(String),
}

impl CaptureState {
    fn startable(&self) -> bool {
        matches!(self, CaptureState::Idle | CaptureState::Error(_))
    }
}

/// What a mic press amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicToggle {
    Started,
    /// An active session was asked to stop; its terminal event is pending.
    StopRequested,
    /// The previous session is still finalizing.
    Busy,
    /// Capture is unsupported and that was already reported.
    Unavailable,
}

pub struct CaptureController {
    backend: Arc<dyn SpeechCapture>,
    state: CaptureState,
    unsupported_reported: bool,
}

impl CaptureController {
    pub fn new(backend: Arc<dyn SpeechCapture>) -> Self {
        Self {
            backend,
            state: CaptureState::Idle,
            unsupported_reported: false,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == CaptureState::Listening
    }

    /// Toggle semantics for the mic affordance: start when no session is
    /// active, request a stop when one is listening. Starting while a session
    /// exists never creates a second one.
    pub async fn toggle(&mut self, locale: &str) -> Result<MicToggle, CaptureError> {
        match self.state {
            CaptureState::Listening => {
                self.backend.stop().await;
                Ok(MicToggle::StopRequested)
            }
            CaptureState::Processing => Ok(MicToggle::Busy),
            _ => {
                if self.unsupported_reported {
                    return Ok(MicToggle::Unavailable);
                }
                debug_assert!(self.state.startable());
                match self.backend.start(locale).await {
                    Ok(()) => {
                        self.state = CaptureState::Listening;
                        Ok(MicToggle::Started)
                    }
                    Err(CaptureError::Unsupported) => {
                        self.unsupported_reported = true;
                        Err(CaptureError::Unsupported)
                    }
                    Err(err) => {
                        self.state = CaptureState::Error(err.to_string());
                        Err(err)
                    }
                }
            }
        }
    }

    /// Listening -> Processing when the backend finalizes a transcript.
    /// Returns false for events arriving outside an active session.
    pub fn finalize(&mut self) -> bool {
        if self.state != CaptureState::Listening {
            return false;
        }
        self.state = CaptureState::Processing;
        true
    }

    /// Processing -> Idle once the transcript has been dispatched.
    pub fn settle(&mut self) {
        if self.state == CaptureState::Processing {
            self.state = CaptureState::Idle;
        }
    }

    /// Destroys the active session; the controller is startable again.
    pub fn fail(&mut self, code: &str) {
        self.state = CaptureState::Error(code.to_string());
    }
}

#[cfg(test)]
#[path = "tests/capture_tests.rs"]
mod tests;
