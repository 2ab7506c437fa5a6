//! Keyboard stand-in for a microphone.
//!
//! `mic` arms a session; the next typed line becomes the finalized
//! transcript. Stopping an armed session early emits an `aborted` error, so
//! the one-terminal-event-per-session contract holds either way.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use client_core::capture::{CaptureError, CaptureEvent, SpeechCapture};
use tokio::sync::mpsc;

pub struct LineSpeechCapture {
    armed: AtomicBool,
    tx: mpsc::UnboundedSender<CaptureEvent>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<CaptureEvent>>>,
}

impl LineSpeechCapture {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            armed: AtomicBool::new(false),
            tx,
            rx: Mutex::new(Some(rx)),
        })
    }

    /// Offers a typed line to the armed session. Returns true when the line
    /// was consumed as a transcript.
    pub fn push_line(&self, line: &str) -> bool {
        if self.armed.swap(false, Ordering::SeqCst) {
            let _ = self.tx.send(CaptureEvent::Transcript(line.to_string()));
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl SpeechCapture for LineSpeechCapture {
    async fn start(&self, locale: &str) -> Result<(), CaptureError> {
        self.armed.store(true, Ordering::SeqCst);
        tracing::info!(locale, "capture armed, the next typed line is the transcript");
        Ok(())
    }

    async fn stop(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            let _ = self.tx.send(CaptureEvent::Error("aborted".to_string()));
        }
    }

    fn take_event_stream(&self) -> Option<mpsc::UnboundedReceiver<CaptureEvent>> {
        self.rx.lock().ok()?.take()
    }
}
