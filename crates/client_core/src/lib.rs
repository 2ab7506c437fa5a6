//! Client core for the voice shopping assistant.
//!
//! [`AssistantClient`] orchestrates one command cycle: a capture session
//! finalizes a transcript, the transcript goes to the interpreter endpoint,
//! and the outcome mutates the single state store. A rejected command is
//! re-dispatched verbatim as a product search; a transport failure becomes a
//! status message and nothing else. Every mutating command is followed by a
//! list refresh so the local cache stays a read-through copy of the server.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use reqwest::Client;
use shared::{
    domain::{ActiveView, ItemId, Language, SearchResult, ShoppingItem},
    protocol::{
        MutationResponse, SearchRequest, SearchResponse, SuggestionsResponse, VoiceCommandRequest,
        VoiceCommandResponse,
    },
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};

pub mod capture;
pub mod state;

use capture::{CaptureController, CaptureError, CaptureEvent, MicToggle, SpeechCapture};
use state::{StateStore, UiSnapshot};

/// Classified result of one interpreter dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Success {
        message: String,
        substitute_suggestions: Option<Vec<String>>,
    },
    /// The interpreter could not make a command of the transcript; the
    /// search fallback has already run.
    Rejected,
    NetworkError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(usize),
    Empty,
    NetworkError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The server refused; its message is surfaced verbatim.
    Refused,
    NetworkError,
}

/// Notifications for renderers; emitted after each store mutation.
#[derive(Debug, Clone)]
pub enum AssistantEvent {
    StatusChanged(String),
    ListeningChanged(bool),
    ViewChanged(ActiveView),
    LanguageChanged(Language),
    ListRefreshed(Vec<ShoppingItem>),
    SuggestionsUpdated(Vec<String>),
    SearchResultsUpdated(Vec<SearchResult>),
}

pub struct AssistantClient {
    http: Client,
    server_url: String,
    capture_backend: Arc<dyn SpeechCapture>,
    capture: Mutex<CaptureController>,
    state: Mutex<StateStore>,
    events: broadcast::Sender<AssistantEvent>,
}

impl AssistantClient {
    pub fn new(
        server_url: impl Into<String>,
        language: Language,
        capture: Arc<dyn SpeechCapture>,
    ) -> Arc<Self> {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            http: Client::new(),
            server_url,
            capture_backend: Arc::clone(&capture),
            capture: Mutex::new(CaptureController::new(capture)),
            state: Mutex::new(StateStore::new(language)),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<AssistantEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> UiSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn set_language(&self, language: Language) {
        self.state.lock().await.set_language(language);
        let _ = self.events.send(AssistantEvent::LanguageChanged(language));
    }

    /// Initial pull of list and suggestions. Failures leave the (empty)
    /// collections untouched and are only logged; the user can still speak.
    pub async fn bootstrap(&self) {
        if let Err(err) = self.refresh_list().await {
            warn!("initial list refresh failed: {err}");
        }
        if let Err(err) = self.load_suggestions().await {
            warn!("initial suggestion load failed: {err}");
        }
    }

    /// Drives the capture session lifecycle from its terminal events.
    /// Call once after construction; the stream is single-subscriber.
    pub fn spawn_capture_pump(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let mut events = self
            .capture_backend
            .take_event_stream()
            .ok_or_else(|| anyhow!("capture event stream unavailable or already taken"))?;
        let client = Arc::clone(self);
        Ok(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                client.handle_capture_event(event).await;
            }
        }))
    }

    /// Mic affordance: starts a session when none is active, stops the
    /// active one otherwise. An unsupported platform is reported once.
    pub async fn press_mic(&self) {
        let locale = { self.state.lock().await.language().capture_locale() };
        let outcome = { self.capture.lock().await.toggle(locale).await };
        match outcome {
            Ok(MicToggle::Started) => {
                self.set_listening(true).await;
                self.set_status("🎙️ Listening...").await;
            }
            Ok(MicToggle::StopRequested | MicToggle::Busy | MicToggle::Unavailable) => {}
            Err(err @ CaptureError::Unsupported) => {
                self.set_status(format!("⚠️ {err}")).await;
            }
            Err(err) => {
                self.set_listening(false).await;
                self.set_status(format!("⚠️ Error: {err}")).await;
            }
        }
    }

    async fn handle_capture_event(&self, event: CaptureEvent) {
        match event {
            CaptureEvent::Transcript(raw) => {
                {
                    let mut capture = self.capture.lock().await;
                    if !capture.finalize() {
                        warn!("dropping transcript outside an active capture session");
                        return;
                    }
                }
                self.set_listening(false).await;
                self.set_status("⏳ Processing...").await;

                let transcript = raw.trim().to_string();
                if transcript.is_empty() {
                    self.capture.lock().await.fail("no-speech");
                    self.set_status("⚠️ Error: no-speech").await;
                    return;
                }

                self.set_status(format!("📥 Heard: \"{transcript}\"")).await;
                self.dispatch(&transcript).await;
                self.capture.lock().await.settle();
            }
            CaptureEvent::Error(code) => {
                self.capture.lock().await.fail(&code);
                self.set_listening(false).await;
                self.set_status(format!("⚠️ Error: {code}")).await;
            }
        }
    }

    /// Sends a finalized transcript to the interpreter and applies the
    /// outcome. On rejection the same transcript is re-dispatched as a
    /// search query, never a transformed one.
    pub async fn dispatch(&self, transcript: &str) -> CommandOutcome {
        let lang = self.language().await;
        let payload: VoiceCommandResponse = match self
            .post_json(
                "/voice-command",
                &VoiceCommandRequest {
                    text: transcript.to_string(),
                    lang,
                },
            )
            .await
        {
            Ok(payload) => payload,
            Err(err) => {
                warn!("voice-command dispatch failed: {err}");
                self.set_status("❌ Failed to process voice command.").await;
                return CommandOutcome::NetworkError;
            }
        };

        if !payload.is_success() {
            info!(transcript, "interpreter rejected command, falling back to search");
            self.set_status("🤔 Trying search instead...").await;
            self.search_dispatch(transcript).await;
            return CommandOutcome::Rejected;
        }

        self.set_status(format!("✅ {}", payload.message)).await;
        if let Some(labels) = payload.substitute_suggestions.clone() {
            self.apply_substitute_suggestions(labels).await;
        }

        // Every successful command ends with a list refresh, even when
        // substitutes just focused the suggestions view. The refresh runs
        // last, so it wins the view.
        if let Err(err) = self.refresh_list().await {
            warn!("list refresh after command failed: {err}");
        }

        CommandOutcome::Success {
            message: payload.message,
            substitute_suggestions: payload.substitute_suggestions,
        }
    }

    /// Product-search fallback. An empty result set is a valid negative
    /// answer: it clears the table, reports the query verbatim, and leaves
    /// the active view alone.
    pub async fn search_dispatch(&self, query: &str) -> SearchOutcome {
        let lang = self.language().await;
        let payload: SearchResponse = match self
            .post_json(
                "/search",
                &SearchRequest {
                    text: query.to_string(),
                    lang,
                },
            )
            .await
        {
            Ok(payload) => payload,
            Err(err) => {
                warn!("search dispatch failed: {err}");
                self.set_status("❌ Search failed.").await;
                return SearchOutcome::NetworkError;
            }
        };

        if payload.is_success() && !payload.found_items.is_empty() {
            let count = payload.found_items.len();
            {
                let mut state = self.state.lock().await;
                state.replace_search_results(payload.found_items.clone());
            }
            let _ = self
                .events
                .send(AssistantEvent::SearchResultsUpdated(payload.found_items));
            let _ = self.events.send(AssistantEvent::ViewChanged(ActiveView::Search));
            self.set_status(format!("🔎 Found {count} result(s).")).await;
            SearchOutcome::Found(count)
        } else {
            {
                let mut state = self.state.lock().await;
                state.clear_search_results();
            }
            let _ = self
                .events
                .send(AssistantEvent::SearchResultsUpdated(Vec::new()));
            self.set_status(format!("❌ Nothing found for: \"{query}\"")).await;
            SearchOutcome::Empty
        }
    }

    /// One-tap add: synthesizes the command `add <label>` and routes it
    /// through the interpreter, keeping a single command-parsing authority
    /// instead of a dedicated add-item endpoint.
    pub async fn add_suggestion_as_item(&self, label: &str) -> CommandOutcome {
        self.dispatch(&format!("add {label}")).await
    }

    /// Pulls the current list. On success the cache is replaced wholesale
    /// and the list view is shown; on failure prior state stays untouched.
    pub async fn refresh_list(&self) -> Result<()> {
        let items: Vec<ShoppingItem> = self
            .http
            .get(format!("{}/list", self.server_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        {
            let mut state = self.state.lock().await;
            state.replace_list(items.clone());
        }
        let _ = self.events.send(AssistantEvent::ListRefreshed(items));
        let _ = self.events.send(AssistantEvent::ViewChanged(ActiveView::List));
        Ok(())
    }

    /// Pulls suggestion labels: seasonal first, then frequently bought,
    /// each in server order, no de-duplication. Does not change the view.
    pub async fn load_suggestions(&self) -> Result<()> {
        let payload: SuggestionsResponse = self
            .http
            .get(format!("{}/suggestions", self.server_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let labels = payload.into_labels();
        {
            let mut state = self.state.lock().await;
            state.replace_suggestions(labels.clone());
        }
        let _ = self.events.send(AssistantEvent::SuggestionsUpdated(labels));
        Ok(())
    }

    /// Single mutating delete, no retry. A server refusal surfaces its
    /// message verbatim and leaves the list unchanged.
    pub async fn delete_item(&self, id: ItemId) -> DeleteOutcome {
        let payload: MutationResponse = match async {
            self.http
                .delete(format!("{}/item/{}", self.server_url, id.0))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
        }
        .await
        {
            Ok(payload) => payload,
            Err(err) => {
                warn!(item_id = id.0, "delete request failed: {err}");
                self.set_status("❌ Failed to delete item.").await;
                return DeleteOutcome::NetworkError;
            }
        };

        if payload.is_success() {
            self.set_status(format!("✅ {}", payload.message)).await;
            if let Err(err) = self.refresh_list().await {
                warn!("list refresh after delete failed: {err}");
            }
            DeleteOutcome::Deleted
        } else {
            self.set_status(format!("❌ {}", payload.message)).await;
            DeleteOutcome::Refused
        }
    }

    async fn language(&self) -> Language {
        self.state.lock().await.language()
    }

    async fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        self.state.lock().await.set_status(status.clone());
        let _ = self.events.send(AssistantEvent::StatusChanged(status));
    }

    async fn set_listening(&self, listening: bool) {
        self.state.lock().await.set_listening(listening);
        let _ = self.events.send(AssistantEvent::ListeningChanged(listening));
    }

    async fn apply_substitute_suggestions(&self, labels: Vec<String>) {
        {
            let mut state = self.state.lock().await;
            state.replace_suggestions(labels.clone());
            state.focus_view(ActiveView::Suggestions);
        }
        let _ = self.events.send(AssistantEvent::SuggestionsUpdated(labels));
        let _ = self
            .events
            .send(AssistantEvent::ViewChanged(ActiveView::Suggestions));
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, reqwest::Error>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        self.http
            .post(format!("{}{path}", self.server_url))
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
