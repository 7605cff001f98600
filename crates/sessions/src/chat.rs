use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use careconnect_client::{CareApi, ChatRequest};
use careconnect_core::{ChatTranscriptEntry, Coordinate, VerificationConfig};
use careconnect_observability::FlowMetrics;
use parking_lot::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::intake::Intake;

pub const CHAT_GREETING: &str = "Great! I can now help you find nearby services. I can assist you with finding food, shelter, medical, or community support services. What kind of help are you looking for?";

/// One conversation with the assistant backend, pinned to a location.
///
/// `send` takes `&self`, so several sends may be in flight at once. Each user
/// entry is appended before its request goes out; replies are appended in
/// completion order.
pub struct ChatSession<A> {
    id: Uuid,
    api: Arc<A>,
    location: Coordinate,
    transcript: Mutex<Vec<ChatTranscriptEntry>>,
    in_flight: AtomicUsize,
    error: Mutex<Option<String>>,
    metrics: Arc<FlowMetrics>,
}

impl<A: CareApi> ChatSession<A> {
    pub fn new(api: Arc<A>, location: Coordinate, metrics: Arc<FlowMetrics>) -> Self {
        Self {
            id: Uuid::new_v4(),
            api,
            location,
            transcript: Mutex::new(vec![ChatTranscriptEntry {
                role: careconnect_core::ChatRole::Assistant,
                content: CHAT_GREETING.to_string(),
                timestamp: None,
            }]),
            in_flight: AtomicUsize::new(0),
            error: Mutex::new(None),
            metrics,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn location(&self) -> &Coordinate {
        &self.location
    }

    pub fn transcript(&self) -> Vec<ChatTranscriptEntry> {
        self.transcript.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    #[instrument(skip(self, text), fields(session_id = %self.id))]
    pub async fn send(&self, text: &str) -> Result<ChatTranscriptEntry, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.transcript.lock().push(ChatTranscriptEntry::user(text));
        *self.error.lock() = None;
        let _pending = PendingGuard::enter(&self.in_flight);
        self.metrics.inc_chat_sent();

        let started = Instant::now();
        let request = ChatRequest::new(text, &self.location);
        let outcome = self.api.send_chat(&request).await;
        self.metrics.observe_chat_latency(started.elapsed());

        match outcome {
            Ok(reply) => {
                let entry = ChatTranscriptEntry::assistant(reply.reply);
                self.transcript.lock().push(entry.clone());
                info!(
                    transcript_len = self.transcript.lock().len(),
                    "assistant reply appended"
                );
                Ok(entry)
            }
            Err(source) => {
                self.metrics.inc_chat_failed();
                warn!(error = %source, status = ?source.status(), "chat message failed");
                let error = SessionError::SendFailed { source };
                *self.error.lock() = Some(error.to_string());
                Err(error)
            }
        }
    }
}

struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ChatFlow<A> {
    intake: Intake,
    api: Arc<A>,
    session: Option<ChatSession<A>>,
    metrics: Arc<FlowMetrics>,
}

impl<A: CareApi> ChatFlow<A> {
    pub fn new(api: Arc<A>, config: VerificationConfig, metrics: Arc<FlowMetrics>) -> Self {
        Self {
            intake: Intake::new(config, metrics.clone()),
            api,
            session: None,
            metrics,
        }
    }

    pub fn intake(&self) -> &Intake {
        &self.intake
    }

    pub fn intake_mut(&mut self) -> &mut Intake {
        &mut self.intake
    }

    pub fn needs_location(&self) -> bool {
        self.intake.age().is_some() && self.session.is_none()
    }

    pub fn session(&self) -> Option<&ChatSession<A>> {
        self.session.as_ref()
    }

    pub fn set_location(&mut self, location: Coordinate) -> Result<&ChatSession<A>, SessionError> {
        if self.intake.age().is_none() {
            return Err(SessionError::AgeNotVerified);
        }

        self.intake.set_location(location.clone());
        let session = ChatSession::new(self.api.clone(), location, self.metrics.clone());
        info!(session_id = %session.id(), "chat session opened");
        Ok(self.session.insert(session))
    }

    pub async fn send(&self, text: &str) -> Result<ChatTranscriptEntry, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::ChatNotReady)?;
        session.send(text).await
    }

    pub fn reset(&mut self) {
        self.session = None;
        self.intake.reset_age();
        self.intake.reset_location();
    }
}
