//! The session engine.
//!
//! One `ChatSession` per user: it owns the message log, the shared
//! composer buffer, the upload gate, interview progress, and the
//! input-mode signal, and drives the optimistic send protocol against an
//! injected [`ChatBackend`].
//!
//! Locking discipline: all mutable state sits behind one mutex that is
//! only held in synchronous sections, never across an await. The
//! suspension points are exactly the outstanding chat call, the
//! outstanding upload, and an active voice capture, each individually
//! exclusive via its own flag.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::debug;

use parley_client::{ApiError, ChatBackend, ChatRequest};
use parley_core::events::SessionEvent;
use parley_core::{InputMode, InterviewState, Message, SlotStats, Timestamp, ToolCall};
use parley_voice::{CaptureOutcome, VoiceCapture};

use crate::error::SessionError;
use crate::gate::UploadGate;
use crate::mode::InputModeResolver;
use crate::progress::InterviewProgressTracker;

/// Capacity of the event broadcast channel. Observers that fall behind
/// lose old events, never block the session.
const EVENT_CAPACITY: usize = 64;

struct SessionState {
    messages: Vec<Message>,
    composer: String,
    temperature: f64,
    sending: bool,
    gate: UploadGate,
    progress: InterviewProgressTracker,
    mode: InputModeResolver,
    tool_calls: Vec<ToolCall>,
}

/// The conversation session state machine.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    voice: VoiceCapture,
    user_id: String,
    inner: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, voice: VoiceCapture, user_id: String) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            voice,
            user_id,
            inner: Mutex::new(SessionState {
                messages: Vec::new(),
                composer: String::new(),
                temperature: 0.3,
                sending: false,
                gate: UploadGate::new(),
                progress: InterviewProgressTracker::new(),
                mode: InputModeResolver::new(),
                tool_calls: Vec::new(),
            }),
            events,
        }
    }

    /// Override the sampling temperature at construction.
    pub fn with_temperature(self, temperature: f64) -> Self {
        self.lock().temperature = temperature;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().expect("session state poisoned")
    }

    fn emit(&self, event: SessionEvent) {
        debug!(event = event.event_name(), "session event");
        let _ = self.events.send(event);
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Snapshot of the ordered message log.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn composer(&self) -> String {
        self.lock().composer.clone()
    }

    pub fn temperature(&self) -> f64 {
        self.lock().temperature
    }

    pub fn is_sending(&self) -> bool {
        self.lock().sending
    }

    pub fn has_document(&self) -> bool {
        self.lock().gate.has_document()
    }

    pub fn is_uploading(&self) -> bool {
        self.lock().gate.upload_in_flight()
    }

    pub fn slot_stats(&self) -> SlotStats {
        self.lock().progress.stats()
    }

    pub fn interview_state(&self) -> Option<InterviewState> {
        self.lock().progress.state().cloned()
    }

    pub fn input_mode(&self) -> InputMode {
        self.lock().mode.current()
    }

    /// Tool calls from the latest successful send, for display only.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.lock().tool_calls.clone()
    }

    /// Whether `send` would currently be accepted for this text. The UI
    /// gates the affordance on this instead of probing with real sends.
    pub fn can_send(&self, text: &str) -> bool {
        let state = self.lock();
        !text.trim().is_empty() && !state.sending && state.gate.has_document()
    }

    // =========================================================================
    // Composer
    // =========================================================================

    /// Replace the composer buffer (manual typing).
    pub fn set_composer(&self, text: impl Into<String>) {
        self.lock().composer = text.into();
    }

    pub fn set_temperature(&self, temperature: f64) {
        self.lock().temperature = temperature;
    }

    // =========================================================================
    // Send
    // =========================================================================

    /// Send one user turn.
    ///
    /// Appends the user message and an assistant placeholder
    /// optimistically, clears the composer, and issues the chat request.
    /// On success the placeholder is resolved in place and the returned
    /// interview state, tool calls, and mode hint are published. On
    /// failure both optimistic messages are removed and the composer is
    /// restored to the submitted text.
    pub async fn send(&self, text: &str) -> Result<(), SessionError> {
        let submitted = text.trim().to_string();

        let (user_message_id, placeholder_id, temperature) = {
            let mut state = self.lock();
            if submitted.is_empty() {
                return Err(SessionError::EmptyMessage);
            }
            if state.sending {
                return Err(SessionError::SendInFlight);
            }
            if !state.gate.has_document() {
                return Err(SessionError::ResumeRequired);
            }
            state.sending = true;

            let user = Message::user(submitted.clone());
            let placeholder = Message::pending_assistant();
            let ids = (user.id, placeholder.id, state.temperature);
            state.messages.push(user);
            state.messages.push(placeholder);
            state.composer.clear();
            ids
        };

        self.emit(SessionEvent::SendStarted {
            user_message_id: user_message_id.0,
            assistant_message_id: placeholder_id.0,
            timestamp: Timestamp::now(),
        });

        let request = ChatRequest {
            user_id: self.user_id.clone(),
            message: submitted.clone(),
            temperature,
        };

        match self.backend.chat(&request).await {
            Ok(response) => {
                let (stats, ended, mode_change) = {
                    let mut state = self.lock();
                    if let Some(placeholder) = state
                        .messages
                        .iter_mut()
                        .find(|m| m.id == placeholder_id)
                    {
                        placeholder.resolve(response.answer);
                    }
                    let stats = state.progress.publish(response.interview_state);
                    let ended = state.progress.state().is_some_and(|s| s.ended);
                    state.tool_calls = response.tool_calls;
                    let mut mode_change = None;
                    if let Some(hint) = response.next_input_mode {
                        if state.mode.observe(hint) {
                            mode_change = Some(hint);
                        }
                    }
                    state.sending = false;
                    (stats, ended, mode_change)
                };

                self.emit(SessionEvent::SendResolved {
                    message_id: placeholder_id.0,
                    timestamp: Timestamp::now(),
                });
                self.emit(SessionEvent::InterviewUpdated {
                    filled: stats.filled,
                    total: stats.total,
                    remaining: stats.remaining,
                    ended,
                    timestamp: Timestamp::now(),
                });
                if let Some(mode) = mode_change {
                    self.emit(SessionEvent::InputModeChanged {
                        mode,
                        timestamp: Timestamp::now(),
                    });
                }
                Ok(())
            }
            Err(err) => {
                {
                    let mut state = self.lock();
                    state
                        .messages
                        .retain(|m| m.id != user_message_id && m.id != placeholder_id);
                    state.composer = submitted;
                    state.sending = false;
                }
                let reason = failure_reason(&err);
                self.emit(SessionEvent::SendFailed {
                    reason: reason.clone(),
                    timestamp: Timestamp::now(),
                });
                Err(SessionError::Chat(reason))
            }
        }
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Upload a document for ingestion.
    ///
    /// Returns whether the backend accepted it. A 2xx body without an
    /// explicit success marker settles the upload but leaves the gate
    /// closed.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<bool, SessionError> {
        self.lock().gate.begin()?;
        self.emit(SessionEvent::UploadStarted {
            timestamp: Timestamp::now(),
        });

        match self.backend.upload(file_name, bytes, &self.user_id).await {
            Ok(response) => {
                let accepted = response.is_success();
                self.lock().gate.complete(accepted);
                self.emit(SessionEvent::UploadCompleted {
                    accepted,
                    timestamp: Timestamp::now(),
                });
                Ok(accepted)
            }
            Err(err) => {
                self.lock().gate.fail();
                let reason = failure_reason(&err);
                self.emit(SessionEvent::UploadFailed {
                    reason: reason.clone(),
                    timestamp: Timestamp::now(),
                });
                Err(SessionError::Upload(reason))
            }
        }
    }

    // =========================================================================
    // Voice capture
    // =========================================================================

    /// Run one voice capture and merge any transcript into the composer.
    ///
    /// `Unsupported` and `Error` are outcomes for the caller to surface;
    /// only a concurrent capture is a precondition error.
    pub async fn capture(&self) -> Result<CaptureOutcome, SessionError> {
        if self.voice.is_active() {
            return Err(SessionError::CaptureActive);
        }
        if self.voice.is_supported() {
            self.emit(SessionEvent::CaptureStarted {
                timestamp: Timestamp::now(),
            });
        }

        let outcome = self.voice.capture().await?;
        match &outcome {
            CaptureOutcome::Transcript(transcript) => {
                {
                    let mut state = self.lock();
                    state.composer = VoiceCapture::append(&state.composer, transcript);
                }
                self.emit(SessionEvent::CaptureFinished {
                    transcript_len: transcript.len(),
                    timestamp: Timestamp::now(),
                });
            }
            CaptureOutcome::Unsupported => {
                self.emit(SessionEvent::CaptureUnsupported {
                    timestamp: Timestamp::now(),
                });
            }
            CaptureOutcome::Error(reason) => {
                self.emit(SessionEvent::CaptureFailed {
                    reason: reason.clone(),
                    timestamp: Timestamp::now(),
                });
            }
        }
        Ok(outcome)
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Clear the log, interview state, and tool calls. The composer, the
    /// gate, and the session identity are untouched.
    pub fn reset(&self) {
        {
            let mut state = self.lock();
            state.messages.clear();
            state.progress.publish(None);
            state.tool_calls.clear();
        }
        self.emit(SessionEvent::ConversationReset {
            timestamp: Timestamp::now(),
        });
    }
}

/// The user-visible reason for a backend failure: the response body text
/// for status errors, the error display otherwise.
fn failure_reason(err: &ApiError) -> String {
    match err {
        ApiError::Status { body, .. } if !body.trim().is_empty() => body.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, VecDeque};

    use async_trait::async_trait;
    use parley_client::{ChatResponse, UploadResponse};
    use parley_core::{Delivery, Role};
    use parley_voice::{RecognizerError, SpeechCapability, SpeechRecognizer};

    // ---- Scripted backend ----

    #[derive(Default)]
    struct ScriptedBackend {
        chat_results: Mutex<VecDeque<Result<ChatResponse, ApiError>>>,
        upload_results: Mutex<VecDeque<Result<UploadResponse, ApiError>>>,
        chat_requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn push_chat(&self, result: Result<ChatResponse, ApiError>) {
            self.chat_results.lock().unwrap().push_back(result);
        }

        fn push_upload(&self, result: Result<UploadResponse, ApiError>) {
            self.upload_results.lock().unwrap().push_back(result);
        }

        fn seen_requests(&self) -> Vec<ChatRequest> {
            self.chat_requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
            self.chat_requests.lock().unwrap().push(request.clone());
            self.chat_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted chat result")
        }

        async fn upload(
            &self,
            _file_name: &str,
            _bytes: Vec<u8>,
            _user_id: &str,
        ) -> Result<UploadResponse, ApiError> {
            self.upload_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted upload result")
        }
    }

    fn answer(text: &str) -> ChatResponse {
        ChatResponse {
            answer: text.to_string(),
            interview_state: None,
            tool_calls: Vec::new(),
            next_input_mode: None,
        }
    }

    fn interview(slots: &[(&str, Option<&str>)]) -> InterviewState {
        InterviewState {
            slots: slots
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect::<BTreeMap<_, _>>(),
            goal_completed: false,
            ended: false,
        }
    }

    fn indexed_upload() -> UploadResponse {
        UploadResponse {
            status: Some("ok".to_string()),
            indexed_path: None,
            resume_indexed: Some(true),
        }
    }

    fn no_voice() -> VoiceCapture {
        VoiceCapture::new(SpeechCapability::Unavailable)
    }

    fn session_with(backend: Arc<ScriptedBackend>) -> ChatSession {
        ChatSession::new(backend, no_voice(), "session-1".to_string())
    }

    /// A session whose gate is already open via a scripted upload.
    async fn gated_session(backend: Arc<ScriptedBackend>) -> ChatSession {
        backend.push_upload(Ok(indexed_upload()));
        let session = session_with(backend);
        session.upload("cv.pdf", b"pdf".to_vec()).await.unwrap();
        session
    }

    // ---- Send: happy path ----

    #[tokio::test]
    async fn successful_sends_alternate_user_assistant() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;

        for i in 0..3 {
            backend.push_chat(Ok(answer(&format!("answer {i}"))));
            session.send(&format!("question {i}")).await.unwrap();
        }

        let messages = session.messages();
        assert_eq!(messages.len(), 6);
        for (i, message) in messages.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(message.role, expected);
            assert_eq!(message.delivery, Delivery::Resolved);
        }
        assert_eq!(messages[5].content, "answer 2");
    }

    #[tokio::test]
    async fn send_clears_composer_and_trims_text() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;

        session.set_composer("  hello  ");
        backend.push_chat(Ok(answer("hi")));
        session.send(&session.composer()).await.unwrap();

        assert_eq!(session.composer(), "");
        assert_eq!(session.messages()[0].content, "hello");
        assert_eq!(backend.seen_requests()[0].message, "hello");
    }

    #[tokio::test]
    async fn send_carries_user_id_and_temperature() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;
        session.set_temperature(0.8);

        backend.push_chat(Ok(answer("hi")));
        session.send("hello").await.unwrap();

        let request = &backend.seen_requests()[0];
        assert_eq!(request.user_id, "session-1");
        assert!((request.temperature - 0.8).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn send_publishes_interview_state_and_tool_calls() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;

        let mut response = answer("noted");
        response.interview_state = Some(interview(&[
            ("name", Some("Ana")),
            ("email", None),
            ("phone", Some("  ")),
        ]));
        response.tool_calls = vec![ToolCall {
            tool: "whatsapp_send".to_string(),
            target: Some("+34".to_string()),
            extra: Default::default(),
        }];
        backend.push_chat(Ok(response));
        session.send("here you go").await.unwrap();

        let stats = session.slot_stats();
        assert_eq!(stats.filled, 1);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.remaining, 2);
        assert_eq!(session.tool_calls().len(), 1);
    }

    #[tokio::test]
    async fn null_interview_state_replaces_previous_one() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;

        let mut response = answer("ok");
        response.interview_state = Some(interview(&[("name", Some("Ana"))]));
        backend.push_chat(Ok(response));
        session.send("first").await.unwrap();
        assert_eq!(session.slot_stats().total, 1);

        // Wholesale replacement, null included.
        backend.push_chat(Ok(answer("declined")));
        session.send("second").await.unwrap();
        assert_eq!(session.slot_stats(), SlotStats::default());
        assert!(session.interview_state().is_none());
    }

    #[tokio::test]
    async fn mode_hint_updates_resolver() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;
        assert_eq!(session.input_mode(), InputMode::Text);

        let mut response = answer("speak to me");
        response.next_input_mode = Some(InputMode::Voice);
        backend.push_chat(Ok(response));
        session.send("hello").await.unwrap();
        assert_eq!(session.input_mode(), InputMode::Voice);

        // No hint: the last one stands.
        backend.push_chat(Ok(answer("still here")));
        session.send("more").await.unwrap();
        assert_eq!(session.input_mode(), InputMode::Voice);
    }

    // ---- Send: rollback ----

    #[tokio::test]
    async fn failed_send_rolls_back_log_and_restores_composer() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;

        backend.push_chat(Ok(answer("first answer")));
        session.send("first").await.unwrap();
        let before = session.messages();

        session.set_composer("second question");
        backend.push_chat(Err(ApiError::Status {
            status: 500,
            body: "agent crashed".to_string(),
        }));
        let err = session.send("second question").await.unwrap_err();

        match err {
            SessionError::Chat(reason) => assert_eq!(reason, "agent crashed"),
            other => panic!("expected Chat error, got {other:?}"),
        }

        // Log identical to the pre-send snapshot.
        let after = session.messages();
        assert_eq!(after.len(), before.len());
        for (a, b) in after.iter().zip(before.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.content, b.content);
            assert_eq!(a.delivery, b.delivery);
        }
        // Composer restored to the submitted text.
        assert_eq!(session.composer(), "second question");
        assert!(!session.is_sending());
    }

    #[tokio::test]
    async fn failed_first_send_leaves_log_empty() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;

        backend.push_chat(Err(ApiError::Transport("connection refused".to_string())));
        assert!(session.send("hello").await.is_err());
        assert!(session.messages().is_empty());
        assert_eq!(session.composer(), "hello");
    }

    // ---- Send: preconditions ----

    #[tokio::test]
    async fn send_without_document_is_rejected() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = session_with(Arc::clone(&backend));

        assert!(!session.can_send("Hi"));
        let err = session.send("Hi").await.unwrap_err();
        assert!(matches!(err, SessionError::ResumeRequired));
        assert!(session.messages().is_empty());

        // After a successful upload the same send goes through.
        backend.push_upload(Ok(indexed_upload()));
        assert!(session.upload("cv.pdf", b"pdf".to_vec()).await.unwrap());
        backend.push_chat(Ok(answer("welcome")));
        session.send("Hi").await.unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hi");
        assert_eq!(messages[1].content, "welcome");
        assert_eq!(messages[1].delivery, Delivery::Resolved);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(backend).await;

        assert!(matches!(
            session.send("   ").await,
            Err(SessionError::EmptyMessage)
        ));
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn second_send_while_in_flight_is_rejected() {
        struct ParkedBackend {
            release: tokio::sync::Notify,
        }

        #[async_trait]
        impl ChatBackend for ParkedBackend {
            async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, ApiError> {
                self.release.notified().await;
                Ok(ChatResponse {
                    answer: "late answer".to_string(),
                    interview_state: None,
                    tool_calls: Vec::new(),
                    next_input_mode: None,
                })
            }

            async fn upload(
                &self,
                _file_name: &str,
                _bytes: Vec<u8>,
                _user_id: &str,
            ) -> Result<UploadResponse, ApiError> {
                Ok(UploadResponse {
                    resume_indexed: Some(true),
                    ..Default::default()
                })
            }
        }

        let backend = Arc::new(ParkedBackend {
            release: tokio::sync::Notify::new(),
        });
        let session = Arc::new(ChatSession::new(
            Arc::clone(&backend) as Arc<dyn ChatBackend>,
            no_voice(),
            "session-1".to_string(),
        ));
        session.upload("cv.pdf", b"pdf".to_vec()).await.unwrap();

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send("first").await })
        };
        while !session.is_sending() {
            tokio::task::yield_now().await;
        }

        // Exactly one pending placeholder while the first send is parked.
        let pending = session.messages().iter().filter(|m| m.is_pending()).count();
        assert_eq!(pending, 1);

        let err = session.send("second").await.unwrap_err();
        assert!(matches!(err, SessionError::SendInFlight));

        backend.release.notify_one();
        first.await.unwrap().unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| !m.is_pending()));
    }

    // ---- Upload ----

    #[tokio::test]
    async fn upload_without_marker_keeps_gate_closed() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = session_with(Arc::clone(&backend));

        backend.push_upload(Ok(UploadResponse {
            status: Some("queued".to_string()),
            ..Default::default()
        }));
        let accepted = session.upload("cv.pdf", b"pdf".to_vec()).await.unwrap();
        assert!(!accepted);
        assert!(!session.has_document());
    }

    #[tokio::test]
    async fn failed_upload_surfaces_body_and_allows_retry() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = session_with(Arc::clone(&backend));

        backend.push_upload(Err(ApiError::Status {
            status: 400,
            body: "no file part".to_string(),
        }));
        let err = session.upload("cv.pdf", Vec::new()).await.unwrap_err();
        match err {
            SessionError::Upload(reason) => assert_eq!(reason, "no file part"),
            other => panic!("expected Upload error, got {other:?}"),
        }
        assert!(!session.has_document());
        assert!(!session.is_uploading());

        backend.push_upload(Ok(indexed_upload()));
        assert!(session.upload("cv.pdf", b"pdf".to_vec()).await.unwrap());
        assert!(session.has_document());
    }

    #[tokio::test]
    async fn gate_stays_open_after_later_failed_upload() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;
        assert!(session.has_document());

        backend.push_upload(Err(ApiError::Transport("timeout".to_string())));
        assert!(session.upload("cv2.pdf", b"pdf".to_vec()).await.is_err());
        assert!(session.has_document());
    }

    // ---- Voice ----

    #[tokio::test]
    async fn capture_unsupported_leaves_composer_unchanged() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = session_with(backend);

        session.set_composer("draft");
        let outcome = session.capture().await.unwrap();
        assert_eq!(outcome, CaptureOutcome::Unsupported);
        assert_eq!(session.composer(), "draft");
    }

    #[tokio::test]
    async fn capture_appends_transcript_to_composer() {
        struct Fixed;

        #[async_trait]
        impl SpeechRecognizer for Fixed {
            async fn recognize(&self) -> Result<String, RecognizerError> {
                Ok("two years at Acme".to_string())
            }
        }

        let backend = Arc::new(ScriptedBackend::default());
        let voice = VoiceCapture::new(SpeechCapability::Available(Arc::new(Fixed)));
        let session = ChatSession::new(backend, voice, "session-1".to_string());

        session.set_composer("I spent");
        let outcome = session.capture().await.unwrap();
        assert_eq!(
            outcome,
            CaptureOutcome::Transcript("two years at Acme".to_string())
        );
        assert_eq!(session.composer(), "I spent two years at Acme");

        // Into an empty composer the transcript stands alone.
        session.set_composer("");
        session.capture().await.unwrap();
        assert_eq!(session.composer(), "two years at Acme");
    }

    #[tokio::test]
    async fn capture_error_leaves_composer_unchanged() {
        struct Failing;

        #[async_trait]
        impl SpeechRecognizer for Failing {
            async fn recognize(&self) -> Result<String, RecognizerError> {
                Err(RecognizerError::Failed("microphone lost".to_string()))
            }
        }

        let backend = Arc::new(ScriptedBackend::default());
        let voice = VoiceCapture::new(SpeechCapability::Available(Arc::new(Failing)));
        let session = ChatSession::new(backend, voice, "session-1".to_string());

        session.set_composer("draft");
        let outcome = session.capture().await.unwrap();
        assert!(matches!(outcome, CaptureOutcome::Error(_)));
        assert_eq!(session.composer(), "draft");
    }

    // ---- Reset ----

    #[tokio::test]
    async fn reset_clears_log_progress_and_tool_calls() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;

        let mut response = answer("noted");
        response.interview_state = Some(interview(&[("name", Some("Ana"))]));
        response.tool_calls = vec![ToolCall {
            tool: "index".to_string(),
            target: None,
            extra: Default::default(),
        }];
        backend.push_chat(Ok(response));
        session.send("hello").await.unwrap();
        session.set_composer("half-typed");

        session.reset();

        assert!(session.messages().is_empty());
        assert_eq!(session.slot_stats(), SlotStats::default());
        assert!(session.tool_calls().is_empty());
        // Gate and composer survive a reset.
        assert!(session.has_document());
        assert_eq!(session.composer(), "half-typed");
    }

    // ---- Events ----

    #[tokio::test]
    async fn events_trace_the_send_lifecycle() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;
        let mut events = session.subscribe();

        backend.push_chat(Ok(answer("hi")));
        session.send("hello").await.unwrap();

        let names: Vec<&'static str> = std::iter::from_fn(|| {
            events.try_recv().ok().map(|e| e.event_name())
        })
        .collect();
        assert_eq!(names, vec!["send_started", "send_resolved", "interview_updated"]);
    }

    #[tokio::test]
    async fn events_trace_a_failed_send() {
        let backend = Arc::new(ScriptedBackend::default());
        let session = gated_session(Arc::clone(&backend)).await;
        let mut events = session.subscribe();

        backend.push_chat(Err(ApiError::Transport("down".to_string())));
        let _ = session.send("hello").await;

        let names: Vec<&'static str> = std::iter::from_fn(|| {
            events.try_recv().ok().map(|e| e.event_name())
        })
        .collect();
        assert_eq!(names, vec!["send_started", "send_failed"]);
    }
}
