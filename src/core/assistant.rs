//! Conversation orchestration in front of an injected completion backend.

use async_trait::async_trait;
use chrono::Local;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::core::message::{Message, Role};
use crate::core::prompt;
use crate::core::store::{ChatMode, ConversationStore, TranscriptError, TranscriptRecord};

/// Input handed to a completion backend. The raw transcript travels as an
/// ordered message list; the templated buffer arrives pre-rendered as a
/// single prompt.
#[derive(Debug, Clone)]
pub enum CompletionInput {
    Messages(Vec<Message>),
    Prompt(String),
}

/// Errors surfaced by a completion backend. Not retried.
#[derive(Debug)]
pub enum CompletionError {
    /// Transport-level failure reaching the endpoint.
    Http(reqwest::Error),

    /// The endpoint answered with a non-success status.
    Api { status: u16, message: String },

    /// The endpoint answered successfully but returned no usable text.
    EmptyResponse,
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Http(source) => write!(f, "Completion request failed: {source}"),
            CompletionError::Api { status, message } => {
                write!(f, "API error (status {status}): {message}")
            }
            CompletionError::EmptyResponse => {
                write!(f, "API returned a response without any content")
            }
        }
    }
}

impl StdError for CompletionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CompletionError::Http(source) => Some(source),
            _ => None,
        }
    }
}

/// The external text-generation capability. Implemented by the HTTP
/// client and by in-memory stubs in tests.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, input: CompletionInput) -> Result<String, CompletionError>;
}

/// Snapshot returned by [`Assistant::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantStatus {
    pub mode: ChatMode,
    pub model: String,
    pub turn_count: usize,
}

/// Routes user turns into the active representation, drives the
/// completion backend, and orchestrates persistence.
pub struct Assistant {
    store: ConversationStore,
    backend: Box<dyn CompletionBackend>,
    model: String,
    history_dir: PathBuf,
}

impl Assistant {
    pub fn new(
        backend: Box<dyn CompletionBackend>,
        model: impl Into<String>,
        mode: ChatMode,
        history_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store: ConversationStore::new(mode, prompt::SYSTEM_SEED),
            backend,
            model: model.into(),
            history_dir: history_dir.into(),
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.store.mode()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Run one conversation turn. Callers reject empty input before
    /// invoking this.
    ///
    /// In raw mode the user message is appended first and the whole
    /// transcript is sent as context; on backend failure that user message
    /// stays recorded while no reply is appended. In templated mode the
    /// exchange pair is only appended once the reply arrived, so a failed
    /// call leaves the buffer untouched.
    pub async fn respond(&mut self, user_text: &str) -> Result<String, CompletionError> {
        match self.store.mode() {
            ChatMode::Raw => {
                self.store.append(Role::User, user_text);
                let context = self.store.raw_messages().to_vec();
                let reply = self
                    .backend
                    .complete(CompletionInput::Messages(context))
                    .await?;
                self.store.append(Role::Assistant, reply.clone());
                Ok(reply)
            }
            ChatMode::Templated => {
                let rendered = prompt::render_prompt(self.store.pairs(), user_text);
                let reply = self
                    .backend
                    .complete(CompletionInput::Prompt(rendered))
                    .await?;
                self.store.append_pair(user_text, reply.clone());
                Ok(reply)
            }
        }
    }

    /// Toggle between the two memory modes. Neither history is touched;
    /// the inactive representation keeps its residual content.
    pub fn switch_mode(&mut self) -> String {
        let next = self.store.mode().toggled();
        self.store.set_mode(next);
        format!("Switched to {next} mode")
    }

    pub fn clear_history(&mut self) -> String {
        self.store.clear();
        "Conversation history cleared".to_string()
    }

    /// Write the active representation to a new timestamped file in the
    /// history directory and return its path.
    pub fn save(&self) -> Result<PathBuf, TranscriptError> {
        let records = self.store.serialize();
        let contents = serde_json::to_string_pretty(&records)
            .map_err(|source| TranscriptError::Serialize { source })?;

        fs::create_dir_all(&self.history_dir).map_err(|source| TranscriptError::Write {
            path: self.history_dir.clone(),
            source,
        })?;

        // Second-granularity timestamps can collide; the atomic rename
        // makes the last writer win rather than interleave.
        let filename = format!("chat_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.history_dir.join(filename);

        let mut temp =
            NamedTempFile::new_in(&self.history_dir).map_err(|source| TranscriptError::Write {
                path: path.clone(),
                source,
            })?;
        temp.write_all(contents.as_bytes())
            .map_err(|source| TranscriptError::Write {
                path: path.clone(),
                source,
            })?;
        temp.persist(&path).map_err(|err| TranscriptError::Write {
            path: path.clone(),
            source: err.error,
        })?;

        Ok(path)
    }

    /// Replace the active history with a transcript read from `path`.
    ///
    /// Read, parse, and validation all happen before any state changes;
    /// a failure at any step leaves prior history intact.
    pub fn load(&mut self, path: &Path) -> Result<String, TranscriptError> {
        let contents = fs::read_to_string(path).map_err(|source| TranscriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<TranscriptRecord> =
            serde_json::from_str(&contents).map_err(|source| TranscriptError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let applied = self.store.deserialize(&records)?;
        Ok(format!("Loaded {applied} messages from {}", path.display()))
    }

    pub fn status(&self) -> AssistantStatus {
        AssistantStatus {
            mode: self.store.mode(),
            model: self.model.clone(),
            turn_count: self.store.turn_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[derive(Clone)]
    struct StubBackend {
        reply: String,
        seen: Arc<Mutex<Vec<CompletionInput>>>,
    }

    impl StubBackend {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for StubBackend {
        async fn complete(&self, input: CompletionInput) -> Result<String, CompletionError> {
            self.seen.lock().unwrap().push(input);
            Ok(self.reply.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        async fn complete(&self, _input: CompletionInput) -> Result<String, CompletionError> {
            Err(CompletionError::Api {
                status: 503,
                message: "provider overloaded".to_string(),
            })
        }
    }

    fn assistant_with(backend: StubBackend, mode: ChatMode) -> Assistant {
        Assistant::new(Box::new(backend), "test-model", mode, "unused-history-dir")
    }

    #[tokio::test]
    async fn raw_turn_records_both_sides_and_reports_status() {
        let backend = StubBackend::new("hi there");
        let mut assistant = assistant_with(backend.clone(), ChatMode::Raw);

        let reply = assistant.respond("hello").await.unwrap();
        assert_eq!(reply, "hi there");

        let status = assistant.status();
        assert_eq!(status.mode, ChatMode::Raw);
        assert_eq!(status.model, "test-model");
        // System seed + user + assistant.
        assert_eq!(status.turn_count, 3);

        // The backend received the full transcript up to the user turn.
        let seen = backend.seen.lock().unwrap();
        match &seen[0] {
            CompletionInput::Messages(messages) => {
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[0].role, Role::System);
                assert_eq!(messages[1].role, Role::User);
            }
            other => panic!("expected message context, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn templated_turn_sends_rendered_prompt_and_appends_pair() {
        let backend = StubBackend::new("first reply");
        let mut assistant = assistant_with(backend.clone(), ChatMode::Templated);

        assistant.respond("first question").await.unwrap();
        assistant.respond("second question").await.unwrap();

        assert_eq!(assistant.store().pairs().len(), 2);

        let seen = backend.seen.lock().unwrap();
        match &seen[1] {
            CompletionInput::Prompt(prompt) => {
                assert!(prompt.contains("User: first question"));
                assert!(prompt.contains("Assistant: first reply"));
                assert!(prompt.ends_with("User: second question\nAssistant:"));
            }
            other => panic!("expected rendered prompt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn switching_modes_twice_restores_mode_and_histories() {
        let mut assistant = assistant_with(StubBackend::new("hi"), ChatMode::Raw);
        assistant.respond("hello").await.unwrap();

        let raw_before = assistant.store().raw_messages().to_vec();
        let pairs_before = assistant.store().pairs().to_vec();

        assert_eq!(assistant.switch_mode(), "Switched to templated mode");
        assert_eq!(assistant.switch_mode(), "Switched to raw mode");

        assert_eq!(assistant.mode(), ChatMode::Raw);
        assert_eq!(assistant.store().raw_messages(), raw_before.as_slice());
        assert_eq!(assistant.store().pairs(), pairs_before.as_slice());
    }

    #[tokio::test]
    async fn turn_count_grows_by_one_per_successful_turn() {
        let mut assistant = assistant_with(StubBackend::new("ok"), ChatMode::Templated);
        assert_eq!(assistant.status().turn_count, 0);
        assistant.respond("one").await.unwrap();
        assert_eq!(assistant.status().turn_count, 1);
        assistant.respond("two").await.unwrap();
        assert_eq!(assistant.status().turn_count, 2);
    }

    #[tokio::test]
    async fn failed_raw_turn_keeps_user_message_without_reply() {
        let mut assistant =
            Assistant::new(Box::new(FailingBackend), "test-model", ChatMode::Raw, "unused");

        let err = assistant.respond("hello").await.unwrap_err();
        assert!(err.to_string().contains("provider overloaded"));

        let messages = assistant.store().raw_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "hello");
    }

    #[tokio::test]
    async fn failed_templated_turn_leaves_buffer_untouched() {
        let mut assistant = Assistant::new(
            Box::new(FailingBackend),
            "test-model",
            ChatMode::Templated,
            "unused",
        );

        assert!(assistant.respond("hello").await.is_err());
        assert!(assistant.store().pairs().is_empty());
        assert_eq!(assistant.status().turn_count, 0);
    }

    #[tokio::test]
    async fn save_then_load_reproduces_turn_content() {
        let dir = tempdir().unwrap();
        let backend = StubBackend::new("hi there");
        let mut assistant = Assistant::new(
            Box::new(backend),
            "test-model",
            ChatMode::Raw,
            dir.path(),
        );
        assistant.respond("hello").await.unwrap();

        let path = assistant.save().unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("chat_"));

        let mut fresh = Assistant::new(
            Box::new(StubBackend::new("unused")),
            "test-model",
            ChatMode::Raw,
            dir.path(),
        );
        let confirmation = fresh.load(&path).unwrap();
        assert!(confirmation.starts_with("Loaded 2 messages"));
        assert_eq!(fresh.store().serialize(), assistant.store().serialize());
    }

    #[tokio::test]
    async fn load_from_missing_path_is_non_destructive() {
        let mut assistant = assistant_with(StubBackend::new("hi"), ChatMode::Raw);
        assistant.respond("hello").await.unwrap();
        let before = assistant.store().raw_messages().to_vec();

        let err = assistant.load(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, TranscriptError::Read { .. }));
        assert_eq!(assistant.store().raw_messages(), before.as_slice());
    }

    #[tokio::test]
    async fn load_of_malformed_json_is_non_destructive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let mut assistant = assistant_with(StubBackend::new("hi"), ChatMode::Raw);
        assistant.respond("hello").await.unwrap();
        let before = assistant.store().raw_messages().to_vec();

        let err = assistant.load(&path).unwrap_err();
        assert!(matches!(err, TranscriptError::Parse { .. }));
        assert_eq!(assistant.store().raw_messages(), before.as_slice());
    }
}
