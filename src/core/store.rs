//! Conversation state held in one of two interchangeable representations.
//!
//! The raw transcript keeps every role-tagged message in order and is sent
//! wholesale as context. The templated buffer keeps completed
//! user/assistant exchanges and is rendered into a single prompt per turn.
//! Exactly one representation is live at a time, selected by [`ChatMode`];
//! the other keeps whatever it held before the switch.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::message::{Message, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    Raw,
    Templated,
}

impl ChatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatMode::Raw => "raw",
            ChatMode::Templated => "templated",
        }
    }

    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            ChatMode::Raw => ChatMode::Templated,
            ChatMode::Templated => ChatMode::Raw,
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "raw" => Ok(ChatMode::Raw),
            "templated" => Ok(ChatMode::Templated),
            _ => Err(format!(
                "invalid chat mode: {value} (expected \"raw\" or \"templated\")"
            )),
        }
    }
}

/// One completed turn in the templated buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangePair {
    pub user: String,
    pub assistant: String,
}

/// One `{role, content}` record of a persisted transcript. Persisted
/// transcripts only ever carry user and assistant records; the system
/// seed is internal to the raw representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub role: Role,
    pub content: String,
}

impl TranscriptRecord {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Errors raised while persisting or replaying transcripts.
#[derive(Debug)]
pub enum TranscriptError {
    /// Failed to read a transcript file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a transcript file to disk.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A transcript file was not valid JSON of `{role, content}` records.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to encode the current history as JSON.
    Serialize { source: serde_json::Error },

    /// A record carried a role transcripts never persist.
    Role { index: usize, role: Role },

    /// A record broke the strict user/assistant alternation required to
    /// rebuild exchange pairs.
    Alternation { index: usize, found: Role },

    /// The transcript ended with a user record that has no reply.
    TrailingUser { index: usize },
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptError::Read { path, source } => {
                write!(f, "Failed to read transcript at {}: {}", path.display(), source)
            }
            TranscriptError::Write { path, source } => {
                write!(f, "Failed to write transcript at {}: {}", path.display(), source)
            }
            TranscriptError::Parse { path, source } => {
                write!(f, "Failed to parse transcript at {}: {}", path.display(), source)
            }
            TranscriptError::Serialize { source } => {
                write!(f, "Failed to encode transcript: {source}")
            }
            TranscriptError::Role { index, role } => {
                write!(
                    f,
                    "Transcript record {index} has role \"{}\"; only user and assistant records are persisted",
                    role.as_str()
                )
            }
            TranscriptError::Alternation { index, found } => {
                write!(
                    f,
                    "Transcript record {index} breaks user/assistant alternation (found \"{}\")",
                    found.as_str()
                )
            }
            TranscriptError::TrailingUser { index } => {
                write!(f, "Transcript ends with an unanswered user record at index {index}")
            }
        }
    }
}

impl StdError for TranscriptError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TranscriptError::Read { source, .. } | TranscriptError::Write { source, .. } => {
                Some(source)
            }
            TranscriptError::Parse { source, .. } | TranscriptError::Serialize { source } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Ordered history in both representations.
///
/// The raw transcript always starts with exactly one system seed and is
/// append-only. Switching modes never transfers or clears history; it only
/// changes which representation subsequent operations act on.
pub struct ConversationStore {
    mode: ChatMode,
    raw: Vec<Message>,
    templated: Vec<ExchangePair>,
}

impl ConversationStore {
    pub fn new(mode: ChatMode, seed: &str) -> Self {
        Self {
            mode,
            raw: vec![Message::system(seed)],
            templated: Vec::new(),
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        self.mode = mode;
    }

    pub fn raw_messages(&self) -> &[Message] {
        &self.raw
    }

    pub fn pairs(&self) -> &[ExchangePair] {
        &self.templated
    }

    /// Append a message to the raw transcript.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.raw.push(Message::new(role, content));
    }

    /// Append a completed exchange to the templated buffer.
    pub fn append_pair(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.templated.push(ExchangePair {
            user: user.into(),
            assistant: assistant.into(),
        });
    }

    /// Clear the active representation.
    ///
    /// In raw mode only the system seed survives; it is structural to the
    /// transcript. The templated buffer empties completely, since its
    /// instruction lives in the template rather than in stored history.
    pub fn clear(&mut self) {
        match self.mode {
            ChatMode::Raw => self.raw.retain(|message| message.role.is_system()),
            ChatMode::Templated => self.templated.clear(),
        }
    }

    /// Message count of the active representation: total raw messages
    /// (seed included) in raw mode, completed pairs in templated mode.
    pub fn turn_count(&self) -> usize {
        match self.mode {
            ChatMode::Raw => self.raw.len(),
            ChatMode::Templated => self.templated.len(),
        }
    }

    /// Flatten the active representation into persistable records,
    /// excluding the raw system seed.
    pub fn serialize(&self) -> Vec<TranscriptRecord> {
        match self.mode {
            ChatMode::Raw => self
                .raw
                .iter()
                .filter(|message| !message.role.is_system())
                .map(|message| TranscriptRecord::new(message.role, message.content.clone()))
                .collect(),
            ChatMode::Templated => self
                .templated
                .iter()
                .flat_map(|pair| {
                    [
                        TranscriptRecord::new(Role::User, pair.user.clone()),
                        TranscriptRecord::new(Role::Assistant, pair.assistant.clone()),
                    ]
                })
                .collect(),
        }
    }

    /// Replace the active representation with the given records.
    ///
    /// Validates every record before touching state, so a failed replay
    /// leaves prior history exactly as it was. Raw mode keeps its system
    /// seed and takes the records verbatim. Templated mode requires strict
    /// `user, assistant, user, assistant, …` alternation with an even
    /// count and rebuilds exchange pairs from it.
    pub fn deserialize(&mut self, records: &[TranscriptRecord]) -> Result<usize, TranscriptError> {
        match self.mode {
            ChatMode::Raw => {
                for (index, record) in records.iter().enumerate() {
                    if record.role.is_system() {
                        return Err(TranscriptError::Role {
                            index,
                            role: record.role,
                        });
                    }
                }
                self.raw.retain(|message| message.role.is_system());
                self.raw.extend(
                    records
                        .iter()
                        .map(|record| Message::new(record.role, record.content.clone())),
                );
            }
            ChatMode::Templated => {
                for (index, record) in records.iter().enumerate() {
                    if record.role.is_system() {
                        return Err(TranscriptError::Role {
                            index,
                            role: record.role,
                        });
                    }
                    let expected = if index % 2 == 0 { Role::User } else { Role::Assistant };
                    if record.role != expected {
                        return Err(TranscriptError::Alternation {
                            index,
                            found: record.role,
                        });
                    }
                }
                if records.len() % 2 != 0 {
                    return Err(TranscriptError::TrailingUser {
                        index: records.len() - 1,
                    });
                }
                self.templated = records
                    .chunks(2)
                    .map(|chunk| ExchangePair {
                        user: chunk[0].content.clone(),
                        assistant: chunk[1].content.clone(),
                    })
                    .collect();
            }
        }
        Ok(records.len())
    }
}
