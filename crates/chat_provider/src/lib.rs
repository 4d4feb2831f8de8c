//! Minimal provider-agnostic contract for talking to a chat model.
//!
//! This crate defines only the conversation and live-session surfaces the
//! cockpit depends on. It excludes transport details, request payloads, and
//! any notion of projects or snippets.

use std::fmt;

use thiserror::Error;

/// Error returned while constructing/configuring a provider before any call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Failure of a single provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),

    #[error("conversation has no replies left")]
    Exhausted,
}

/// Provider-neutral conversation history item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    User { text: String },
    Assistant { text: String },
}

impl ChatMessage {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::User { text } | Self::Assistant { text } => text,
        }
    }
}

/// Complete assistant reply for one `send_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
}

impl ChatReply {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Immutable metadata describing a chat provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Event delivered by an open live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    Opened,
    Message(String),
    Error(String),
    Closed,
}

impl LiveEvent {
    /// Returns true when no further events follow this one.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Callback receiving live-session events, possibly from a provider thread.
pub type LiveEventSink = Box<dyn FnMut(LiveEvent) + Send>;

/// One chat conversation seeded with prior history.
pub trait Conversation: Send {
    /// Sends one user message and blocks until the full reply is available.
    fn send_message(&mut self, text: &str) -> Result<ChatReply, ChatError>;
}

/// Long-lived streaming session opened independently of conversations.
pub trait LiveSession: Send {
    fn send(&mut self, text: &str) -> Result<(), ChatError>;

    /// Closes the session. Implementations must tolerate repeated calls.
    fn close(&mut self);
}

/// Provider interface used by the cockpit runtime.
pub trait ChatProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Starts a conversation that replays `history` before the next message.
    fn start_conversation(
        &self,
        history: Vec<ChatMessage>,
        instructions: &str,
    ) -> Result<Box<dyn Conversation>, ChatError>;

    /// Opens a live session that reports through `sink`.
    ///
    /// Providers without streaming support keep the default.
    fn open_live_session(&self, sink: LiveEventSink) -> Result<Box<dyn LiveSession>, ChatError> {
        let _ = sink;
        Err(ChatError::Unsupported("live session"))
    }
}
