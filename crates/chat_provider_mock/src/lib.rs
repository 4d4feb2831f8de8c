//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport logic and is intended for local
//! development and contract-level integration testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chat_provider::{
    ChatError, ChatMessage, ChatProvider, ChatReply, Conversation, LiveEvent, LiveEventSink,
    LiveSession, ProviderProfile,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// Reply used once the script is empty, unless the mock is exhaustible.
pub const DEFAULT_REPLY: &str = r#"Here is a starting point for the landing view.

```tsx
// Category: frontend
function App() {
  return <h1>Hello from the cockpit</h1>;
}
ReactDOM.createRoot(document.getElementById('root')).render(<App />);
```

Tell me what to build next.
"#;

/// One `send_message` call observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub history: Vec<ChatMessage>,
    pub instructions: String,
    pub text: String,
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Result<String, ChatError>>,
    requests: Vec<RecordedRequest>,
}

/// Deterministic mock provider used by cockpit tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct MockChatProvider {
    script: Arc<Mutex<Script>>,
    reply_delay: Duration,
    exhaustible: bool,
}

impl MockChatProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that answers with `replies` in order, then with [`DEFAULT_REPLY`].
    #[must_use]
    pub fn with_replies(replies: impl IntoIterator<Item = Result<String, ChatError>>) -> Self {
        let provider = Self::default();
        lock_unpoisoned(&provider.script)
            .replies
            .extend(replies);
        provider
    }

    /// Delays every reply, standing in for network latency.
    #[must_use]
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    /// Fails with [`ChatError::Exhausted`] once the script is empty instead of
    /// answering with [`DEFAULT_REPLY`].
    #[must_use]
    pub fn exhaustible(mut self) -> Self {
        self.exhaustible = true;
        self
    }

    /// Queues one more scripted reply; conversations already started see it.
    pub fn push_reply(&self, reply: Result<String, ChatError>) {
        lock_unpoisoned(&self.script).replies.push_back(reply);
    }

    /// Returns every request seen so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock_unpoisoned(&self.script).requests.clone()
    }
}

impl ChatProvider for MockChatProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn start_conversation(
        &self,
        history: Vec<ChatMessage>,
        instructions: &str,
    ) -> Result<Box<dyn Conversation>, ChatError> {
        Ok(Box::new(MockConversation {
            script: Arc::clone(&self.script),
            history,
            instructions: instructions.to_string(),
            reply_delay: self.reply_delay,
            exhaustible: self.exhaustible,
        }))
    }

    fn open_live_session(&self, mut sink: LiveEventSink) -> Result<Box<dyn LiveSession>, ChatError> {
        sink(LiveEvent::Opened);
        Ok(Box::new(MockLiveSession {
            sink,
            closed: false,
        }))
    }
}

struct MockConversation {
    script: Arc<Mutex<Script>>,
    history: Vec<ChatMessage>,
    instructions: String,
    reply_delay: Duration,
    exhaustible: bool,
}

impl Conversation for MockConversation {
    fn send_message(&mut self, text: &str) -> Result<ChatReply, ChatError> {
        let next = {
            let mut script = lock_unpoisoned(&self.script);
            script.requests.push(RecordedRequest {
                history: self.history.clone(),
                instructions: self.instructions.clone(),
                text: text.to_string(),
            });
            script.replies.pop_front()
        };

        if !self.reply_delay.is_zero() {
            thread::sleep(self.reply_delay);
        }

        let reply = match next {
            Some(reply) => reply?,
            None if self.exhaustible => return Err(ChatError::Exhausted),
            None => DEFAULT_REPLY.to_string(),
        };
        self.history.push(ChatMessage::User {
            text: text.to_string(),
        });
        self.history.push(ChatMessage::Assistant {
            text: reply.clone(),
        });
        Ok(ChatReply::new(reply))
    }
}

struct MockLiveSession {
    sink: LiveEventSink,
    closed: bool,
}

impl LiveSession for MockLiveSession {
    fn send(&mut self, text: &str) -> Result<(), ChatError> {
        if self.closed {
            return Err(ChatError::Rejected("live session is closed".to_string()));
        }

        (self.sink)(LiveEvent::Message(format!("echo: {text}")));
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }

        self.closed = true;
        (self.sink)(LiveEvent::Closed);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
