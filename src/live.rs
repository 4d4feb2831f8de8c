//! Live (streaming) session handle, independent of conversation turns.

use chat_provider::{ChatError, ChatProvider, LiveEventSink, LiveSession};

/// Owns an open live session. Closing is idempotent and happens on drop.
pub struct LiveSessionHandle {
    session: Option<Box<dyn LiveSession>>,
}

impl LiveSessionHandle {
    pub fn open(provider: &dyn ChatProvider, sink: LiveEventSink) -> Result<Self, ChatError> {
        let session = provider.open_live_session(sink)?;
        tracing::debug!(provider = %provider.profile().provider_id, "live session opened");
        Ok(Self {
            session: Some(session),
        })
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn send(&mut self, text: &str) -> Result<(), ChatError> {
        match self.session.as_mut() {
            Some(session) => session.send(text),
            None => Err(ChatError::Rejected("live session is closed".to_string())),
        }
    }

    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
            tracing::debug!("live session closed");
        }
    }
}

impl Drop for LiveSessionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chat_provider::LiveEvent;
    use chat_provider_mock::MockChatProvider;

    use super::*;

    fn recording_sink() -> (LiveEventSink, Arc<Mutex<Vec<LiveEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink_events = Arc::clone(&events);
        let sink: LiveEventSink = Box::new(move |event| {
            sink_events
                .lock()
                .expect("events lock poisoned")
                .push(event);
        });
        (sink, events)
    }

    #[test]
    fn close_twice_emits_one_closed_event() {
        let provider = MockChatProvider::new();
        let (sink, events) = recording_sink();
        let mut handle = LiveSessionHandle::open(&provider, sink).expect("mock supports live");

        handle.close();
        handle.close();

        assert!(!handle.is_open());
        let closed = events
            .lock()
            .expect("events lock poisoned")
            .iter()
            .filter(|event| event.is_terminal())
            .count();
        assert_eq!(closed, 1);
    }

    #[test]
    fn send_after_close_is_rejected() {
        let provider = MockChatProvider::new();
        let (sink, _events) = recording_sink();
        let mut handle = LiveSessionHandle::open(&provider, sink).expect("mock supports live");

        handle.send("hello").expect("open session accepts text");
        handle.close();

        assert!(matches!(handle.send("late"), Err(ChatError::Rejected(_))));
    }

    #[test]
    fn drop_closes_the_session() {
        let provider = MockChatProvider::new();
        let (sink, events) = recording_sink();

        drop(LiveSessionHandle::open(&provider, sink).expect("mock supports live"));

        assert_eq!(
            events.lock().expect("events lock poisoned").last(),
            Some(&LiveEvent::Closed)
        );
    }
}
