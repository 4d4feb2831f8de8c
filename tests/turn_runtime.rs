use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chat_provider::{ChatError, ChatMessage, LiveEvent, LiveEventSink};
use chat_provider_mock::{MockChatProvider, DEFAULT_REPLY};
use cockpit::app::{App, SubmitOutcome};
use cockpit::runtime::RuntimeController;
use cockpit::turn::TurnStatus;
use project_store::{MemoryStorage, MessageRole, ProjectStore, SnippetCategory};

const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    app: Arc<Mutex<App>>,
    provider: MockChatProvider,
    storage: MemoryStorage,
    host: Arc<RuntimeController>,
}

fn harness(provider: MockChatProvider, settle_delay: Duration) -> Harness {
    let storage = MemoryStorage::new();
    let app = Arc::new(Mutex::new(App::new(
        ProjectStore::open(storage.clone()),
        None,
    )));
    let host = RuntimeController::new(
        Arc::clone(&app),
        Arc::new(provider.clone()),
        settle_delay,
    );
    Harness {
        app,
        provider,
        storage,
        host,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn reply_is_ingested_and_persisted() {
    let h = harness(MockChatProvider::new(), Duration::ZERO);

    assert!(matches!(h.host.submit("build a landing page"), SubmitOutcome::Started(_)));
    assert!(h.host.wait_until_idle(IDLE_TIMEOUT));

    let app = lock(&h.app);
    let project = app.current_project().expect("project created");
    assert_eq!(project.workspace.messages.len(), 2);
    assert_eq!(project.workspace.messages[1].role, MessageRole::Assistant);
    assert_eq!(project.workspace.messages[1].content, DEFAULT_REPLY);
    assert_eq!(project.workspace.snippets.len(), 1);
    assert_eq!(project.workspace.snippets[0].category, SnippetCategory::Frontend);
    assert_eq!(project.workspace.snippets[0].language, "tsx");
    assert!(app.active_preview().is_some());
    drop(app);

    let reopened = ProjectStore::open(h.storage.clone());
    assert_eq!(reopened.projects()[0].workspace.messages.len(), 2);
    assert_eq!(reopened.projects()[0].workspace.snippets.len(), 1);
    assert!(h.host.render_requests() > 0);
}

#[test]
fn provider_failure_leaves_only_the_user_message() {
    let provider =
        MockChatProvider::with_replies([Err(ChatError::Transport("offline".to_string()))]);
    let h = harness(provider, Duration::ZERO);

    h.host.submit("hello");
    assert!(h.host.wait_until_idle(IDLE_TIMEOUT));

    let app = lock(&h.app);
    let project = app.current_project().expect("project");
    assert_eq!(project.workspace.messages.len(), 1);
    assert_eq!(project.workspace.messages[0].role, MessageRole::User);
    assert!(project.workspace.snippets.is_empty());
    assert_eq!(app.active_turn_id(), None);
}

#[test]
fn exhausted_script_fails_the_turn_until_a_reply_is_queued() {
    let h = harness(MockChatProvider::new().exhaustible(), Duration::ZERO);

    h.host.submit("first");
    assert!(h.host.wait_until_idle(IDLE_TIMEOUT));
    assert_eq!(
        lock(&h.app)
            .current_project()
            .expect("project")
            .workspace
            .messages
            .len(),
        1
    );

    h.provider.push_reply(Ok("late answer".to_string()));
    h.host.submit("again");
    assert!(h.host.wait_until_idle(IDLE_TIMEOUT));

    let app = lock(&h.app);
    let messages = &app.current_project().expect("project").workspace.messages;
    let contents: Vec<&str> = messages.iter().map(|message| message.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "again", "late answer"]);
}

#[test]
fn second_turn_replays_history_and_instructions() {
    let provider = MockChatProvider::with_replies([Ok("first answer".to_string())]);
    let h = harness(provider, Duration::ZERO);

    h.host.submit("first");
    assert!(h.host.wait_until_idle(IDLE_TIMEOUT));
    h.host.submit("second");
    assert!(h.host.wait_until_idle(IDLE_TIMEOUT));

    let requests = h.provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].history.is_empty());
    assert_eq!(
        requests[1].history,
        vec![
            ChatMessage::User {
                text: "first".to_string()
            },
            ChatMessage::Assistant {
                text: "first answer".to_string()
            },
        ]
    );
    assert_eq!(requests[1].text, "second");
    assert_eq!(
        requests[1].instructions,
        lock(&h.app).system_instructions()
    );
}

#[test]
fn submissions_during_a_slow_reply_are_dropped() {
    let provider = MockChatProvider::new().with_reply_delay(Duration::from_millis(100));
    let h = harness(provider, Duration::ZERO);

    assert!(matches!(h.host.submit("slow"), SubmitOutcome::Started(_)));
    assert_eq!(h.host.submit("impatient"), SubmitOutcome::Dropped);
    assert!(h.host.wait_until_idle(IDLE_TIMEOUT));

    assert_eq!(h.provider.requests().len(), 1);
    let app = lock(&h.app);
    let messages = &app.current_project().expect("project").workspace.messages;
    assert_eq!(messages.len(), 2);
}

#[test]
fn settle_delay_keeps_building_until_it_elapses() {
    let h = harness(MockChatProvider::new(), Duration::from_millis(200));

    h.host.submit("build");

    let mut saw_building = false;
    for _ in 0..200 {
        h.host.flush_pending_turn_events();
        let status = lock(&h.app).status();
        if status == TurnStatus::Building {
            saw_building = true;
            break;
        }
        if status == TurnStatus::Idle {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }

    assert!(saw_building);
    assert!(h.host.wait_until_idle(IDLE_TIMEOUT));
}

#[test]
fn live_session_is_independent_of_turns() {
    let h = harness(MockChatProvider::new(), Duration::ZERO);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = Arc::clone(&events);
    let sink: LiveEventSink = Box::new(move |event| lock(&sink_events).push(event));

    let mut session = h.host.open_live_session(sink).expect("mock supports live");
    session.send("ping").expect("open session accepts text");
    session.close();
    session.close();

    assert_eq!(
        *lock(&events),
        vec![
            LiveEvent::Opened,
            LiveEvent::Message("echo: ping".to_string()),
            LiveEvent::Closed,
        ]
    );
    assert_eq!(lock(&h.app).status(), TurnStatus::Idle);
}

#[test]
fn quit_command_requests_stop() {
    let h = harness(MockChatProvider::new(), Duration::ZERO);

    assert_eq!(h.host.submit("/quit"), SubmitOutcome::Command);
    assert!(h.host.stop_requested());
    assert!(lock(&h.app).should_exit);
}
