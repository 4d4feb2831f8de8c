use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chat_provider::{ChatError, ChatMessage, ChatProvider, LiveEventSink};

use crate::app::{App, HostOps, SubmitOutcome};
use crate::live::LiveSessionHandle;
use crate::turn::{TurnEvent, TurnId, TurnStatus};

const ERROR_TURN_ALREADY_ACTIVE: &str = "Turn already active";
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

struct ActiveTurn {
    turn_id: TurnId,
    join_handle: Option<JoinHandle<()>>,
}

/// Runs provider calls off the caller's thread and feeds their outcomes back
/// into `App` in arrival order.
pub struct RuntimeController {
    app: Arc<Mutex<App>>,
    provider: Arc<dyn ChatProvider>,
    pending_events: Arc<Mutex<VecDeque<TurnEvent>>>,
    next_turn_id: AtomicU64,
    active_turn: Mutex<Option<ActiveTurn>>,
    settle_delay: Duration,
    render_requests: AtomicUsize,
    stop_requested: AtomicBool,
}

impl RuntimeController {
    /// Creates a controller that buffers turn events before applying them to `App`.
    ///
    /// Events are applied only by [`RuntimeController::flush_pending_turn_events`]
    /// (or [`RuntimeController::wait_until_idle`], which calls it), so the caller
    /// decides on which thread `App` mutations happen.
    pub fn new(
        app: Arc<Mutex<App>>,
        provider: Arc<dyn ChatProvider>,
        settle_delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            app,
            provider,
            pending_events: Arc::new(Mutex::new(VecDeque::new())),
            next_turn_id: AtomicU64::new(1),
            active_turn: Mutex::new(None),
            settle_delay,
            render_requests: AtomicUsize::new(0),
            stop_requested: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn app(&self) -> &Arc<Mutex<App>> {
        &self.app
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    /// Submits user input to `App` with this controller as its host.
    pub fn submit(self: &Arc<Self>, input: &str) -> SubmitOutcome {
        let mut host = Arc::clone(self);
        lock_unpoisoned(&self.app).on_submit(input, &mut host)
    }

    /// Opens a live session on the configured provider.
    pub fn open_live_session(&self, sink: LiveEventSink) -> Result<LiveSessionHandle, ChatError> {
        LiveSessionHandle::open(self.provider.as_ref(), sink)
    }

    #[must_use]
    pub fn render_requests(&self) -> usize {
        self.render_requests.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Applies queued turn events and returns how many were applied.
    pub fn flush_pending_turn_events(&self) -> usize {
        let mut drained = 0usize;

        loop {
            let event = lock_unpoisoned(&self.pending_events).pop_front();
            match event {
                Some(event) => {
                    self.apply_turn_event(event);
                    drained += 1;
                }
                None => break,
            }
        }

        if drained > 0 {
            self.render_requests.fetch_add(1, Ordering::SeqCst);
        }

        drained
    }

    /// Flushes events until `App` is idle or `timeout` elapses. Returns whether
    /// the app reached idle.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            self.flush_pending_turn_events();
            if lock_unpoisoned(&self.app).status() == TurnStatus::Idle {
                return true;
            }

            if Instant::now() >= deadline {
                return false;
            }

            thread::sleep(IDLE_POLL_INTERVAL);
        }
    }

    fn start_turn_internal(
        self: &Arc<Self>,
        history: Vec<ChatMessage>,
        text: String,
        instructions: String,
    ) -> Result<TurnId, String> {
        let mut active_turn = self.lock_active_turn();
        if active_turn.is_some() {
            return Err(ERROR_TURN_ALREADY_ACTIVE.to_string());
        }

        let turn_id = self.next_turn_id.fetch_add(1, Ordering::SeqCst);
        let controller = Arc::clone(self);
        let join_handle = thread::Builder::new()
            .name(format!("cockpit-turn-{turn_id}"))
            .spawn(move || controller.run_worker(turn_id, history, text, instructions))
            .map_err(|error| format!("Failed to spawn turn worker: {error}"))?;

        *active_turn = Some(ActiveTurn {
            turn_id,
            join_handle: Some(join_handle),
        });

        Ok(turn_id)
    }

    fn run_worker(
        self: Arc<Self>,
        turn_id: TurnId,
        history: Vec<ChatMessage>,
        text: String,
        instructions: String,
    ) {
        let provider = Arc::clone(&self.provider);
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut conversation = provider.start_conversation(history, &instructions)?;
            conversation.send_message(&text)
        }));

        let event = match outcome {
            Ok(Ok(reply)) => TurnEvent::Replied {
                turn_id,
                text: reply.text,
            },
            Ok(Err(error)) => TurnEvent::Failed {
                turn_id,
                error: error.to_string(),
            },
            Err(_) => TurnEvent::Failed {
                turn_id,
                error: "Chat provider panicked".to_string(),
            },
        };

        self.enqueue_turn_event(event);
    }

    fn enqueue_turn_event(&self, event: TurnEvent) {
        lock_unpoisoned(&self.pending_events).push_back(event);
    }

    fn apply_turn_event(&self, event: TurnEvent) {
        let turn_id = event.turn_id();
        let ends_provider_call = event.ends_provider_call();
        let replied = matches!(event, TurnEvent::Replied { .. });

        {
            let mut app = lock_unpoisoned(&self.app);
            match event {
                TurnEvent::Replied { turn_id, text } => app.on_turn_replied(turn_id, &text),
                TurnEvent::Failed { turn_id, error } => app.on_turn_failed(turn_id, &error),
                TurnEvent::Settled { turn_id } => app.on_turn_settled(turn_id),
            }
        }

        if ends_provider_call {
            self.clear_active_turn_if_matching(turn_id);
        }

        if replied {
            self.schedule_settle(turn_id);
        }
    }

    /// Queues `Settled` after the cosmetic delay. The reply is already applied.
    fn schedule_settle(&self, turn_id: TurnId) {
        if self.settle_delay.is_zero() {
            self.enqueue_turn_event(TurnEvent::Settled { turn_id });
            return;
        }

        let delay = self.settle_delay;
        let pending_events = Arc::clone(&self.pending_events);
        let spawned = thread::Builder::new()
            .name(format!("cockpit-settle-{turn_id}"))
            .spawn(move || {
                thread::sleep(delay);
                lock_unpoisoned(&pending_events).push_back(TurnEvent::Settled { turn_id });
            });

        if let Err(error) = spawned {
            tracing::warn!(%error, turn_id, "settle timer unavailable; settling now");
            self.enqueue_turn_event(TurnEvent::Settled { turn_id });
        }
    }

    fn clear_active_turn_if_matching(&self, turn_id: TurnId) {
        let mut active_turn = self.lock_active_turn();
        let matches = active_turn.as_ref().map(|active| active.turn_id) == Some(turn_id);
        if !matches {
            return;
        }

        let Some(mut completed) = active_turn.take() else {
            return;
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn lock_active_turn(&self) -> MutexGuard<'_, Option<ActiveTurn>> {
        lock_unpoisoned(&self.active_turn)
    }
}

impl HostOps for Arc<RuntimeController> {
    fn start_turn(
        &mut self,
        history: Vec<ChatMessage>,
        text: String,
        instructions: String,
    ) -> Result<TurnId, String> {
        self.start_turn_internal(history, text, instructions)
    }

    fn request_render(&mut self) {
        self.render_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn request_stop(&mut self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
