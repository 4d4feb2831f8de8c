use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chat_provider::{LiveEvent, LiveEventSink};
use cockpit::app::{App, SubmitOutcome};
use cockpit::config::CockpitConfig;
use cockpit::live::LiveSessionHandle;
use cockpit::logging::init_logging;
use cockpit::providers;
use cockpit::runtime::RuntimeController;
use cockpit::turn::TurnStatus;
use project_store::{FileStorage, MessageRole, ProjectStore};

const TURN_POLL_INTERVAL: Duration = Duration::from_millis(20);

fn main() -> io::Result<()> {
    let config = CockpitConfig::from_env();
    init_logging(&config);

    let cwd = std::env::current_dir().map_err(io::Error::other)?;
    let storage = FileStorage::new(config.storage_root(&cwd));
    tracing::debug!(root = %storage.root().display(), "project storage");
    let store = ProjectStore::open(storage);
    let app = Arc::new(Mutex::new(App::new(
        store,
        Some(config.system_instructions.clone()),
    )));

    let provider = providers::provider_for_id(&config.provider_id).map_err(io::Error::other)?;
    let profile = provider.profile();
    let host = RuntimeController::new(Arc::clone(&app), provider, config.settle_delay);
    tracing::info!(
        provider = %profile.provider_id,
        model = %profile.model_id,
        "cockpit started"
    );

    let mut stdout = io::stdout();
    writeln!(
        stdout,
        "cockpit ({} / {}). Type /help for commands.",
        profile.provider_id, profile.model_id
    )?;

    let mut live: Option<LiveSessionHandle> = None;
    let stdin = io::stdin();
    prompt(&mut stdout)?;
    for line in stdin.lock().lines() {
        let line = line?;
        match host.submit(&line) {
            SubmitOutcome::Started(_) => drive_turn(&host, &app, &mut stdout)?,
            SubmitOutcome::Dropped => writeln!(stdout, "Busy; message dropped.")?,
            SubmitOutcome::Refused => writeln!(stdout, "Could not start the turn.")?,
            SubmitOutcome::Live(argument) => {
                handle_live(&host, &mut live, argument.as_deref(), &mut stdout)?;
            }
            SubmitOutcome::Empty | SubmitOutcome::Command => {}
        }

        for notice in lock_unpoisoned(&app).take_notices() {
            writeln!(stdout, "{notice}")?;
        }

        if lock_unpoisoned(&app).should_exit {
            break;
        }
        prompt(&mut stdout)?;
    }

    if let Some(mut session) = live.take() {
        session.close();
    }
    Ok(())
}

/// Blocks until the started turn returns to idle, echoing status changes and
/// the assistant reply.
fn drive_turn(
    host: &Arc<RuntimeController>,
    app: &Arc<Mutex<App>>,
    out: &mut impl Write,
) -> io::Result<()> {
    let (project_id, seen_messages, seen_snippets) = {
        let app = lock_unpoisoned(app);
        match app.current_project() {
            Some(project) => (
                project.project_id.clone(),
                project.workspace.messages.len(),
                project.workspace.snippets.len(),
            ),
            None => return Ok(()),
        }
    };

    let mut last_status = TurnStatus::Idle;
    loop {
        host.flush_pending_turn_events();
        let status = lock_unpoisoned(app).status();
        if status != last_status {
            writeln!(out, "[{}]", status.label())?;
            last_status = status;
        }
        if status == TurnStatus::Idle {
            break;
        }
        thread::sleep(TURN_POLL_INTERVAL);
    }

    let app = lock_unpoisoned(app);
    let Some(project) = app.store().get(&project_id) else {
        return Ok(());
    };

    for message in project.workspace.messages.iter().skip(seen_messages) {
        if message.role == MessageRole::Assistant {
            writeln!(out, "{}", message.content)?;
        }
    }
    for snippet in project.workspace.snippets.iter().skip(seen_snippets) {
        writeln!(
            out,
            "+ {} ({}, {})",
            snippet.filename,
            snippet.language,
            snippet.category.as_str()
        )?;
    }
    if let Some(preview) = app.active_preview() {
        writeln!(out, "preview: {}", preview.filename)?;
    }
    Ok(())
}

fn handle_live(
    host: &RuntimeController,
    live: &mut Option<LiveSessionHandle>,
    argument: Option<&str>,
    out: &mut impl Write,
) -> io::Result<()> {
    match argument {
        None | Some("on") => {
            if live.as_ref().is_some_and(LiveSessionHandle::is_open) {
                return writeln!(out, "Live session already open.");
            }
            match host.open_live_session(printing_sink()) {
                Ok(session) => *live = Some(session),
                Err(error) => writeln!(out, "Live session unavailable: {error}")?,
            }
        }
        Some("off") => match live.as_mut() {
            Some(session) => session.close(),
            None => writeln!(out, "No live session.")?,
        },
        Some(text) => match live.as_mut() {
            Some(session) => {
                if let Err(error) = session.send(text) {
                    writeln!(out, "Live send failed: {error}")?;
                }
            }
            None => writeln!(out, "No live session. Use /live on first.")?,
        },
    }
    Ok(())
}

fn printing_sink() -> LiveEventSink {
    Box::new(|event| {
        let line = match event {
            LiveEvent::Opened => "[live] opened".to_string(),
            LiveEvent::Message(text) => format!("[live] {text}"),
            LiveEvent::Error(error) => format!("[live] error: {error}"),
            LiveEvent::Closed => "[live] closed".to_string(),
        };
        println!("{line}");
    })
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
