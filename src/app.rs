use std::path::PathBuf;

use chat_provider::ChatMessage;
use project_store::{
    format_timestamp, now_millis, MessageRole, Project, ProjectPhase, ProjectStatus, ProjectStore,
};

use crate::commands::{parse_slash_command, SlashCommand};
use crate::config::DEFAULT_SYSTEM_INSTRUCTIONS;
use crate::ingest::ingest;
use crate::preview::{write_document, PreviewSlot, DEFAULT_PREVIEW_FILE};
use crate::turn::{TurnId, TurnStatus};

pub trait HostOps {
    fn start_turn(
        &mut self,
        history: Vec<ChatMessage>,
        text: String,
        instructions: String,
    ) -> Result<TurnId, String>;
    fn request_render(&mut self);
    fn request_stop(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input.
    Empty,
    /// A slash command was handled in place.
    Command,
    /// `/live`; the host owns live sessions.
    Live(Option<String>),
    /// A turn is already in flight; the submission was discarded.
    Dropped,
    Started(TurnId),
    /// The host could not start the turn. The user message stays.
    Refused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveTurn {
    turn_id: TurnId,
    project_id: String,
}

const HELP_TEXT: &str = "Commands: /help, /new [name], /projects, /open <id>, /phase <phase|next>, /status <status>, /snippets, /preview [path], /live [on|off|text], /quit";

pub struct App {
    store: ProjectStore,
    current_project_id: Option<String>,
    status: TurnStatus,
    active_turn: Option<ActiveTurn>,
    preview: Option<PreviewSlot>,
    notices: Vec<String>,
    system_instructions: String,
    pub should_exit: bool,
}

impl App {
    /// Creates an app over `store`, selecting the most recent project if any.
    pub fn new(store: ProjectStore, system_instructions: Option<String>) -> Self {
        let current_project_id = store
            .projects()
            .first()
            .map(|project| project.project_id.clone());
        let preview = store
            .projects()
            .first()
            .and_then(|project| PreviewSlot::latest_in(&project.workspace.snippets));
        let system_instructions = system_instructions
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTIONS.to_string());

        Self {
            store,
            current_project_id,
            status: TurnStatus::Idle,
            active_turn: None,
            preview,
            notices: Vec::new(),
            system_instructions,
            should_exit: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> TurnStatus {
        self.status
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    #[must_use]
    pub fn active_turn_id(&self) -> Option<TurnId> {
        self.active_turn.as_ref().map(|active| active.turn_id)
    }

    #[must_use]
    pub fn system_instructions(&self) -> &str {
        &self.system_instructions
    }

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        self.store.projects()
    }

    #[must_use]
    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    #[must_use]
    pub fn current_project(&self) -> Option<&Project> {
        self.current_project_id
            .as_deref()
            .and_then(|project_id| self.store.get(project_id))
    }

    /// Latest frontend snippet of the current project (single slot, last wins).
    #[must_use]
    pub fn active_preview(&self) -> Option<&PreviewSlot> {
        self.preview.as_ref()
    }

    /// Drains system notices produced by commands, oldest first.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn push_notice(&mut self, notice: impl Into<String>) {
        self.notices.push(notice.into());
    }

    pub fn on_submit(&mut self, input: &str, host: &mut dyn HostOps) -> SubmitOutcome {
        let prompt = input.trim();

        if prompt.is_empty() {
            host.request_render();
            return SubmitOutcome::Empty;
        }

        if let Some(command) = parse_slash_command(prompt) {
            let outcome = self.on_command(command, host);
            host.request_render();
            return outcome;
        }

        if self.status.is_busy() {
            tracing::debug!(status = self.status.label(), "submission dropped while busy");
            return SubmitOutcome::Dropped;
        }

        let project = self.ensure_current_project();
        let history = conversation_history(&project);
        let ingestion = ingest(project, MessageRole::User, prompt);
        let project_id = ingestion.project.project_id.clone();
        self.persist(ingestion.project);

        self.status = TurnStatus::Thinking;
        let outcome = match host.start_turn(
            history,
            prompt.to_string(),
            self.system_instructions.clone(),
        ) {
            Ok(turn_id) => {
                tracing::debug!(turn_id, %project_id, "turn started");
                self.active_turn = Some(ActiveTurn {
                    turn_id,
                    project_id,
                });
                SubmitOutcome::Started(turn_id)
            }
            Err(error) => {
                tracing::warn!(%error, "failed to start turn");
                self.status = TurnStatus::Idle;
                SubmitOutcome::Refused
            }
        };

        host.request_render();
        outcome
    }

    /// Applies a provider reply to the project that started the turn.
    pub fn on_turn_replied(&mut self, turn_id: TurnId, text: &str) {
        let Some(project_id) = self.project_for_turn(turn_id) else {
            return;
        };

        self.status = TurnStatus::Building;
        let Some(project) = self.store.get(&project_id).cloned() else {
            tracing::warn!(turn_id, %project_id, "reply arrived for an unknown project");
            return;
        };

        let ingestion = ingest(project, MessageRole::Assistant, text);
        tracing::debug!(
            turn_id,
            snippets = ingestion.snippets.len(),
            "assistant reply ingested"
        );
        let is_current = self.current_project_id.as_deref() == Some(project_id.as_str());
        if let Some(snippet) = ingestion.latest_frontend.as_ref().filter(|_| is_current) {
            self.preview = Some(PreviewSlot::from(snippet));
        }
        self.persist(ingestion.project);
    }

    /// Ends a turn whose provider call failed. Nothing is appended.
    pub fn on_turn_failed(&mut self, turn_id: TurnId, error: &str) {
        if self.project_for_turn(turn_id).is_none() {
            return;
        }

        tracing::warn!(turn_id, %error, "turn failed");
        self.active_turn = None;
        self.status = TurnStatus::Idle;
    }

    /// Cosmetic end of the building phase.
    pub fn on_turn_settled(&mut self, turn_id: TurnId) {
        if self.project_for_turn(turn_id).is_none() || self.status != TurnStatus::Building {
            return;
        }

        tracing::debug!(turn_id, "turn settled");
        self.active_turn = None;
        self.status = TurnStatus::Idle;
    }

    /// Creates a project and makes it current.
    pub fn new_project(&mut self, name: Option<&str>) -> Project {
        let project = match self.store.create(name) {
            Ok(project) => project,
            Err(error) => {
                tracing::error!(%error, "failed to persist new project");
                self.store.projects()[0].clone()
            }
        };

        self.current_project_id = Some(project.project_id.clone());
        self.preview = None;
        project
    }

    /// Selects the project whose id equals or starts with `id_or_prefix`.
    pub fn open_project(&mut self, id_or_prefix: &str) -> Result<&Project, String> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err("Usage: /open <project id>".to_string());
        }

        let matches: Vec<&Project> = self
            .store
            .projects()
            .iter()
            .filter(|project| project.project_id.starts_with(needle))
            .collect();
        let project_id = match matches.as_slice() {
            [] => return Err(format!("No project matches '{needle}'")),
            [project] => project.project_id.clone(),
            _ => match matches.iter().find(|project| project.project_id == needle) {
                Some(project) => project.project_id.clone(),
                None => return Err(format!("'{needle}' matches {} projects", matches.len())),
            },
        };

        let project = self
            .store
            .get(&project_id)
            .ok_or_else(|| format!("No project matches '{needle}'"))?;
        self.preview = PreviewSlot::latest_in(&project.workspace.snippets);
        self.current_project_id = Some(project_id);
        Ok(project)
    }

    /// `next` advances the current project's phase; anything else is a phase name.
    fn resolve_phase(&self, value: &str) -> Option<ProjectPhase> {
        if value.trim().eq_ignore_ascii_case("next") {
            return self
                .current_project()
                .and_then(|project| project.current_phase.next());
        }
        ProjectPhase::parse(value)
    }

    pub fn set_phase(&mut self, phase: ProjectPhase) -> bool {
        self.update_current_project(|project| project.current_phase = phase)
    }

    pub fn set_status(&mut self, status: ProjectStatus) -> bool {
        self.update_current_project(|project| project.status = status)
    }

    fn on_command(&mut self, command: SlashCommand, host: &mut dyn HostOps) -> SubmitOutcome {
        match command {
            SlashCommand::Help => self.push_notice(HELP_TEXT),
            SlashCommand::New(name) => {
                let project = self.new_project(name.as_deref());
                self.push_notice(format!(
                    "Created project {} ({})",
                    project.name,
                    short_id(&project.project_id)
                ));
            }
            SlashCommand::Projects => self.list_projects(),
            SlashCommand::Open(id) => match self.open_project(&id) {
                Ok(project) => {
                    let notice = format!("Opened project {}", project.name);
                    self.push_notice(notice);
                }
                Err(error) => self.push_notice(error),
            },
            SlashCommand::Phase(value) => match self.resolve_phase(&value) {
                Some(phase) => {
                    let notice = if self.set_phase(phase) {
                        format!("Phase set to {}", phase.as_str())
                    } else {
                        "No current project".to_string()
                    };
                    self.push_notice(notice);
                }
                None => self.push_notice(format!(
                    "Unknown phase '{value}'. Phases: {}",
                    join_labels(ProjectPhase::ALL.iter().map(ProjectPhase::as_str))
                )),
            },
            SlashCommand::Status(value) => match ProjectStatus::parse(&value) {
                Some(status) => {
                    let notice = if self.set_status(status) {
                        format!("Status set to {}", status.as_str())
                    } else {
                        "No current project".to_string()
                    };
                    self.push_notice(notice);
                }
                None => self.push_notice(format!(
                    "Unknown status '{value}'. Statuses: {}",
                    join_labels(ProjectStatus::ALL.iter().map(ProjectStatus::as_str))
                )),
            },
            SlashCommand::Snippets => self.list_snippets(),
            SlashCommand::Preview(path) => self.write_preview(path),
            SlashCommand::Live(argument) => return SubmitOutcome::Live(argument),
            SlashCommand::Quit => {
                self.should_exit = true;
                host.request_stop();
            }
            SlashCommand::Unknown(command) => {
                self.push_notice(format!("Unknown command: {command}"));
            }
        }

        SubmitOutcome::Command
    }

    fn list_projects(&mut self) {
        if self.store.is_empty() {
            self.push_notice("No projects yet");
            return;
        }

        let lines: Vec<String> = self
            .store
            .projects()
            .iter()
            .map(|project| {
                let marker = if self.current_project_id.as_deref() == Some(&project.project_id) {
                    '*'
                } else {
                    ' '
                };
                let modified = format_timestamp(project.last_modified).unwrap_or_default();
                format!(
                    "{marker} {} {} [{} / {}] {} messages, {} snippets, modified {modified}",
                    short_id(&project.project_id),
                    project.name,
                    project.status.as_str(),
                    project.current_phase.as_str(),
                    project.workspace.messages.len(),
                    project.workspace.snippets.len()
                )
            })
            .collect();
        self.push_notice(lines.join("\n"));
    }

    fn list_snippets(&mut self) {
        let lines: Vec<String> = match self.current_project() {
            Some(project) => project
                .workspace
                .snippets
                .iter()
                .map(|snippet| {
                    format!(
                        "{} ({}, {})",
                        snippet.filename,
                        snippet.language,
                        snippet.category.as_str()
                    )
                })
                .collect(),
            None => Vec::new(),
        };

        if lines.is_empty() {
            self.push_notice("No snippets yet");
        } else {
            self.push_notice(lines.join("\n"));
        }
    }

    fn write_preview(&mut self, path: Option<String>) {
        let Some(slot) = self.preview.as_ref() else {
            self.push_notice("No frontend snippet to preview");
            return;
        };

        let path = PathBuf::from(path.unwrap_or_else(|| DEFAULT_PREVIEW_FILE.to_string()));
        let notice = match write_document(&path, &slot.code) {
            Ok(()) => format!("Preview of {} written to {}", slot.filename, path.display()),
            Err(error) => {
                tracing::warn!(%error, path = %path.display(), "failed to write preview");
                format!("Failed to write preview: {error}")
            }
        };
        self.push_notice(notice);
    }

    fn ensure_current_project(&mut self) -> Project {
        if let Some(project) = self.current_project() {
            return project.clone();
        }

        self.new_project(None)
    }

    fn update_current_project(&mut self, update: impl FnOnce(&mut Project)) -> bool {
        let Some(mut project) = self.current_project().cloned() else {
            return false;
        };

        update(&mut project);
        project.last_modified = now_millis();
        self.persist(project);
        true
    }

    fn project_for_turn(&self, turn_id: TurnId) -> Option<String> {
        match self.active_turn.as_ref() {
            Some(active) if active.turn_id == turn_id => Some(active.project_id.clone()),
            _ => {
                tracing::debug!(turn_id, "ignoring event for inactive turn");
                None
            }
        }
    }

    fn persist(&mut self, project: Project) {
        let project_id = project.project_id.clone();
        if let Err(error) = self.store.upsert(project) {
            tracing::error!(%error, %project_id, "failed to persist project");
        }
    }
}

/// Provider-facing history for `project`, oldest first.
#[must_use]
pub fn conversation_history(project: &Project) -> Vec<ChatMessage> {
    project
        .workspace
        .messages
        .iter()
        .map(|message| match message.role {
            MessageRole::User => ChatMessage::User {
                text: message.content.clone(),
            },
            MessageRole::Assistant => ChatMessage::Assistant {
                text: message.content.clone(),
            },
        })
        .collect()
}

fn short_id(project_id: &str) -> &str {
    project_id.get(..8).unwrap_or(project_id)
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}
