mod backend;
mod clock;
mod error;
mod paths;
mod schema;
mod store;

pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use clock::{format_timestamp, now_millis};
pub use error::ProjectStoreError;
pub use paths::{storage_root, PROJECTS_KEY, STORAGE_DIR};
pub use schema::{
    CodeSnippet, GitHubMetadata, Message, MessageRole, Project, ProjectPhase, ProjectStatus,
    SimulationResult, SnippetCategory, Snapshot, SyncMetadata, Timestamp, Workspace,
};
pub use store::{ProjectStore, UpsertOutcome, DEFAULT_PROJECT_NAME};
