use crate::backend::StorageBackend;
use crate::clock::now_millis;
use crate::error::ProjectStoreError;
use crate::paths::PROJECTS_KEY;
use crate::schema::Project;

pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Replaced,
    Appended,
}

/// In-memory project list mirrored to a storage backend.
///
/// The in-memory list is authoritative for the running process. Every mutation
/// rewrites the whole persisted list; there is no concurrency control, so two
/// stores writing the same backend overwrite each other (last write wins).
pub struct ProjectStore {
    backend: Box<dyn StorageBackend>,
    projects: Vec<Project>,
}

impl ProjectStore {
    /// Opens a store and loads whatever list the backend holds.
    pub fn open(backend: impl StorageBackend + 'static) -> Self {
        let mut store = Self {
            backend: Box::new(backend),
            projects: Vec::new(),
        };
        store.projects = store.load();
        store
    }

    /// Reads the persisted list, failing open to an empty list.
    #[must_use]
    pub fn load(&self) -> Vec<Project> {
        match self.try_load() {
            Ok(projects) => projects,
            Err(error) => {
                tracing::warn!(%error, "stored project list is unreadable; starting empty");
                Vec::new()
            }
        }
    }

    /// Reads the persisted list, surfacing read and parse failures.
    pub fn try_load(&self) -> Result<Vec<Project>, ProjectStoreError> {
        let Some(raw) = self.backend.read(PROJECTS_KEY)? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|source| ProjectStoreError::json_parse(PROJECTS_KEY, source))
    }

    /// Replaces both the in-memory and the persisted list.
    pub fn save(&mut self, projects: Vec<Project>) -> Result<(), ProjectStoreError> {
        self.projects = projects;
        self.persist()
    }

    /// Creates a project at the front of the list and persists immediately.
    ///
    /// When persisting fails the project is still present in memory at index 0.
    pub fn create(&mut self, name: Option<&str>) -> Result<Project, ProjectStoreError> {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PROJECT_NAME);
        let project = Project::new(uuid::Uuid::new_v4().to_string(), name, now_millis());

        tracing::debug!(project_id = %project.project_id, name = %project.name, "created project");
        self.projects.insert(0, project.clone());
        self.persist()?;
        Ok(project)
    }

    /// Replaces the project with the same id in place, or appends it.
    pub fn upsert(&mut self, project: Project) -> Result<UpsertOutcome, ProjectStoreError> {
        let outcome = match self
            .projects
            .iter_mut()
            .find(|existing| existing.project_id == project.project_id)
        {
            Some(existing) => {
                *existing = project;
                UpsertOutcome::Replaced
            }
            None => {
                self.projects.push(project);
                UpsertOutcome::Appended
            }
        };

        self.persist()?;
        Ok(outcome)
    }

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    #[must_use]
    pub fn get(&self, project_id: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|project| project.project_id == project_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    fn persist(&self) -> Result<(), ProjectStoreError> {
        let serialized = serde_json::to_string(&self.projects)
            .map_err(|source| ProjectStoreError::json_serialize(PROJECTS_KEY, source))?;
        self.backend.write(PROJECTS_KEY, &serialized)
    }
}
