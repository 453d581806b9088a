//! Editor session: one open project wired to the canvas engine.
//!
//! DESIGN
//! ======
//! Opening a project fires the catalog fetch and the project load together
//! and applies each result as it lands. The engine holds a loaded scene until
//! the catalog is ready, so arrival order never matters and a late catalog
//! cannot clobber edits made after the restore.
//!
//! Saving snapshots the payload synchronously and sends it on a spawned task,
//! so the host keeps editing while the request is in flight. The outcome
//! carries the revisions it captured; a success only marks the session clean
//! up to those revisions, and a failure never rolls the scene back.
//!
//! Failures the user should see become [`Notice`]s that the host drains.
//! A project that failed to load (or whose scene did not decode, or whose
//! restore is still waiting on the catalog) refuses to save, so stored data
//! is never overwritten with an empty canvas.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use canvas::catalog::DesignElement;
use canvas::engine::{Action, EngineCore};
use canvas::geom::Size;
use canvas::serial::{SceneError, SerializedScene};

use crate::api::{ApiError, CatalogSource, ProjectMeta, ProjectRecord, ProjectStore, ProjectUpdate};
use crate::config::StudioConfig;
use crate::error::ErrorCode;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-facing message raised by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The project is not loaded, or its scene has not been restored yet.
    #[error("project is not loaded")]
    NotLoaded,

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("save failed: {0}")]
    Save(#[from] ApiError),

    /// The spawned save task panicked or was cancelled.
    #[error("save task failed: {0}")]
    Task(String),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotLoaded => "E_SESSION_NOT_LOADED",
            Self::Scene(_) => "E_SCENE_ENCODE",
            Self::Save(e) => e.error_code(),
            Self::Task(_) => "E_SAVE_TASK",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Save(e) => e.retryable(),
            Self::Task(_) => true,
            Self::NotLoaded | Self::Scene(_) => false,
        }
    }
}

/// Result of a spawned save, tagged with the revisions it captured.
#[derive(Debug)]
pub struct SaveOutcome {
    pub engine_revision: u64,
    pub meta_revision: u64,
    pub result: Result<(), ApiError>,
}

/// Engine and metadata revisions at the last load or successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mark {
    engine: u64,
    meta: u64,
}

// =============================================================================
// SESSION
// =============================================================================

pub struct DesignSession {
    project_id: String,
    engine: EngineCore,
    meta: ProjectMeta,
    meta_revision: u64,
    catalog: Arc<dyn CatalogSource>,
    store: Arc<dyn ProjectStore>,
    loaded: bool,
    clean: Option<Mark>,
    notices: Vec<Notice>,
}

impl DesignSession {
    /// Open `project_id`, fetching the catalog and the project concurrently.
    ///
    /// Never fails outright: fetch and decode problems are reported as
    /// notices and leave the session in a state that refuses to save.
    pub async fn open(
        project_id: impl Into<String>,
        config: &StudioConfig,
        catalog: Arc<dyn CatalogSource>,
        store: Arc<dyn ProjectStore>,
        container: Size,
    ) -> Self {
        let project_id = project_id.into();
        let mut engine = EngineCore::with_history_depth(config.history_depth);
        engine.set_container(container.width, container.height);
        info!(%project_id, "opening project");

        let mut session = Self {
            project_id: project_id.clone(),
            engine,
            meta: ProjectMeta::default(),
            meta_revision: 0,
            catalog: Arc::clone(&catalog),
            store: Arc::clone(&store),
            loaded: false,
            clean: None,
            notices: Vec::new(),
        };

        let mut catalog_fut = catalog.list_templates();
        let mut load_fut = store.load_project(&project_id);
        let mut catalog_done = false;
        let mut load_done = false;
        while !(catalog_done && load_done) {
            tokio::select! {
                result = &mut catalog_fut, if !catalog_done => {
                    catalog_done = true;
                    session.apply_catalog(result);
                }
                result = &mut load_fut, if !load_done => {
                    load_done = true;
                    session.apply_project(result);
                }
            }
        }
        session
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn engine(&self) -> &EngineCore {
        &self.engine
    }

    /// The engine, for forwarding pointer, keyboard and command events.
    pub fn engine_mut(&mut self) -> &mut EngineCore {
        &mut self.engine
    }

    #[must_use]
    pub fn meta(&self) -> &ProjectMeta {
        &self.meta
    }

    /// Loaded and restored: saves are allowed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded && !self.engine.restore_pending()
    }

    /// Edited since the last load or successful save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.is_loaded() && self.clean != Some(self.current_mark())
    }

    /// Take every notice raised since the last call.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // --- Metadata ---

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.update_meta(|meta| meta.name = name);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        self.update_meta(|meta| meta.description = description);
    }

    pub fn set_category_ref(&mut self, category_ref: Option<String>) {
        self.update_meta(|meta| meta.category_ref = category_ref);
    }

    pub fn set_material_ref(&mut self, material_ref: Option<String>) {
        self.update_meta(|meta| meta.material_ref = material_ref);
    }

    pub fn set_selected_fabric_ref(&mut self, fabric_ref: Option<String>) {
        self.update_meta(|meta| meta.selected_fabric_ref = fabric_ref);
    }

    fn update_meta(&mut self, edit: impl FnOnce(&mut ProjectMeta)) {
        let before = self.meta.clone();
        edit(&mut self.meta);
        if self.meta != before {
            self.meta_revision += 1;
        }
    }

    // --- Loading ---

    /// Fetch the catalog again after a failure. Applies a waiting scene.
    pub async fn retry_catalog(&mut self) {
        let result = self.catalog.list_templates().await;
        self.apply_catalog(result);
    }

    /// Load the project again after a failure. Ignored once loaded.
    pub async fn reload_project(&mut self) {
        if self.loaded {
            return;
        }
        let result = self.store.load_project(&self.project_id).await;
        self.apply_project(result);
    }

    fn apply_catalog(&mut self, result: Result<Vec<DesignElement>, ApiError>) {
        match result {
            Ok(templates) => {
                let count = templates.len();
                let actions = self.engine.set_catalog(templates);
                info!(project_id = %self.project_id, count, "catalog loaded");
                self.absorb(&actions);
            }
            Err(e) => {
                warn!(project_id = %self.project_id, error = %e, code = e.error_code(), "catalog fetch failed");
                self.notify(NoticeLevel::Error, format!("Could not load design templates: {e}"));
            }
        }
    }

    fn apply_project(&mut self, result: Result<ProjectRecord, ApiError>) {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(project_id = %self.project_id, error = %e, code = e.error_code(), "project load failed");
                self.notify(NoticeLevel::Error, format!("Could not load project: {e}"));
                return;
            }
        };
        let scene = match record.scene() {
            Ok(Some(scene)) => scene,
            Ok(None) => SerializedScene { locked: record.locked, favorited: record.favorited, ..SerializedScene::default() },
            Err(e) => {
                warn!(project_id = %self.project_id, error = %e, "stored scene did not decode");
                self.notify(NoticeLevel::Error, format!("The saved design could not be read: {e}"));
                return;
            }
        };
        info!(project_id = %self.project_id, shapes = scene.body.len(), "project loaded");
        self.meta = record.meta;
        self.loaded = true;
        let actions = self.engine.load_scene(scene);
        self.absorb(&actions);
    }

    fn absorb(&mut self, actions: &[Action]) {
        for action in actions {
            match action {
                Action::SceneReplaced => {
                    self.clean = Some(self.current_mark());
                    info!(project_id = %self.project_id, revision = self.engine.revision(), "scene restored");
                }
                Action::UnresolvedTemplates { ids } => {
                    warn!(project_id = %self.project_id, count = ids.len(), "scene references missing templates");
                    self.notify(
                        NoticeLevel::Warning,
                        format!("{} design element(s) use templates that are no longer available", ids.len()),
                    );
                }
                _ => {}
            }
        }
    }

    // --- Saving ---

    /// The payload a save would send now.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotLoaded`] before the scene is restored, or
    /// [`SessionError::Scene`] if the scene cannot be encoded.
    pub fn snapshot(&self) -> Result<ProjectUpdate, SessionError> {
        if !self.is_loaded() {
            return Err(SessionError::NotLoaded);
        }
        let scene = self.engine.serialize();
        Ok(ProjectUpdate {
            meta: self.meta.clone(),
            serialized_scene: scene.to_json()?,
            locked: scene.locked,
            favorited: scene.favorited,
        })
    }

    /// Snapshot now and send on a background task. Editing may continue;
    /// pass the task's outcome to [`DesignSession::finish_save`].
    ///
    /// # Errors
    ///
    /// See [`DesignSession::snapshot`].
    pub fn spawn_save(&self) -> Result<JoinHandle<SaveOutcome>, SessionError> {
        let update = self.snapshot()?;
        let mark = self.current_mark();
        let store = Arc::clone(&self.store);
        let project_id = self.project_id.clone();
        info!(%project_id, revision = mark.engine, "saving project");

        Ok(tokio::spawn(async move {
            let result = store.save_project(&project_id, &update).await;
            SaveOutcome { engine_revision: mark.engine, meta_revision: mark.meta, result }
        }))
    }

    /// Record a save's outcome. The scene is never rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Save`] if the save failed; a notice is raised too.
    pub fn finish_save(&mut self, outcome: SaveOutcome) -> Result<(), SessionError> {
        match outcome.result {
            Ok(()) => {
                let saved = Mark { engine: outcome.engine_revision, meta: outcome.meta_revision };
                let advances = self.clean.is_none_or(|c| saved.engine >= c.engine && saved.meta >= c.meta);
                if advances {
                    self.clean = Some(saved);
                }
                info!(project_id = %self.project_id, revision = saved.engine, dirty = self.is_dirty(), "project saved");
                Ok(())
            }
            Err(e) => {
                warn!(project_id = %self.project_id, error = %e, code = e.error_code(), "project save failed");
                self.notify(NoticeLevel::Error, format!("Could not save project: {e}"));
                Err(SessionError::Save(e))
            }
        }
    }

    /// Save and wait for the result.
    ///
    /// # Errors
    ///
    /// See [`DesignSession::spawn_save`] and [`DesignSession::finish_save`].
    pub async fn save(&mut self) -> Result<(), SessionError> {
        let outcome = self.spawn_save()?.await.map_err(|e| SessionError::Task(e.to_string()))?;
        self.finish_save(outcome)
    }

    fn current_mark(&self) -> Mark {
        Mark { engine: self.engine.revision(), meta: self.meta_revision }
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.push(Notice::new(level, message));
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
