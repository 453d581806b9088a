//! Catalog and project services.
//!
//! DESIGN
//! ======
//! The design page talks to two REST services: the template catalog (read
//! only) and the project store (load and save). Both sit behind `async_trait`
//! seams so the session can be driven by in-memory fakes in tests;
//! [`http::HttpApi`] is the production implementation of both.

pub mod http;
pub mod types;

use canvas::catalog::DesignElement;

pub use types::{ApiError, ProjectMeta, ProjectRecord, ProjectUpdate};

/// Read access to the template catalog.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Every template, active or retired.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the response is malformed.
    async fn list_templates(&self) -> Result<Vec<DesignElement>, ApiError>;
}

/// Load and save access to stored projects.
#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    /// Fetch one project.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown id, or another
    /// [`ApiError`] if the request fails.
    async fn load_project(&self, project_id: &str) -> Result<ProjectRecord, ApiError>;

    /// Replace a project's metadata and scene.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or is rejected.
    async fn save_project(&self, project_id: &str, update: &ProjectUpdate) -> Result<(), ApiError>;
}
