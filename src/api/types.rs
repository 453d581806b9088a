//! Wire types and errors for the catalog and project services.

use serde::{Deserialize, Serialize};

use canvas::serial::{SceneError, SerializedScene};

use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by catalog and project service calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// A request URL could not be built from the base URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("request failed: {0}")]
    Request(String),

    /// The project does not exist.
    #[error("project {0} not found")]
    NotFound(String),

    /// The service returned a non-success HTTP status.
    #[error("service responded with status {status}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("response parse failed: {0}")]
    Parse(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::InvalidUrl(_) => "E_INVALID_URL",
            Self::Request(_) => "E_API_REQUEST",
            Self::NotFound(_) => "E_PROJECT_NOT_FOUND",
            Self::Status { .. } => "E_API_STATUS",
            Self::Parse(_) => "E_API_PARSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// PROJECTS
// =============================================================================

/// Editable project metadata, saved alongside the scene.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_ref: Option<String>,
    #[serde(default)]
    pub material_ref: Option<String>,
    #[serde(default)]
    pub selected_fabric_ref: Option<String>,
}

/// A project as returned by `GET /projects/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub meta: ProjectMeta,
    /// Embedded scene object, a JSON-encoded string of it, or null.
    #[serde(default)]
    pub serialized_scene: serde_json::Value,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub favorited: bool,
}

impl ProjectRecord {
    /// Decode the stored scene. `None` for a project that has never been saved.
    ///
    /// The record's top-level `locked`/`favorited` win over the copies inside
    /// the scene blob.
    ///
    /// # Errors
    ///
    /// Returns a [`SceneError`] if the stored scene does not decode.
    pub fn scene(&self) -> Result<Option<SerializedScene>, SceneError> {
        let scene = SerializedScene::from_value(self.serialized_scene.clone())?;
        Ok(scene.map(|s| SerializedScene { locked: self.locked, favorited: self.favorited, ..s }))
    }
}

/// Body of `PUT /projects/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    #[serde(flatten)]
    pub meta: ProjectMeta,
    /// The scene blob, JSON-encoded.
    pub serialized_scene: String,
    pub locked: bool,
    pub favorited: bool,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
