//! REST client for the catalog and project services.
//!
//! Thin wrapper over `reqwest`. Status handling and body parsing are pure
//! functions so they can be tested without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use canvas::catalog::DesignElement;

use super::types::{ApiError, ProjectRecord, ProjectUpdate};
use super::{CatalogSource, ProjectStore};
use crate::config::StudioConfig;

const TEMPLATES_PATH: &str = "design-elements";
const PROJECTS_PATH: &str = "projects";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpApi {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpApi {
    /// Build a client from config.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the base URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(config: &StudioConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        let base_url = Url::parse(&config.api_base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        Ok(Self { http, base_url, token: config.api_token.clone() })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return the status and body text.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<(u16, String), ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Request(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait]
impl CatalogSource for HttpApi {
    async fn list_templates(&self) -> Result<Vec<DesignElement>, ApiError> {
        let url = endpoint(&self.base_url, &[TEMPLATES_PATH])?;
        let (status, body) = self.send(self.request(reqwest::Method::GET, url)).await?;
        check_status(status, body).and_then(|body| parse_templates(&body))
    }
}

#[async_trait]
impl ProjectStore for HttpApi {
    async fn load_project(&self, project_id: &str) -> Result<ProjectRecord, ApiError> {
        let url = endpoint(&self.base_url, &[PROJECTS_PATH, project_id])?;
        let (status, body) = self.send(self.request(reqwest::Method::GET, url)).await?;
        if status == 404 {
            return Err(ApiError::NotFound(project_id.to_string()));
        }
        check_status(status, body).and_then(|body| parse_project(&body, project_id))
    }

    async fn save_project(&self, project_id: &str, update: &ProjectUpdate) -> Result<(), ApiError> {
        let url = endpoint(&self.base_url, &[PROJECTS_PATH, project_id])?;
        let (status, body) = self.send(self.request(reqwest::Method::PUT, url).json(update)).await?;
        if status == 404 {
            return Err(ApiError::NotFound(project_id.to_string()));
        }
        check_status(status, body)?;
        debug!(%project_id, "project saved");
        Ok(())
    }
}

// =============================================================================
// URLS
// =============================================================================

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ApiError::InvalidUrl(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// =============================================================================
// PARSING
// =============================================================================

/// Pass the body through on 2xx, otherwise turn it into [`ApiError::Status`].
pub(crate) fn check_status(status: u16, body: String) -> Result<String, ApiError> {
    if (200..300).contains(&status) { Ok(body) } else { Err(ApiError::Status { status, body }) }
}

pub(crate) fn parse_templates(json: &str) -> Result<Vec<DesignElement>, ApiError> {
    serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Decode a project body. A body without an `id` takes the requested one.
pub(crate) fn parse_project(json: &str, project_id: &str) -> Result<ProjectRecord, ApiError> {
    let mut record: ProjectRecord = serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))?;
    if record.id.is_empty() {
        record.id = project_id.to_string();
    }
    Ok(record)
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
