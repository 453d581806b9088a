//! Template catalog adapter.
//!
//! Wraps the list returned by the external template service in an immutable,
//! id-indexed [`Catalog`]. Templates with `active = false` are hidden from the
//! palette but still resolvable by id, so scenes saved before a template was
//! retired keep rendering.
//!
//! Readiness is an explicit flag rather than "has entries": a catalog that
//! loaded successfully but is empty is still ready, and scene restoration
//! waits on [`Catalog::is_ready`] alone.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::doc::TemplateId;

/// A master graphic supplied by the catalog. Never placed directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignElement {
    /// Catalog identifier; placed shapes reference this.
    pub id: TemplateId,
    /// Human-readable name shown in the palette.
    pub name: String,
    /// Category tag used to group the palette.
    #[serde(default)]
    pub category: String,
    /// Inactive templates are excluded from the palette.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Reference to the template's artwork (URL or asset key).
    pub image_ref: String,
}

fn default_active() -> bool {
    true
}

impl DesignElement {
    /// The template's draw procedure: its visual for a given colour.
    #[must_use]
    pub fn draw(&self, color: &str) -> Visual {
        Visual::Template { template_id: self.id.clone(), image_ref: self.image_ref.clone(), color: color.to_string() }
    }
}

/// What the host should paint for a shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Visual {
    /// Template artwork tinted with `color`.
    Template { template_id: TemplateId, image_ref: String, color: String },
    /// Flat colour block for a shape whose template cannot be resolved.
    Fallback { color: String },
}

/// Immutable, indexed list of templates for one editing session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: Vec<DesignElement>,
    index: HashMap<TemplateId, usize>,
    ready: bool,
}

impl Catalog {
    /// A catalog whose fetch has not resolved yet.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// A loaded catalog. Later duplicates of an id are ignored.
    #[must_use]
    pub fn from_templates(templates: Vec<DesignElement>) -> Self {
        let mut kept = Vec::with_capacity(templates.len());
        let mut index = HashMap::with_capacity(templates.len());
        for t in templates {
            if index.contains_key(&t.id) {
                continue;
            }
            index.insert(t.id.clone(), kept.len());
            kept.push(t);
        }
        Self { templates: kept, index, ready: true }
    }

    /// Whether the catalog fetch has resolved.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Look up a template by id, active or not.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DesignElement> {
        self.index.get(id).and_then(|&i| self.templates.get(i))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Every template, in catalog order.
    #[must_use]
    pub fn all(&self) -> &[DesignElement] {
        &self.templates
    }

    /// Active templates, in catalog order.
    pub fn palette(&self) -> impl Iterator<Item = &DesignElement> {
        self.templates.iter().filter(|t| t.active)
    }

    /// Active templates carrying the given category tag.
    pub fn palette_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a DesignElement> {
        self.palette().filter(move |t| t.category == category)
    }

    /// Distinct category tags of active templates, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.palette().map(|t| t.category.as_str()).collect();
        set.into_iter().collect()
    }

    /// Resolve the visual for a template id and colour.
    ///
    /// Unknown ids resolve to [`Visual::Fallback`].
    #[must_use]
    pub fn visual(&self, template_id: &str, color: &str) -> Visual {
        match self.get(template_id) {
            Some(t) => t.draw(color),
            None => Visual::Fallback { color: color.to_string() },
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
