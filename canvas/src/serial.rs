//! Scene serialization and deferred restoration.
//!
//! The persistence service stores a scene as an opaque JSON blob:
//!
//! ```json
//! { "body": [PlacedShape, ...], "locked": false, "favorited": false }
//! ```
//!
//! Shapes carry only their `templateId`; the visual is looked up in the
//! catalog at render time. Restoring a scene therefore needs a *ready*
//! catalog. Catalog fetch and scene load race, so [`RestoreGate`] parks the
//! loaded scene until the catalog is ready and applies it at most once per
//! load, which keeps a late catalog from clobbering edits made after the
//! restore.

#[cfg(test)]
#[path = "serial_test.rs"]
mod serial_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::Catalog;
use crate::consts::GRID_UNIT;
use crate::doc::{InstanceId, PlacedShape, Region, Scene, SceneStore};
use crate::geom::normalize_degrees;

/// Errors produced while decoding a stored scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The blob is not valid scene JSON.
    #[error("scene JSON is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The stored value is neither an object, a JSON string, nor null.
    #[error("scene JSON must be an object, a string or null, got {0}")]
    UnexpectedType(&'static str),
}

/// Catalog-independent form of every region's scene plus the design flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedScene {
    #[serde(default)]
    pub body: Vec<PlacedShape>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub favorited: bool,
}

impl SerializedScene {
    /// Shapes stored for `region`.
    #[must_use]
    pub fn shapes(&self, region: Region) -> &[PlacedShape] {
        match region {
            Region::Body => &self.body,
        }
    }

    fn shapes_mut(&mut self, region: Region) -> &mut Vec<PlacedShape> {
        match region {
            Region::Body => &mut self.body,
        }
    }

    /// Encode as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Malformed`] if a value cannot be encoded (non-finite numbers).
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Malformed`] if the text is not a valid scene.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode the `serializedScene` field of a stored project.
    ///
    /// Accepts an embedded object, a JSON-encoded string, or null (no scene yet).
    ///
    /// # Errors
    ///
    /// Returns a [`SceneError`] if the value is of another type or does not decode.
    pub fn from_value(value: serde_json::Value) -> Result<Option<Self>, SceneError> {
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
            serde_json::Value::String(s) => Self::from_json(&s).map(Some),
            v @ serde_json::Value::Object(_) => Ok(Some(serde_json::from_value(v)?)),
            serde_json::Value::Array(_) => Err(SceneError::UnexpectedType("array")),
            serde_json::Value::Bool(_) => Err(SceneError::UnexpectedType("bool")),
            serde_json::Value::Number(_) => Err(SceneError::UnexpectedType("number")),
        }
    }
}

/// Capture every region of `store` together with the design flags.
#[must_use]
pub fn serialize(store: &SceneStore, locked: bool, favorited: bool) -> SerializedScene {
    let mut out = SerializedScene { body: Vec::new(), locked, favorited };
    for region in Region::ALL {
        out.shapes_mut(region).clone_from(&store.scene_of(region).shapes);
    }
    out
}

/// A decoded scene ready to be applied to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredScene {
    pub regions: Vec<(Region, Scene)>,
    pub locked: bool,
    pub favorited: bool,
}

/// Outcome of restoring a serialized scene against a catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Restore {
    /// The catalog is not ready; try again once it is.
    Deferred,
    /// Every shape resolved to a catalog template.
    Complete(RestoredScene),
    /// Some shapes reference templates the catalog lacks. They are kept and
    /// render as a flat colour block.
    Partial { scene: RestoredScene, unresolved: Vec<InstanceId> },
}

/// Rebuild the scene from `serialized`, reattaching shapes to `catalog`.
#[must_use]
pub fn restore(serialized: &SerializedScene, catalog: &Catalog) -> Restore {
    if !catalog.is_ready() {
        return Restore::Deferred;
    }

    let mut seen = HashSet::new();
    let mut unresolved = Vec::new();
    let mut regions = Vec::with_capacity(Region::ALL.len());

    for region in Region::ALL {
        let mut shapes = Vec::with_capacity(serialized.shapes(region).len());
        for shape in serialized.shapes(region) {
            if !seen.insert(shape.instance_id) {
                warn!(instance_id = %shape.instance_id, "dropping shape with duplicate instance id");
                continue;
            }
            if !catalog.contains(&shape.template_id) {
                unresolved.push(shape.instance_id);
            }
            shapes.push(sanitize(shape.clone()));
        }
        regions.push((region, Scene::new(shapes)));
    }

    let scene = RestoredScene { regions, locked: serialized.locked, favorited: serialized.favorited };
    if unresolved.is_empty() {
        Restore::Complete(scene)
    } else {
        warn!(count = unresolved.len(), "restored scene references templates missing from the catalog");
        Restore::Partial { scene, unresolved }
    }
}

/// Bring stored geometry back inside the model's invariants. Valid shapes pass unchanged.
fn sanitize(mut shape: PlacedShape) -> PlacedShape {
    for v in [&mut shape.x, &mut shape.y] {
        if !v.is_finite() {
            *v = 0.0;
        }
    }
    for v in [&mut shape.width, &mut shape.height] {
        if !v.is_finite() || *v <= 0.0 {
            *v = GRID_UNIT;
        }
    }
    shape.rotation = if shape.rotation.is_finite() { normalize_degrees(shape.rotation) } else { 0.0 };
    shape.crop_insets = shape.crop_insets.map(crate::doc::CropInsets::clamped);
    shape
}

/// Holds a loaded scene until the catalog is ready, then releases it once.
#[derive(Debug, Clone, Default)]
pub struct RestoreGate {
    pending: Option<SerializedScene>,
    restored: bool,
}

impl RestoreGate {
    /// Start a new load. Any earlier pending scene is discarded.
    pub fn begin(&mut self, serialized: SerializedScene) {
        self.pending = Some(serialized);
        self.restored = false;
    }

    /// Try to restore. Returns `None` while the catalog is not ready, when no
    /// load is pending, or once this load has already been restored.
    pub fn poll(&mut self, catalog: &Catalog) -> Option<Restore> {
        if self.restored {
            return None;
        }
        let serialized = self.pending.as_ref()?;
        match restore(serialized, catalog) {
            Restore::Deferred => None,
            outcome => {
                self.pending = None;
                self.restored = true;
                Some(outcome)
            }
        }
    }

    /// Whether a loaded scene is waiting for the catalog.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the current load has been applied.
    #[must_use]
    pub fn is_restored(&self) -> bool {
        self.restored
    }
}
