//! `wasm-bindgen` surface for the browser host.
//!
//! [`DesignCanvas`] wraps [`EngineCore`] with a JavaScript-friendly API:
//! plain numbers, strings and booleans in, JSON strings out. Every event
//! method returns the resulting [`Action`] list as a JSON array; the host
//! applies cursor changes, schedules animation frames and repaints from
//! [`DesignCanvas::render_plan`].
//!
//! Modifier keys travel as a bit set: `1` shift, `2` ctrl, `4` alt, `8` meta.
//! Buttons use DOM `MouseEvent.button` numbering.

#[cfg(test)]
#[path = "wasm_test.rs"]
mod wasm_test;

use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;

use crate::catalog::DesignElement;
use crate::doc::CropEdge;
use crate::engine::{Action, EngineCore};
use crate::geom::Point;
use crate::input::{Button, Key, Modifiers};
use crate::render;
use crate::serial::SerializedScene;

const MOD_SHIFT: u8 = 1;
const MOD_CTRL: u8 = 2;
const MOD_ALT: u8 = 4;
const MOD_META: u8 = 8;

/// Browser-facing design canvas controller.
#[wasm_bindgen]
pub struct DesignCanvas {
    core: EngineCore,
}

#[wasm_bindgen]
impl DesignCanvas {
    /// Create a controller for a `width × height` canvas region.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let mut core = EngineCore::new();
        core.set_container(width, height);
        Self { core }
    }

    /// Like [`DesignCanvas::new`] but with a custom undo depth.
    #[must_use]
    pub fn with_history_depth(width: f64, height: f64, depth: u32) -> Self {
        let mut core = EngineCore::with_history_depth(usize::try_from(depth).unwrap_or(usize::MAX));
        core.set_container(width, height);
        Self { core }
    }

    pub fn set_container(&mut self, width: f64, height: f64) {
        self.core.set_container(width, height);
    }

    // --- Data ---

    /// Install the template catalog from a JSON array of design elements.
    ///
    /// # Errors
    ///
    /// Returns a message if the JSON does not decode.
    pub fn set_catalog(&mut self, json: &str) -> Result<String, String> {
        let templates: Vec<DesignElement> = serde_json::from_str(json).map_err(|e| format!("invalid catalog: {e}"))?;
        Ok(actions_json(&self.core.set_catalog(templates)))
    }

    /// Load a stored scene. Accepts the object itself, a JSON-encoded
    /// string of it, or `null`/`""` for a project without a scene yet.
    ///
    /// # Errors
    ///
    /// Returns a message if the scene does not decode.
    pub fn load_scene(&mut self, json: &str) -> Result<String, String> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(|e| format!("invalid scene: {e}"))?;
        let scene = SerializedScene::from_value(value).map_err(|e| e.to_string())?.unwrap_or_default();
        Ok(actions_json(&self.core.load_scene(scene)))
    }

    /// The scene as the JSON blob the persistence service stores.
    ///
    /// # Errors
    ///
    /// Returns a message if a shape holds a non-finite number.
    pub fn serialize_scene(&self) -> Result<String, String> {
        self.core.serialize().to_json().map_err(|e| e.to_string())
    }

    /// Active templates as a JSON array, for the palette.
    #[must_use]
    pub fn palette(&self) -> String {
        to_json(&self.core.catalog().palette().collect::<Vec<_>>())
    }

    // --- Pointer ---

    pub fn pointer_down(&mut self, x: f64, y: f64, button: i16, mods: u8) -> String {
        let Some(button) = button_from(button) else {
            return actions_json(&[]);
        };
        actions_json(&self.core.on_pointer_down(Point::new(x, y), button, modifiers(mods)))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, mods: u8) -> String {
        actions_json(&self.core.on_pointer_move(Point::new(x, y), modifiers(mods)))
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, button: i16, mods: u8) -> String {
        let Some(button) = button_from(button) else {
            return actions_json(&[]);
        };
        actions_json(&self.core.on_pointer_up(Point::new(x, y), button, modifiers(mods)))
    }

    // --- Keyboard ---

    pub fn key_down(&mut self, key: &str, mods: u8) -> String {
        actions_json(&self.core.on_key_down(&Key::new(key), modifiers(mods)))
    }

    pub fn key_up(&mut self, key: &str, mods: u8) -> String {
        actions_json(&self.core.on_key_up(&Key::new(key), modifiers(mods)))
    }

    pub fn animation_frame(&mut self) -> String {
        actions_json(&self.core.on_animation_frame())
    }

    // --- Commands ---

    pub fn begin_create(&mut self, template_id: &str) -> String {
        actions_json(&self.core.begin_create(template_id))
    }

    pub fn cancel_create(&mut self) -> String {
        actions_json(&self.core.cancel_create())
    }

    pub fn enter_crop(&mut self) -> String {
        actions_json(&self.core.enter_crop())
    }

    pub fn exit_crop(&mut self) -> String {
        actions_json(&self.core.exit_crop())
    }

    /// Set one crop inset by edge name (`top`, `right`, `bottom`, `left`).
    ///
    /// # Errors
    ///
    /// Returns a message for an unknown edge name.
    pub fn set_crop_inset(&mut self, edge: &str, value: f64) -> Result<String, String> {
        let edge = crop_edge_from(edge).ok_or_else(|| format!("unknown crop edge: {edge}"))?;
        Ok(actions_json(&self.core.set_crop_inset(edge, value)))
    }

    pub fn duplicate_selected(&mut self) -> String {
        actions_json(&self.core.duplicate_selected())
    }

    pub fn delete_selected(&mut self) -> String {
        actions_json(&self.core.delete_selected())
    }

    pub fn recolor_selected(&mut self, color: &str) -> String {
        actions_json(&self.core.recolor_selected(color))
    }

    pub fn reset_scene(&mut self) -> String {
        actions_json(&self.core.reset_scene())
    }

    pub fn undo(&mut self) -> String {
        actions_json(&self.core.undo())
    }

    pub fn redo(&mut self) -> String {
        actions_json(&self.core.redo())
    }

    pub fn set_locked(&mut self, locked: bool) -> String {
        actions_json(&self.core.set_locked(locked))
    }

    pub fn set_favorited(&mut self, favorited: bool) {
        self.core.set_favorited(favorited);
    }

    pub fn set_active_color(&mut self, color: &str) {
        self.core.set_active_color(color);
    }

    // --- Queries ---

    /// Display list for the current state as JSON.
    #[must_use]
    pub fn render_plan(&self) -> String {
        to_json(&render::plan(&self.core))
    }

    /// Selected instance id, if any.
    #[must_use]
    pub fn selection(&self) -> Option<String> {
        self.core.selection().map(|id| id.to_string())
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.core.revision()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.core.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.core.can_redo()
    }

    #[must_use]
    pub fn locked(&self) -> bool {
        self.core.ui().locked
    }

    #[must_use]
    pub fn favorited(&self) -> bool {
        self.core.ui().favorited
    }

    #[must_use]
    pub fn restore_pending(&self) -> bool {
        self.core.restore_pending()
    }
}

fn modifiers(bits: u8) -> Modifiers {
    Modifiers {
        shift: bits & MOD_SHIFT != 0,
        ctrl: bits & MOD_CTRL != 0,
        alt: bits & MOD_ALT != 0,
        meta: bits & MOD_META != 0,
    }
}

fn button_from(button: i16) -> Option<Button> {
    match button {
        0 => Some(Button::Primary),
        1 => Some(Button::Middle),
        2 => Some(Button::Secondary),
        _ => None,
    }
}

fn crop_edge_from(name: &str) -> Option<CropEdge> {
    match name {
        "top" => Some(CropEdge::Top),
        "right" => Some(CropEdge::Right),
        "bottom" => Some(CropEdge::Bottom),
        "left" => Some(CropEdge::Left),
        _ => None,
    }
}

fn actions_json(actions: &[Action]) -> String {
    to_json(&actions)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to encode value for the host");
            "null".to_string()
        }
    }
}
