//! Design canvas engine for the garment customizer.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! interactive part of the design page: placing catalog templates over the
//! fabric, moving, resizing, rotating and cropping them, snapping committed
//! geometry to the grid, keeping a linear undo/redo history, and converting
//! the scene to and from the JSON blob the persistence service stores. The
//! host page only wires DOM events to the engine, paints the
//! [`render::RenderPlan`] it produces, and forwards the resulting
//! [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Interaction controller ([`engine::EngineCore`]) |
//! | [`doc`] | Placed shapes, regions, and the scene store |
//! | [`catalog`] | Read-only template catalog and visual resolution |
//! | [`history`] | Snapshot-based undo/redo stacks |
//! | [`serial`] | Scene JSON format and deferred restoration |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing shapes, resize/rotate handles and crop handles |
//! | [`geom`] | Points, rects, grid snapping and clamping |
//! | [`render`] | Display list for the host to paint |
//! | [`wasm`] | `wasm-bindgen` surface for the browser host |
//! | [`consts`] | Shared numeric constants (grid unit, handle sizes, etc.) |

pub mod catalog;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod geom;
pub mod hit;
pub mod history;
pub mod input;
pub mod render;
pub mod serial;
pub mod wasm;
