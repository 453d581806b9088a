//! Service edge of the garment design page.
//!
//! DESIGN
//! ======
//! The interactive canvas lives in the `canvas` crate and knows nothing about
//! the network. This crate wires it to the outside: typed configuration from
//! the environment, a REST client for the template catalog and the project
//! store, and a [`session::DesignSession`] that opens a project, feeds the
//! catalog and the stored scene into the engine in whichever order they
//! arrive, and saves without blocking editing.
//!
//! Logging goes through `tracing`; installing a subscriber is left to the
//! embedding binary.

pub mod api;
pub mod config;
pub mod error;
pub mod session;

pub use canvas;
