//! Pipeline stages that run before any document is handed to the renderer.
//!
//! ## Data Flow
//!
//! ```text
//! workspace ──▶ workspace ──▶ input ──▶ (dispatch)
//! (dist)        (assets)      (path)
//! ```
//!
//! 1. [`workspace`] — wipe and recreate an output directory
//! 2. [`input`]     — classify the user path and pick eligible documents

pub mod input;
pub mod workspace;
