//! Persistent cross-session memory.
//!
//! Memory is three section-addressable markdown files in a resolved project
//! directory. `paths` decides where they live, `document` gives them structure,
//! and `store` owns loading, auto-heal, caching, and section updates.

pub mod document;
pub mod paths;
pub mod store;

pub use document::MemoryDocument;
pub use store::{Memory, MemoryStore};
