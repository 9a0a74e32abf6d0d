//! Core traits and plumbing shared by every Lectern crate: layered
//! settings, the module lifecycle trait, and the module registry.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
