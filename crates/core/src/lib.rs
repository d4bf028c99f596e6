//! Core domain types and errors for `modsmith`.
//!
//! This crate establishes the foundational data structures and error handling
//! used by every other crate in the workspace.
//!
//! ## Key Components
//!
//! - **`errors`**: The primary `Error` enum and `Result` alias, centralizing
//!   the failure modes of task execution and module resolution.
//! - **`version`**: A structured module `Version` parsed once at the boundary,
//!   with well-defined equality and ordering.
//! - **`module`**: Module descriptors and their `requires` clauses.
//! - **`requires`**: The `RequiresMap` used to merge requirements from several
//!   providers and detect version conflicts.
//! - **`constants`**: Shared file names and defaults.

pub mod constants;
pub mod errors;
pub mod module;
pub mod requires;
pub mod version;

pub use self::{
    constants::*,
    errors::{Error, Result},
    module::{ModuleDescriptor, ModuleRequires, RequiresModifier},
    requires::{Requirement, RequiresMap},
    version::Version,
};
