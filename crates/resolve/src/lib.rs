//! Module resolution for modsmith
//!
//! Providers report which modules are declared and which are required. The
//! [`Resolver`] fetches every required module that no provider declares into
//! the library directory, rescanning the library after each round until
//! nothing is missing.

pub mod action;
pub mod classfile;
pub mod fetcher;
pub mod library;
pub mod modifiers;
pub mod provider;
pub mod resolver;
pub mod runtime;
pub mod source;

pub use action::ResolveMissingModules;
pub use fetcher::ArtifactFetcher;
pub use library::{automatic_module_name, describe_archive, LibraryProvider};
pub use provider::{ModuleProvider, ModuleScan, ProviderKind};
pub use resolver::{FetchedModule, Resolution, Resolver};
pub use runtime::RuntimeProvider;
pub use source::SourceProvider;
