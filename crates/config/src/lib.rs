//! Build configuration for modsmith
//!
//! This crate layers the project configuration (built-in defaults, then
//! `modsmith.toml`, then `MODSMITH_*` environment variables) and owns the
//! lookup from module names to remote artifact coordinates.

pub mod build_config;
pub mod coordinates;
pub mod placeholder;
pub mod target;

pub use build_config::{BuildConfig, BuildConfigBuilder, ConfigSource, LibraryModifier};
pub use coordinates::{Coordinate, CoordinateTable, PatternEntry};
pub use placeholder::Platform;
pub use target::{FetchTarget, LinkOverride};
