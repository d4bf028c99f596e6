/// Constants used throughout the modsmith codebase
// Project configuration
pub const CONFIG_FILENAME: &str = "modsmith.toml";
pub const ENV_PREFIX: &str = "MODSMITH_";

// Default directory layout, relative to the project base
pub const DEFAULT_LIBRARY_DIR: &str = "lib";
pub const DEFAULT_SOURCE_DIR: &str = "src";
pub const DEFAULT_WORKSPACE_DIR: &str = ".modsmith/workspace";

// Remote repository
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";

// Module descriptors
pub const MODULE_INFO_JAVA: &str = "module-info.java";
pub const MODULE_INFO_CLASS: &str = "module-info.class";
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const AUTOMATIC_MODULE_NAME: &str = "Automatic-Module-Name";
pub const ARCHIVE_EXTENSION: &str = "jar";

// Extended attribute holding the cache-validation tag of a fetched artifact
pub const ETAG_ATTRIBUTE: &str = "user.etag";

// Resolution bound
pub const DEFAULT_MAX_FETCH_ATTEMPTS: u32 = 3;
