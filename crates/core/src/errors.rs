use std::path::PathBuf;
use std::sync::Arc;

/// Result type alias for modsmith operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for modsmith operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Tool invocation errors
    #[error("{}", format_command_error(.command, .args, .message, .exit_code))]
    CommandExecution {
        command: String,
        args: Vec<String>,
        message: String,
        exit_code: Option<i32>,
    },

    /// Two or more distinct concrete versions requested for one module
    #[error("multiple versions requested for module '{module}': {}", .versions.join(", "))]
    VersionConflict {
        module: String,
        versions: Vec<String>,
    },

    /// A missing module has no coordinate entry in any lookup layer
    #[error("module '{module}' is not mapped to any remote coordinate")]
    UnmappedModule { module: String },

    /// A module stayed missing after every permitted fetch attempt
    #[error("could not resolve module '{module}' after {attempts} fetch attempt(s)")]
    UnresolvedModule { module: String, attempts: u32 },

    /// Module descriptor source text that does not match the expected shape
    #[error("malformed module descriptor '{path}': {message}")]
    MalformedDescriptor { path: PathBuf, message: String },

    /// Unparsable module version strings
    #[error("invalid version '{value}': {message}")]
    InvalidVersion { value: String, message: String },

    /// Unparsable remote coordinates
    #[error("invalid coordinate '{value}': {message}")]
    InvalidCoordinate { value: String, message: String },

    /// Module archives that cannot be read
    #[error("failed to read module archive '{path}': {message}")]
    Archive { path: PathBuf, message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Network-related errors
    #[error("network error for '{endpoint}': {message}")]
    Network { endpoint: String, message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A leaf action panicked instead of returning an error
    #[error("task '{task}' panicked: {message}")]
    TaskPanicked { task: String, message: String },

    /// Raised when asserting on the summary of a failed build
    #[error("{task} failed")]
    BuildFailed {
        task: String,
        /// Root of the tree the failing task belongs to
        root: String,
        #[source]
        source: Arc<Error>,
    },
}

fn format_command_error(
    tool: &str,
    args: &[String],
    message: &str,
    exit_code: &Option<i32>,
) -> String {
    let invocation = std::iter::once(tool)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    match exit_code {
        Some(code) => format!("command '{invocation}' failed with exit code {code}: {message}"),
        None => format!("command '{invocation}' failed: {message}"),
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a command execution error
    #[must_use]
    pub fn command_execution(
        command: impl Into<String>,
        args: Vec<String>,
        message: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Error::CommandExecution {
            command: command.into(),
            args,
            message: message.into(),
            exit_code,
        }
    }

    /// Create a version conflict error
    #[must_use]
    pub fn version_conflict<V: ToString>(
        module: impl Into<String>,
        versions: impl IntoIterator<Item = V>,
    ) -> Self {
        Error::VersionConflict {
            module: module.into(),
            versions: versions.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Create an unmapped module error
    #[must_use]
    pub fn unmapped_module(module: impl Into<String>) -> Self {
        Error::UnmappedModule {
            module: module.into(),
        }
    }

    /// Create an unresolved module error
    #[must_use]
    pub fn unresolved_module(module: impl Into<String>, attempts: u32) -> Self {
        Error::UnresolvedModule {
            module: module.into(),
            attempts,
        }
    }

    /// Create a malformed descriptor error
    #[must_use]
    pub fn malformed_descriptor(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::MalformedDescriptor {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid version error
    #[must_use]
    pub fn invalid_version(value: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidVersion {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an invalid coordinate error
    #[must_use]
    pub fn invalid_coordinate(value: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidCoordinate {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an archive error
    #[must_use]
    pub fn archive(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Archive {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a network error
    #[must_use]
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a task panic error
    #[must_use]
    pub fn task_panicked(task: impl Into<String>, message: impl Into<String>) -> Self {
        Error::TaskPanicked {
            task: task.into(),
            message: message.into(),
        }
    }

    /// Create a build failure for `task` below `root`, wrapping the original cause
    #[must_use]
    pub fn build_failed(
        task: impl Into<String>,
        root: impl Into<String>,
        source: Arc<Error>,
    ) -> Self {
        Error::BuildFailed {
            task: task.into(),
            root: root.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_command_error_formatting() {
        let err = Error::command_execution(
            "javac",
            vec!["--version".to_string()],
            "boom",
            Some(2),
        );
        assert_eq!(
            err.to_string(),
            "command 'javac --version' failed with exit code 2: boom"
        );

        let err = Error::command_execution("jar", vec![], "not found", None);
        assert_eq!(err.to_string(), "command 'jar' failed: not found");
    }

    #[test]
    fn test_version_conflict_names_module_and_versions() {
        let err = Error::version_conflict("mod.a", ["1.0", "2.0"]);
        let message = err.to_string();
        assert!(message.contains("mod.a"));
        assert!(message.contains("1.0, 2.0"));
    }

    #[test]
    fn test_build_failed_keeps_source() {
        let cause = Arc::new(Error::configuration("bad"));
        let err = Error::build_failed("compile", "Build app", Arc::clone(&cause));
        assert_eq!(err.to_string(), "compile failed");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("configuration error: bad"));
    }
}
