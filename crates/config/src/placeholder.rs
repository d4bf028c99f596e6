//! Placeholders recognized in coordinates and link overrides

use modsmith_core::Version;

pub const VERSION: &str = "${VERSION}";
pub const JAVAFX_PLATFORM: &str = "${JAVAFX_PLATFORM}";
pub const LWJGL_NATIVES: &str = "${LWJGL_NATIVES}";

/// Platform-specific classifier values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub javafx: &'static str,
    pub lwjgl_natives: &'static str,
}

impl Platform {
    /// The platform this process runs on
    pub fn host() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    pub fn for_os(os: &str) -> Self {
        match os {
            "macos" => Self {
                javafx: "mac",
                lwjgl_natives: "natives-macos",
            },
            "windows" => Self {
                javafx: "win",
                lwjgl_natives: "natives-windows",
            },
            _ => Self {
                javafx: "linux",
                lwjgl_natives: "natives-linux",
            },
        }
    }

    /// Replace every known placeholder in `template`.
    ///
    /// `${VERSION}` is left untouched when no version is given.
    pub fn expand(&self, template: &str, version: Option<&Version>) -> String {
        let mut expanded = template
            .replace(JAVAFX_PLATFORM, self.javafx)
            .replace(LWJGL_NATIVES, self.lwjgl_natives);
        if let Some(version) = version {
            expanded = expanded.replace(VERSION, version.as_str());
        }
        expanded
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::host()
    }
}
