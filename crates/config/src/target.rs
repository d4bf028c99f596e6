use modsmith_core::{Version, ARCHIVE_EXTENSION};
use serde::{Deserialize, Serialize};

/// Explicit per-module artifact location, checked before any coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOverride {
    /// May contain `${VERSION}`
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

/// A concrete artifact to fetch for one missing module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    pub module: String,
    pub uri: String,
    pub version: Option<Version>,
    pub classifier: Option<String>,
}

impl FetchTarget {
    /// `<module>[-<version>][-<classifier>].jar`
    pub fn file_name(&self) -> String {
        let mut name = self.module.clone();
        if let Some(version) = &self.version {
            name.push('-');
            name.push_str(version.as_str());
        }
        if let Some(classifier) = &self.classifier {
            name.push('-');
            name.push_str(classifier);
        }
        name.push('.');
        name.push_str(ARCHIVE_EXTENSION);
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        let target = FetchTarget {
            module: "lib.x".to_string(),
            uri: "https://repo/g/lib-x/1.2.3/lib-x-1.2.3.jar".to_string(),
            version: Some(Version::parse("1.2.3").unwrap()),
            classifier: None,
        };
        assert_eq!(target.file_name(), "lib.x-1.2.3.jar");

        let natives = FetchTarget {
            module: "org.lwjgl.natives".to_string(),
            uri: String::new(),
            version: Some(Version::parse("3.2.3").unwrap()),
            classifier: Some("natives-linux".to_string()),
        };
        assert_eq!(natives.file_name(), "org.lwjgl.natives-3.2.3-natives-linux.jar");

        let bare = FetchTarget {
            module: "m".to_string(),
            uri: String::new(),
            version: None,
            classifier: None,
        };
        assert_eq!(bare.file_name(), "m.jar");
    }
}
