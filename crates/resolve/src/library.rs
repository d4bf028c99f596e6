//! Modules present as archives in the local library directory

use crate::classfile;
use crate::provider::{ModuleProvider, ModuleScan, ProviderKind};
use modsmith_core::{
    Error, ModuleDescriptor, Result, ARCHIVE_EXTENSION, AUTOMATIC_MODULE_NAME, MANIFEST_PATH,
    MODULE_INFO_CLASS,
};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

#[derive(Debug, Clone)]
pub struct LibraryProvider {
    directory: PathBuf,
}

impl LibraryProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Archives directly inside the library directory, sorted by name
    pub fn archives(&self) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::file_system(&self.directory, "list library", e)),
        };

        let mut archives = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| Error::file_system(&self.directory, "list library", e))?
                .path();
            let is_archive = path
                .extension()
                .is_some_and(|extension| extension == ARCHIVE_EXTENSION);
            if is_archive && path.is_file() {
                archives.push(path);
            }
        }
        archives.sort();
        Ok(archives)
    }
}

impl ModuleProvider for LibraryProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Library
    }

    fn scan(&self) -> Result<ModuleScan> {
        let modules = self
            .archives()?
            .iter()
            .map(|archive| describe_archive(archive))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            directory = %self.directory.display(),
            modules = modules.len(),
            "scanned library"
        );
        Ok(ModuleScan::forcing_only(modules))
    }
}

/// Describe one module archive
pub fn describe_archive(path: &Path) -> Result<ModuleDescriptor> {
    let file = File::open(path).map_err(|e| Error::file_system(path, "open archive", e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| Error::archive(path, e.to_string()))?;

    if let Some(bytes) = read_entry(&mut archive, path, MODULE_INFO_CLASS)? {
        return classfile::read_module_info(&bytes).map_err(|e| Error::archive(path, e.to_string()));
    }
    if let Some(entry) = versioned_module_info(&archive) {
        if let Some(bytes) = read_entry(&mut archive, path, &entry)? {
            return classfile::read_module_info(&bytes)
                .map_err(|e| Error::archive(path, e.to_string()));
        }
    }

    let manifest = read_entry(&mut archive, path, MANIFEST_PATH)?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = manifest_attribute(&manifest, AUTOMATIC_MODULE_NAME)
        .or_else(|| automatic_module_name(&file_name))
        .ok_or_else(|| Error::archive(path, "cannot derive a module name"))?;

    let mut descriptor = ModuleDescriptor::automatic(name);
    descriptor.main_class = manifest_attribute(&manifest, "Main-Class");
    Ok(descriptor)
}

fn read_entry(
    archive: &mut ZipArchive<File>,
    path: &Path,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(Error::archive(path, e.to_string())),
    };
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| Error::archive(path, format!("reading {name}: {e}")))?;
    Ok(Some(bytes))
}

/// Highest `META-INF/versions/<n>/module-info.class` of a multi-release archive
fn versioned_module_info(archive: &ZipArchive<File>) -> Option<String> {
    archive
        .file_names()
        .filter_map(|name| {
            let release = name
                .strip_prefix("META-INF/versions/")?
                .strip_suffix(&format!("/{MODULE_INFO_CLASS}"))?;
            release.parse::<u32>().ok().map(|release| (release, name))
        })
        .max_by_key(|(release, _)| *release)
        .map(|(_, name)| name.to_string())
}

/// Value of a main-section manifest attribute, with continuation lines joined
pub fn manifest_attribute(manifest: &str, key: &str) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in manifest.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            // end of the main section
            break;
        }
        match (line.strip_prefix(' '), lines.last_mut()) {
            (Some(continuation), Some(last)) => last.push_str(continuation),
            _ => lines.push(line.to_string()),
        }
    }
    lines
        .iter()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case(key)
                .then(|| value.trim().to_string())
        })
        .filter(|value| !value.is_empty())
}

/// Module name derived from an archive file name.
///
/// The extension is dropped and the name is cut where a `-` is followed by a
/// digit. Remaining non-alphanumeric runs become single dots.
pub fn automatic_module_name(file_name: &str) -> Option<String> {
    let stem = file_name
        .strip_suffix(&format!(".{ARCHIVE_EXTENSION}"))
        .unwrap_or(file_name);

    let bytes = stem.as_bytes();
    let cut = (0..bytes.len())
        .find(|&i| bytes[i] == b'-' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
        .unwrap_or(bytes.len());

    let mut name = String::with_capacity(cut);
    for c in stem[..cut].chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else if !name.ends_with('.') {
            name.push('.');
        }
    }
    let name = name.trim_matches('.');
    (!name.is_empty()).then(|| name.to_string())
}
