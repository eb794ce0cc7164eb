//! Asset registry: named logical directories and files.
//!
//! Assets are registered once, during configuration generation, in dependency
//! order (a directory before any file that lives in it). Registration is
//! idempotent by logical name: re-registering an existing name keeps the first
//! descriptor and silently ignores the new one, so registration order does not
//! matter for already-registered entries.
//!
//! A directory's relative path may itself contain unexpanded `{{ }}`
//! placeholders; resolution to a concrete path happens later, against a full
//! configuration (see the template module).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::node::roles_match;
use crate::node::RoleSet;

/// A logical directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDirectory {
    /// Path relative to the deployment or local base. May contain placeholders.
    pub path: String,

    /// Roles that need this directory. Empty means every role.
    #[serde(default, skip_serializing_if = "RoleSet::is_empty")]
    pub labels: RoleSet,
}

/// A logical file, owned by a registered directory.
///
/// The file's logical name doubles as its on-disk name; the concrete path is
/// the owner directory's resolved path joined with that name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFile {
    /// Logical name of the owning directory.
    pub directory: String,

    /// Roles that need this file. Empty means every role.
    #[serde(default, skip_serializing_if = "RoleSet::is_empty")]
    pub labels: RoleSet,
}

/// Registry of all logical directories and files.
///
/// Backed by ordered maps so listings and serialized output are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistry {
    /// Logical name to directory descriptor.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub directories: BTreeMap<String, AssetDirectory>,

    /// Logical name to file descriptor.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, AssetFile>,
}

impl AssetRegistry {
    /// Register a directory under a logical name. First registration wins.
    pub fn register_directory(&mut self, name: &str, labels: RoleSet, path: impl Into<String>) {
        self.directories.entry(name.to_string()).or_insert_with(|| AssetDirectory {
            path: path.into(),
            labels,
        });
    }

    /// Register a file under a logical name. First registration wins.
    pub fn register_file(&mut self, name: &str, labels: RoleSet, directory: &str) {
        self.files.entry(name.to_string()).or_insert_with(|| AssetFile {
            directory: directory.to_string(),
            labels,
        });
    }

    /// Look up a directory descriptor by logical name.
    pub fn directory(&self, name: &str) -> Result<&AssetDirectory, ConfigError> {
        self.directories
            .get(name)
            .ok_or_else(|| ConfigError::MissingAssetDirectory { name: name.to_string() })
    }

    /// Look up a file descriptor by logical name.
    pub fn file(&self, name: &str) -> Result<&AssetFile, ConfigError> {
        self.files
            .get(name)
            .ok_or_else(|| ConfigError::MissingAssetFile { name: name.to_string() })
    }

    /// Directories applying to the given roles. `None` lists everything.
    pub fn directories_for<'a>(
        &'a self,
        filter: Option<&'a RoleSet>,
    ) -> impl Iterator<Item = (&'a String, &'a AssetDirectory)> {
        self.directories
            .iter()
            .filter(move |(_, directory)| filter.is_none_or(|roles| roles_match(&directory.labels, roles)))
    }

    /// Files applying to the given roles. `None` lists everything.
    pub fn files_for<'a>(&'a self, filter: Option<&'a RoleSet>) -> impl Iterator<Item = (&'a String, &'a AssetFile)> {
        self.files
            .iter()
            .filter(move |(_, file)| filter.is_none_or(|roles| roles_match(&file.labels, roles)))
    }
}

/// Join a path fragment under a base, normalizing the separating slash.
///
/// Unlike `Path::join`, an absolute-looking fragment never discards the base:
/// target paths are always rooted under the deployment base and local paths
/// under the local base.
pub(crate) fn join_path(base: &str, tail: &str) -> String {
    let base = base.trim_end_matches('/');
    let tail = tail.trim_start_matches('/');

    if base.is_empty() {
        return format!("/{tail}");
    }

    format!("{base}/{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::role_set;
    use crate::node::Role;

    #[test]
    fn first_registration_wins() {
        let mut registry = AssetRegistry::default();

        registry.register_directory("data", role_set(&[]), "var/lib/data");
        registry.register_directory("data", role_set(&[Role::Worker]), "somewhere/else");

        let directory = registry.directory("data").unwrap();
        assert_eq!(directory.path, "var/lib/data");
        assert!(directory.labels.is_empty());

        registry.register_file("state.db", role_set(&[]), "data");
        registry.register_file("state.db", role_set(&[]), "other-directory");
        assert_eq!(registry.file("state.db").unwrap().directory, "data");
    }

    #[test]
    fn missing_names_are_reported_exactly() {
        let registry = AssetRegistry::default();

        let err = registry.directory("no-such-directory").unwrap_err();
        assert!(matches!(err, ConfigError::MissingAssetDirectory { name } if name == "no-such-directory"));

        let err = registry.file("no-such-file").unwrap_err();
        assert!(matches!(err, ConfigError::MissingAssetFile { name } if name == "no-such-file"));
    }

    #[test]
    fn role_filtered_listings() {
        let mut registry = AssetRegistry::default();
        registry.register_directory("worker-only", role_set(&[Role::Worker]), "w");
        registry.register_directory("everywhere", role_set(&[]), "e");
        registry.register_file("worker-file", role_set(&[Role::Worker]), "worker-only");

        let controller = role_set(&[Role::Controller]);
        let worker = role_set(&[Role::Worker]);

        let names: Vec<_> = registry.directories_for(Some(&controller)).map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["everywhere"]);

        let names: Vec<_> = registry.directories_for(Some(&worker)).map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["everywhere", "worker-only"]);

        assert_eq!(registry.files_for(Some(&controller)).count(), 0);
        assert_eq!(registry.files_for(None).count(), 1);
    }

    #[test]
    fn join_path_normalizes_slashes() {
        assert_eq!(join_path("/", "etc/larch"), "/etc/larch");
        assert_eq!(join_path("/base/", "/etc/larch"), "/base/etc/larch");
        assert_eq!(join_path("", "etc"), "/etc");
        assert_eq!(join_path("/assets", "opt/bin"), "/assets/opt/bin");
    }
}
