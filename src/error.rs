//! Error types for configuration, template expansion, and supervision.
//!
//! Every failure class gets its own variant with enough context to act on.
//! Missing-asset errors always name the offending logical key; template errors
//! always carry the label of the template that failed, so a bad placeholder can
//! be traced back to the server and flag that declared it.

use std::io;

use thiserror::Error;

/// Errors from configuration construction, mutation, and persistence.
///
/// Missing-asset variants indicate an internally inconsistent registry (a
/// programming error in the registration tables), and callers should treat
/// them as fatal at the point of first use. Node variants are ordinary
/// validation failures returned to the caller.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A logical asset file name was referenced but never registered.
    #[error("missing asset file '{name}'")]
    MissingAssetFile {
        /// The unregistered logical name.
        name: String,
    },

    /// A logical asset directory name was referenced but never registered.
    #[error("missing asset directory '{name}'")]
    MissingAssetDirectory {
        /// The unregistered logical name.
        name: String,
    },

    /// A node name was empty after trimming whitespace.
    #[error("node name is empty")]
    EmptyNodeName,

    /// A node address did not parse as an IP address.
    #[error("invalid node address '{ip}'")]
    InvalidNodeAddress {
        /// The rejected address string.
        ip: String,
    },

    /// A node name was not present in the node set.
    #[error("node '{name}' not found")]
    NodeNotFound {
        /// The missing node name.
        name: String,
    },

    /// A role string did not match any known role.
    #[error("unknown role '{value}'")]
    UnknownRole {
        /// The rejected role string.
        value: String,
    },

    /// The persisted configuration document does not exist.
    #[error("configuration '{path}' not found")]
    NotFound {
        /// Path that was probed.
        path: String,
    },

    /// Reading or writing the persisted configuration document failed.
    #[error("configuration I/O failed for '{path}'")]
    Io {
        /// Path of the document.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The persisted configuration document is not valid YAML.
    #[error("configuration document is malformed")]
    Yaml(#[from] serde_yaml::Error),

    /// Template expansion failed while resolving a path or value.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Errors from `{{ }}` template expansion.
///
/// Expansion failures propagate to the caller instead of degrading to an
/// empty string: a silently empty value would corrupt a downstream command
/// line.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A `{{` placeholder was never closed.
    #[error("template '{label}' has an unterminated placeholder")]
    Unterminated {
        /// Label of the failing template.
        label: String,
    },

    /// A placeholder referenced a name outside the closed resolver set.
    #[error("template '{label}' references unknown name '{reference}'")]
    UnknownReference {
        /// Label of the failing template.
        label: String,
        /// The unresolvable name.
        reference: String,
    },

    /// A placeholder passed a malformed or unexpected argument.
    #[error("template '{label}' passes a malformed argument to '{reference}'")]
    BadArgument {
        /// Label of the failing template.
        label: String,
        /// The resolver that rejected its argument.
        reference: String,
    },

    /// A placeholder referenced the current node, but no node is active.
    #[error("template '{label}' references the current node, but no node is active")]
    NoNode {
        /// Label of the failing template.
        label: String,
    },

    /// A placeholder referenced an asset that could not be resolved.
    #[error("template '{label}' could not resolve an asset")]
    Asset {
        /// Label of the failing template.
        label: String,
        /// The underlying registry error, naming the missing key.
        #[source]
        source: Box<ConfigError>,
    },
}

/// Errors from starting a supervised server.
///
/// Only setup failures surface here; a log file that cannot be opened once
/// supervision is running is logged and retried on the next cycle instead.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The directory holding the server's log file could not be created.
    #[error("could not create log directory '{path}'")]
    LogDirectory {
        /// The directory that failed to materialize.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
