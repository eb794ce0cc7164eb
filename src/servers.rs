//! Command and server descriptors, and server materialization.
//!
//! A command is a one-shot shell invocation template; a server is a long-lived
//! process described by a binary path template plus a named-argument map.
//! Descriptors stay unexpanded in the persisted configuration; materialization
//! turns a server descriptor into a concrete argv and log path against the
//! current node, once per supervision start.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::cluster::Config;
use crate::error::TemplateError;
use crate::node::Node;
use crate::template;
use crate::node::RoleSet;

/// A one-shot external command template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Logical name of the command.
    pub name: String,

    /// Roles that run this command. Empty means every role.
    #[serde(default, skip_serializing_if = "RoleSet::is_empty")]
    pub labels: RoleSet,

    /// Shell command line. Resolved at registration time.
    pub command: String,
}

/// Log capture settings for a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Whether the child's output is captured at all.
    pub enabled: bool,

    /// Log file path template, derived from the server name at registration.
    pub filename: String,
}

/// A long-lived supervised process template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Logical name of the server.
    pub name: String,

    /// Roles that run this server.
    #[serde(default, skip_serializing_if = "RoleSet::is_empty")]
    pub labels: RoleSet,

    /// Binary path template.
    pub command: String,

    /// Flag name to value template. An empty value renders as a bare flag.
    ///
    /// Ordered by flag name so the materialized command line is reproducible
    /// and diffable across regenerations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, String>,

    /// Log capture settings.
    pub logger: LoggerConfig,
}

/// A server descriptor expanded against a concrete node: ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningServer {
    /// Logical name, carried over from the descriptor.
    pub name: String,

    /// Expanded argv: binary path followed by `--flag` / `--flag=value` tokens.
    pub argv: Vec<String>,

    /// Expanded log file path, when logging is enabled.
    pub log_path: Option<String>,
}

impl ServerDescriptor {
    /// Expand this descriptor into a concrete argv and log path.
    ///
    /// Flags render in sorted name order; a flag with an empty value template
    /// renders bare, everything else as `--flag=<expanded>`. The first
    /// argument that fails to expand aborts materialization, with the error
    /// labeled `<server>.<flag>`.
    pub fn materialize(&self, config: &Config, node_name: &str, node: &Node) -> Result<RunningServer, TemplateError> {
        let context = Some((node_name, node));

        let mut argv = Vec::with_capacity(self.arguments.len() + 1);
        argv.push(template::expand(&self.name, &self.command, config, context)?);

        for (flag, value) in &self.arguments {
            if value.is_empty() {
                argv.push(format!("--{flag}"));
                continue;
            }

            let label = format!("{}.{flag}", self.name);
            let expanded = template::expand(&label, value, config, context)?;
            argv.push(format!("--{flag}={expanded}"));
        }

        let log_path = if self.logger.enabled {
            let label = format!("{}.log", self.name);
            Some(template::expand(&label, &self.logger.filename, config, context)?)
        } else {
            None
        };

        Ok(RunningServer {
            name: self.name.clone(),
            argv,
            log_path,
        })
    }
}
