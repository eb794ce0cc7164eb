//! The declarative configuration and its lifecycle.
//!
//! [`Config`] is the persisted model: cluster-wide settings, the node set, and
//! the asset/command/server registries. It is created fresh on first run,
//! populated by the registration tables in dependency order, saved as YAML,
//! and reloaded on later invocations. After construction it is read-only for
//! the lifetime of all supervision loops; the only mutations are the explicit
//! add/remove/register operations here.
//!
//! [`Cluster`] wraps a `Config` with the pieces that are deliberately not
//! persisted: the local base directory and the currently active node.

mod tables;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::assets::join_path;
use crate::assets::AssetRegistry;
use crate::constants;
use crate::error::ConfigError;
use crate::node::roles_match;
use crate::node::Node;
use crate::node::RoleSet;
use crate::servers::CommandDescriptor;
use crate::servers::LoggerConfig;
use crate::servers::ServerDescriptor;
use crate::template;
use crate::template::NodeRef;

/// The persisted declarative model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Format version of this document.
    pub version: String,

    /// Port of the load balancer fronting the API servers.
    pub load_balancer_port: u16,

    /// Secure port of the API server.
    pub api_server_port: u16,

    /// Service cluster IP range.
    pub cluster_ip_range: String,

    /// Cluster DNS service IP.
    pub cluster_dns_ip: String,

    /// Pod network CIDR.
    pub cluster_cidr: String,

    /// resolv.conf handed to the kubelet.
    pub resolv_conf: String,

    /// Base path everything is rooted under on the target machines.
    #[serde(default)]
    pub deployment_directory: String,

    /// Logical directories and files.
    #[serde(default)]
    pub assets: AssetRegistry,

    /// Cluster members by name. Ordered, so aggregate expansions are stable.
    #[serde(default)]
    pub nodes: BTreeMap<String, Node>,

    /// One-shot command descriptors, in registration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDescriptor>,

    /// Supervised server descriptors, in registration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerDescriptor>,
}

impl Config {
    /// A fresh configuration with default cluster settings and empty registries.
    pub fn new() -> Self {
        Self {
            version: constants::CONFIG_VERSION.to_string(),
            load_balancer_port: constants::LOAD_BALANCER_PORT,
            api_server_port: constants::API_SERVER_PORT,
            cluster_ip_range: constants::CLUSTER_IP_RANGE.to_string(),
            cluster_dns_ip: constants::CLUSTER_DNS_IP.to_string(),
            cluster_cidr: constants::CLUSTER_CIDR.to_string(),
            resolv_conf: constants::RESOLV_CONF.to_string(),
            deployment_directory: String::new(),
            assets: AssetRegistry::default(),
            nodes: BTreeMap::new(),
            commands: Vec::new(),
            servers: Vec::new(),
        }
    }

    // ========================================================================
    // Node operations
    // ========================================================================

    /// Add a node, replacing any previous descriptor under the same name.
    ///
    /// The name is trimmed and must be non-empty; the address must parse as an
    /// IP address.
    pub fn add_node(&mut self, name: &str, ip: &str, index: u32, labels: RoleSet) -> Result<Node, ConfigError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(ConfigError::EmptyNodeName);
        }

        if ip.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::InvalidNodeAddress { ip: ip.to_string() });
        }

        let node = Node::new(ip, index, labels);
        self.nodes.insert(name.to_string(), node.clone());

        Ok(node)
    }

    /// Remove a node by name.
    pub fn remove_node(&mut self, name: &str) -> Result<(), ConfigError> {
        self.nodes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ConfigError::NodeNotFound { name: name.to_string() })
    }

    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Result<&Node, ConfigError> {
        self.nodes
            .get(name)
            .ok_or_else(|| ConfigError::NodeNotFound { name: name.to_string() })
    }

    /// Nodes carrying the controller role, in name order.
    pub fn controllers(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.nodes.iter().filter(|(_, node)| node.is_controller())
    }

    /// Client endpoints of the etcd cluster, one per controller, in name order.
    pub fn etcd_client_endpoints(&self) -> Vec<String> {
        self.controllers().map(|(_, node)| format!("https://{}:2379", node.ip)).collect()
    }

    // ========================================================================
    // Command and server registration
    // ========================================================================

    /// Register a one-shot command. First registration under a name wins.
    pub fn register_command(&mut self, name: &str, labels: RoleSet, command: impl Into<String>) {
        if self.commands.iter().any(|existing| existing.name == name) {
            return;
        }

        self.commands.push(CommandDescriptor {
            name: name.to_string(),
            labels,
            command: command.into(),
        });
    }

    /// Register a supervised server. First registration under a name wins.
    ///
    /// A log file path `<logging dir>/<name>.log` is attached automatically.
    pub fn register_server(
        &mut self,
        name: &str,
        labels: RoleSet,
        command: impl Into<String>,
        arguments: BTreeMap<String, String>,
    ) {
        if self.servers.iter().any(|existing| existing.name == name) {
            return;
        }

        let filename = format!(
            "{}/{name}.log",
            template::asset_directory_placeholder(constants::LOGGING_DIRECTORY)
        );

        self.servers.push(ServerDescriptor {
            name: name.to_string(),
            labels,
            command: command.into(),
            arguments,
            logger: LoggerConfig { enabled: true, filename },
        });
    }

    /// Commands applying to the given roles. `None` lists everything.
    pub fn commands_for<'a>(&'a self, filter: Option<&'a RoleSet>) -> impl Iterator<Item = &'a CommandDescriptor> {
        self.commands
            .iter()
            .filter(move |command| filter.is_none_or(|roles| roles_match(&command.labels, roles)))
    }

    /// Servers applying to the given roles. `None` lists everything.
    pub fn servers_for<'a>(&'a self, filter: Option<&'a RoleSet>) -> impl Iterator<Item = &'a ServerDescriptor> {
        self.servers
            .iter()
            .filter(move |server| filter.is_none_or(|roles| roles_match(&server.labels, roles)))
    }

    // ========================================================================
    // Asset path resolution
    // ========================================================================

    /// The registered relative path of a directory, before expansion.
    pub fn relative_asset_directory(&self, name: &str) -> Result<&str, ConfigError> {
        Ok(self.assets.directory(name)?.path.as_str())
    }

    /// Expanded relative path of a directory.
    pub fn resolve_directory(&self, name: &str, node: NodeRef<'_>) -> Result<String, ConfigError> {
        let directory = self.assets.directory(name)?;
        Ok(template::expand("asset-directory", &directory.path, self, node)?)
    }

    /// Expanded relative path of a file: the owner directory's path joined
    /// with the file's logical name, re-expanded as a template (the directory
    /// path may itself embed placeholders).
    pub fn resolve_file(&self, name: &str, node: NodeRef<'_>) -> Result<String, ConfigError> {
        let file = self.assets.file(name)?;
        let directory = self.assets.directory(&file.directory)?;

        let joined = format!("{}/{name}", directory.path.trim_end_matches('/'));

        Ok(template::expand("asset-file", &joined, self, node)?)
    }

    /// Directory path rooted under the deployment base (target machines).
    pub fn target_asset_directory(&self, name: &str, node: NodeRef<'_>) -> Result<String, ConfigError> {
        Ok(join_path(&self.deployment_directory, &self.resolve_directory(name, node)?))
    }

    /// File path rooted under the deployment base (target machines).
    pub fn target_asset_file(&self, name: &str, node: NodeRef<'_>) -> Result<String, ConfigError> {
        Ok(join_path(&self.deployment_directory, &self.resolve_file(name, node)?))
    }

    /// Directory path rooted under a local base (build time).
    pub fn local_asset_directory(&self, base: &str, name: &str, node: NodeRef<'_>) -> Result<String, ConfigError> {
        Ok(join_path(base, &self.resolve_directory(name, node)?))
    }

    /// File path rooted under a local base (build time).
    pub fn local_asset_file(&self, base: &str, name: &str, node: NodeRef<'_>) -> Result<String, ConfigError> {
        Ok(join_path(base, &self.resolve_file(name, node)?))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// A configuration bound to a machine: local base directory plus, once
/// selected, the node this process is running as.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Local base path all build-time asset paths are rooted under.
    pub base_directory: String,

    /// Name of the active node. Empty until a node is selected.
    pub name: String,

    /// Descriptor of the active node, if its name is in the node set.
    pub node: Option<Node>,

    /// The declarative model.
    pub config: Config,
}

impl Cluster {
    /// A cluster with a fresh configuration.
    pub fn new(base_directory: impl Into<String>) -> Self {
        Self {
            base_directory: base_directory.into(),
            name: String::new(),
            node: None,
            config: Config::new(),
        }
    }

    /// Populate the registration tables in dependency order: directories,
    /// then files referencing them, then commands and servers referencing
    /// asset paths. Idempotent registration makes re-generation a no-op for
    /// entries that already exist.
    pub fn generate(&mut self, deployment_directory: &str) -> Result<(), ConfigError> {
        self.config.deployment_directory = deployment_directory.to_string();

        self.register_asset_directories()?;
        self.register_asset_files();
        self.register_commands()?;
        self.register_servers();

        Ok(())
    }

    /// Select the node this process runs as.
    pub fn activate_node(&mut self, name: &str) -> Result<(), ConfigError> {
        let node = self.config.node(name)?.clone();
        self.name = name.to_string();
        self.node = Some(node);
        Ok(())
    }

    /// The active node as a template context.
    pub fn node_context(&self) -> NodeRef<'_> {
        self.node.as_ref().map(|node| (self.name.as_str(), node))
    }

    /// Servers that apply to the active node's roles.
    pub fn servers_for_node(&self) -> Vec<&ServerDescriptor> {
        match &self.node {
            Some(node) => self.config.servers_for(Some(&node.labels)).collect(),
            None => Vec::new(),
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    fn config_directory(&self) -> String {
        join_path(
            &self.base_directory,
            &join_path(constants::ETC_SUBDIRECTORY, constants::PROJECT_SUBDIRECTORY),
        )
    }

    /// Path of the persisted configuration document.
    pub fn config_path(&self) -> String {
        join_path(&self.config_directory(), constants::CONFIG_FILENAME)
    }

    /// Write the configuration document, creating its directory if missing.
    pub fn save(&self) -> Result<(), ConfigError> {
        let directory = self.config_directory();
        std::fs::create_dir_all(&directory).map_err(|source| ConfigError::Io {
            path: directory,
            source,
        })?;

        let document = serde_yaml::to_string(&self.config)?;

        let path = self.config_path();
        std::fs::write(&path, document).map_err(|source| ConfigError::Io { path: path.clone(), source })?;

        info!(filename = %path, "saved configuration");

        Ok(())
    }

    /// Load the configuration document from under a base directory.
    ///
    /// A missing document is a reported error, not a crash; the caller
    /// decides whether to proceed with defaults or abort.
    pub fn load(base_directory: impl Into<String>) -> Result<Self, ConfigError> {
        let mut cluster = Self::new(base_directory);
        let path = cluster.config_path();

        if !Path::new(&path).exists() {
            return Err(ConfigError::NotFound { path });
        }

        let document = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
        cluster.config = serde_yaml::from_str(&document)?;

        Ok(cluster)
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Log every registered entry with its resolved labels. Read-only.
    pub fn dump(&self) {
        info!(base_directory = %self.base_directory, "configuration");

        if !self.name.is_empty() {
            info!(name = %self.name, "active node");
        }

        for (name, node) in &self.config.nodes {
            info!(name = %name, ip = %node.ip, index = node.index, labels = ?node.labels, "node");
        }

        for (name, directory) in &self.config.assets.directories {
            info!(name = %name, path = %directory.path, labels = ?directory.labels, "asset directory");
        }

        for (name, file) in &self.config.assets.files {
            info!(name = %name, directory = %file.directory, labels = ?file.labels, "asset file");
        }

        for command in &self.config.commands {
            info!(name = %command.name, command = %command.command, labels = ?command.labels, "command");
        }

        for server in &self.config.servers {
            info!(
                name = %server.name,
                command = %server.command,
                arguments = server.arguments.len(),
                log = %server.logger.filename,
                labels = ?server.labels,
                "server"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::role_set;
    use crate::node::Role;

    #[test]
    fn add_node_validates_name_and_address() {
        let mut config = Config::new();

        assert!(matches!(config.add_node("  ", "10.0.0.1", 0, role_set(&[])), Err(ConfigError::EmptyNodeName)));
        assert!(matches!(
            config.add_node("node0", "not-an-address", 0, role_set(&[])),
            Err(ConfigError::InvalidNodeAddress { ip }) if ip == "not-an-address"
        ));

        let node = config.add_node(" node0 \n", "10.0.0.1", 0, role_set(&[Role::Controller])).unwrap();
        assert_eq!(node.ip, "10.0.0.1");
        assert!(config.node("node0").is_ok());
    }

    #[test]
    fn add_node_accepts_ipv6() {
        let mut config = Config::new();
        assert!(config.add_node("node0", "fd00::1", 0, role_set(&[])).is_ok());
    }

    #[test]
    fn remove_node_reports_missing_names() {
        let mut config = Config::new();
        config.add_node("node0", "10.0.0.1", 0, role_set(&[])).unwrap();

        assert!(config.remove_node("node0").is_ok());
        assert!(matches!(
            config.remove_node("node0"),
            Err(ConfigError::NodeNotFound { name }) if name == "node0"
        ));
    }

    #[test]
    fn command_and_server_registration_is_idempotent() {
        let mut config = Config::new();

        config.register_command("swapoff", role_set(&[Role::Worker]), "swapoff -a");
        config.register_command("swapoff", role_set(&[]), "something else entirely");

        assert_eq!(config.commands.len(), 1);
        assert_eq!(config.commands[0].command, "swapoff -a");

        config.register_server("etcd", role_set(&[Role::Controller]), "/opt/bin/etcd", BTreeMap::new());
        config.register_server("etcd", role_set(&[Role::Controller]), "/other/etcd", BTreeMap::new());

        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].command, "/opt/bin/etcd");
    }

    #[test]
    fn registered_servers_get_a_derived_log_path() {
        let mut config = Config::new();
        config.register_server("etcd", role_set(&[Role::Controller]), "/opt/bin/etcd", BTreeMap::new());

        let server = &config.servers[0];
        assert!(server.logger.enabled);
        assert!(server.logger.filename.ends_with("/etcd.log"));
        assert!(server.logger.filename.contains("asset_directory"));
    }

    #[test]
    fn file_resolution_joins_directory_and_name() {
        let mut config = Config::new();
        config.deployment_directory = "/".to_string();
        config.assets.register_directory("pki", role_set(&[]), "etc/pki");
        config.assets.register_file("ca.pem", role_set(&[]), "pki");

        assert_eq!(config.resolve_file("ca.pem", None).unwrap(), "etc/pki/ca.pem");
        assert_eq!(config.target_asset_file("ca.pem", None).unwrap(), "/etc/pki/ca.pem");
        assert_eq!(
            config.local_asset_file("/home/op/assets", "ca.pem", None).unwrap(),
            "/home/op/assets/etc/pki/ca.pem"
        );
    }

    #[test]
    fn file_resolution_expands_directory_placeholders() {
        let mut config = Config::new();
        config.deployment_directory = "/deploy".to_string();
        config
            .assets
            .register_directory("per-node", role_set(&[]), "var/lib/{{ node_name }}");
        config.assets.register_file("state.db", role_set(&[]), "per-node");
        config.add_node("work1", "10.0.0.2", 1, role_set(&[Role::Worker])).unwrap();

        let node = config.node("work1").unwrap().clone();
        let resolved = config.target_asset_file("state.db", Some(("work1", &node))).unwrap();
        assert_eq!(resolved, "/deploy/var/lib/work1/state.db");
    }

    #[test]
    fn file_with_unregistered_owner_directory_is_an_integrity_error() {
        let mut config = Config::new();
        config.assets.register_file("orphan.pem", role_set(&[]), "nowhere");

        let err = config.resolve_file("orphan.pem", None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAssetDirectory { name } if name == "nowhere"));
    }

    #[test]
    fn role_filtered_command_and_server_listings() {
        let mut config = Config::new();
        config.register_command("worker-cmd", role_set(&[Role::Worker]), "true");
        config.register_server("worker-srv", role_set(&[Role::Worker]), "/bin/true", BTreeMap::new());

        let controller = role_set(&[Role::Controller]);
        let worker = role_set(&[Role::Worker]);

        assert_eq!(config.commands_for(Some(&controller)).count(), 0);
        assert_eq!(config.commands_for(Some(&worker)).count(), 1);
        assert_eq!(config.servers_for(Some(&controller)).count(), 0);
        assert_eq!(config.servers_for(Some(&worker)).count(), 1);
        assert_eq!(config.servers_for(None).count(), 1);
    }

    #[test]
    fn load_reports_a_missing_document() {
        let temp = tempfile::tempdir().unwrap();
        let err = Cluster::load(temp.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().to_str().unwrap();

        let mut cluster = Cluster::new(base);
        cluster.generate("/").unwrap();
        cluster
            .config
            .add_node("ctrl1", "10.0.0.1", 0, role_set(&[Role::Controller]))
            .unwrap();
        cluster.save().unwrap();

        let reloaded = Cluster::load(base).unwrap();
        assert_eq!(reloaded.config, cluster.config);
    }

    #[test]
    fn activate_node_requires_membership() {
        let mut cluster = Cluster::new("/tmp/unused");
        assert!(matches!(
            cluster.activate_node("ghost"),
            Err(ConfigError::NodeNotFound { name }) if name == "ghost"
        ));

        cluster
            .config
            .add_node("work1", "10.0.0.2", 1, role_set(&[Role::Worker]))
            .unwrap();
        cluster.activate_node("work1").unwrap();
        assert_eq!(cluster.name, "work1");
        assert!(cluster.node_context().is_some());
    }
}
