//! Larch binary - cluster bootstrap and node supervision entry point.
//!
//! One binary drives the whole lifecycle: `initialize` generates and saves
//! the declarative configuration, `node add`/`node remove` edit the node set,
//! `dump` prints everything registered, and `run` supervises the servers that
//! apply to this machine's roles until interrupted.
//!
//! All state lives in a single YAML document under the base directory
//! (`<base>/etc/larch/config.yaml`); every subcommand loads it, applies its
//! change, and saves it back.

use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use larch::cluster::Cluster;
use larch::node::role_set;
use larch::node::Role;
use larch::supervisor::Supervisor;

#[derive(Parser)]
#[command(name = "larch", version, about = "Declarative cluster bootstrap and process supervision")]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Args)]
struct GlobalOptions {
    /// Base directory all local asset paths are rooted under.
    #[arg(long, global = true, env = "LARCH_BASE_DIRECTORY", default_value = ".")]
    base_directory: String,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Generate the configuration and save it under the base directory.
    Initialize {
        /// Base path everything is rooted under on the target machines.
        #[arg(long, default_value = "/")]
        deployment_directory: String,
    },

    /// Edit the node set.
    #[command(subcommand)]
    Node(NodeCommand),

    /// Print every registered node, asset, command, and server.
    Dump,

    /// Supervise the servers that apply to this node's roles.
    Run {
        /// Name of the node this machine runs as.
        #[arg(long, env = "HOSTNAME")]
        node_name: String,
    },
}

#[derive(Subcommand)]
enum NodeCommand {
    /// Add a node, replacing any previous one under the same name.
    Add {
        /// Unique node name.
        name: String,

        /// IP address of the node.
        ip: String,

        /// Ordinal index of the node within the fleet.
        #[arg(long, default_value_t = 0)]
        index: u32,

        /// Roles the node carries.
        #[arg(long, value_delimiter = ',', default_value = "worker")]
        labels: Vec<Role>,
    },

    /// Remove a node by name.
    Remove {
        /// Node name to remove.
        name: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let base = cli.global.base_directory;

    match cli.command {
        CliCommand::Initialize { deployment_directory } => initialize(&base, &deployment_directory),
        CliCommand::Node(command) => node(&base, command),
        CliCommand::Dump => {
            let cluster = load(&base)?;
            cluster.dump();
            Ok(())
        }
        CliCommand::Run { node_name } => run(&base, &node_name).await,
    }
}

fn load(base: &str) -> Result<Cluster> {
    Cluster::load(base).with_context(|| format!("loading configuration under '{base}'"))
}

fn initialize(base: &str, deployment_directory: &str) -> Result<()> {
    // Re-initializing an existing configuration keeps its nodes and settings;
    // idempotent registration only fills in missing entries.
    let mut cluster = match Cluster::load(base) {
        Ok(cluster) => cluster,
        Err(larch::ConfigError::NotFound { .. }) => Cluster::new(base),
        Err(error) => return Err(error).with_context(|| format!("loading configuration under '{base}'")),
    };

    cluster.generate(deployment_directory).context("generating configuration")?;
    cluster.save().context("saving configuration")?;

    Ok(())
}

fn node(base: &str, command: NodeCommand) -> Result<()> {
    let mut cluster = load(base)?;

    match command {
        NodeCommand::Add { name, ip, index, labels } => {
            cluster.config.add_node(&name, &ip, index, role_set(&labels))?;
            info!(name = %name, ip = %ip, index, "added node");
        }
        NodeCommand::Remove { name } => {
            cluster.config.remove_node(&name)?;
            info!(name = %name, "removed node");
        }
    }

    cluster.save().context("saving configuration")?;

    Ok(())
}

async fn run(base: &str, node_name: &str) -> Result<()> {
    let mut cluster = load(base)?;
    cluster
        .activate_node(node_name)
        .with_context(|| format!("node '{node_name}' is not part of the cluster"))?;

    let node = cluster.node.clone().context("no active node")?;

    let mut supervisors = Vec::new();
    for descriptor in cluster.servers_for_node() {
        let supervisor = Supervisor::from_descriptor(&cluster.config, &cluster.name, &node, descriptor)
            .with_context(|| format!("materializing server '{}'", descriptor.name))?;

        supervisor
            .start()
            .with_context(|| format!("starting supervision of '{}'", descriptor.name))?;

        supervisors.push(supervisor);
    }

    info!(node = %node_name, servers = supervisors.len(), "supervising");

    signal::ctrl_c().await.context("waiting for interrupt")?;

    // Stop supervision only. Running servers are deliberately left alive.
    for supervisor in &supervisors {
        supervisor.stop();
    }

    Ok(())
}
