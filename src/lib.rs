//! Larch - declarative cluster bootstrap and process supervision.
//!
//! A cluster is described once, as a declarative [`cluster::Config`]: the
//! nodes and their roles, the logical assets every role needs on disk, and
//! the commands and servers that run on them. The configuration is generated
//! from built-in registration tables, persisted as YAML, and reloaded on
//! every later invocation.
//!
//! Server command lines are stored as `{{ }}` templates and expanded by the
//! closed resolver set in [`template`] against the active node just before
//! launch. Launched servers are kept alive by [`supervisor::Supervisor`],
//! which respawns a crashed child after a fixed delay and, on stop, walks
//! away without killing it.

pub mod assets;
pub mod cluster;
pub mod constants;
pub mod error;
pub mod node;
pub mod servers;
pub mod supervisor;
pub mod template;

pub use cluster::Cluster;
pub use cluster::Config;
pub use error::ConfigError;
pub use error::SupervisorError;
pub use error::TemplateError;
pub use node::Node;
pub use node::Role;
pub use supervisor::Supervisor;
