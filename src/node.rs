//! Node model: cluster members and the roles they carry.
//!
//! Roles are a closed set. Assets, commands, and servers are tagged with the
//! roles that need them, and every listing or scheduling decision reduces to
//! the same intersection test in [`roles_match`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// A node role.
///
/// Controllers run the control plane, workers run workloads, and the
/// bootstrapper is the machine driving the initial cluster setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Controller,
    Worker,
    Bootstrapper,
}

impl Role {
    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Controller => "controller",
            Role::Worker => "worker",
            Role::Bootstrapper => "bootstrapper",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "controller" => Ok(Role::Controller),
            "worker" => Ok(Role::Worker),
            "bootstrapper" => Ok(Role::Bootstrapper),
            _ => Err(ConfigError::UnknownRole { value: value.to_string() }),
        }
    }
}

/// A set of roles, ordered for deterministic serialization.
pub type RoleSet = BTreeSet<Role>;

/// Build a role set from a slice. Convenience for the registration tables.
pub fn role_set(roles: &[Role]) -> RoleSet {
    roles.iter().copied().collect()
}

/// Whether a descriptor tagged with `required` applies to a holder of `present`.
///
/// An empty required set means the descriptor applies to every role.
pub fn roles_match(required: &RoleSet, present: &RoleSet) -> bool {
    required.is_empty() || required.iter().any(|role| present.contains(role))
}

/// A cluster member.
///
/// Identified by its unique name, which is the key of the node map and not a
/// field of the struct. Created whole via [`Node::new`] and replaced whole on
/// re-add; never partially updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Network address of the node. Validated at add time.
    pub ip: String,

    /// Ordinal index of the node within the fleet.
    pub index: u32,

    /// Roles this node carries.
    #[serde(default)]
    pub labels: RoleSet,
}

impl Node {
    /// Create a new node descriptor.
    pub fn new(ip: impl Into<String>, index: u32, labels: RoleSet) -> Self {
        Self {
            ip: ip.into(),
            index,
            labels,
        }
    }

    /// Whether this node carries the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.labels.contains(&role)
    }

    /// Whether this node is part of the control plane.
    pub fn is_controller(&self) -> bool {
        self.has_role(Role::Controller)
    }

    /// Whether this node runs workloads.
    pub fn is_worker(&self) -> bool {
        self.has_role(Role::Worker)
    }
}
