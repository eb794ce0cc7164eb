//! Template expansion with a closed resolver set.
//!
//! Templates are plain strings with `{{ }}`-delimited placeholders. A
//! placeholder is either a named value (`{{ node_ip }}`) or a resolver call
//! with one quoted argument (`{{ asset_file "ca.pem" }}`). The resolver set is
//! closed: every name is dispatched explicitly against the configuration and
//! the currently active node, and anything else fails with a
//! [`TemplateError`] carrying the caller-supplied label.
//!
//! Expansion is pure given a fixed configuration: the same template and node
//! always produce the same string, and cluster aggregates iterate the ordered
//! node map, so generated server flags stay stable across regenerations.
//!
//! # Resolver set
//!
//! | Placeholder | Expands to |
//! |-------------|------------|
//! | `node_name` / `node_ip` / `node_index` | current node identity |
//! | `api_server_port`, `cluster_ip_range`, `cluster_dns_ip`, `cluster_cidr`, `resolv_conf`, `deployment_directory` | cluster settings |
//! | `controllers_count` | decimal count of controller nodes |
//! | `etcd_servers` | comma-joined `https://<ip>:2379` per controller |
//! | `etcd_cluster` | comma-joined `<name>=https://<ip>:2380` per controller |
//! | `asset_file "n"` / `asset_directory "n"` | fully-qualified target path |

use crate::cluster::Config;
use crate::error::TemplateError;
use crate::node::Node;

/// The currently active node, if any.
///
/// Templates that reference `node_*` values fail without one; everything else
/// expands node-free (the registration tables are built before any node is
/// selected).
pub type NodeRef<'a> = Option<(&'a str, &'a Node)>;

/// Render an `asset_file` placeholder for the registration tables.
pub fn asset_file_placeholder(name: &str) -> String {
    format!("{{{{ asset_file \"{name}\" }}}}")
}

/// Render an `asset_directory` placeholder for the registration tables.
pub fn asset_directory_placeholder(name: &str) -> String {
    format!("{{{{ asset_directory \"{name}\" }}}}")
}

/// Expand every placeholder in `input`.
///
/// `label` names the template in errors (typically the server and flag that
/// declared it). Fails instead of substituting an empty string: a silently
/// empty value would corrupt the command line built from it.
pub fn expand(label: &str, input: &str, config: &Config, node: NodeRef<'_>) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);

        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| TemplateError::Unterminated { label: label.to_string() })?;

        let value = evaluate(label, after[..end].trim(), config, node)?;
        output.push_str(&value);

        rest = &after[end + 2..];
    }

    output.push_str(rest);

    Ok(output)
}

/// Evaluate a single placeholder body.
fn evaluate(label: &str, body: &str, config: &Config, node: NodeRef<'_>) -> Result<String, TemplateError> {
    let (reference, argument) = split_reference(label, body)?;

    let current_node = || node.ok_or_else(|| TemplateError::NoNode { label: label.to_string() });

    // Resolvers taking one quoted argument.
    if let Some(name) = argument {
        return match reference {
            "asset_file" => config.target_asset_file(name, node).map_err(|source| TemplateError::Asset {
                label: label.to_string(),
                source: Box::new(source),
            }),
            "asset_directory" => config.target_asset_directory(name, node).map_err(|source| TemplateError::Asset {
                label: label.to_string(),
                source: Box::new(source),
            }),
            _ => Err(TemplateError::BadArgument {
                label: label.to_string(),
                reference: reference.to_string(),
            }),
        };
    }

    match reference {
        // Current node identity.
        "node_name" => Ok(current_node()?.0.to_string()),
        "node_ip" => Ok(current_node()?.1.ip.clone()),
        "node_index" => Ok(current_node()?.1.index.to_string()),

        // Cluster settings.
        "api_server_port" => Ok(config.api_server_port.to_string()),
        "cluster_ip_range" => Ok(config.cluster_ip_range.clone()),
        "cluster_dns_ip" => Ok(config.cluster_dns_ip.clone()),
        "cluster_cidr" => Ok(config.cluster_cidr.clone()),
        "resolv_conf" => Ok(config.resolv_conf.clone()),
        "deployment_directory" => Ok(config.deployment_directory.clone()),

        // Cluster aggregates over the ordered node map.
        "controllers_count" => Ok(config.controllers().count().to_string()),
        "etcd_servers" => Ok(config.etcd_client_endpoints().join(",")),
        "etcd_cluster" => Ok(config
            .controllers()
            .map(|(name, node)| format!("{name}=https://{}:2380", node.ip))
            .collect::<Vec<_>>()
            .join(",")),

        // Argument-taking resolvers called without an argument.
        "asset_file" | "asset_directory" => Err(TemplateError::BadArgument {
            label: label.to_string(),
            reference: reference.to_string(),
        }),

        _ => Err(TemplateError::UnknownReference {
            label: label.to_string(),
            reference: reference.to_string(),
        }),
    }
}

/// Split a placeholder body into its reference and optional quoted argument.
fn split_reference<'a>(label: &str, body: &'a str) -> Result<(&'a str, Option<&'a str>), TemplateError> {
    match body.find(char::is_whitespace) {
        None => Ok((body, None)),
        Some(position) => {
            let reference = &body[..position];
            let raw = body[position..].trim();

            let argument = raw
                .strip_prefix('"')
                .and_then(|value| value.strip_suffix('"'))
                .ok_or_else(|| TemplateError::BadArgument {
                    label: label.to_string(),
                    reference: reference.to_string(),
                })?;

            Ok((reference, Some(argument)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::role_set;
    use crate::node::Role;

    fn fixture() -> Config {
        let mut config = Config::new();
        config.deployment_directory = "/".to_string();
        config
            .add_node("ctrl1", "10.0.0.1", 0, role_set(&[Role::Controller]))
            .unwrap();
        config.add_node("work1", "10.0.0.2", 1, role_set(&[Role::Worker])).unwrap();
        config
    }

    #[test]
    fn plain_text_passes_through() {
        let config = fixture();
        assert_eq!(expand("t", "no placeholders", &config, None).unwrap(), "no placeholders");
    }

    #[test]
    fn node_values_expand() {
        let config = fixture();
        let node = config.node("ctrl1").unwrap().clone();
        let context = Some(("ctrl1", &node));

        assert_eq!(
            expand("t", "https://{{ node_ip }}:2380", &config, context).unwrap(),
            "https://10.0.0.1:2380"
        );
        assert_eq!(expand("t", "{{ node_name }}-{{ node_index }}", &config, context).unwrap(), "ctrl1-0");
    }

    #[test]
    fn node_values_require_an_active_node() {
        let config = fixture();
        let err = expand("etcd.name", "{{ node_name }}", &config, None).unwrap_err();
        assert!(matches!(err, TemplateError::NoNode { label } if label == "etcd.name"));
    }

    #[test]
    fn cluster_aggregates_expand_deterministically() {
        let config = fixture();

        assert_eq!(expand("t", "{{ controllers_count }}", &config, None).unwrap(), "1");
        assert_eq!(expand("t", "{{ etcd_cluster }}", &config, None).unwrap(), "ctrl1=https://10.0.0.1:2380");

        let first = expand("t", "{{ etcd_servers }}", &config, None).unwrap();
        for _ in 0..16 {
            assert_eq!(expand("t", "{{ etcd_servers }}", &config, None).unwrap(), first);
        }
        assert_eq!(first, "https://10.0.0.1:2379");
    }

    #[test]
    fn aggregates_join_multiple_controllers_in_name_order() {
        let mut config = fixture();
        config
            .add_node("actrl", "10.0.0.9", 2, role_set(&[Role::Controller]))
            .unwrap();

        assert_eq!(
            expand("t", "{{ etcd_cluster }}", &config, None).unwrap(),
            "actrl=https://10.0.0.9:2380,ctrl1=https://10.0.0.1:2380"
        );
        assert_eq!(
            expand("t", "{{ etcd_servers }}", &config, None).unwrap(),
            "https://10.0.0.9:2379,https://10.0.0.1:2379"
        );
    }

    #[test]
    fn unknown_reference_is_an_error_not_empty() {
        let config = fixture();
        let err = expand("flag", "{{ nonsense }}", &config, None).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownReference { label, reference }
            if label == "flag" && reference == "nonsense"));
    }

    #[test]
    fn unterminated_placeholder_is_an_error() {
        let config = fixture();
        let err = expand("flag", "{{ node_ip ", &config, None).unwrap_err();
        assert!(matches!(err, TemplateError::Unterminated { .. }));
    }

    #[test]
    fn malformed_argument_is_an_error() {
        let config = fixture();
        let err = expand("flag", "{{ asset_file ca.pem }}", &config, None).unwrap_err();
        assert!(matches!(err, TemplateError::BadArgument { reference, .. } if reference == "asset_file"));

        let err = expand("flag", "{{ asset_file }}", &config, None).unwrap_err();
        assert!(matches!(err, TemplateError::BadArgument { reference, .. } if reference == "asset_file"));
    }

    #[test]
    fn asset_resolvers_surface_missing_keys() {
        let config = fixture();
        let err = expand("flag", &asset_file_placeholder("ghost.pem"), &config, None).unwrap_err();

        match err {
            TemplateError::Asset { label, source } => {
                assert_eq!(label, "flag");
                assert!(source.to_string().contains("ghost.pem"));
            }
            other => panic!("expected asset error, got {other:?}"),
        }
    }

    #[test]
    fn asset_resolvers_produce_target_paths() {
        let mut config = fixture();
        config.assets.register_directory("pki", role_set(&[]), "etc/pki");
        config.assets.register_file("ca.pem", role_set(&[]), "pki");

        assert_eq!(
            expand("flag", &asset_file_placeholder("ca.pem"), &config, None).unwrap(),
            "/etc/pki/ca.pem"
        );
        assert_eq!(
            expand("flag", &asset_directory_placeholder("pki"), &config, None).unwrap(),
            "/etc/pki"
        );
    }
}
