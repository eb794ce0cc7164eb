//! The registration tables.
//!
//! Everything a node might need on disk, and every process it might run, is
//! declared here against the idempotent registry operations. Order matters
//! only for first registration: directories come before the files inside
//! them, and assets before the commands and servers whose templates reference
//! them.

use std::collections::BTreeMap;

use crate::constants::*;
use crate::error::ConfigError;
use crate::node::role_set;
use crate::node::Role;
use crate::template::asset_directory_placeholder;
use crate::template::asset_file_placeholder;

use super::Cluster;

/// Join relative path fragments. Registration-time only; rooting under a base
/// happens at resolution.
fn sub(parent: &str, child: &str) -> String {
    format!("{}/{child}", parent.trim_end_matches('/'))
}

/// Build an argument map from flag/value pairs.
fn arguments(pairs: Vec<(&str, String)>) -> BTreeMap<String, String> {
    pairs.into_iter().map(|(flag, value)| (flag.to_string(), value)).collect()
}

impl Cluster {
    /// Resolved local path of an asset file, for command templates that are
    /// expanded eagerly at registration.
    fn local_file(&self, name: &str) -> Result<String, ConfigError> {
        self.config.local_asset_file(&self.base_directory, name, self.node_context())
    }

    /// Resolved local path of an asset directory.
    fn local_directory(&self, name: &str) -> Result<String, ConfigError> {
        self.config.local_asset_directory(&self.base_directory, name, self.node_context())
    }

    /// The registered relative path of a directory, for deriving nested ones.
    fn relative(&self, name: &str) -> Result<String, ConfigError> {
        Ok(self.config.relative_asset_directory(name)?.to_string())
    }

    pub(super) fn register_asset_directories(&mut self) -> Result<(), ConfigError> {
        let assets = &mut self.config.assets;

        // Configuration
        assets.register_directory(CONFIG_DIRECTORY, role_set(&[]), sub(ETC_SUBDIRECTORY, PROJECT_SUBDIRECTORY));

        let config = self.relative(CONFIG_DIRECTORY)?;
        let assets = &mut self.config.assets;
        assets.register_directory(CERTIFICATES_DIRECTORY, role_set(&[]), sub(&config, CERTIFICATES_SUBDIRECTORY));
        assets.register_directory(CNI_CONFIG_DIRECTORY, role_set(&[]), sub(&config, CNI_SUBDIRECTORY));
        assets.register_directory(CRI_CONFIG_DIRECTORY, role_set(&[]), sub(&config, CRI_SUBDIRECTORY));
        assets.register_directory(K8S_CONFIG_DIRECTORY, role_set(&[]), sub(&config, K8S_SUBDIRECTORY));
        assets.register_directory(GOBETWEEN_CONFIG_DIRECTORY, role_set(&[]), sub(&config, LOAD_BALANCER_SUBDIRECTORY));

        // K8s configuration
        let k8s_config = self.relative(K8S_CONFIG_DIRECTORY)?;
        let assets = &mut self.config.assets;
        assets.register_directory(K8S_KUBE_CONFIG_DIRECTORY, role_set(&[]), sub(&k8s_config, KUBECONFIG_SUBDIRECTORY));
        assets.register_directory(
            K8S_SECURITY_CONFIG_DIRECTORY,
            role_set(&[]),
            sub(&k8s_config, SECURITY_SUBDIRECTORY),
        );
        assets.register_directory(K8S_SETUP_CONFIG_DIRECTORY, role_set(&[]), sub(&k8s_config, SETUP_SUBDIRECTORY));
        assets.register_directory(
            K8S_MANIFESTS_DIRECTORY,
            role_set(&[Role::Worker]),
            sub(&k8s_config, MANIFESTS_SUBDIRECTORY),
        );

        // Binaries
        let assets = &mut self.config.assets;
        assets.register_directory(
            BINARIES_DIRECTORY,
            role_set(&[]),
            sub(&sub(OPT_SUBDIRECTORY, PROJECT_SUBDIRECTORY), BIN_SUBDIRECTORY),
        );

        let binaries = self.relative(BINARIES_DIRECTORY)?;
        let assets = &mut self.config.assets;
        assets.register_directory(K8S_BINARIES_DIRECTORY, role_set(&[]), sub(&binaries, K8S_SUBDIRECTORY));
        assets.register_directory(ETCD_BINARIES_DIRECTORY, role_set(&[]), sub(&binaries, ETCD_SUBDIRECTORY));
        assets.register_directory(CRI_BINARIES_DIRECTORY, role_set(&[]), sub(&binaries, CRI_SUBDIRECTORY));
        assets.register_directory(CNI_BINARIES_DIRECTORY, role_set(&[]), sub(&binaries, CNI_SUBDIRECTORY));
        assets.register_directory(
            GOBETWEEN_BINARIES_DIRECTORY,
            role_set(&[]),
            sub(&binaries, LOAD_BALANCER_SUBDIRECTORY),
        );

        // Dynamic data
        let assets = &mut self.config.assets;
        assets.register_directory(
            DYNAMIC_DATA_DIRECTORY,
            role_set(&[]),
            sub(&sub(VAR_SUBDIRECTORY, LIB_SUBDIRECTORY), PROJECT_SUBDIRECTORY),
        );

        let dynamic = self.relative(DYNAMIC_DATA_DIRECTORY)?;
        let assets = &mut self.config.assets;
        assets.register_directory(ETCD_DATA_DIRECTORY, role_set(&[]), sub(&dynamic, ETCD_SUBDIRECTORY));
        assets.register_directory(CONTAINERD_DATA_DIRECTORY, role_set(&[]), sub(&dynamic, CONTAINERD_SUBDIRECTORY));
        assets.register_directory(KUBELET_DATA_DIRECTORY, role_set(&[]), sub(&dynamic, KUBELET_SUBDIRECTORY));
        assets.register_directory(HELM_DATA_DIRECTORY, role_set(&[]), sub(&dynamic, HELM_SUBDIRECTORY));

        // Miscellaneous
        assets.register_directory(
            LOGGING_DIRECTORY,
            role_set(&[]),
            sub(&sub(VAR_SUBDIRECTORY, LOG_SUBDIRECTORY), PROJECT_SUBDIRECTORY),
        );
        assets.register_directory(
            SERVICE_DIRECTORY,
            role_set(&[]),
            sub(&sub(ETC_SUBDIRECTORY, SYSTEMD_SUBDIRECTORY), SYSTEM_SUBDIRECTORY),
        );
        assets.register_directory(
            CONTAINERD_STATE_DIRECTORY,
            role_set(&[]),
            sub(&sub(&sub(VAR_SUBDIRECTORY, RUN_SUBDIRECTORY), PROJECT_SUBDIRECTORY), CONTAINERD_SUBDIRECTORY),
        );
        assets.register_directory(PROFILE_DIRECTORY, role_set(&[]), sub(ETC_SUBDIRECTORY, PROFILE_D_SUBDIRECTORY));
        assets.register_directory(TEMPORARY_DIRECTORY, role_set(&[]), TMP_SUBDIRECTORY.to_string());

        Ok(())
    }

    pub(super) fn register_asset_files(&mut self) {
        let assets = &mut self.config.assets;

        let all_nodes = || role_set(&[Role::Controller, Role::Worker]);
        let controller = || role_set(&[Role::Controller]);
        let worker = || role_set(&[Role::Worker]);
        let unlabeled = || role_set(&[]);

        // Configuration
        assets.register_file(CONFIG_FILENAME, all_nodes(), CONFIG_DIRECTORY);

        // This tool's own binary
        assets.register_file(LARCH_BINARY, all_nodes(), BINARIES_DIRECTORY);

        // CNI binaries
        assets.register_file(BRIDGE_BINARY, worker(), CNI_BINARIES_DIRECTORY);
        assets.register_file(FLANNEL_BINARY, worker(), CNI_BINARIES_DIRECTORY);
        assets.register_file(LOOPBACK_BINARY, worker(), CNI_BINARIES_DIRECTORY);
        assets.register_file(HOST_LOCAL_BINARY, worker(), CNI_BINARIES_DIRECTORY);

        // CRI binaries
        assets.register_file(CONTAINERD_BINARY, worker(), CRI_BINARIES_DIRECTORY);
        assets.register_file(CONTAINERD_SHIM_BINARY, worker(), CRI_BINARIES_DIRECTORY);
        assets.register_file(CTR_BINARY, worker(), CRI_BINARIES_DIRECTORY);
        assets.register_file(RUNC_BINARY, worker(), CRI_BINARIES_DIRECTORY);
        assets.register_file(CRICTL_BINARY, worker(), CRI_BINARIES_DIRECTORY);

        // Etcd binaries
        assets.register_file(ETCD_BINARY, controller(), ETCD_BINARIES_DIRECTORY);
        assets.register_file(ETCDCTL_BINARY, controller(), ETCD_BINARIES_DIRECTORY);
        assets.register_file(FLANNELD_BINARY, all_nodes(), ETCD_BINARIES_DIRECTORY);

        // K8s binaries
        assets.register_file(KUBECTL_BINARY, controller(), K8S_BINARIES_DIRECTORY);
        assets.register_file(KUBE_APISERVER_BINARY, controller(), K8S_BINARIES_DIRECTORY);
        assets.register_file(KUBE_CONTROLLER_MANAGER_BINARY, controller(), K8S_BINARIES_DIRECTORY);
        assets.register_file(KUBE_SCHEDULER_BINARY, controller(), K8S_BINARIES_DIRECTORY);
        assets.register_file(KUBELET_BINARY, worker(), K8S_BINARIES_DIRECTORY);
        assets.register_file(KUBE_PROXY_BINARY, worker(), K8S_BINARIES_DIRECTORY);
        assets.register_file(HELM_BINARY, unlabeled(), K8S_BINARIES_DIRECTORY);

        // Load balancer binary
        assets.register_file(GOBETWEEN_BINARY, controller(), GOBETWEEN_BINARIES_DIRECTORY);

        // Certificates
        assets.register_file(CA_PEM, all_nodes(), CERTIFICATES_DIRECTORY);
        assets.register_file(CA_KEY_PEM, controller(), CERTIFICATES_DIRECTORY);
        assets.register_file(VIRTUAL_IP_PEM, all_nodes(), CERTIFICATES_DIRECTORY);
        assets.register_file(VIRTUAL_IP_KEY_PEM, all_nodes(), CERTIFICATES_DIRECTORY);
        assets.register_file(FLANNELD_PEM, all_nodes(), CERTIFICATES_DIRECTORY);
        assets.register_file(FLANNELD_KEY_PEM, all_nodes(), CERTIFICATES_DIRECTORY);
        assets.register_file(KUBERNETES_PEM, controller(), CERTIFICATES_DIRECTORY);
        assets.register_file(KUBERNETES_KEY_PEM, controller(), CERTIFICATES_DIRECTORY);
        assets.register_file(SERVICE_ACCOUNT_PEM, controller(), CERTIFICATES_DIRECTORY);
        assets.register_file(SERVICE_ACCOUNT_KEY_PEM, controller(), CERTIFICATES_DIRECTORY);
        assets.register_file(ADMIN_PEM, unlabeled(), CERTIFICATES_DIRECTORY);
        assets.register_file(ADMIN_KEY_PEM, unlabeled(), CERTIFICATES_DIRECTORY);
        assets.register_file(CONTROLLER_MANAGER_PEM, unlabeled(), CERTIFICATES_DIRECTORY);
        assets.register_file(CONTROLLER_MANAGER_KEY_PEM, unlabeled(), CERTIFICATES_DIRECTORY);
        assets.register_file(SCHEDULER_PEM, unlabeled(), CERTIFICATES_DIRECTORY);
        assets.register_file(SCHEDULER_KEY_PEM, unlabeled(), CERTIFICATES_DIRECTORY);
        assets.register_file(PROXY_PEM, unlabeled(), CERTIFICATES_DIRECTORY);
        assets.register_file(PROXY_KEY_PEM, unlabeled(), CERTIFICATES_DIRECTORY);
        assets.register_file(KUBELET_PEM, worker(), CERTIFICATES_DIRECTORY);
        assets.register_file(KUBELET_KEY_PEM, worker(), CERTIFICATES_DIRECTORY);

        // Kubeconfig files
        assets.register_file(ADMIN_KUBECONFIG, unlabeled(), K8S_KUBE_CONFIG_DIRECTORY);
        assets.register_file(CONTROLLER_MANAGER_KUBECONFIG, controller(), K8S_KUBE_CONFIG_DIRECTORY);
        assets.register_file(SCHEDULER_KUBECONFIG, controller(), K8S_KUBE_CONFIG_DIRECTORY);
        assets.register_file(PROXY_KUBECONFIG, worker(), K8S_KUBE_CONFIG_DIRECTORY);
        assets.register_file(KUBELET_KUBECONFIG, worker(), K8S_KUBE_CONFIG_DIRECTORY);

        // Security
        assets.register_file(ENCRYPTION_CONFIG, controller(), K8S_SECURITY_CONFIG_DIRECTORY);

        // CNI configuration
        assets.register_file(NET_CONFIG, worker(), CNI_CONFIG_DIRECTORY);
        assets.register_file(CNI_CONFIG, worker(), CNI_CONFIG_DIRECTORY);

        // CRI configuration
        assets.register_file(CONTAINERD_CONFIG, worker(), CRI_CONFIG_DIRECTORY);
        assets.register_file(CONTAINERD_SOCK, unlabeled(), CONTAINERD_STATE_DIRECTORY);

        // Systemd service unit
        assets.register_file(SERVICE_CONFIG, all_nodes(), SERVICE_DIRECTORY);

        // K8s setup manifests
        assets.register_file(K8S_KUBELET_SETUP, unlabeled(), K8S_SETUP_CONFIG_DIRECTORY);
        assets.register_file(K8S_ADMIN_USER_SETUP, unlabeled(), K8S_SETUP_CONFIG_DIRECTORY);
        assets.register_file(K8S_HELM_USER_SETUP, unlabeled(), K8S_SETUP_CONFIG_DIRECTORY);

        // K8s component configuration
        assets.register_file(K8S_KUBE_SCHEDULER_CONFIG, controller(), K8S_CONFIG_DIRECTORY);
        assets.register_file(K8S_KUBELET_CONFIG, worker(), K8S_CONFIG_DIRECTORY);

        // Shell profile
        assets.register_file(LARCH_PROFILE, all_nodes(), PROFILE_DIRECTORY);

        // Load balancer configuration
        assets.register_file(GOBETWEEN_CONFIG, controller(), GOBETWEEN_CONFIG_DIRECTORY);
    }

    pub(super) fn register_commands(&mut self) -> Result<(), ConfigError> {
        let kubectl = format!(
            "{} --kubeconfig {}",
            self.local_file(KUBECTL_BINARY)?,
            self.local_file(ADMIN_KUBECONFIG)?
        );
        let helm = format!(
            "KUBECONFIG={} HELM_HOME={} {}",
            self.local_file(ADMIN_KUBECONFIG)?,
            self.local_directory(HELM_DATA_DIRECTORY)?,
            self.local_file(HELM_BINARY)?
        );

        let flanneld_configuration = format!(
            "{} --ca-file={} --cert-file={} --key-file={} --endpoints={} \
             set /coreos.com/network/config '{{ \"Network\": \"{}\" }}'",
            self.local_file(ETCDCTL_BINARY)?,
            self.local_file(CA_PEM)?,
            self.local_file(KUBERNETES_PEM)?,
            self.local_file(KUBERNETES_KEY_PEM)?,
            self.config.etcd_client_endpoints().join(","),
            self.config.cluster_cidr,
        );

        let kubelet_setup = self.local_file(K8S_KUBELET_SETUP)?;
        let admin_user_setup = self.local_file(K8S_ADMIN_USER_SETUP)?;
        let helm_user_setup = self.local_file(K8S_HELM_USER_SETUP)?;

        let config = &mut self.config;

        let all_nodes = || role_set(&[Role::Controller, Role::Worker]);
        let worker = || role_set(&[Role::Worker]);
        let bootstrapper = || role_set(&[Role::Bootstrapper]);

        // Host preparation
        config.register_command("swapoff", worker(), "swapoff -a");
        config.register_command("load-overlay", worker(), "modprobe overlay");
        config.register_command("load-btrfs", worker(), "modprobe btrfs");
        config.register_command("load-br_netfilter", all_nodes(), "modprobe br_netfilter");
        config.register_command(
            "enable-br_netfilter",
            all_nodes(),
            "echo '1' > /proc/sys/net/bridge/bridge-nf-call-iptables",
        );

        // Cluster bootstrap
        config.register_command("flanneld-configuration", bootstrapper(), flanneld_configuration);
        config.register_command("k8s-kubelet-setup", bootstrapper(), format!("{kubectl} apply -f {kubelet_setup}"));
        config.register_command(
            "k8s-admin-user-setup",
            bootstrapper(),
            format!("{kubectl} apply -f {admin_user_setup}"),
        );
        config.register_command(
            "k8s-kube-dns",
            bootstrapper(),
            format!("{kubectl} apply -f https://storage.googleapis.com/kubernetes-the-hard-way/kube-dns.yaml"),
        );
        config.register_command("k8s-helm-user-setup", bootstrapper(), format!("{kubectl} apply -f {helm_user_setup}"));
        config.register_command(
            "helm-init",
            bootstrapper(),
            format!("{helm} init --service-account {HELM_SERVICE_ACCOUNT} --upgrade"),
        );
        config.register_command("helm-repo-update", bootstrapper(), format!("{helm} repo update"));
        config.register_command(
            "helm-kubernetes-dashboard",
            bootstrapper(),
            format!(
                "{kubectl} get svc kubernetes-dashboard -n kube-system || \
                 {helm} install stable/kubernetes-dashboard --name kubernetes-dashboard \
                 --set=service.type=NodePort,service.nodePort=32443 --namespace kube-system"
            ),
        );

        Ok(())
    }

    pub(super) fn register_servers(&mut self) {
        let config = &mut self.config;

        let all_nodes = || role_set(&[Role::Controller, Role::Worker]);
        let controller = || role_set(&[Role::Controller]);
        let worker = || role_set(&[Role::Worker]);

        config.register_server(
            "etcd",
            controller(),
            asset_file_placeholder(ETCD_BINARY),
            arguments(vec![
                ("name", "{{ node_name }}".to_string()),
                ("cert-file", asset_file_placeholder(KUBERNETES_PEM)),
                ("key-file", asset_file_placeholder(KUBERNETES_KEY_PEM)),
                ("peer-cert-file", asset_file_placeholder(KUBERNETES_PEM)),
                ("peer-key-file", asset_file_placeholder(KUBERNETES_KEY_PEM)),
                ("trusted-ca-file", asset_file_placeholder(CA_PEM)),
                ("peer-trusted-ca-file", asset_file_placeholder(CA_PEM)),
                ("peer-client-cert-auth", String::new()),
                ("client-cert-auth", String::new()),
                ("initial-advertise-peer-urls", "https://{{ node_ip }}:2380".to_string()),
                ("listen-peer-urls", "https://{{ node_ip }}:2380".to_string()),
                ("listen-client-urls", "https://{{ node_ip }}:2379".to_string()),
                ("advertise-client-urls", "https://{{ node_ip }}:2379".to_string()),
                ("initial-cluster-token", "etcd-cluster".to_string()),
                ("initial-cluster", "{{ etcd_cluster }}".to_string()),
                ("initial-cluster-state", "new".to_string()),
                ("data-dir", asset_directory_placeholder(ETCD_DATA_DIRECTORY)),
            ]),
        );

        config.register_server(
            "flanneld",
            all_nodes(),
            asset_file_placeholder(FLANNELD_BINARY),
            arguments(vec![
                ("etcd-endpoints", "{{ etcd_servers }}".to_string()),
                ("etcd-cafile", asset_file_placeholder(CA_PEM)),
                ("etcd-certfile", asset_file_placeholder(FLANNELD_PEM)),
                ("etcd-keyfile", asset_file_placeholder(FLANNELD_KEY_PEM)),
                ("iface-regex", "{{ node_ip }}".to_string()),
                ("v", "0".to_string()),
            ]),
        );

        config.register_server(
            "containerd",
            worker(),
            asset_file_placeholder(CONTAINERD_BINARY),
            arguments(vec![("config", asset_file_placeholder(CONTAINERD_CONFIG))]),
        );

        config.register_server(
            "gobetween",
            controller(),
            asset_file_placeholder(GOBETWEEN_BINARY),
            arguments(vec![("config", asset_file_placeholder(GOBETWEEN_CONFIG))]),
        );

        config.register_server(
            "kube-apiserver",
            controller(),
            asset_file_placeholder(KUBE_APISERVER_BINARY),
            arguments(vec![
                ("allow-privileged", "true".to_string()),
                ("advertise-address", "{{ node_ip }}".to_string()),
                ("apiserver-count", "{{ controllers_count }}".to_string()),
                ("audit-log-maxage", "30".to_string()),
                ("audit-log-maxbackup", "3".to_string()),
                ("audit-log-maxsize", "100".to_string()),
                ("audit-log-path", format!("{}/{AUDIT_LOG}", asset_directory_placeholder(LOGGING_DIRECTORY))),
                ("authorization-mode", "Node,RBAC".to_string()),
                ("bind-address", "0.0.0.0".to_string()),
                ("secure-port", "{{ api_server_port }}".to_string()),
                ("client-ca-file", asset_file_placeholder(CA_PEM)),
                (
                    "enable-admission-plugins",
                    "Initializers,NamespaceLifecycle,NodeRestriction,LimitRanger,ServiceAccount,\
                     DefaultStorageClass,ResourceQuota"
                        .to_string(),
                ),
                ("enable-swagger-ui", "true".to_string()),
                ("etcd-cafile", asset_file_placeholder(CA_PEM)),
                ("etcd-certfile", asset_file_placeholder(KUBERNETES_PEM)),
                ("etcd-keyfile", asset_file_placeholder(KUBERNETES_KEY_PEM)),
                ("etcd-servers", "{{ etcd_servers }}".to_string()),
                ("event-ttl", "1h".to_string()),
                ("experimental-encryption-provider-config", asset_file_placeholder(ENCRYPTION_CONFIG)),
                ("kubelet-certificate-authority", asset_file_placeholder(CA_PEM)),
                ("kubelet-client-certificate", asset_file_placeholder(KUBERNETES_PEM)),
                ("kubelet-client-key", asset_file_placeholder(KUBERNETES_KEY_PEM)),
                ("kubelet-https", "true".to_string()),
                ("runtime-config", "api/all".to_string()),
                ("service-account-key-file", asset_file_placeholder(SERVICE_ACCOUNT_PEM)),
                ("service-cluster-ip-range", "{{ cluster_ip_range }}".to_string()),
                ("service-node-port-range", "30000-32767".to_string()),
                ("tls-cert-file", asset_file_placeholder(KUBERNETES_PEM)),
                ("tls-private-key-file", asset_file_placeholder(KUBERNETES_KEY_PEM)),
                ("v", "0".to_string()),
            ]),
        );

        config.register_server(
            "kube-controller-manager",
            controller(),
            asset_file_placeholder(KUBE_CONTROLLER_MANAGER_BINARY),
            arguments(vec![
                ("address", "0.0.0.0".to_string()),
                ("cluster-cidr", "{{ cluster_cidr }}".to_string()),
                ("cluster-name", "kubernetes".to_string()),
                ("cluster-signing-cert-file", asset_file_placeholder(CA_PEM)),
                ("cluster-signing-key-file", asset_file_placeholder(CA_KEY_PEM)),
                ("kubeconfig", asset_file_placeholder(CONTROLLER_MANAGER_KUBECONFIG)),
                ("leader-elect", "true".to_string()),
                ("root-ca-file", asset_file_placeholder(CA_PEM)),
                ("service-account-private-key-file", asset_file_placeholder(SERVICE_ACCOUNT_KEY_PEM)),
                ("service-cluster-ip-range", "{{ cluster_ip_range }}".to_string()),
                ("use-service-account-credentials", "true".to_string()),
                ("v", "0".to_string()),
            ]),
        );

        config.register_server(
            "kube-scheduler",
            controller(),
            asset_file_placeholder(KUBE_SCHEDULER_BINARY),
            arguments(vec![
                ("config", asset_file_placeholder(K8S_KUBE_SCHEDULER_CONFIG)),
                ("v", "0".to_string()),
            ]),
        );

        config.register_server(
            "kube-proxy",
            worker(),
            asset_file_placeholder(KUBE_PROXY_BINARY),
            arguments(vec![
                ("cluster-cidr", "{{ cluster_cidr }}".to_string()),
                ("kubeconfig", asset_file_placeholder(PROXY_KUBECONFIG)),
                ("proxy-mode", "iptables".to_string()),
                ("v", "0".to_string()),
            ]),
        );

        config.register_server(
            "kubelet",
            worker(),
            asset_file_placeholder(KUBELET_BINARY),
            arguments(vec![
                ("allow-privileged", "true".to_string()),
                ("config", asset_file_placeholder(K8S_KUBELET_CONFIG)),
                ("container-runtime", "remote".to_string()),
                ("container-runtime-endpoint", format!("unix://{}", asset_file_placeholder(CONTAINERD_SOCK))),
                ("image-pull-progress-deadline", "2m".to_string()),
                ("kubeconfig", asset_file_placeholder(KUBELET_KUBECONFIG)),
                ("network-plugin", "cni".to_string()),
                ("register-node", "true".to_string()),
                ("resolv-conf", "{{ resolv_conf }}".to_string()),
                ("root-dir", asset_directory_placeholder(KUBELET_DATA_DIRECTORY)),
                ("v", "0".to_string()),
            ]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants;

    fn generated() -> Cluster {
        let mut cluster = Cluster::new("/assets");
        cluster.generate("/").unwrap();
        cluster
    }

    #[test]
    fn generate_registers_everything_in_dependency_order() {
        let cluster = generated();

        assert!(cluster.config.assets.directories.len() >= 24);
        assert!(cluster.config.assets.files.len() >= 45);
        assert_eq!(cluster.config.servers.len(), 9);
        assert_eq!(cluster.config.commands.len(), 13);

        // Every file's owner directory must be registered.
        for (name, file) in &cluster.config.assets.files {
            assert!(
                cluster.config.assets.directories.contains_key(&file.directory),
                "file '{name}' references unregistered directory '{}'",
                file.directory
            );
        }
    }

    #[test]
    fn generate_is_idempotent() {
        let mut cluster = generated();
        let snapshot = cluster.config.clone();

        cluster.generate("/").unwrap();
        assert_eq!(cluster.config, snapshot);
    }

    #[test]
    fn nested_directories_inherit_parent_paths() {
        let cluster = generated();

        assert_eq!(
            cluster.config.relative_asset_directory(constants::CONFIG_DIRECTORY).unwrap(),
            "etc/larch"
        );
        assert_eq!(
            cluster.config.relative_asset_directory(constants::CERTIFICATES_DIRECTORY).unwrap(),
            "etc/larch/certificates"
        );
        assert_eq!(
            cluster.config.relative_asset_directory(constants::ETCD_DATA_DIRECTORY).unwrap(),
            "var/lib/larch/etcd"
        );
    }

    #[test]
    fn commands_resolve_local_paths_eagerly() {
        let cluster = generated();

        let kubelet_setup = cluster
            .config
            .commands
            .iter()
            .find(|command| command.name == "k8s-kubelet-setup")
            .unwrap();

        assert!(kubelet_setup.command.contains("/assets/opt/larch/bin/k8s/kubectl"));
        assert!(!kubelet_setup.command.contains("{{"));
    }

    #[test]
    fn server_templates_stay_unexpanded_until_materialization() {
        let cluster = generated();

        let etcd = cluster.config.servers.iter().find(|server| server.name == "etcd").unwrap();
        assert_eq!(etcd.arguments.get("initial-cluster").unwrap(), "{{ etcd_cluster }}");
        assert!(etcd.command.contains("asset_file"));
    }
}
