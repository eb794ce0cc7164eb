//! Logical names and cluster-wide defaults.
//!
//! Logical asset names are the keys of the asset registry; path components are
//! the building blocks of the relative paths the registration tables derive.
//! Nothing here is a concrete filesystem path on its own.

// ============================================================================
// Configuration defaults
// ============================================================================

/// Version stamp written into freshly generated configurations.
pub const CONFIG_VERSION: &str = "1.0.0";

/// Default secure port of the API server.
pub const API_SERVER_PORT: u16 = 6443;

/// Default port of the load balancer fronting the API servers.
pub const LOAD_BALANCER_PORT: u16 = 16443;

/// Default service cluster IP range.
pub const CLUSTER_IP_RANGE: &str = "10.32.0.0/24";

/// Default cluster DNS service IP.
pub const CLUSTER_DNS_IP: &str = "10.32.0.10";

/// Default pod network CIDR.
pub const CLUSTER_CIDR: &str = "10.200.0.0/16";

/// Default resolv.conf handed to the kubelet.
pub const RESOLV_CONF: &str = "/etc/resolv.conf";

/// File name of the persisted configuration document.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Service account used by helm's server-side component.
pub const HELM_SERVICE_ACCOUNT: &str = "tiller";

// ============================================================================
// Path components
// ============================================================================

pub const ETC_SUBDIRECTORY: &str = "etc";
pub const OPT_SUBDIRECTORY: &str = "opt";
pub const VAR_SUBDIRECTORY: &str = "var";
pub const LIB_SUBDIRECTORY: &str = "lib";
pub const LOG_SUBDIRECTORY: &str = "log";
pub const RUN_SUBDIRECTORY: &str = "run";
pub const TMP_SUBDIRECTORY: &str = "tmp";
pub const BIN_SUBDIRECTORY: &str = "bin";
pub const PROJECT_SUBDIRECTORY: &str = "larch";
pub const K8S_SUBDIRECTORY: &str = "k8s";
pub const ETCD_SUBDIRECTORY: &str = "etcd";
pub const CRI_SUBDIRECTORY: &str = "cri";
pub const CNI_SUBDIRECTORY: &str = "cni";
pub const CERTIFICATES_SUBDIRECTORY: &str = "certificates";
pub const LOAD_BALANCER_SUBDIRECTORY: &str = "lb";
pub const KUBECONFIG_SUBDIRECTORY: &str = "kubeconfig";
pub const SECURITY_SUBDIRECTORY: &str = "security";
pub const SETUP_SUBDIRECTORY: &str = "setup";
pub const MANIFESTS_SUBDIRECTORY: &str = "manifests";
pub const CONTAINERD_SUBDIRECTORY: &str = "containerd";
pub const KUBELET_SUBDIRECTORY: &str = "kubelet";
pub const HELM_SUBDIRECTORY: &str = "helm";
pub const SYSTEMD_SUBDIRECTORY: &str = "systemd";
pub const SYSTEM_SUBDIRECTORY: &str = "system";
pub const PROFILE_D_SUBDIRECTORY: &str = "profile.d";

// ============================================================================
// Logical directory names
// ============================================================================

pub const CONFIG_DIRECTORY: &str = "config";
pub const CERTIFICATES_DIRECTORY: &str = "certificates";
pub const CNI_CONFIG_DIRECTORY: &str = "cni-config";
pub const CRI_CONFIG_DIRECTORY: &str = "cri-config";
pub const K8S_CONFIG_DIRECTORY: &str = "k8s-config";
pub const K8S_KUBE_CONFIG_DIRECTORY: &str = "k8s-kube-config";
pub const K8S_SECURITY_CONFIG_DIRECTORY: &str = "k8s-security-config";
pub const K8S_SETUP_CONFIG_DIRECTORY: &str = "k8s-setup-config";
pub const K8S_MANIFESTS_DIRECTORY: &str = "k8s-manifests";
pub const BINARIES_DIRECTORY: &str = "binaries";
pub const K8S_BINARIES_DIRECTORY: &str = "k8s-binaries";
pub const ETCD_BINARIES_DIRECTORY: &str = "etcd-binaries";
pub const CRI_BINARIES_DIRECTORY: &str = "cri-binaries";
pub const CNI_BINARIES_DIRECTORY: &str = "cni-binaries";
pub const GOBETWEEN_BINARIES_DIRECTORY: &str = "gobetween-binaries";
pub const GOBETWEEN_CONFIG_DIRECTORY: &str = "gobetween-config";
pub const DYNAMIC_DATA_DIRECTORY: &str = "dynamic-data";
pub const ETCD_DATA_DIRECTORY: &str = "etcd-data";
pub const CONTAINERD_DATA_DIRECTORY: &str = "containerd-data";
pub const KUBELET_DATA_DIRECTORY: &str = "kubelet-data";
pub const LOGGING_DIRECTORY: &str = "logging";
pub const SERVICE_DIRECTORY: &str = "service";
pub const CONTAINERD_STATE_DIRECTORY: &str = "containerd-state";
pub const PROFILE_DIRECTORY: &str = "profile";
pub const HELM_DATA_DIRECTORY: &str = "helm-data";
pub const TEMPORARY_DIRECTORY: &str = "temporary";

// ============================================================================
// Logical file names
// ============================================================================

// The registry joins a file's logical name onto its owner directory, so the
// logical name doubles as the on-disk file name.

pub const LARCH_BINARY: &str = "larch";

// CNI binaries
pub const BRIDGE_BINARY: &str = "bridge";
pub const FLANNEL_BINARY: &str = "flannel";
pub const LOOPBACK_BINARY: &str = "loopback";
pub const HOST_LOCAL_BINARY: &str = "host-local";

// CRI binaries
pub const CONTAINERD_BINARY: &str = "containerd";
pub const CONTAINERD_SHIM_BINARY: &str = "containerd-shim";
pub const CTR_BINARY: &str = "ctr";
pub const RUNC_BINARY: &str = "runc";
pub const CRICTL_BINARY: &str = "crictl";

// Etcd binaries
pub const ETCD_BINARY: &str = "etcd";
pub const ETCDCTL_BINARY: &str = "etcdctl";
pub const FLANNELD_BINARY: &str = "flanneld";

// K8s binaries
pub const KUBECTL_BINARY: &str = "kubectl";
pub const KUBE_APISERVER_BINARY: &str = "kube-apiserver";
pub const KUBE_CONTROLLER_MANAGER_BINARY: &str = "kube-controller-manager";
pub const KUBELET_BINARY: &str = "kubelet";
pub const KUBE_PROXY_BINARY: &str = "kube-proxy";
pub const KUBE_SCHEDULER_BINARY: &str = "kube-scheduler";
pub const HELM_BINARY: &str = "helm";
pub const GOBETWEEN_BINARY: &str = "gobetween";

// Certificates
pub const CA_PEM: &str = "ca.pem";
pub const CA_KEY_PEM: &str = "ca-key.pem";
pub const VIRTUAL_IP_PEM: &str = "virtual-ip.pem";
pub const VIRTUAL_IP_KEY_PEM: &str = "virtual-ip-key.pem";
pub const FLANNELD_PEM: &str = "flanneld.pem";
pub const FLANNELD_KEY_PEM: &str = "flanneld-key.pem";
pub const KUBERNETES_PEM: &str = "kubernetes.pem";
pub const KUBERNETES_KEY_PEM: &str = "kubernetes-key.pem";
pub const SERVICE_ACCOUNT_PEM: &str = "service-account.pem";
pub const SERVICE_ACCOUNT_KEY_PEM: &str = "service-account-key.pem";
pub const ADMIN_PEM: &str = "admin.pem";
pub const ADMIN_KEY_PEM: &str = "admin-key.pem";
pub const CONTROLLER_MANAGER_PEM: &str = "controller-manager.pem";
pub const CONTROLLER_MANAGER_KEY_PEM: &str = "controller-manager-key.pem";
pub const SCHEDULER_PEM: &str = "scheduler.pem";
pub const SCHEDULER_KEY_PEM: &str = "scheduler-key.pem";
pub const PROXY_PEM: &str = "proxy.pem";
pub const PROXY_KEY_PEM: &str = "proxy-key.pem";
pub const KUBELET_PEM: &str = "kubelet.pem";
pub const KUBELET_KEY_PEM: &str = "kubelet-key.pem";

// Kubeconfig files
pub const ADMIN_KUBECONFIG: &str = "admin.kubeconfig";
pub const CONTROLLER_MANAGER_KUBECONFIG: &str = "controller-manager.kubeconfig";
pub const SCHEDULER_KUBECONFIG: &str = "scheduler.kubeconfig";
pub const PROXY_KUBECONFIG: &str = "proxy.kubeconfig";
pub const KUBELET_KUBECONFIG: &str = "kubelet.kubeconfig";

// Security
pub const ENCRYPTION_CONFIG: &str = "encryption-config.yaml";

// CNI configuration
pub const NET_CONFIG: &str = "10-bridge.conf";
pub const CNI_CONFIG: &str = "99-loopback.conf";

// CRI configuration
pub const CONTAINERD_CONFIG: &str = "config.toml";
pub const CONTAINERD_SOCK: &str = "containerd.sock";

// Systemd service unit
pub const SERVICE_CONFIG: &str = "larch.service";

// K8s setup manifests
pub const K8S_KUBELET_SETUP: &str = "kubelet-setup.yaml";
pub const K8S_ADMIN_USER_SETUP: &str = "admin-user-setup.yaml";
pub const K8S_HELM_USER_SETUP: &str = "helm-user-setup.yaml";

// K8s component configuration
pub const K8S_KUBE_SCHEDULER_CONFIG: &str = "kube-scheduler-config.yaml";
pub const K8S_KUBELET_CONFIG: &str = "kubelet-config.yaml";

// Shell profile
pub const LARCH_PROFILE: &str = "larch.sh";

// Load balancer configuration
pub const GOBETWEEN_CONFIG: &str = "gobetween.toml";

// API server audit log, written under the logging directory
pub const AUDIT_LOG: &str = "audit.log";
