//! Full configuration lifecycle: generate, persist, reload, and materialize
//! server command lines against real nodes.

use larch::cluster::Cluster;
use larch::constants;
use larch::node::role_set;
use larch::node::Role;
use larch::template;

fn bootstrap(base: &str) -> Cluster {
    let mut cluster = Cluster::new(base);
    cluster.generate("/").unwrap();

    cluster
        .config
        .add_node("ctrl1", "10.0.0.1", 0, role_set(&[Role::Controller]))
        .unwrap();
    cluster
        .config
        .add_node("work1", "10.0.0.2", 1, role_set(&[Role::Worker]))
        .unwrap();

    cluster
}

#[test]
fn configuration_survives_a_save_and_reload() {
    let temp = tempfile::tempdir().unwrap();
    let base = temp.path().to_str().unwrap();

    let cluster = bootstrap(base);
    cluster.save().unwrap();

    let reloaded = Cluster::load(base).unwrap();
    assert_eq!(reloaded.config, cluster.config);
    assert_eq!(reloaded.config.nodes.len(), 2);
    assert!(reloaded.config.servers.iter().any(|server| server.name == "etcd"));
}

#[test]
fn cluster_aggregates_reflect_the_node_set() {
    let temp = tempfile::tempdir().unwrap();
    let cluster = bootstrap(temp.path().to_str().unwrap());

    let config = &cluster.config;
    assert_eq!(template::expand("t", "{{ controllers_count }}", config, None).unwrap(), "1");
    assert_eq!(
        template::expand("t", "{{ etcd_cluster }}", config, None).unwrap(),
        "ctrl1=https://10.0.0.1:2380"
    );
    assert_eq!(
        template::expand("t", "{{ etcd_servers }}", config, None).unwrap(),
        "https://10.0.0.1:2379"
    );
}

#[test]
fn etcd_materializes_against_the_controller() {
    let temp = tempfile::tempdir().unwrap();
    let mut cluster = bootstrap(temp.path().to_str().unwrap());
    cluster.activate_node("ctrl1").unwrap();

    let node = cluster.node.clone().unwrap();
    let etcd = cluster.config.servers.iter().find(|server| server.name == "etcd").unwrap();

    let running = etcd.materialize(&cluster.config, &cluster.name, &node).unwrap();

    assert_eq!(running.argv[0], "/opt/larch/bin/etcd/etcd");
    assert!(running.argv.contains(&"--name=ctrl1".to_string()));
    assert!(running.argv.contains(&"--initial-cluster=ctrl1=https://10.0.0.1:2380".to_string()));
    assert!(running.argv.contains(&"--listen-client-urls=https://10.0.0.1:2379".to_string()));
    assert!(running.argv.contains(&"--peer-client-cert-auth".to_string()));
    assert_eq!(running.log_path.as_deref(), Some("/var/log/larch/etcd.log"));
}

#[test]
fn each_role_sees_only_its_servers() {
    let temp = tempfile::tempdir().unwrap();
    let mut cluster = bootstrap(temp.path().to_str().unwrap());

    cluster.activate_node("ctrl1").unwrap();
    let controller_servers: Vec<_> = cluster.servers_for_node().iter().map(|server| server.name.clone()).collect();
    assert!(controller_servers.contains(&"etcd".to_string()));
    assert!(controller_servers.contains(&"kube-apiserver".to_string()));
    assert!(controller_servers.contains(&"flanneld".to_string()));
    assert!(!controller_servers.contains(&"kubelet".to_string()));

    cluster.activate_node("work1").unwrap();
    let worker_servers: Vec<_> = cluster.servers_for_node().iter().map(|server| server.name.clone()).collect();
    assert!(worker_servers.contains(&"kubelet".to_string()));
    assert!(worker_servers.contains(&"containerd".to_string()));
    assert!(worker_servers.contains(&"flanneld".to_string()));
    assert!(!worker_servers.contains(&"etcd".to_string()));
}

#[test]
fn every_server_of_every_role_materializes_cleanly() {
    let temp = tempfile::tempdir().unwrap();
    let mut cluster = bootstrap(temp.path().to_str().unwrap());

    for name in ["ctrl1", "work1"] {
        cluster.activate_node(name).unwrap();
        let node = cluster.node.clone().unwrap();

        for server in cluster.servers_for_node() {
            let running = server.materialize(&cluster.config, &cluster.name, &node).unwrap();

            // No placeholder survives materialization.
            for token in &running.argv {
                assert!(!token.contains("{{"), "unexpanded placeholder in '{token}' of '{}'", server.name);
            }
        }
    }
}

#[test]
fn asset_paths_root_under_deployment_and_local_bases() {
    let temp = tempfile::tempdir().unwrap();
    let cluster = bootstrap(temp.path().to_str().unwrap());
    let config = &cluster.config;

    assert_eq!(config.target_asset_file(constants::CA_PEM, None).unwrap(), "/etc/larch/certificates/ca.pem");
    assert_eq!(
        config.local_asset_file("/home/op/assets", constants::CA_PEM, None).unwrap(),
        "/home/op/assets/etc/larch/certificates/ca.pem"
    );
    assert_eq!(
        config.target_asset_directory(constants::ETCD_DATA_DIRECTORY, None).unwrap(),
        "/var/lib/larch/etcd"
    );
}
