mod common;

use std::fs;

use common::{default_stack, harness, multi_instance, snapshot, stack};
use wp_config::{InstanceStatus, WorkspaceType};
use wp_core::error::WpError;
use wp_instance::{InstanceLayout, LiveStatus, StackRequest, TransitionError};

#[test]
fn ports_are_allocated_append_only() {
    let h = multi_instance();
    let m = &h.manager;

    assert_eq!(m.create("alpha", &default_stack()).unwrap().port, 8001);
    assert_eq!(m.create("beta", &default_stack()).unwrap().port, 8002);
    m.remove("alpha").unwrap();
    assert_eq!(m.create("gamma", &default_stack()).unwrap().port, 8003);
}

#[test]
fn network_ordinals_are_never_reused() {
    let h = multi_instance();
    let m = &h.manager;

    let alpha = m.create("alpha", &default_stack()).unwrap();
    let beta = m.create("beta", &default_stack()).unwrap();
    assert_eq!(alpha.network.name, "wp-network-1");
    assert_eq!(beta.network.subnet.to_string(), "172.20.2.0/24");

    m.remove("beta").unwrap();
    let gamma = m.create("gamma", &default_stack()).unwrap();
    assert_eq!(gamma.network.name, "wp-network-3");
    assert!(h.engine().has_network("wp-network-3"));
    assert!(h.engine().has_network("wp-shared"));
}

#[test]
fn foreign_network_with_the_next_name_is_a_hard_failure() {
    let h = multi_instance();
    h.engine()
        .add_network("wp-network-1", "172.20.1.0/24".parse().unwrap());
    let before = snapshot(h.root());

    let err = h.manager.create("alpha", &default_stack()).unwrap_err();
    assert!(err.is_rejected());
    assert!(matches!(err.into_source(), WpError::Conflict(_)));
    assert_eq!(snapshot(h.root()), before);
}

#[test]
fn duplicate_name_is_rejected_without_side_effects() {
    let h = multi_instance();
    h.manager.create("alpha", &default_stack()).unwrap();
    let before = snapshot(h.root());
    h.engine().clear_calls();

    let err = h.manager.create("alpha", &default_stack()).unwrap_err();
    assert!(err.is_rejected());
    let err = h.manager.create("ALPHA", &default_stack()).unwrap_err();
    assert!(err.is_rejected());

    assert_eq!(snapshot(h.root()), before);
    assert!(h.engine().calls().is_empty());
}

#[test]
fn invalid_webserver_is_rejected_without_side_effects() {
    let h = multi_instance();
    let before = snapshot(h.root());

    let err = h
        .manager
        .create("alpha", &stack("80", "83", "lighttpd"))
        .unwrap_err();
    assert!(err.is_rejected());
    assert_eq!(snapshot(h.root()), before);
    assert_eq!(fs::read_dir(h.root().join("instances")).unwrap().count(), 0);
}

#[test]
fn invalid_name_is_rejected() {
    let h = multi_instance();
    assert!(h
        .manager
        .create("no spaces", &default_stack())
        .unwrap_err()
        .is_rejected());
}

#[test]
fn unknown_version_codes_fall_back_visibly() {
    let h = multi_instance();
    let outcome = h.manager.create("alpha", &stack("99", "56", "apache")).unwrap();

    assert_eq!(outcome.stack.php_version.to_string(), "8.3");
    assert_eq!(outcome.stack.mysql_version.to_string(), "8.0");
    let components: Vec<_> = outcome.substitutions.iter().map(|s| s.component).collect();
    assert_eq!(components, vec!["PHP", "MySQL"]);
    assert_eq!(outcome.substitutions[0].requested, "56");
}

#[test]
fn create_lays_out_the_instance() {
    let h = multi_instance();
    h.manager.create("alpha", &stack("57", "81", "apache")).unwrap();

    let layout = h.manager.instance_layout("alpha");
    let metadata = layout.read_metadata().unwrap();
    assert_eq!(metadata.port, 8001);
    assert_eq!(metadata.db_name, "wordpress");
    assert_ne!(metadata.db_password, metadata.db_root_password);
    assert!(metadata.db_password.len() >= 16);

    let compose = fs::read_to_string(layout.compose_path()).unwrap();
    assert!(compose.contains("wpdind/wordpress:apache-2.4.62"));
    assert!(compose.contains("wpdind/wordpress:mysql-5.7.44"));
    assert!(compose.contains("restart: \"no\""));
    assert!(!compose.contains("unless-stopped"));
    assert!(layout.config_dir().join("apache/httpd.conf").is_file());
    assert!(layout.config_dir().join("php/user.ini").is_file());

    let ws = h.manager.store().load().unwrap();
    assert_eq!(ws.instances["alpha"].status, InstanceStatus::Created);
    assert!(h
        .engine()
        .calls()
        .iter()
        .any(|c| c == "compose_create wp-alpha"));
}

#[test]
fn start_and_stop_are_idempotent() {
    let h = multi_instance();
    let m = &h.manager;
    m.create("alpha", &default_stack()).unwrap();

    let started = m.start("alpha").unwrap();
    assert_eq!(started.confirmed_port, Some(8001));
    assert_eq!(started.url, "http://localhost:8001");
    assert!(m.start("alpha").is_ok());
    assert_eq!(m.info("alpha").unwrap().status, LiveStatus::Running);

    m.stop("alpha").unwrap();
    m.stop("alpha").unwrap();
    assert_eq!(m.info("alpha").unwrap().status, LiveStatus::Stopped);
    assert_eq!(
        m.store().load().unwrap().instances["alpha"].status,
        InstanceStatus::Stopped
    );
}

#[test]
fn list_derives_status_from_the_engine() {
    let h = multi_instance();
    let m = &h.manager;
    m.create("alpha", &default_stack()).unwrap();
    m.create("beta", &default_stack()).unwrap();
    m.start("alpha").unwrap();

    // Simulates a host-container restart: persisted status says running.
    h.engine().stop_everything();
    let views = m.list().unwrap();
    assert_eq!(views.len(), 2);
    assert!(views.iter().all(|v| v.status == LiveStatus::Stopped));
    assert_eq!(
        m.store().load().unwrap().instances["alpha"].status,
        InstanceStatus::Running
    );
}

#[test]
fn info_reports_credentials_and_binding() {
    let h = multi_instance();
    h.manager.create("alpha", &default_stack()).unwrap();
    h.manager.start("alpha").unwrap();

    let view = h.manager.info("alpha").unwrap();
    let metadata = view.metadata.unwrap();
    assert_eq!(metadata.name, "alpha");
    assert_eq!(view.published_port, Some(8001));
    assert_eq!(view.network.name, "wp-network-1");

    assert!(matches!(
        h.manager.info("missing").unwrap_err(),
        WpError::NotFound(_)
    ));
}

#[test]
fn remove_releases_the_name() {
    let h = multi_instance();
    let m = &h.manager;
    m.create("alpha", &default_stack()).unwrap();
    m.start("alpha").unwrap();

    let outcome = m.remove("alpha").unwrap();
    assert!(outcome.teardown_errors.is_empty());
    assert!(!m.instance_layout("alpha").exists());
    assert!(!m.store().load().unwrap().instances.contains_key("alpha"));
    assert!(!h.engine().has_network("wp-network-1"));
    assert!(!h.engine().is_running("wp-alpha-web"));

    assert!(m.create("alpha", &default_stack()).is_ok());
}

#[test]
fn remove_reports_teardown_failure_but_cleans_up() {
    let h = multi_instance();
    h.manager.create("alpha", &default_stack()).unwrap();
    h.engine().fail_on("compose_down");

    let outcome = h.manager.remove("alpha").unwrap();
    assert_eq!(outcome.teardown_errors.len(), 1);
    assert!(!h.manager.instance_layout("alpha").exists());
    assert!(h.manager.store().load().unwrap().instances.is_empty());
}

#[test]
fn failed_create_is_rolled_back() {
    let h = multi_instance();
    h.engine().fail_on("compose_create");

    let err = h.manager.create("alpha", &default_stack()).unwrap_err();
    assert!(matches!(err, TransitionError::RolledBack { .. }));
    assert!(!h.manager.instance_layout("alpha").exists());
    assert!(!h.engine().has_network("wp-network-1"));
    assert!(h.manager.store().load().unwrap().instances.is_empty());

    h.engine().clear_failures();
    let retry = h.manager.create("alpha", &default_stack()).unwrap();
    assert_eq!(retry.network.name, "wp-network-2");
}

#[test]
fn incomplete_create_is_visible_and_removable() {
    let h = multi_instance();
    h.engine().fail_on("compose_create");
    h.engine().fail_on("remove_network");

    let err = h.manager.create("alpha", &default_stack()).unwrap_err();
    let hint = err.cleanup_hint().unwrap().to_string();
    assert!(hint.contains("wp-manager remove alpha --force"));

    let views = h.manager.list().unwrap();
    assert_eq!(
        views[0].status,
        LiveStatus::Incomplete(InstanceStatus::Creating)
    );
    assert!(h.manager.start("alpha").unwrap_err().is_rejected());

    h.engine().clear_failures();
    h.manager.remove("alpha").unwrap();
    assert!(!h.engine().has_network("wp-network-1"));
    assert!(h.manager.list().unwrap().is_empty());
}

#[test]
fn logs_map_service_aliases() {
    let h = multi_instance();
    h.manager.create("alpha", &default_stack()).unwrap();
    h.manager.logs("alpha", Some("nginx"), false).unwrap();
    h.manager.logs("alpha", None, false).unwrap();
    assert!(h.manager.logs("alpha", Some("redis"), false).is_err());

    let calls = h.engine().calls();
    assert!(calls.iter().any(|c| c == "compose_logs wp-alpha web"));
    assert!(calls.iter().any(|c| c == "compose_logs wp-alpha"));
}

#[test]
fn init_is_rejected_once_initialized() {
    let h = multi_instance();
    let err = h
        .manager
        .init("other", WorkspaceType::Workspace, &StackRequest::default())
        .unwrap_err();
    assert!(err.is_rejected());
    assert_eq!(h.manager.store().load().unwrap().workspace_name, "blog");
}

#[test]
fn commands_need_an_initialized_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let manager = wp_instance::InstanceManager::new(
        wp_config::ManagerSettings::new(dir.path()),
        wp_provider::mock::MockEngine::new(),
    );
    assert!(manager.list().is_err());
    assert!(manager
        .create("alpha", &default_stack())
        .unwrap_err()
        .is_rejected());
}

#[test]
fn boot_starts_shared_services_but_not_multi_instance_sites() {
    let h = multi_instance();
    h.manager.create("alpha", &default_stack()).unwrap();

    let outcome = h.manager.boot().unwrap();
    assert!(outcome.autostarted.is_none());
    assert_eq!(
        outcome.shared_services,
        vec!["phpmyadmin", "mailpit", "redis", "redis-commander"]
    );
    assert!(h.engine().is_running("wp-shared-mailpit"));
    assert!(!h.engine().is_running("wp-alpha-web"));
    assert!(h.root().join("shared/docker-compose.yml").is_file());
}

#[test]
fn workspace_mode_site_is_fixed_and_autostarted() {
    let h = harness(WorkspaceType::Workspace);
    let m = &h.manager;

    let err = m.create("alpha", &default_stack()).unwrap_err();
    assert!(err.is_rejected());
    assert!(m.remove("blog").unwrap_err().is_rejected());

    let outcome = m.boot().unwrap();
    let site = outcome.autostarted.unwrap();
    assert_eq!(site.name, "blog");
    assert_eq!(site.port, 8000);
    assert!(h.engine().has_network("wp-workspace"));
    assert!(h.engine().is_running("wp-blog-web"));
    let compose = fs::read_to_string(InstanceLayout::for_site(m.store().root()).compose_path()).unwrap();
    assert!(compose.contains("restart: unless-stopped"));

    let views = m.list().unwrap();
    assert_eq!(views.len(), 1);
    assert!(views[0].implicit);
    assert_eq!(views[0].status, LiveStatus::Running);

    m.stop("blog").unwrap();
    assert_eq!(m.info("blog").unwrap().status, LiveStatus::Stopped);
    assert!(m.info("alpha").is_err());
}
