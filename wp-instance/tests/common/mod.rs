#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use walkdir::WalkDir;
use wp_config::{ManagerSettings, ReadinessPolicy, WorkspaceType};
use wp_instance::{InstanceManager, StackRequest};
use wp_provider::mock::MockEngine;

pub struct Harness {
    pub dir: TempDir,
    pub manager: InstanceManager<MockEngine>,
}

impl Harness {
    pub fn engine(&self) -> &MockEngine {
        self.manager.engine()
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn wordpress_dir(&self, name: &str) -> PathBuf {
        self.manager.instance_layout(name).wordpress_dir()
    }
}

fn settings(dir: &Path) -> ManagerSettings {
    let mut settings = ManagerSettings::new(dir);
    settings.readiness = ReadinessPolicy {
        attempts: 3,
        interval: Duration::ZERO,
    };
    settings
}

pub fn harness(workspace_type: WorkspaceType) -> Harness {
    let dir = TempDir::new().unwrap();
    let manager = InstanceManager::new(settings(dir.path()), MockEngine::new());
    manager
        .init("blog", workspace_type, &StackRequest::default())
        .unwrap();
    Harness { dir, manager }
}

pub fn multi_instance() -> Harness {
    harness(WorkspaceType::MultiInstance)
}

pub fn stack(mysql: &str, php: &str, webserver: &str) -> StackRequest {
    StackRequest {
        mysql: Some(mysql.to_string()),
        php: Some(php.to_string()),
        webserver: Some(webserver.to_string()),
    }
}

pub fn default_stack() -> StackRequest {
    stack("80", "83", "nginx")
}

/// Every file under `root` (except the lock file) with its bytes.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(true, |ext| ext != "lock"))
        .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
        .collect()
}
