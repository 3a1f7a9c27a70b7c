//! Instance registry and lifecycle state machine.
//!
//! Every mutating operation takes the workspace lock once, loads the document,
//! and persists a transient status before its first side effect so that an
//! interrupted invocation is visible to `list` and recoverable with
//! `remove --force`.

use std::collections::BTreeSet;
use std::fs;

use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span, warn};
use wp_config::{
    InstanceMetadata, InstanceRecord, InstanceStatus, ManagerSettings, MysqlVersion, PhpVersion,
    StackSpec, WebServer, Workspace, WorkspaceStore, WorkspaceType,
};
use wp_core::error::{Result, WpError};
use wp_core::file_system::remove_path;
use wp_core::secrets::generate_password;
use wp_core::validation::validate_instance_name;
use wp_messages::{msg, MESSAGES};
use wp_ports::network::{ensure_available, NETWORK_PREFIX};
use wp_ports::{next_port, NetworkAllocator, NetworkInfo, NetworkSpec, WORKSPACE_PORT};
use wp_provider::compose::SHARED_PROJECT;
use wp_provider::{
    instance_stack, project_name, render_instance_compose, render_shared_compose, ComposeStack,
    ContainerEngine, InstanceTopology, SharedTopology, StackImages, SERVICE_MYSQL, SERVICE_PHP,
    SERVICE_WEB,
};

use crate::clone::{self, CloneStrategy};
use crate::error::{TransitionError, TransitionResult};
use crate::layout::{InstanceLayout, TemplateSource, SHARED_DIR};
use crate::mysql;
use crate::readiness::wait_for_mysql;

/// Stack choice as typed by the user; `None` falls back to the settings.
#[derive(Debug, Clone, Default)]
pub struct StackRequest {
    pub mysql: Option<String>,
    pub php: Option<String>,
    pub webserver: Option<String>,
}

/// A version code that was replaced by the newest supported version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub component: &'static str,
    pub requested: String,
    pub resolved: String,
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub name: String,
    pub port: u16,
    pub network: NetworkSpec,
    pub stack: StackSpec,
    pub substitutions: Vec<Substitution>,
}

#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub name: String,
    pub port: u16,
    pub url: String,
    /// Port the engine reported for the web container, if it could be read.
    pub confirmed_port: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct RemoveOutcome {
    pub name: String,
    /// Engine teardown failures that did not block cleanup.
    pub teardown_errors: Vec<String>,
    /// Shared-reference clones that pointed at the removed files.
    pub dependents: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CloneOutcome {
    pub source: String,
    pub strategy: CloneStrategy,
    pub target: CreateOutcome,
}

#[derive(Debug, Clone)]
pub struct BootOutcome {
    pub shared_services: Vec<String>,
    pub autostarted: Option<StartOutcome>,
}

/// Status derived from the engine at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveStatus {
    Running,
    Stopped,
    /// An operation was interrupted; the persisted transient status.
    Incomplete(InstanceStatus),
}

impl std::fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiveStatus::Running => f.write_str("running"),
            LiveStatus::Stopped => f.write_str("stopped"),
            LiveStatus::Incomplete(status) => write!(f, "{} (incomplete)", status),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstanceView {
    pub name: String,
    pub stack: StackSpec,
    pub port: u16,
    pub network: NetworkSpec,
    pub status: LiveStatus,
    pub url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub shared_from: Option<String>,
    /// Credentials and identity; only loaded by `info`.
    pub metadata: Option<InstanceMetadata>,
    pub published_port: Option<u16>,
    pub implicit: bool,
}

struct Located {
    name: String,
    layout: InstanceLayout,
    record: Option<InstanceRecord>,
    implicit: bool,
}

impl Located {
    fn stack(&self) -> ComposeStack {
        instance_stack(&self.name, self.layout.root())
    }

    fn status(&self) -> Option<InstanceStatus> {
        self.record.as_ref().map(|r| r.status)
    }
}

#[derive(Debug, Default)]
struct CreateProgress {
    network_created: bool,
    dir_created: bool,
    containers_created: bool,
}

pub struct InstanceManager<E: ContainerEngine> {
    settings: ManagerSettings,
    store: WorkspaceStore,
    engine: E,
    templates: TemplateSource,
}

impl<E: ContainerEngine> InstanceManager<E> {
    pub fn new(settings: ManagerSettings, engine: E) -> Self {
        let store = WorkspaceStore::new(&settings.workspace_dir);
        let templates = TemplateSource::from_dir(settings.templates_dir.as_deref());
        Self {
            settings,
            store,
            engine,
            templates,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn store(&self) -> &WorkspaceStore {
        &self.store
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    pub fn instance_layout(&self, name: &str) -> InstanceLayout {
        InstanceLayout::for_instance(self.store.root(), name)
    }

    fn url(&self, port: u16) -> String {
        format!("http://{}:{}", self.settings.host_ip, port)
    }

    // ------------------------------------------------------------------
    // Workspace
    // ------------------------------------------------------------------

    /// Create the workspace document; in workspace mode also lay out the
    /// implicit site under `<workspace>/site`.
    pub fn init(
        &self,
        name: &str,
        workspace_type: WorkspaceType,
        request: &StackRequest,
    ) -> TransitionResult<Workspace> {
        let _span = info_span!("instance_operation", operation = "init", instance = %name).entered();
        validate_instance_name(name)?;
        let (stack, _) = self.resolve_stack(request)?;

        let _lock = self.store.lock()?;
        let existing = self.store.load()?;
        if existing.is_initialized() {
            return Err(WpError::AlreadyExists(msg!(
                MESSAGES.workspace.already_initialized,
                name = existing.workspace_name.as_str(),
                kind = existing.workspace_type.to_string()
            ))
            .into());
        }

        let site = InstanceLayout::for_site(self.store.root());
        if workspace_type == WorkspaceType::Workspace && site.exists() {
            return Err(WpError::AlreadyExists(format!(
                "{:?} already exists; move it aside before initializing",
                site.root()
            ))
            .into());
        }

        let mut workspace = Workspace::new(name, workspace_type, Some(stack));
        workspace.revision = existing.revision;
        workspace.extra = existing.extra;

        let result = match workspace_type {
            WorkspaceType::Workspace => {
                let metadata =
                    self.new_metadata(name, stack, NetworkSpec::workspace(), WORKSPACE_PORT);
                site.prepare(&metadata, &self.templates)
                    .and_then(|_| self.write_compose(&workspace, &site, &metadata))
                    .and_then(|_| self.store.save(&mut workspace))
            }
            WorkspaceType::MultiInstance => {
                fs::create_dir_all(self.store.root().join(crate::layout::INSTANCES_DIR))
                    .map_err(WpError::from)
                    .and_then(|_| self.store.save(&mut workspace))
            }
        };

        if let Err(cause) = result {
            if workspace_type == WorkspaceType::Workspace {
                if let Err(e) = remove_path(site.root()) {
                    return Err(TransitionError::partial(
                        cause,
                        format!("Delete {:?} by hand: {}", site.root(), e),
                    ));
                }
            }
            return Err(TransitionError::RolledBack { source: cause });
        }

        info!("Initialized {} workspace '{}'", workspace_type, name);
        Ok(workspace)
    }

    /// Host-container startup hook: shared network, shared services, and
    /// the workspace-mode site. Multi-instance sites stay as they are.
    pub fn boot(&self) -> TransitionResult<BootOutcome> {
        let _span = info_span!("instance_operation", operation = "boot", instance = "-").entered();
        let _lock = self.store.lock()?;
        let workspace = self.store.load_required()?;
        let hint = "Re-run 'wp-manager boot' once the engine is healthy";

        let shared_services = self
            .start_shared_services(&workspace)
            .map_err(|e| TransitionError::partial(e, hint))?;

        let autostarted = if workspace.is_workspace_mode() {
            let located = self.locate(&workspace, &workspace.workspace_name)?;
            let metadata = located.layout.read_metadata()?;
            let outcome = self
                .bring_up(&workspace, &located, &metadata)
                .map_err(|e| TransitionError::partial(e, hint))?;
            Some(outcome)
        } else {
            None
        };

        Ok(BootOutcome {
            shared_services,
            autostarted,
        })
    }

    fn start_shared_services(&self, workspace: &Workspace) -> Result<Vec<String>> {
        let live = self.engine.list_networks()?;
        self.ensure_shared_network(&live)?;

        let dir = self.store.root().join(SHARED_DIR);
        fs::create_dir_all(&dir)?;
        let topology = SharedTopology::from_catalog(&workspace.catalog());
        let stack = topology.stack(&dir);
        fs::write(&stack.file, render_shared_compose(&topology)?)?;

        if stack.services.is_empty() {
            debug!("No shared services configured");
            return Ok(Vec::new());
        }
        self.engine.compose_up(&stack, &[])?;
        info!("Shared services up in project {}", SHARED_PROJECT);
        Ok(stack.services.iter().map(|s| s.service.clone()).collect())
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub fn create(&self, name: &str, request: &StackRequest) -> TransitionResult<CreateOutcome> {
        let _span = info_span!("instance_operation", operation = "create", instance = %name).entered();
        validate_instance_name(name)?;
        let (stack, substitutions) = self.resolve_stack(request)?;

        let _lock = self.store.lock()?;
        let mut workspace = self.store.load_required()?;
        self.ensure_multi_instance(&workspace, "create")?;

        let mut outcome = self.create_locked(&mut workspace, name, stack)?;
        outcome.substitutions = substitutions;
        Ok(outcome)
    }

    fn resolve_stack(&self, request: &StackRequest) -> Result<(StackSpec, Vec<Substitution>)> {
        let webserver: WebServer = request
            .webserver
            .as_deref()
            .unwrap_or(&self.settings.default_webserver)
            .parse()?;
        let php = PhpVersion::resolve(request.php.as_deref().unwrap_or(&self.settings.default_php));
        let mysql =
            MysqlVersion::resolve(request.mysql.as_deref().unwrap_or(&self.settings.default_mysql));

        let mut substitutions = Vec::new();
        if let Some(requested) = php.substituted_from {
            substitutions.push(Substitution {
                component: "PHP",
                requested,
                resolved: php.value.to_string(),
            });
        }
        if let Some(requested) = mysql.substituted_from {
            substitutions.push(Substitution {
                component: "MySQL",
                requested,
                resolved: mysql.value.to_string(),
            });
        }

        Ok((
            StackSpec {
                webserver,
                php_version: php.value,
                mysql_version: mysql.value,
            },
            substitutions,
        ))
    }

    fn new_metadata(
        &self,
        name: &str,
        stack: StackSpec,
        network: NetworkSpec,
        port: u16,
    ) -> InstanceMetadata {
        InstanceMetadata {
            name: name.to_string(),
            stack,
            network,
            port,
            created: Utc::now(),
            db_name: self.settings.db_name.clone(),
            db_user: self.settings.db_user.clone(),
            db_password: generate_password(),
            db_root_password: generate_password(),
        }
    }

    /// Create with the lock already held and `workspace` freshly loaded.
    fn create_locked(
        &self,
        workspace: &mut Workspace,
        name: &str,
        stack: StackSpec,
    ) -> TransitionResult<CreateOutcome> {
        if let Some(existing) = workspace.name_taken(name) {
            return Err(WpError::AlreadyExists(format!(
                "Instance '{}' already exists",
                existing
            ))
            .into());
        }
        let layout = self.instance_layout(name);
        if layout.exists() {
            return Err(WpError::AlreadyExists(format!(
                "{:?} exists but is not a registered instance; delete it or pick another name",
                layout.root()
            ))
            .into());
        }

        let port = next_port(&workspace.assigned_ports(), self.settings.port_range_start)?;
        let live = self.engine.list_networks()?;
        let network = NetworkAllocator::new(workspace.network_counter)
            .allocate(workspace.instances.values().map(|r| &r.network), &live)?;
        let metadata = self.new_metadata(name, stack, network.clone(), port);

        let snapshot = workspace.clone();
        workspace.network_counter = workspace
            .network_counter
            .max(network.ordinal().unwrap_or(0));
        workspace.instances.insert(
            name.to_string(),
            InstanceRecord {
                port,
                network: network.clone(),
                stack,
                created_at: metadata.created,
                status: InstanceStatus::Creating,
                shared_from: None,
            },
        );
        if let Err(e) = self.store.save(workspace) {
            *workspace = snapshot;
            return Err(TransitionError::Rejected(e));
        }

        let mut progress = CreateProgress::default();
        if let Err(cause) = self.provision(workspace, &layout, &metadata, &mut progress) {
            return Err(self.rollback_create(workspace, name, &layout, &network, progress, cause));
        }

        info!("Created instance '{}' on port {} ({})", name, port, network.name);
        Ok(CreateOutcome {
            name: name.to_string(),
            port,
            network,
            stack,
            substitutions: Vec::new(),
        })
    }

    fn provision(
        &self,
        workspace: &mut Workspace,
        layout: &InstanceLayout,
        metadata: &InstanceMetadata,
        progress: &mut CreateProgress,
    ) -> Result<()> {
        let live = self.engine.list_networks()?;
        self.ensure_shared_network(&live)?;
        self.engine.create_network(&metadata.network)?;
        progress.network_created = true;

        progress.dir_created = true;
        layout.prepare(metadata, &self.templates)?;
        self.write_compose(workspace, layout, metadata)?;

        progress.containers_created = true;
        self.engine
            .compose_create(&instance_stack(&metadata.name, layout.root()))?;

        if let Some(record) = workspace.instance_mut(&metadata.name) {
            record.status = InstanceStatus::Created;
        }
        self.store.save(workspace)
    }

    fn rollback_create(
        &self,
        workspace: &mut Workspace,
        name: &str,
        layout: &InstanceLayout,
        network: &NetworkSpec,
        progress: CreateProgress,
        cause: WpError,
    ) -> TransitionError {
        warn!("Creating '{}' failed, rolling back: {}", name, cause);
        let mut leftovers = Vec::new();
        let mut containers_left = false;

        if progress.containers_created {
            if let Err(e) = self
                .engine
                .compose_down(&instance_stack(name, layout.root()), true)
            {
                containers_left = true;
                leftovers.push(format!("containers ({})", e));
            }
        }
        if progress.network_created {
            if let Err(e) = self.engine.remove_network(&network.name) {
                leftovers.push(format!("network {} ({})", network.name, e));
            }
        }
        // The compose file is needed to tear down leftover containers later.
        if progress.dir_created && !containers_left {
            if let Err(e) = remove_path(layout.root()) {
                leftovers.push(format!("directory {:?} ({})", layout.root(), e));
            }
        }
        if leftovers.is_empty() {
            workspace.instances.shift_remove(name);
            match self.store.save(workspace) {
                Ok(()) => TransitionError::RolledBack { source: cause },
                Err(e) => TransitionError::partial(
                    cause,
                    format!(
                        "The workspace still lists '{}' ({}). Clean up with: wp-manager remove {} --force",
                        name, e, name
                    ),
                ),
            }
        } else {
            // The record stays so that `remove --force` can find the leftovers.
            if let Some(record) = workspace.instance_mut(name) {
                record.status = InstanceStatus::Creating;
            }
            if let Err(e) = self.store.save(workspace) {
                warn!("Could not persist the state of '{}': {}", name, e);
            }
            for leftover in &leftovers {
                warn!("Rollback of '{}' left behind: {}", name, leftover);
            }
            TransitionError::partial(
                cause,
                format!(
                    "Left behind: {}. Clean up with: wp-manager remove {} --force",
                    leftovers.join(", "),
                    name
                ),
            )
        }
    }

    // ------------------------------------------------------------------
    // Start / Stop
    // ------------------------------------------------------------------

    pub fn start(&self, name: &str) -> TransitionResult<StartOutcome> {
        let _span = info_span!("instance_operation", operation = "start", instance = %name).entered();
        let _lock = self.store.lock()?;
        let mut workspace = self.store.load_required()?;
        let located = self.locate(&workspace, name)?;
        ensure_settled(&located)?;
        let metadata = located.layout.read_metadata()?;

        let hint = format!("Inspect the containers with: wp-manager logs {}", located.name);
        let outcome = self
            .bring_up(&workspace, &located, &metadata)
            .map_err(|e| TransitionError::partial(e, hint.clone()))?;

        self.set_status(&mut workspace, &located, InstanceStatus::Running)
            .map_err(|e| TransitionError::partial(e, hint))?;
        Ok(outcome)
    }

    fn bring_up(
        &self,
        workspace: &Workspace,
        located: &Located,
        metadata: &InstanceMetadata,
    ) -> Result<StartOutcome> {
        let live = self.engine.list_networks()?;
        self.ensure_shared_network(&live)?;
        self.ensure_network(&metadata.network, &live)?;
        if !located.layout.compose_path().is_file() {
            self.write_compose(workspace, &located.layout, metadata)?;
        }

        let stack = located.stack();
        self.engine.compose_up(&stack, &[])?;

        let confirmed_port = match stack.container(SERVICE_WEB) {
            Some(web) => self.engine.published_port(web, 80)?,
            None => None,
        };
        match confirmed_port {
            Some(port) if port != metadata.port => warn!(
                "'{}' is published on {} but recorded with port {}",
                located.name, port, metadata.port
            ),
            Some(_) => {}
            None => warn!("Could not confirm the published port of '{}'", located.name),
        }

        Ok(StartOutcome {
            name: located.name.clone(),
            port: metadata.port,
            url: self.url(metadata.port),
            confirmed_port,
        })
    }

    pub fn stop(&self, name: &str) -> TransitionResult<()> {
        let _span = info_span!("instance_operation", operation = "stop", instance = %name).entered();
        let _lock = self.store.lock()?;
        let mut workspace = self.store.load_required()?;
        let located = self.locate(&workspace, name)?;
        ensure_settled(&located)?;

        let hint = format!("Inspect the containers with: wp-manager logs {}", located.name);
        self.engine
            .compose_stop(&located.stack())
            .map_err(|e| TransitionError::partial(e, hint.clone()))?;
        self.set_status(&mut workspace, &located, InstanceStatus::Stopped)
            .map_err(|e| TransitionError::partial(e, hint))?;
        Ok(())
    }

    fn set_status(
        &self,
        workspace: &mut Workspace,
        located: &Located,
        status: InstanceStatus,
    ) -> Result<()> {
        if located.implicit {
            return Ok(());
        }
        match workspace.instance_mut(&located.name) {
            Some(record) if record.status != status => {
                record.status = status;
                self.store.save(workspace)
            }
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Remove
    // ------------------------------------------------------------------

    /// Tear down and delete an instance. Also completes an interrupted
    /// create, clone or remove. Confirmation is the caller's job.
    pub fn remove(&self, name: &str) -> TransitionResult<RemoveOutcome> {
        let _span = info_span!("instance_operation", operation = "remove", instance = %name).entered();
        let _lock = self.store.lock()?;
        let mut workspace = self.store.load_required()?;
        self.ensure_multi_instance(&workspace, "remove")?;

        let layout = self.instance_layout(name);
        let record = workspace.instance(name).cloned();
        if record.is_none() && !layout.exists() {
            return Err(self.not_found(name).into());
        }
        let dependents: Vec<String> = workspace
            .dependents_of(name)
            .into_iter()
            .filter(|d| d != name)
            .collect();
        if !dependents.is_empty() {
            warn!("Removing '{}' breaks shared files of {:?}", name, dependents);
        }

        if let Some(record) = workspace.instance_mut(name) {
            record.status = InstanceStatus::Removing;
            self.store.save(&mut workspace)?;
        }

        let mut teardown_errors = Vec::new();
        if layout.compose_path().is_file() {
            if let Err(e) = self
                .engine
                .compose_down(&instance_stack(name, layout.root()), true)
            {
                warn!("Teardown of '{}' failed: {}", name, e);
                teardown_errors.push(e.to_string());
            }
        }

        let network = record
            .as_ref()
            .map(|r| r.network.clone())
            .or_else(|| layout.read_metadata().ok().map(|m| m.network));
        if let Some(network) = network.filter(|n| n.name.starts_with(NETWORK_PREFIX)) {
            if let Err(e) = self.remove_network_if_present(&network.name) {
                warn!("Removing network {} failed: {}", network.name, e);
                teardown_errors.push(e.to_string());
            }
        }

        remove_path(layout.root()).map_err(|e| {
            TransitionError::partial(
                e,
                format!(
                    "Delete {:?} by hand, then run: wp-manager remove {} --force",
                    layout.root(),
                    name
                ),
            )
        })?;

        workspace.instances.shift_remove(name);
        self.store.save(&mut workspace).map_err(|e| {
            TransitionError::partial(e, format!("Run again: wp-manager remove {} --force", name))
        })?;

        info!("Removed instance '{}'", name);
        Ok(RemoveOutcome {
            name: name.to_string(),
            teardown_errors,
            dependents,
        })
    }

    fn remove_network_if_present(&self, name: &str) -> Result<()> {
        let live = self.engine.list_networks()?;
        if live.iter().any(|n| n.name == name) {
            self.engine.remove_network(name)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Clone
    // ------------------------------------------------------------------

    pub fn clone_instance(
        &self,
        source: &str,
        target: &str,
        strategy: CloneStrategy,
    ) -> TransitionResult<CloneOutcome> {
        let _span = info_span!(
            "instance_operation",
            operation = "clone",
            instance = %target,
            source = %source,
            strategy = %strategy
        )
        .entered();
        validate_instance_name(target)?;
        if source == target {
            return Err(WpError::Validation(format!(
                "Cannot clone '{}' onto itself",
                source
            ))
            .into());
        }

        let _lock = self.store.lock()?;
        let mut workspace = self.store.load_required()?;
        self.ensure_multi_instance(&workspace, "clone")?;

        let located = self.locate(&workspace, source)?;
        ensure_settled(&located)?;
        let source_record = located
            .record
            .clone()
            .ok_or_else(|| self.not_found(source))?;
        let source_metadata = located.layout.read_metadata()?;

        let created = self.create_locked(&mut workspace, target, source_record.stack)?;

        let owner = source_record
            .shared_from
            .clone()
            .unwrap_or_else(|| source.to_string());
        self.populate_clone(
            &mut workspace,
            &located,
            &source_metadata,
            target,
            strategy,
            owner,
        )
        .map_err(|e| {
            TransitionError::partial(
                e,
                format!(
                    "Clone target '{}' is incomplete; remove it with: wp-manager remove {} --force",
                    target, target
                ),
            )
        })?;

        info!("Cloned '{}' into '{}' ({})", source, target, strategy);
        Ok(CloneOutcome {
            source: source.to_string(),
            strategy,
            target: created,
        })
    }

    fn populate_clone(
        &self,
        workspace: &mut Workspace,
        source: &Located,
        source_metadata: &InstanceMetadata,
        target: &str,
        strategy: CloneStrategy,
        owner: String,
    ) -> Result<()> {
        if let Some(record) = workspace.instance_mut(target) {
            record.status = InstanceStatus::Cloning;
            if strategy == CloneStrategy::SharedReference {
                record.shared_from = Some(owner);
            }
        }
        self.store.save(workspace)?;

        let target_layout = self.instance_layout(target);
        let target_stack = instance_stack(target, target_layout.root());
        self.engine.compose_stop(&target_stack)?;

        clone::apply_files(
            strategy,
            &source.layout.wordpress_dir(),
            &target_layout.wordpress_dir(),
        )?;

        self.engine.compose_up(&target_stack, &[])?;

        if strategy.copies_database() {
            let target_metadata = target_layout.read_metadata()?;
            self.copy_database(source, source_metadata, &target_stack, &target_metadata)?;
        }

        if let Some(record) = workspace.instance_mut(target) {
            record.status = InstanceStatus::Running;
        }
        self.store.save(workspace)
    }

    fn copy_database(
        &self,
        source: &Located,
        source_metadata: &InstanceMetadata,
        target_stack: &ComposeStack,
        target_metadata: &InstanceMetadata,
    ) -> Result<()> {
        let target_mysql = service_container(target_stack, SERVICE_MYSQL)?;
        wait_for_mysql(&self.engine, target_mysql, self.settings.readiness)?;

        let source_stack = source.stack();
        let source_mysql = service_container(&source_stack, SERVICE_MYSQL)?;
        let started_source = !self.engine.running_containers()?.contains(source_mysql);
        if started_source {
            info!("Starting MySQL of '{}' for the dump", source.name);
            self.engine.compose_up(&source_stack, &[SERVICE_MYSQL])?;
        }

        let result = self.dump_and_restore(
            source_mysql,
            source_metadata,
            target_mysql,
            target_metadata,
        );

        if started_source {
            if let Err(e) = self.engine.compose_stop(&source_stack) {
                warn!("Could not stop '{}' again after the dump: {}", source.name, e);
            }
        }
        result
    }

    fn dump_and_restore(
        &self,
        source_mysql: &str,
        source_metadata: &InstanceMetadata,
        target_mysql: &str,
        target_metadata: &InstanceMetadata,
    ) -> Result<()> {
        wait_for_mysql(&self.engine, source_mysql, self.settings.readiness)?;
        let dump = self
            .engine
            .exec_capture_bytes(source_mysql, &mysql::dump_command(&source_metadata.db_name))?;
        debug!("Dumped {} bytes from {}", dump.len(), source_mysql);
        self.engine.exec_with_input(
            target_mysql,
            &mysql::restore_command(&target_metadata.db_name),
            &dump,
        )
    }

    // ------------------------------------------------------------------
    // List / Info / Logs
    // ------------------------------------------------------------------

    pub fn list(&self) -> Result<Vec<InstanceView>> {
        let workspace = self.store.load_required()?;
        let running = self.engine.running_containers()?;

        if workspace.is_workspace_mode() {
            let located = self.locate(&workspace, &workspace.workspace_name)?;
            let metadata = located.layout.read_metadata()?;
            return Ok(vec![self.view(&workspace, &located, Some(metadata), &running)?]);
        }

        workspace
            .instances
            .keys()
            .map(|name| {
                let located = self.locate(&workspace, name)?;
                self.view(&workspace, &located, None, &running)
            })
            .collect()
    }

    pub fn info(&self, name: &str) -> Result<InstanceView> {
        let workspace = self.store.load_required()?;
        let located = self.locate(&workspace, name)?;
        let metadata = located.layout.read_metadata()?;
        let running = self.engine.running_containers()?;

        let mut view = self.view(&workspace, &located, Some(metadata), &running)?;
        if view.status == LiveStatus::Running {
            if let Some(web) = located.stack().container(SERVICE_WEB) {
                view.published_port = self.engine.published_port(web, 80)?;
            }
        }
        Ok(view)
    }

    pub fn logs(&self, name: &str, service: Option<&str>, follow: bool) -> Result<()> {
        let workspace = self.store.load_required()?;
        let located = self.locate(&workspace, name)?;
        let service = service.map(service_alias).transpose()?;
        self.engine.compose_logs(&located.stack(), service, follow)
    }

    fn view(
        &self,
        workspace: &Workspace,
        located: &Located,
        metadata: Option<InstanceMetadata>,
        running: &BTreeSet<String>,
    ) -> Result<InstanceView> {
        let (stack, port, network, created_at) = match (&located.record, &metadata) {
            (Some(record), _) => (
                record.stack,
                record.port,
                record.network.clone(),
                Some(record.created_at),
            ),
            (None, Some(meta)) => (
                workspace.workspace_stack.unwrap_or(meta.stack),
                meta.port,
                meta.network.clone(),
                Some(meta.created),
            ),
            (None, None) => return Err(self.not_found(&located.name)),
        };

        let status = match located.status().filter(InstanceStatus::is_transient) {
            Some(transient) => LiveStatus::Incomplete(transient),
            None => {
                let web = format!("{}-{}", project_name(&located.name), SERVICE_WEB);
                if running.contains(&web) {
                    LiveStatus::Running
                } else {
                    LiveStatus::Stopped
                }
            }
        };

        Ok(InstanceView {
            name: located.name.clone(),
            stack,
            port,
            network,
            status,
            url: self.url(port),
            created_at,
            shared_from: located.record.as_ref().and_then(|r| r.shared_from.clone()),
            metadata,
            published_port: None,
            implicit: located.implicit,
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn not_found(&self, name: &str) -> WpError {
        WpError::NotFound(msg!(MESSAGES.instance.not_found, name = name))
    }

    fn ensure_multi_instance(&self, workspace: &Workspace, operation: &str) -> Result<()> {
        if workspace.is_workspace_mode() {
            return Err(WpError::Validation(msg!(
                MESSAGES.workspace.single_instance_mode,
                name = workspace.workspace_name.as_str(),
                operation = operation
            )));
        }
        Ok(())
    }

    fn locate(&self, workspace: &Workspace, name: &str) -> Result<Located> {
        if workspace.is_workspace_mode() {
            if name != workspace.workspace_name {
                return Err(self.not_found(name));
            }
            return Ok(Located {
                name: name.to_string(),
                layout: InstanceLayout::for_site(self.store.root()),
                record: None,
                implicit: true,
            });
        }

        let record = workspace.instance(name).cloned().ok_or_else(|| self.not_found(name))?;
        Ok(Located {
            name: name.to_string(),
            layout: self.instance_layout(name),
            record: Some(record),
            implicit: false,
        })
    }

    fn write_compose(
        &self,
        workspace: &Workspace,
        layout: &InstanceLayout,
        metadata: &InstanceMetadata,
    ) -> Result<()> {
        let images =
            StackImages::resolve(metadata, &workspace.image_versions, &self.settings.image_vendor)?;
        let topology = InstanceTopology::new(metadata, layout.root(), images, &self.settings.host_ip)?
            .autostart(workspace.is_workspace_mode());
        fs::write(layout.compose_path(), render_instance_compose(&topology)?)?;
        Ok(())
    }

    /// Create the shared network unless it already exists.
    fn ensure_shared_network(&self, live: &[NetworkInfo]) -> Result<()> {
        self.ensure_network(&NetworkSpec::shared(), live)
    }

    fn ensure_network(&self, spec: &NetworkSpec, live: &[NetworkInfo]) -> Result<()> {
        if live.iter().any(|n| n.name == spec.name) {
            return Ok(());
        }
        ensure_available(spec, live)?;
        self.engine.create_network(spec)?;
        info!("Created network {} ({})", spec.name, spec.subnet);
        Ok(())
    }
}

fn ensure_settled(located: &Located) -> Result<()> {
    match located.status() {
        Some(status) if status.is_transient() => Err(WpError::Validation(format!(
            "Instance '{}' is stuck in '{}' after an interrupted operation\n\n💡 Remove it with: wp-manager remove {} --force",
            located.name, status, located.name
        ))),
        _ => Ok(()),
    }
}

fn service_container<'a>(stack: &'a ComposeStack, service: &str) -> Result<&'a str> {
    stack.container(service).ok_or_else(|| {
        WpError::Internal(format!("{} has no {} service", stack.project, service))
    })
}

/// Map user-facing service names onto compose services.
pub fn service_alias(service: &str) -> Result<&'static str> {
    match service.to_ascii_lowercase().as_str() {
        "mysql" | "db" | "database" => Ok(SERVICE_MYSQL),
        "php" | "php-fpm" | "wordpress" => Ok(SERVICE_PHP),
        "web" | "nginx" | "apache" | "httpd" => Ok(SERVICE_WEB),
        other => Err(WpError::Validation(format!(
            "Unknown service '{}': expected mysql, php or web",
            other
        ))),
    }
}
