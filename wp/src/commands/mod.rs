// Command handlers for wp-manager

use tracing::debug;
use wp_config::ManagerSettings;
use wp_core::error::Result;
use wp_core::{wp_error, wp_error_hint, wp_warning};
use wp_instance::{InstanceManager, LiveStatus, TransitionError, TransitionResult};
use wp_messages::{msg, MESSAGES};
use wp_provider::docker::DockerEngine;

use crate::cli::{Args, Command};

pub mod inspect;
pub mod interaction;
pub mod lifecycle;
pub mod workspace;

/// Settings plus a lazily connected engine.
pub struct Context {
    settings: ManagerSettings,
}

impl Context {
    pub fn new(settings: ManagerSettings) -> Self {
        Self { settings }
    }

    /// Manager backed by the Docker engine; fails when docker is missing.
    pub fn manager(&self) -> Result<InstanceManager<DockerEngine>> {
        let engine = DockerEngine::new()?;
        Ok(InstanceManager::new(self.settings.clone(), engine))
    }

    /// Manager for commands that only touch the workspace directory.
    pub fn offline_manager(&self) -> InstanceManager<DockerEngine> {
        InstanceManager::new(self.settings.clone(), DockerEngine::default())
    }
}

/// Main command dispatcher
pub fn execute_command(args: Args) -> TransitionResult<()> {
    let mut settings = ManagerSettings::from_env()?;
    if let Some(dir) = args.workspace {
        settings = settings.with_workspace_dir(dir);
    }
    debug!("Workspace directory: {:?}", settings.workspace_dir);
    let ctx = Context::new(settings);

    match args.command {
        Command::Init {
            name,
            workspace_type,
            mysql,
            php,
            webserver,
        } => workspace::handle_init(&ctx, &name, &workspace_type, mysql, php, webserver),
        Command::Boot => workspace::handle_boot(&ctx),
        Command::Create {
            name,
            mysql,
            php,
            webserver,
        } => lifecycle::handle_create(&ctx, &name, mysql, php, webserver),
        Command::Start { name } => lifecycle::handle_start(&ctx, &name),
        Command::Stop { name } => lifecycle::handle_stop(&ctx, &name),
        Command::Remove { name, force } => lifecycle::handle_remove(&ctx, &name, force),
        Command::Clone {
            source,
            target,
            strategy,
        } => lifecycle::handle_clone(&ctx, &source, &target, &strategy),
        Command::List => inspect::handle_list(&ctx),
        Command::Info { name } => inspect::handle_info(&ctx, &name),
        Command::Logs {
            name,
            service,
            follow,
        } => inspect::handle_logs(&ctx, &name, service.as_deref(), follow),
    }
}

/// Print a failed transition: the cause, then what was undone or left behind.
pub fn report_error(err: &TransitionError) {
    let source = match err {
        TransitionError::Rejected(source)
        | TransitionError::RolledBack { source }
        | TransitionError::Partial { source, .. } => source,
    };
    wp_error!("{}", msg!(MESSAGES.common.error_generic, error = source.to_string()));

    match err {
        TransitionError::RolledBack { .. } => {
            eprintln!("{}", MESSAGES.common.error_rolled_back);
        }
        TransitionError::Partial { cleanup_hint, .. } => {
            wp_warning!("Some changes could not be undone");
            wp_error_hint!("{}", cleanup_hint);
        }
        TransitionError::Rejected(_) => {}
    }
}

pub(crate) fn status_label(status: LiveStatus) -> String {
    match status {
        LiveStatus::Running => MESSAGES.common.status_running.to_string(),
        LiveStatus::Stopped => MESSAGES.common.status_stopped.to_string(),
        LiveStatus::Incomplete(transient) => msg!(
            MESSAGES.common.status_incomplete,
            status = transient.as_str()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wp_config::InstanceStatus;

    #[test]
    fn test_status_labels() {
        assert!(status_label(LiveStatus::Running).contains("running"));
        assert!(status_label(LiveStatus::Stopped).contains("stopped"));
        assert_eq!(
            status_label(LiveStatus::Incomplete(InstanceStatus::Cloning)),
            "🟡 cloning (incomplete)"
        );
    }

    #[test]
    fn test_report_error_covers_every_outcome() {
        use wp_core::error::WpError;

        report_error(&TransitionError::Rejected(WpError::Validation("bad name".into())));
        report_error(&TransitionError::RolledBack {
            source: WpError::Engine("compose up failed".into()),
        });
        report_error(&TransitionError::partial(
            WpError::Engine("network rm failed".into()),
            "Run again: wp-manager remove alpha --force",
        ));
    }
}
