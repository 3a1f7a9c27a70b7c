// init and boot

use wp_config::WorkspaceType;
use wp_core::wp_println;
use wp_instance::{StackRequest, TransitionResult};
use wp_messages::{msg, MESSAGES};
use wp_ports::NetworkSpec;

use super::Context;

pub fn handle_init(
    ctx: &Context,
    name: &str,
    workspace_type: &str,
    mysql: Option<String>,
    php: Option<String>,
    webserver: Option<String>,
) -> TransitionResult<()> {
    let workspace_type: WorkspaceType = workspace_type.parse()?;
    let request = StackRequest {
        mysql,
        php,
        webserver,
    };

    let workspace = ctx.offline_manager().init(name, workspace_type, &request)?;

    wp_println!(
        "{}",
        msg!(
            MESSAGES.workspace.init_success,
            kind = workspace.workspace_type.to_string(),
            name = workspace.workspace_name.as_str()
        )
    );
    if let Some(stack) = workspace.workspace_stack {
        let network = NetworkSpec::workspace();
        wp_println!(
            "{}",
            msg!(
                MESSAGES.instance.create_info_block,
                webserver = stack.webserver.to_string(),
                php = stack.php_version.to_string(),
                mysql = stack.mysql_version.to_string(),
                port = wp_ports::WORKSPACE_PORT.to_string(),
                network = network.name.as_str(),
                subnet = network.subnet.to_string()
            )
        );
    }
    Ok(())
}

pub fn handle_boot(ctx: &Context) -> TransitionResult<()> {
    let manager = ctx.manager()?;
    let name = manager.store().load_required()?.workspace_name;
    wp_println!("{}", msg!(MESSAGES.workspace.boot_header, name = name.as_str()));

    let outcome = manager.boot()?;
    if !outcome.shared_services.is_empty() {
        wp_println!(
            "{}",
            msg!(
                MESSAGES.workspace.boot_shared_services,
                network = NetworkSpec::shared().name.as_str()
            )
        );
        for service in &outcome.shared_services {
            wp_println!("    • {}", service);
        }
    }
    if let Some(site) = outcome.autostarted {
        wp_println!(
            "{}",
            msg!(MESSAGES.workspace.boot_autostart, name = site.name.as_str())
        );
        wp_println!(
            "{}",
            msg!(
                MESSAGES.instance.start_success,
                name = site.name.as_str(),
                url = site.url.as_str()
            )
        );
    }
    wp_println!("{}", MESSAGES.workspace.boot_success);
    Ok(())
}
