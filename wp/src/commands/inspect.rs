// list, info and logs

use wp_core::error::WpError;
use wp_core::wp_println;
use wp_instance::{service_alias, InstanceView, TransitionResult};
use wp_messages::{msg, MESSAGES};

use super::{status_label, Context};

fn stack_label(view: &InstanceView) -> String {
    format!(
        "{} + PHP {} + MySQL {}",
        view.stack.webserver, view.stack.php_version, view.stack.mysql_version
    )
}

pub fn handle_list(ctx: &Context) -> TransitionResult<()> {
    let manager = ctx.manager()?;
    let views = manager.list()?;

    if views.is_empty() {
        wp_println!("{}", MESSAGES.instance.list_empty);
        return Ok(());
    }

    wp_println!("{}", MESSAGES.instance.list_table_header);
    wp_println!("{}", MESSAGES.instance.list_table_separator);
    for view in &views {
        wp_println!(
            "{:<20} {:<22} {:<6} {}",
            view.name,
            status_label(view.status),
            view.port,
            stack_label(view)
        );
    }
    Ok(())
}

pub fn handle_info(ctx: &Context, name: &str) -> TransitionResult<()> {
    let manager = ctx.manager()?;
    let view = manager.info(name)?;
    let metadata = view.metadata.as_ref().ok_or_else(|| {
        WpError::NotFound(msg!(MESSAGES.instance.not_found, name = name))
    })?;

    wp_println!(
        "{}",
        msg!(
            MESSAGES.instance.info_block,
            name = view.name.as_str(),
            status = status_label(view.status),
            webserver = view.stack.webserver.to_string(),
            php = view.stack.php_version.to_string(),
            mysql = view.stack.mysql_version.to_string(),
            port = view.port.to_string(),
            url = view.url.as_str(),
            network = view.network.name.as_str(),
            subnet = view.network.subnet.to_string(),
            db_name = metadata.db_name.as_str(),
            db_user = metadata.db_user.as_str(),
            db_password = metadata.db_password.as_str(),
            db_root_password = metadata.db_root_password.as_str(),
            created = metadata.created.to_rfc3339()
        )
    );
    if let Some(source) = &view.shared_from {
        wp_println!(
            "{}",
            msg!(MESSAGES.instance.info_shared_from, source = source.as_str())
        );
    }
    if let Some(published) = view.published_port.filter(|p| *p != view.port) {
        wp_println!(
            "{}",
            msg!(
                MESSAGES.common.warning_generic,
                warning = format!(
                    "engine publishes port {} but {} was allocated",
                    published, view.port
                )
            )
        );
    }
    Ok(())
}

pub fn handle_logs(
    ctx: &Context,
    name: &str,
    service: Option<&str>,
    follow: bool,
) -> TransitionResult<()> {
    let service = service.map(service_alias).transpose()?;
    let manager = ctx.manager()?;

    eprintln!(
        "{}",
        msg!(
            MESSAGES.instance.logs_header,
            name = name,
            service = service.map(|s| format!(" ({})", s)).unwrap_or_default()
        )
    );
    manager.logs(name, service, follow)?;
    Ok(())
}
