// create, start, stop, remove, clone

use wp_core::error::WpError;
use wp_core::wp_println;
use wp_instance::{CloneStrategy, CreateOutcome, StackRequest, TransitionResult};
use wp_messages::{msg, MESSAGES};

use super::{interaction, status_label, Context};

pub fn handle_create(
    ctx: &Context,
    name: &str,
    mysql: Option<String>,
    php: Option<String>,
    webserver: Option<String>,
) -> TransitionResult<()> {
    let request = StackRequest {
        mysql,
        php,
        webserver,
    };
    let manager = ctx.manager()?;

    wp_println!("{}", msg!(MESSAGES.instance.create_header, name = name));
    let outcome = manager.create(name, &request)?;
    print_created(&outcome);
    wp_println!("{}", msg!(MESSAGES.instance.create_success, name = name));
    Ok(())
}

fn print_created(outcome: &CreateOutcome) {
    for sub in &outcome.substitutions {
        wp_println!(
            "{}",
            msg!(
                MESSAGES.instance.version_substituted,
                component = sub.component,
                requested = sub.requested.as_str(),
                resolved = sub.resolved.as_str()
            )
        );
    }
    wp_println!(
        "{}",
        msg!(
            MESSAGES.instance.create_info_block,
            webserver = outcome.stack.webserver.to_string(),
            php = outcome.stack.php_version.to_string(),
            mysql = outcome.stack.mysql_version.to_string(),
            port = outcome.port.to_string(),
            network = outcome.network.name.as_str(),
            subnet = outcome.network.subnet.to_string()
        )
    );
}

pub fn handle_start(ctx: &Context, name: &str) -> TransitionResult<()> {
    let manager = ctx.manager()?;
    wp_println!("{}", msg!(MESSAGES.instance.start_header, name = name));

    let outcome = manager.start(name)?;
    match outcome.confirmed_port {
        Some(port) => {
            wp_println!(
                "{}",
                msg!(MESSAGES.instance.start_port_confirmed, port = port.to_string())
            );
        }
        None => {
            wp_println!(
                "{}",
                msg!(MESSAGES.instance.start_port_unconfirmed, name = name)
            );
        }
    }
    wp_println!(
        "{}",
        msg!(
            MESSAGES.instance.start_success,
            name = outcome.name.as_str(),
            url = outcome.url.as_str()
        )
    );
    Ok(())
}

pub fn handle_stop(ctx: &Context, name: &str) -> TransitionResult<()> {
    let manager = ctx.manager()?;
    wp_println!("{}", msg!(MESSAGES.instance.stop_header, name = name));
    manager.stop(name)?;
    wp_println!("{}", msg!(MESSAGES.instance.stop_success, name = name));
    wp_println!("{}", msg!(MESSAGES.instance.stop_restart_hint, name = name));
    Ok(())
}

pub fn handle_remove(ctx: &Context, name: &str, force: bool) -> TransitionResult<()> {
    if !force && !interaction::is_interactive() {
        return Err(WpError::Validation(msg!(
            MESSAGES.instance.remove_non_interactive,
            name = name
        ))
        .into());
    }
    let manager = ctx.manager()?;

    if force {
        wp_println!("{}", msg!(MESSAGES.instance.remove_force, name = name));
    } else {
        // An interrupted create may have no metadata yet; remove still applies.
        let status = manager
            .info(name)
            .map(|view| status_label(view.status))
            .unwrap_or_else(|_| "unknown".to_string());
        wp_println!(
            "{}",
            msg!(
                MESSAGES.instance.remove_info_block,
                status = status,
                dir = manager.instance_layout(name).root().display().to_string()
            )
        );
        let dependents = manager.store().load()?.dependents_of(name);
        if !dependents.is_empty() {
            wp_println!(
                "{}",
                msg!(
                    MESSAGES.instance.remove_shared_dependents,
                    name = name,
                    dependents = dependents.join(", ")
                )
            );
        }
        let prompt = msg!(MESSAGES.instance.remove_confirm_prompt, name = name);
        if !interaction::confirm(&prompt)? {
            wp_println!("{}", MESSAGES.instance.remove_cancelled);
            return Ok(());
        }
    }

    let outcome = manager.remove(name)?;
    for error in &outcome.teardown_errors {
        wp_println!(
            "{}",
            msg!(
                MESSAGES.instance.remove_teardown_warning,
                name = name,
                error = error.as_str()
            )
        );
    }
    if force && !outcome.dependents.is_empty() {
        wp_println!(
            "{}",
            msg!(
                MESSAGES.instance.remove_shared_dependents,
                name = name,
                dependents = outcome.dependents.join(", ")
            )
        );
    }
    wp_println!("{}", msg!(MESSAGES.instance.remove_success, name = name));
    Ok(())
}

pub fn handle_clone(
    ctx: &Context,
    source: &str,
    target: &str,
    strategy: &str,
) -> TransitionResult<()> {
    let strategy: CloneStrategy = strategy.parse()?;
    let manager = ctx.manager()?;

    wp_println!(
        "{}",
        msg!(
            MESSAGES.instance.clone_header,
            source = source,
            target = target,
            strategy = strategy.to_string()
        )
    );
    let outcome = manager.clone_instance(source, target, strategy)?;
    print_created(&outcome.target);
    wp_println!(
        "{}",
        msg!(
            MESSAGES.instance.clone_success,
            target = target,
            source = outcome.source.as_str()
        )
    );
    Ok(())
}
