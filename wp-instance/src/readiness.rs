use std::thread;

use tracing::{debug, warn};
use wp_config::ReadinessPolicy;
use wp_core::error::{Result, WpError};
use wp_provider::ContainerEngine;

use crate::mysql::ping_command;

/// Poll `mysqladmin ping` until MySQL in `container` answers.
pub fn wait_for_mysql<E: ContainerEngine>(
    engine: &E,
    container: &str,
    policy: ReadinessPolicy,
) -> Result<()> {
    let ping = ping_command();

    let mut last_error = None;
    for attempt in 1..=policy.attempts {
        match engine.exec_capture(container, &ping) {
            Ok(_) => {
                debug!("MySQL in {} ready after {} attempt(s)", container, attempt);
                return Ok(());
            }
            Err(e) => {
                debug!("MySQL in {} not ready (attempt {}): {}", container, attempt, e);
                last_error = Some(e);
            }
        }
        if attempt < policy.attempts {
            thread::sleep(policy.interval);
        }
    }

    match last_error {
        Some(e) => Err(WpError::Timeout(format!(
            "MySQL in {} did not become ready after {} attempts: {}",
            container, policy.attempts, e
        ))),
        None => {
            warn!("MySQL readiness wait disabled, continuing with {}", container);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wp_provider::mock::MockEngine;
    use wp_provider::ComposeStack;

    fn policy() -> ReadinessPolicy {
        ReadinessPolicy {
            attempts: 3,
            interval: Duration::ZERO,
        }
    }

    #[test]
    fn test_ready_when_running() {
        let engine = MockEngine::new();
        let stack = ComposeStack::new("wp-alpha", "/nowhere/docker-compose.yml").with_service("mysql");
        engine.compose_up(&stack, &[]).unwrap();
        assert!(wait_for_mysql(&engine, "wp-alpha-mysql", policy()).is_ok());
    }

    #[test]
    fn test_times_out_when_stopped() {
        let engine = MockEngine::new();
        let err = wait_for_mysql(&engine, "wp-alpha-mysql", policy()).unwrap_err();
        assert!(matches!(err, WpError::Timeout(_)));
        let pings = engine
            .calls()
            .iter()
            .filter(|c| c.starts_with("exec wp-alpha-mysql mysqladmin"))
            .count();
        assert_eq!(pings, 3);
    }
}
