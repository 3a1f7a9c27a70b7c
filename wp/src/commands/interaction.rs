// Confirmation prompts for destructive commands

use std::io::{self, IsTerminal};

use dialoguer::Confirm;
use wp_core::error::{Result, WpError};

pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Ask a yes/no question; defaults to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| WpError::Internal(format!("Failed to prompt for confirmation: {}", e)))
}
