//! Workspace messages (init, boot, shared services)

pub struct WorkspaceMessages {
    pub already_initialized: &'static str,
    pub boot_autostart: &'static str,
    pub boot_header: &'static str,
    pub boot_shared_services: &'static str,
    pub boot_success: &'static str,
    pub init_success: &'static str,
    pub single_instance_mode: &'static str,
}

pub const WORKSPACE_MESSAGES: WorkspaceMessages = WorkspaceMessages {
    already_initialized: "Workspace '{name}' is already initialized as {kind}",
    boot_autostart: "  ✓ Auto-starting workspace site '{name}'",
    boot_header: "🔌 Preparing workspace '{name}'...",
    boot_shared_services: "  ✓ Shared services up on network {network}",
    boot_success: "✅ Workspace ready",
    init_success: "✅ Initialized {kind} workspace '{name}'",
    single_instance_mode: "Workspace '{name}' runs a single site; '{operation}' needs a multi-instance workspace",
};
