//! Instance lifecycle messages (create, start, stop, remove, clone, list, info, logs)

pub struct InstanceMessages {
    // ============================================================================
    // Instance General
    // ============================================================================
    pub not_found: &'static str,
    pub version_substituted: &'static str,

    // ============================================================================
    // Create
    // ============================================================================
    pub create_header: &'static str,
    pub create_info_block: &'static str,
    pub create_success: &'static str,

    // ============================================================================
    // Start / Stop
    // ============================================================================
    pub start_header: &'static str,
    pub start_port_confirmed: &'static str,
    pub start_port_unconfirmed: &'static str,
    pub start_success: &'static str,
    pub stop_header: &'static str,
    pub stop_restart_hint: &'static str,
    pub stop_success: &'static str,

    // ============================================================================
    // Remove
    // ============================================================================
    pub remove_cancelled: &'static str,
    pub remove_confirm_prompt: &'static str,
    pub remove_force: &'static str,
    pub remove_info_block: &'static str,
    pub remove_non_interactive: &'static str,
    pub remove_shared_dependents: &'static str,
    pub remove_success: &'static str,
    pub remove_teardown_warning: &'static str,

    // ============================================================================
    // Clone
    // ============================================================================
    pub clone_header: &'static str,
    pub clone_success: &'static str,

    // ============================================================================
    // List / Info / Logs
    // ============================================================================
    pub info_block: &'static str,
    pub info_shared_from: &'static str,
    pub list_empty: &'static str,
    pub list_table_header: &'static str,
    pub list_table_separator: &'static str,
    pub logs_header: &'static str,
}

pub const INSTANCE_MESSAGES: InstanceMessages = InstanceMessages {
    not_found: "Instance '{name}' not found\n\n💡 List instances with: wp-manager list",
    version_substituted: "ℹ️  Unknown {component} version '{requested}', using {resolved}",

    create_header: "🚀 Creating instance '{name}'...",
    create_info_block: "  Stack:      {webserver} + PHP {php} + MySQL {mysql}\n  Port:       {port}\n  Network:    {network} ({subnet})",
    create_success: "\n✅ Instance '{name}' created\n\n💡 Start with: wp-manager start {name}",

    start_header: "🚀 Starting '{name}'...",
    start_port_confirmed: "  ✓ Published on port {port}",
    start_port_unconfirmed: "⚠️  Could not confirm the published port for '{name}'",
    start_success: "✅ '{name}' is running at {url}",
    stop_header: "🛑 Stopping '{name}'...",
    stop_restart_hint: "\n💡 Restart with: wp-manager start {name}",
    stop_success: "✅ '{name}' stopped",

    remove_cancelled: "\n❌ Removal cancelled",
    remove_confirm_prompt: "Remove instance '{name}'?",
    remove_force: "🗑️ Removing '{name}' (forced)",
    remove_info_block: "  Status:     {status}\n  Directory:  {dir}\n\n⚠️  This will permanently delete:\n  • Containers and volumes\n  • WordPress files and database\n",
    remove_non_interactive: "Refusing to remove '{name}' without confirmation\n\n💡 Re-run with --force when running non-interactively",
    remove_shared_dependents: "⚠️  Instances sharing files with '{name}' will lose access: {dependents}",
    remove_success: "✅ Instance '{name}' removed",
    remove_teardown_warning: "⚠️  Container teardown for '{name}' failed: {error}",

    clone_header: "🧬 Cloning '{source}' into '{target}' ({strategy})...",
    clone_success: "✅ '{target}' cloned from '{source}'",

    info_block: "Instance:   {name}\nStatus:     {status}\nStack:      {webserver} + PHP {php} + MySQL {mysql}\nPort:       {port}\nURL:        {url}\nNetwork:    {network} ({subnet})\nDatabase:   {db_name} (user: {db_user})\nDB password:    {db_password}\nRoot password:  {db_root_password}\nCreated:    {created}",
    info_shared_from: "Files:      shared with '{source}'",
    list_empty: "No instances yet\n\n💡 Create one with: wp-manager create <name>",
    list_table_header: "NAME                 STATUS                 PORT   STACK",
    list_table_separator: "──────────────────────────────────────────────────────────────────",
    logs_header: "📜 Logs for '{name}'{service}",
};
