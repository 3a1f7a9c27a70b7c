//! Common/shared messages across commands

pub struct CommonMessages {
    // ============================================================================
    // Status labels
    // ============================================================================
    pub status_running: &'static str,
    pub status_stopped: &'static str,
    pub status_incomplete: &'static str,

    // ============================================================================
    // Error Messages (alphabetically sorted)
    // ============================================================================
    pub error_generic: &'static str,
    pub error_rolled_back: &'static str,

    // ============================================================================
    // Generic
    // ============================================================================
    pub warning_generic: &'static str,
}

pub const COMMON_MESSAGES: CommonMessages = CommonMessages {
    status_running: "🟢 running",
    status_stopped: "🔴 stopped",
    status_incomplete: "🟡 {status} (incomplete)",

    error_generic: "❌ Error: {error}",
    error_rolled_back: "↩️  Changes made before the failure were rolled back",

    warning_generic: "⚠️  Warning: {warning}",
};
