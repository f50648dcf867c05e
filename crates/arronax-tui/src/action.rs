//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use arronax_core::{ExplorerCommand, ExplorerState, StoreAction};

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,

    // ── Data ──────────────────────────────────────────────────────
    /// A new store snapshot from the data bridge.
    StateUpdated(Arc<ExplorerState>),

    // ── Explorer ──────────────────────────────────────────────────
    /// Run a thunk on the explorer's command processor.
    Execute(ExplorerCommand),
    /// Apply a plain store action (filter edits, page size, modal close).
    Dispatch(StoreAction),
    /// Write the selected entity's rows to a CSV file.
    ExportCsv,

    // ── Overlays ──────────────────────────────────────────────────
    OpenNetworkSwitcher,
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
