// ── Command API ──
//
// Thunks requested by interactive consumers flow through one channel and
// are run one at a time by the explorer's command processor, so their
// state writes never interleave.

use crate::error::CoreError;
use crate::model::{EntityKind, Record};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: ExplorerCommand,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Every orchestration routine the explorer can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerCommand {
    FetchAttributes,
    FetchValues { attribute: String },
    FetchValuesForPrefix { attribute: String, prefix: String },
    FetchColumns,
    FetchItems { entity: EntityKind },
    ChangeEntity { entity: EntityKind },
    ChangeNetwork { network: String },
    SubmitQuery,
    SetSort { order_by: String },
    GetItemByPrimaryKey { key: String, value: String },
    /// Drop the selected entity's rows and fetch them again.
    Refresh,
}

/// Result of a command execution.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    Item(Box<Record>),
}
