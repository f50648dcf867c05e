//! Data bridge: connects the explorer's state stream to TUI actions.
//!
//! Runs as a background task: pushes the current snapshot, then forwards
//! every store change as [`Action::StateUpdated`] until cancelled.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use arronax_core::Explorer;

use crate::action::Action;

pub async fn spawn_data_bridge(
    explorer: Explorer,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut states = explorer.subscribe();

    // Screens render something before the first fetch lands
    let _ = action_tx.send(Action::StateUpdated(states.latest()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(state) = states.changed() => {
                if action_tx.send(Action::StateUpdated(state)).is_err() {
                    break;
                }
            }
        }
    }

    debug!("data bridge shut down");
}
