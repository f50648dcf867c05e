//! Explorer commands issued by the UI, run one at a time in the order they
//! were issued.
//!
//! A filter change followed by a fetch must reach the explorer in that
//! order, so commands go through one long-lived task instead of a task
//! each.

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use arronax_core::{Explorer, ExplorerCommand};

use crate::action::{Action, Notification};

pub struct CommandQueue {
    tx: mpsc::UnboundedSender<ExplorerCommand>,
}

impl CommandQueue {
    /// Start the queue task. Failures come back as error toasts.
    pub fn spawn(
        explorer: Explorer,
        action_tx: mpsc::UnboundedSender<Action>,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drain(rx, action_tx, cancel, move |cmd| {
            let explorer = explorer.clone();
            async move {
                explorer
                    .execute(cmd)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.summary())
            }
        }));
        Self { tx }
    }

    pub fn submit(&self, cmd: ExplorerCommand) {
        if let Err(e) = self.tx.send(cmd) {
            warn!(command = ?e.0, "command queue closed");
        }
    }
}

async fn drain<F, Fut>(
    mut rx: mpsc::UnboundedReceiver<ExplorerCommand>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
    mut run: F,
) where
    F: FnMut(ExplorerCommand) -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    loop {
        let cmd = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            cmd = rx.recv() => match cmd {
                Some(cmd) => cmd,
                None => break,
            },
        };

        let label = format!("{cmd:?}");
        match run(cmd).await {
            Ok(()) => debug!(command = %label, "command finished"),
            Err(summary) => {
                warn!(command = %label, error = %summary, "command failed");
                let _ = action_tx.send(Action::Notify(Notification::error(summary)));
            }
        }
    }
    debug!("command queue shut down");
}
