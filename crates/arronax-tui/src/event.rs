//! Terminal input for the explorer.
//!
//! A background task turns crossterm events into [`Event`]s and interleaves
//! the toast/spinner tick and the frame clock.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Toast expiry and spinner frames.
pub const TICK_RATE: Duration = Duration::from_millis(250);
/// Redraw clock.
pub const FRAME_RATE: Duration = Duration::from_millis(33);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    /// Bracketed paste, typically an address or hash copied from elsewhere.
    Paste(String),
    /// Frame clock or a resize; either way the screen is drawn again.
    Redraw,
    Tick,
}

/// Map a raw terminal event. Key releases and repeats, mouse and focus
/// changes carry nothing the explorer reacts to.
pub fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Paste(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| Event::Paste(text.to_owned()))
        }
        CrosstermEvent::Resize(..) => Some(Event::Redraw),
        _ => None,
    }
}

/// Handle on the input task. Dropping it stops the task.
pub struct EventReader {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventReader {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        tokio::spawn(async move {
            let mut input = EventStream::new();
            let mut tick = tokio::time::interval(TICK_RATE);
            let mut frame = tokio::time::interval(FRAME_RATE);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    () = token.cancelled() => break,
                    _ = tick.tick() => Event::Tick,
                    _ = frame.tick() => Event::Redraw,
                    raw = input.next() => match raw {
                        Some(Ok(raw)) => match translate(raw) {
                            Some(event) => event,
                            None => continue,
                        },
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "terminal input error");
                            continue;
                        }
                        // stdin closed
                        None => break,
                    },
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx, cancel }
    }

    /// Next event, or `None` once the input task has ended.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
