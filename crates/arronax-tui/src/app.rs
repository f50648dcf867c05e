//! Application core: event loop, overlays and action dispatch.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use arronax_core::{Explorer, ExplorerCommand, ExplorerState};

use crate::action::{Action, Notification, NotificationLevel};
use crate::command_queue::CommandQueue;
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screens::ExplorerScreen;
use crate::theme;
use crate::tui::{Tui, window_title};
use crate::widgets::value_select::{SelectEvent, ValueSelect};

/// How long a toast stays up.
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Top-level application state and event loop.
pub struct App {
    screen: ExplorerScreen,
    running: bool,
    help_visible: bool,
    /// Action sender; components dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver; the main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
    explorer: Explorer,
    /// Cancels the data bridge and command queue tasks.
    data_cancel: CancellationToken,
    /// Set once `run` starts the queue.
    commands: Option<CommandQueue>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
    network_switcher: ValueSelect,
    throbber_state: ThrobberState,
    /// Latest store snapshot, for the status bar and export naming.
    state: Option<Arc<ExplorerState>>,
}

impl App {
    pub fn new(explorer: Explorer) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let config = explorer.config();
        let mut network_switcher = ValueSelect::new("Network");
        network_switcher.set_options(
            config
                .networks
                .iter()
                .map(|(name, net)| (name.clone(), format!("{} ({name})", net.display_name)))
                .collect(),
        );
        network_switcher.set_selected(Some(config.default_network.clone()));

        Self {
            screen: ExplorerScreen::new(),
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
            explorer,
            data_cancel: CancellationToken::new(),
            commands: None,
            notification: None,
            network_switcher,
            throbber_state: ThrobberState::default(),
            state: None,
        }
    }

    /// Run the main event loop until quit.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::enter()?;
        self.screen.init(self.action_tx.clone())?;

        self.explorer.start().await;

        let explorer = self.explorer.clone();
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(explorer, tx, cancel).await;
        });
        self.commands = Some(CommandQueue::spawn(
            self.explorer.clone(),
            self.action_tx.clone(),
            self.data_cancel.clone(),
        ));

        // Initial load of the default entity
        self.execute_command(ExplorerCommand::FetchItems {
            entity: self.explorer.config().default_entity,
        });

        let mut events = EventReader::spawn();

        info!(screen = self.screen.id(), "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Paste(text) => {
                    for action in self.handle_paste(&text)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Redraw => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    if let Some(state) = self.state.as_ref() {
                        tui.set_title(window_title(&state.platform, &state.network))?;
                    }
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        drop(events);
        self.explorer.shutdown().await;
        drop(tui);
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Overlays and the screen's input modes
    /// take keys before the global bindings.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        // Any key press clears the toast
        if self.notification.is_some() {
            self.action_tx.send(Action::DismissNotification)?;
        }

        if self.network_switcher.is_open() {
            return Ok(match self.network_switcher.handle_key(key) {
                SelectEvent::Chosen(network) => {
                    Some(Action::Execute(ExplorerCommand::ChangeNetwork { network }))
                }
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        if !self.screen.captures_input() {
            match key.code {
                KeyCode::Char('q') => return Ok(Some(Action::Quit)),
                KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
                KeyCode::Char('N') => return Ok(Some(Action::OpenNetworkSwitcher)),
                _ => {}
            }
        }

        self.screen.handle_key_event(key)
    }

    /// Pasted text goes into whatever text entry is open, as if typed.
    /// Outside text entry it would fire key bindings, so it is dropped.
    fn handle_paste(&mut self, text: &str) -> Result<Vec<Action>> {
        if self.network_switcher.is_open() || self.help_visible || !self.screen.captures_input()
        {
            debug!(len = text.len(), "paste ignored outside text entry");
            return Ok(Vec::new());
        }
        let mut actions = Vec::new();
        for c in text.chars().filter(|c| !c.is_control()) {
            let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
            actions.extend(self.screen.handle_key_event(key)?);
        }
        Ok(actions)
    }

    /// Process a single action: update app state and forward to the screen.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::OpenNetworkSwitcher => {
                let current = self.state.as_ref().map(|s| s.network.clone());
                self.network_switcher.set_selected(current);
                debug!(current = ?self.network_switcher.selected(), "network switcher opened");
                self.network_switcher.open();
            }

            Action::Execute(cmd) => self.execute_command(cmd.clone()),

            Action::Dispatch(store_action) => {
                debug!(action = store_action.name(), "dispatch");
                self.explorer.dispatch(store_action.clone());
            }

            Action::ExportCsv => self.export_csv(),

            Action::StateUpdated(state) => {
                self.state = Some(Arc::clone(state));
                if let Some(next) = self.screen.update(action)? {
                    self.action_tx.send(next)?;
                }
            }

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, created)| created.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                if self.state.as_ref().is_some_and(|s| s.is_loading()) {
                    self.throbber_state.calc_next();
                }
                if let Some(next) = self.screen.update(action)? {
                    self.action_tx.send(next)?;
                }
            }

            Action::Notify(n) => {
                self.notification = Some((n.clone(), Instant::now()));
            }

            Action::DismissNotification => self.notification = None,

            Action::Render => {}
        }
        Ok(())
    }

    // ── Command execution ────────────────────────────────────────

    fn execute_command(&self, cmd: ExplorerCommand) {
        match self.commands.as_ref() {
            Some(queue) => queue.submit(cmd),
            None => warn!(command = ?cmd, "command issued before the queue started"),
        }
    }

    /// Write the selected entity's rows to a timestamped CSV file in the
    /// working directory.
    fn export_csv(&self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let path = export_path(&state.network, &state.selected_entity.to_string());

        let result = File::create(&path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                self.explorer
                    .export_csv(BufWriter::new(file))
                    .map_err(|e| e.summary())
            });

        let notification = match result {
            Ok(rows) => {
                info!(path = %path.display(), rows, "exported csv");
                Notification::success(format!("Exported {rows} rows to {}", path.display()))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "csv export failed");
                Notification::error(format!("Export failed: {e}"))
            }
        };
        let _ = self.action_tx.send(Action::Notify(notification));
    }

    // ── Rendering ────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // screen content
            Constraint::Length(1), // status bar
        ])
        .split(area);

        self.screen.render(frame, layout[0]);
        self.render_status_bar(frame, layout[1]);

        // Overlays, topmost last
        if let Some((ref notif, _)) = self.notification {
            render_notification(frame, area, notif);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
        self.network_switcher.render(frame, area);
    }

    /// Bottom status bar: network, entity, activity and global key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let Some(state) = self.state.as_deref() else {
            return;
        };

        let display_name = self
            .explorer
            .config()
            .network(&state.network)
            .map_or(state.network.as_str(), |n| n.display_name.as_str());

        let layout = Layout::horizontal([Constraint::Fill(1), Constraint::Length(36)]).split(area);

        let mut spans = vec![
            Span::raw(" "),
            Span::styled(
                format!("● {display_name}"),
                Style::default().fg(theme::TEZOS_BLUE),
            ),
            Span::styled(
                format!("  {}", state.selected_entity.title()),
                Style::default().fg(theme::DIM_WHITE),
            ),
        ];
        if let Some(err) = &state.last_error {
            spans.push(Span::styled(
                format!("  ✗ {err}"),
                Style::default().fg(theme::ERROR_RED),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), layout[0]);

        if state.is_loading() {
            let throbber = Throbber::default()
                .label(" loading")
                .style(theme::key_hint())
                .throbber_style(Style::default().fg(theme::AQUA));
            let loading_area = Rect::new(layout[1].x, layout[1].y, 12.min(layout[1].width), 1);
            frame.render_stateful_widget(throbber, loading_area, &mut self.throbber_state.clone());
        }

        let hints = Line::from(Span::styled(
            "│ ? help  N network  q quit ",
            theme::key_hint(),
        ))
        .right_aligned();
        frame.render_widget(Paragraph::new(hints), layout[1]);
    }
}

/// `arronax-{network}-{entity}-{timestamp}.csv` in the working directory.
fn export_path(network: &str, entity: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(format!("arronax-{network}-{entity}-{stamp}.csv"))
}

fn help_line(key: &'static str, label: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
        Span::styled(label, theme::key_hint()),
    ])
}

fn help_section(title: &'static str) -> [Line<'static>; 2] {
    [
        Line::from(Span::styled(
            format!("  {title}"),
            Style::default().fg(theme::AQUA),
        )),
        Line::from(Span::styled(
            format!("  {}", "─".repeat(title.chars().count())),
            theme::key_hint(),
        )),
    ]
}

/// Render the help overlay centered on screen.
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_width = 62u16.min(area.width.saturating_sub(4));
    let help_height = 30u16.min(area.height.saturating_sub(2));

    let x = (area.width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let mut text = vec![Line::from("")];
    text.extend(help_section("Table"));
    text.extend([
        help_line("j/k ↑/↓", "Move up/down"),
        help_line("h/l ←/→", "Select column"),
        help_line("n/p", "Next / previous page"),
        help_line("</>", "First / last page"),
        help_line("+/-", "More / fewer rows per page"),
        help_line("s", "Sort by column (toggles direction)"),
        help_line("Enter", "Open record details"),
        help_line("c", "Show / hide columns"),
        help_line("r", "Refresh rows"),
        help_line("e", "Export rows to CSV"),
        help_line("1-3 Tab", "Switch entity"),
    ]);
    text.push(Line::from(""));
    text.extend(help_section("Filters (f)"));
    text.extend([
        help_line("a", "Add filter"),
        help_line("o / v", "Edit operator / values"),
        help_line("i", "Invert filter"),
        help_line("d", "Remove filter"),
        help_line("c", "Clear filters"),
        help_line("Enter", "Run query"),
    ]);
    text.push(Line::from(""));
    text.extend(help_section("Global"));
    text.extend([
        help_line("N", "Switch network"),
        help_line("?", "This help"),
        help_line("q Ctrl+c", "Quit"),
    ]);
    text.push(Line::from(""));
    text.push(
        Line::from(Span::styled("Esc or ? to close  ", theme::key_hint())).right_aligned(),
    );

    frame.render_widget(Paragraph::new(text), inner);
}

/// Render a notification toast in the bottom-right corner.
fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
    let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len
        .saturating_add(6)
        .clamp(20, 70)
        .min(area.width);
    let height = 3u16.min(area.height);

    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2); // above status bar
    let toast_area = Rect::new(area.x + x, area.y + y, width, height);

    let (border_color, icon) = match notif.level {
        NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
        NotificationLevel::Error => (theme::ERROR_RED, "✗"),
        NotificationLevel::Info => (theme::AQUA, "·"),
    };

    frame.render_widget(Clear, toast_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme::BG_DARK));

    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
        Span::styled(notif.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}
