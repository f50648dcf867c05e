//! Record detail modal: every attribute of one record, looked up by its
//! primary key.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table};
use throbber_widgets_tui::{Throbber, ThrobberState};

use arronax_core::{ExplorerCommand, ExplorerState, selectors};

use crate::theme;
use crate::widgets::cell_fmt::format_detail;

/// What a key press on the open modal asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalEvent {
    Close,
    Handled,
}

#[derive(Debug, Default)]
pub struct EntityModal {
    open: bool,
    /// Key/value pair of the last opened record.
    last: Option<(String, String)>,
    scroll: usize,
    throbber_state: ThrobberState,
}

impl EntityModal {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open on `key = value`. Returns the lookup to run, or `None` when the
    /// same pair was opened last and its record is still current.
    pub fn open(&mut self, key: &str, value: &str) -> Option<ExplorerCommand> {
        self.open = true;
        self.scroll = 0;
        if self
            .last
            .as_ref()
            .is_some_and(|(k, v)| k == key && v == value)
        {
            return None;
        }
        self.last = Some((key.to_owned(), value.to_owned()));
        Some(ExplorerCommand::GetItemByPrimaryKey {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Forget the last pair so the next open fetches again (network or
    /// entity changed under us).
    pub fn forget(&mut self) {
        self.last = None;
    }

    pub fn tick(&mut self) {
        self.throbber_state.calc_next();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalEvent {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.open = false;
                ModalEvent::Close
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
                ModalEvent::Handled
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                ModalEvent::Handled
            }
            _ => ModalEvent::Handled,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &ExplorerState) {
        if !self.open {
            return;
        }

        let width = area.width.saturating_sub(8).clamp(20, 110).min(area.width);
        let height = area.height.saturating_sub(4).clamp(5, 40).min(area.height);
        let modal_area = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );
        frame.render_widget(Clear, modal_area);

        let (key, value) = self
            .last
            .as_ref()
            .map_or(("", ""), |(k, v)| (k.as_str(), v.as_str()));
        let block = Block::default()
            .title(format!(
                " {} · {key} {value} ",
                state.selected_entity.title()
            ))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

        // Only show the stored item when it belongs to the pair we opened
        let item = state
            .modal
            .as_ref()
            .filter(|m| m.key == key && m.value == value && m.entity == state.selected_entity)
            .and_then(|m| m.item.as_ref());

        match item {
            Some(record) => {
                let rows: Vec<Row> = selectors::attributes(state)
                    .iter()
                    .skip(self.scroll)
                    .map(|attr| {
                        Row::new(vec![
                            Cell::from(attr.display_name.clone()).style(theme::key_hint()),
                            Cell::from(format_detail(record.get(&attr.name), attr))
                                .style(theme::table_row()),
                        ])
                    })
                    .collect();
                let table = Table::new(rows, [Constraint::Length(24), Constraint::Fill(1)])
                    .column_spacing(2);
                frame.render_widget(table, layout[0]);
            }
            None if state.is_loading() => {
                let throbber = Throbber::default()
                    .label(" Loading record…")
                    .style(theme::table_row())
                    .throbber_style(Style::default().fg(theme::TEZOS_BLUE));
                frame.render_stateful_widget(
                    throbber,
                    layout[0],
                    &mut self.throbber_state.clone(),
                );
            }
            None => {
                let message = state
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "Record not found".into());
                frame.render_widget(
                    Paragraph::new(Line::from(Span::styled(
                        format!(" {message}"),
                        Style::default().fg(theme::ERROR_RED),
                    ))),
                    layout[0],
                );
            }
        }

        let hints = Line::from(vec![
            Span::styled(" j/k ", theme::key_hint_key()),
            Span::styled("scroll  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("close", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[1]);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn refetches_only_when_the_pair_changes() {
        let mut modal = EntityModal::default();

        let first = modal.open("hash", "BLone");
        assert_eq!(
            first,
            Some(ExplorerCommand::GetItemByPrimaryKey {
                key: "hash".into(),
                value: "BLone".into()
            })
        );
        modal.close();

        // same pair again: reuse what is loaded
        assert_eq!(modal.open("hash", "BLone"), None);
        assert!(modal.is_open());

        assert!(modal.open("hash", "BLtwo").is_some());
        assert!(modal.open("level", "BLtwo").is_some());
    }

    #[test]
    fn forgetting_forces_a_refetch() {
        let mut modal = EntityModal::default();
        modal.open("account_id", "tz1abc");
        modal.forget();
        assert!(modal.open("account_id", "tz1abc").is_some());
    }

    #[test]
    fn escape_closes() {
        let mut modal = EntityModal::default();
        modal.open("hash", "BLone");
        let event = modal.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(event, ModalEvent::Close);
        assert!(!modal.is_open());
    }
}
