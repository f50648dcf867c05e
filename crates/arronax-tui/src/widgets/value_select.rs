//! Dropdown for picking one value out of a list.
//!
//! Closed, it shows the selected value or the placeholder. Open, it lists
//! the options under the placeholder title with the selected one marked.
//! Picking a value closes it; Esc closes without a change.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph};

use arronax_core::display::humanize;

use crate::theme;

/// What a key press did to an open select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectEvent {
    Chosen(String),
    Cancelled,
    /// Cursor moved; nothing for the caller to do.
    Moved,
    /// Not a select key; the caller may handle it.
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct ValueSelect {
    placeholder: String,
    /// `(value, label)` pairs in display order.
    options: Vec<(String, String)>,
    selected: Option<String>,
    open: bool,
    cursor: usize,
}

impl ValueSelect {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            ..Self::default()
        }
    }

    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    /// Options labelled by humanizing each value.
    pub fn set_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.set_options(
            values
                .into_iter()
                .map(|v| {
                    let label = humanize(&v);
                    (v, label)
                })
                .collect(),
        );
    }

    pub fn set_options(&mut self, options: Vec<(String, String)>) {
        self.options = options;
        self.cursor = self.selected_position().unwrap_or(0);
    }

    pub fn set_selected(&mut self, value: Option<String>) {
        self.selected = value;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    /// Text shown while closed.
    pub fn title(&self) -> &str {
        self.selected.as_deref().unwrap_or(&self.placeholder)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open with the cursor on the selected value.
    pub fn open(&mut self) {
        self.open = true;
        self.cursor = self.selected_position().unwrap_or(0);
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    fn selected_position(&self) -> Option<usize> {
        let selected = self.selected.as_deref()?;
        self.options.iter().position(|(v, _)| v == selected)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SelectEvent {
        if !self.open {
            return SelectEvent::Ignored;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.cursor + 1 < self.options.len() {
                    self.cursor += 1;
                }
                SelectEvent::Moved
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                SelectEvent::Moved
            }
            KeyCode::Enter => {
                let Some((value, _)) = self.options.get(self.cursor) else {
                    return SelectEvent::Moved;
                };
                let value = value.clone();
                self.selected = Some(value.clone());
                self.open = false;
                SelectEvent::Chosen(value)
            }
            KeyCode::Esc => {
                self.open = false;
                SelectEvent::Cancelled
            }
            _ => SelectEvent::Ignored,
        }
    }

    /// Render the open menu as a popup centered in `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if !self.open {
            return;
        }

        let widest = self
            .options
            .iter()
            .map(|(_, label)| label.chars().count())
            .chain(std::iter::once(self.placeholder.chars().count()))
            .max()
            .unwrap_or(0);
        let width = u16::try_from(widest + 8)
            .unwrap_or(u16::MAX)
            .clamp(24, area.width.saturating_sub(4).max(24));
        let height = u16::try_from(self.options.len().max(1) + 2)
            .unwrap_or(u16::MAX)
            .min(area.height.saturating_sub(2).max(3));
        let popup = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width.min(area.width),
            height.min(area.height),
        );

        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(format!(" {} ", self.placeholder))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));

        if self.options.is_empty() {
            let inner = block.inner(popup);
            frame.render_widget(block, popup);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(" no values", theme::key_hint()))),
                inner,
            );
            return;
        }

        let items: Vec<ListItem> = self
            .options
            .iter()
            .map(|(value, label)| {
                let marker = if self.selected.as_deref() == Some(value.as_str()) {
                    "✓ "
                } else {
                    "  "
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(theme::SUCCESS_GREEN)),
                    Span::styled(label.clone(), theme::table_row()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(theme::table_selected())
            .highlight_symbol("▸");

        let mut state = ListState::default().with_selected(Some(self.cursor));
        frame.render_stateful_widget(list, popup, &mut state);
    }
}
