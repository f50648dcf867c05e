//! Explorer screen: entity tabs, filter panel, the paged record table and
//! the record modal.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use arronax_core::display::raw_value;
use arronax_core::{
    AttributeDefinition, DataType, EntityKind, ExplorerCommand, ExplorerState, Record, Sort,
    SortDirection, StoreAction, selectors,
};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::cell_fmt::{HASH_WIDTH, format_cell};
use crate::widgets::entity_modal::{EntityModal, ModalEvent};
use crate::widgets::entity_tabs::{cycle, entity_for_key, render_entity_tabs};
use crate::widgets::filter_panel::FilterPanel;
use crate::widgets::paginator::Paginator;
use crate::widgets::value_select::{SelectEvent, ValueSelect};

/// Step for `+` / `-` page-size changes.
const ROW_STEP: usize = 5;

pub struct ExplorerScreen {
    action_tx: Option<UnboundedSender<Action>>,
    state: Option<Arc<ExplorerState>>,
    table_state: TableState,
    /// Column under the cursor, for sorting.
    column: usize,
    paginator: Paginator,
    filters: FilterPanel,
    modal: EntityModal,
    column_select: ValueSelect,
    /// Rows the current page was computed from; replaced rows reset the page.
    items: Option<Arc<Vec<Record>>>,
    entity: Option<EntityKind>,
    network: String,
}

impl Default for ExplorerScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplorerScreen {
    pub fn new() -> Self {
        Self {
            action_tx: None,
            state: None,
            table_state: TableState::default().with_selected(Some(0)),
            column: 0,
            paginator: Paginator::default(),
            filters: FilterPanel::new(),
            modal: EntityModal::default(),
            column_select: ValueSelect::new("Columns"),
            items: None,
            entity: None,
            network: String::new(),
        }
    }

    fn send(&self, action: Action) {
        if let Some(tx) = &self.action_tx {
            let _ = tx.send(action);
        }
    }

    fn apply_state(&mut self, state: Arc<ExplorerState>) {
        let items = Arc::clone(&state.current().items);
        let entity_changed = self.entity != Some(state.selected_entity);
        let network_changed = self.network != state.network;
        let items_replaced = self
            .items
            .as_ref()
            .is_none_or(|prev| !Arc::ptr_eq(prev, &items));

        if network_changed || entity_changed {
            self.modal.forget();
            self.modal.close();
            self.column = 0;
        }
        if network_changed || entity_changed || items_replaced {
            self.paginator.first();
            self.table_state.select(Some(0));
        } else {
            self.paginator.clamp(items.len(), state.row_count);
        }

        let columns = state.current().columns.len();
        self.column = self.column.min(columns.saturating_sub(1));

        self.items = Some(items);
        self.entity = Some(state.selected_entity);
        self.network.clone_from(&state.network);
        self.filters.sync(Arc::clone(&state));
        self.state = Some(state);
    }

    // ── Table navigation ─────────────────────────────────────────

    fn page_len(&self) -> usize {
        self.state.as_ref().map_or(0, |s| {
            self.paginator
                .range(selectors::items(s).len(), s.row_count)
                .len()
        })
    }

    fn select_row(&mut self, idx: usize) {
        let len = self.page_len();
        let clamped = if len == 0 { 0 } else { idx.min(len - 1) };
        self.table_state.select(Some(clamped));
    }

    fn move_row(&mut self, delta: isize) {
        let current = self.table_state.selected().unwrap_or(0);
        self.select_row(current.saturating_add_signed(delta));
    }

    fn move_column(&mut self, delta: isize) {
        let count = self
            .state
            .as_ref()
            .map_or(0, |s| selectors::columns(s).len());
        if count == 0 {
            return;
        }
        self.column = self.column.saturating_add_signed(delta).min(count - 1);
    }

    fn change_page(&mut self, forward: bool) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let total = selectors::items(state).len();
        if forward {
            self.paginator.next(total, state.row_count);
        } else {
            self.paginator.prev();
        }
        self.table_state.select(Some(0));
    }

    /// Record under the cursor, from the current page.
    fn selected_record(&self) -> Option<&Record> {
        let state = self.state.as_ref()?;
        let items = selectors::items(state);
        let range = self.paginator.range(items.len(), state.row_count);
        let idx = range.start + self.table_state.selected().unwrap_or(0);
        if range.contains(&idx) {
            items.get(idx)
        } else {
            None
        }
    }

    fn open_modal(&mut self) -> Option<Action> {
        let state = Arc::clone(self.state.as_ref()?);
        let key = selectors::primary_key(&state);
        let value = self.selected_record()?.get(&key).map(raw_value)?;
        if value.is_empty() {
            return Some(Action::Notify(Notification::info(format!(
                "Row has no {key}"
            ))));
        }
        self.modal.open(&key, &value).map(Action::Execute)
    }

    fn close_modal(&mut self) -> Option<Action> {
        self.modal.close();
        // A failed lookup should be retried on the next open
        let failed = self
            .state
            .as_ref()
            .is_some_and(|s| s.modal.as_ref().is_none_or(|m| m.item.is_none()));
        if failed {
            self.modal.forget();
            return Some(Action::Dispatch(StoreAction::ClearModal));
        }
        None
    }

    fn open_column_select(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let options = selectors::attributes(state)
            .iter()
            .map(|a| {
                let shown = selectors::columns(state).iter().any(|c| c.name == a.name);
                let marker = if shown { "■" } else { "□" };
                (a.name.clone(), format!("{marker} {}", a.display_name))
            })
            .collect();
        self.column_select.set_options(options);
        self.column_select.open();
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> Option<Action> {
        let state = Arc::clone(self.state.as_ref()?);
        let entity = state.selected_entity;

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_row(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_row(-1),
            KeyCode::Char('g') | KeyCode::Home => self.select_row(0),
            KeyCode::Char('G') | KeyCode::End => self.select_row(usize::MAX),
            KeyCode::Char('h') | KeyCode::Left => self.move_column(-1),
            KeyCode::Char('l') | KeyCode::Right => self.move_column(1),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.change_page(true);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.change_page(false);
            }
            KeyCode::Char('n') | KeyCode::PageDown => self.change_page(true),
            KeyCode::Char('<') => {
                self.paginator.first();
                self.table_state.select(Some(0));
            }
            KeyCode::Char('>') => {
                self.paginator
                    .last(selectors::items(&state).len(), state.row_count);
                self.table_state.select(Some(0));
            }
            KeyCode::Char('p') | KeyCode::PageUp => self.change_page(false),
            KeyCode::Char('+' | '=') => {
                return Some(Action::Dispatch(StoreAction::SetRowCount(
                    state.row_count + ROW_STEP,
                )));
            }
            KeyCode::Char('-') => {
                let rows = state.row_count.saturating_sub(ROW_STEP).max(ROW_STEP);
                return Some(Action::Dispatch(StoreAction::SetRowCount(rows)));
            }
            KeyCode::Char('s') => {
                let column = selectors::columns(&state).get(self.column)?;
                return Some(Action::Execute(ExplorerCommand::SetSort {
                    order_by: column.name.clone(),
                }));
            }
            KeyCode::Enter => return self.open_modal(),
            KeyCode::Char('f') => self.filters.focus(),
            KeyCode::Char('c') => self.open_column_select(),
            KeyCode::Char('r') => return Some(Action::Execute(ExplorerCommand::Refresh)),
            KeyCode::Char('e') => return Some(Action::ExportCsv),
            KeyCode::Char(c @ '1'..='9') => {
                let target = entity_for_key(c)?;
                return (target != entity)
                    .then_some(Action::Execute(ExplorerCommand::ChangeEntity { entity: target }));
            }
            KeyCode::Tab => {
                return Some(Action::Execute(ExplorerCommand::ChangeEntity {
                    entity: cycle(entity, true),
                }));
            }
            KeyCode::BackTab => {
                return Some(Action::Execute(ExplorerCommand::ChangeEntity {
                    entity: cycle(entity, false),
                }));
            }
            _ => {}
        }
        None
    }

    // ── Rendering ────────────────────────────────────────────────

    fn render_table(&self, frame: &mut Frame, area: Rect, state: &ExplorerState) {
        let block = Block::default()
            .title(format!(
                " {} · {} ",
                state.selected_entity.title(),
                state.network
            ))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.filters.is_focused() {
                theme::border_default()
            } else {
                theme::border_focused()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let columns = selectors::columns(state);
        let items = selectors::items(state);

        if columns.is_empty() || items.is_empty() {
            let message = if state.is_loading() {
                " Loading…"
            } else if state.last_error.is_some() {
                " Request failed, r to retry"
            } else {
                " No records"
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(message, theme::key_hint()))),
                inner,
            );
            return;
        }

        let sort = selectors::sort(state);
        let primary_key = selectors::primary_key(state);

        let header = Row::new(columns.iter().enumerate().map(|(i, attr)| {
            let style = if i == self.column {
                theme::table_header_selected()
            } else {
                theme::table_header()
            };
            Cell::from(header_label(attr, sort.as_ref())).style(style)
        }));

        let range = self.paginator.range(items.len(), state.row_count);
        let rows: Vec<Row> = items
            .get(range)
            .unwrap_or_default()
            .iter()
            .map(|record| {
                Row::new(columns.iter().map(|attr| {
                    let style = if attr.name == primary_key {
                        theme::primary_key_cell()
                    } else {
                        theme::table_row()
                    };
                    Cell::from(format_cell(record.get(&attr.name), attr)).style(style)
                }))
            })
            .collect();

        let widths: Vec<Constraint> = columns.iter().map(column_width).collect();

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("▸");

        let mut table_state = self.table_state;
        frame.render_stateful_widget(table, inner, &mut table_state);
    }
}

fn table_hints() -> Line<'static> {
    let keys = [
        ("j/k ", "rows  "),
        ("h/l ", "column  "),
        ("s ", "sort  "),
        ("Enter ", "details  "),
        ("f ", "filters  "),
        ("c ", "columns  "),
        ("r ", "refresh  "),
        ("1-3 ", "entity"),
    ];
    let mut spans = vec![Span::raw(" ")];
    for (k, label) in keys {
        spans.push(Span::styled(k, theme::key_hint_key()));
        spans.push(Span::styled(label, theme::key_hint()));
    }
    Line::from(spans)
}

/// Header text: display name plus an arrow on the sorted column.
fn header_label(attr: &AttributeDefinition, sort: Option<&Sort>) -> String {
    match sort {
        Some(s) if s.order_by == attr.name => {
            let arrow = match s.order {
                SortDirection::Asc => "▲",
                SortDirection::Desc => "▼",
            };
            format!("{} {arrow}", attr.display_name)
        }
        _ => attr.display_name.clone(),
    }
}

fn column_width(attr: &AttributeDefinition) -> Constraint {
    match attr.data_type {
        DataType::Hash | DataType::AccountAddress => {
            Constraint::Length(u16::try_from(HASH_WIDTH).unwrap_or(15))
        }
        DataType::DateTime => Constraint::Length(20),
        _ => Constraint::Fill(1),
    }
}

/// Columns after toggling `name`: shown ones are hidden (never the last
/// one), hidden ones are shown in attribute order.
fn toggle_column(
    attributes: &[AttributeDefinition],
    columns: &[AttributeDefinition],
    name: &str,
) -> Vec<AttributeDefinition> {
    if columns.iter().any(|c| c.name == name) {
        if columns.len() == 1 {
            return columns.to_vec();
        }
        return columns.iter().filter(|c| c.name != name).cloned().collect();
    }
    attributes
        .iter()
        .filter(|a| a.name == name || columns.iter().any(|c| c.name == a.name))
        .cloned()
        .collect()
}

impl Component for ExplorerScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.modal.is_open() {
            return Ok(match self.modal.handle_key(key) {
                ModalEvent::Close => self.close_modal(),
                ModalEvent::Handled => None,
            });
        }

        if self.column_select.is_open() {
            if let SelectEvent::Chosen(name) = self.column_select.handle_key(key) {
                self.column_select.set_selected(None);
                let Some(state) = self.state.as_ref() else {
                    return Ok(None);
                };
                let columns = toggle_column(
                    selectors::attributes(state),
                    selectors::columns(state),
                    &name,
                );
                return Ok(Some(Action::Dispatch(StoreAction::SetColumns {
                    entity: state.selected_entity,
                    columns,
                })));
            }
            return Ok(None);
        }

        if self.filters.is_focused() {
            for action in self.filters.handle_key(key) {
                self.send(action);
            }
            return Ok(None);
        }

        Ok(self.handle_table_key(key))
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StateUpdated(state) => self.apply_state(Arc::clone(state)),
            Action::Tick => self.modal.tick(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(state) = self.state.as_deref() else {
            return;
        };

        let layout = Layout::vertical([
            Constraint::Length(1),                    // entity tabs
            Constraint::Length(self.filters.height()), // filters
            Constraint::Min(3),                       // table
            Constraint::Length(1),                    // paginator
            Constraint::Length(1),                    // hints
        ])
        .split(area);

        frame.render_widget(
            Paragraph::new(render_entity_tabs(state.selected_entity, state.is_loading())),
            layout[0],
        );
        self.filters.render(frame, layout[1]);
        self.render_table(frame, layout[2], state);

        let pager = self.paginator.render_line(
            selectors::items(state).len(),
            state.row_count,
            !selectors::is_full_loaded(state),
        );
        frame.render_widget(Paragraph::new(pager), layout[3]);

        let hints = if self.filters.is_focused() {
            self.filters.hints()
        } else {
            table_hints()
        };
        frame.render_widget(Paragraph::new(hints), layout[4]);

        // Overlays, topmost last
        self.filters.render_overlay(frame, area);
        self.column_select.render(frame, area);
        self.modal.render(frame, area, state);
    }

    fn captures_input(&self) -> bool {
        self.modal.is_open() || self.column_select.is_open() || self.filters.captures_input()
    }

    fn id(&self) -> &'static str {
        "Explorer"
    }
}
