//! Filter panel: the predicates attached to the selected entity.
//!
//! Adding a filter walks attribute → operator → values. Values come from a
//! value-select fed by the server's distinct values, or are typed in.
//! Every edit goes to the store as a [`StoreAction`]; Enter submits the
//! query.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use arronax_core::{
    DataType, EntityKind, ExplorerCommand, ExplorerState, Filter, Operation, StoreAction,
    operators_for, selectors,
};

use crate::action::Action;
use crate::theme;
use crate::widgets::value_select::{SelectEvent, ValueSelect};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Browse,
    Attribute,
    Operator,
    /// Picking from the server's distinct values.
    Values,
    /// Typing values, comma separated.
    Typing,
}

/// A filter being built or edited.
#[derive(Debug, Clone)]
struct Draft {
    entity: EntityKind,
    attribute: String,
    display_name: String,
    data_type: DataType,
    operator: Operation,
    inverse: bool,
    values: Vec<String>,
    /// The filter already exists; only its operator or values change.
    editing: bool,
}

impl Draft {
    fn has_enough_values(&self) -> bool {
        match self.operator.arity() {
            Some(n) => self.values.len() >= n,
            // `in` takes any number; one is enough to stop
            None => !self.values.is_empty(),
        }
    }
}

/// Whether the distinct-value list is worth fetching for a type. Numbers,
/// timestamps and hashes have too many values to pick from.
fn lists_values(data_type: DataType) -> bool {
    matches!(data_type, DataType::String | DataType::Boolean)
}

#[derive(Debug, Default)]
pub struct FilterPanel {
    focused: bool,
    mode: Mode,
    cursor: usize,
    attribute_select: ValueSelect,
    operator_select: ValueSelect,
    value_select: ValueSelect,
    input: String,
    draft: Option<Draft>,
    /// Prefix of the value lookup the open list is waiting on.
    lookup: Option<String>,
    state: Option<Arc<ExplorerState>>,
}

impl FilterPanel {
    pub fn new() -> Self {
        Self {
            attribute_select: ValueSelect::new("Attribute"),
            operator_select: ValueSelect::new("Operator"),
            ..Self::default()
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Whether a menu or text entry is active and owns every key.
    pub fn captures_input(&self) -> bool {
        self.mode != Mode::Browse
    }

    /// Drop any half-built filter and leave the panel.
    pub fn reset(&mut self) {
        self.mode = Mode::Browse;
        self.draft = None;
        self.input.clear();
        self.attribute_select.close();
        self.operator_select.close();
        self.value_select.close();
        self.focused = false;
    }

    /// Take a new snapshot. Feeds fetched distinct values into an open
    /// value list.
    pub fn sync(&mut self, state: Arc<ExplorerState>) {
        if self.mode == Mode::Values {
            if let (Some(draft), Some(available)) =
                (self.draft.as_ref(), selectors::available_values(&state))
            {
                // Snapshots published before the lookup lands still carry
                // the previous list
                let answers_lookup = available.entity == draft.entity
                    && available.attribute == draft.attribute
                    && available.prefix == self.lookup;
                let shown = self.value_select.options().iter().map(|(v, _)| v);
                if answers_lookup && !shown.eq(available.values.iter()) {
                    self.value_select.set_values(available.values.iter().cloned());
                }
            }
        }

        // A draft for another entity is stale
        if self
            .draft
            .as_ref()
            .is_some_and(|d| d.entity != state.selected_entity)
        {
            self.reset();
        }

        let count = state.current().filters.len();
        self.cursor = self.cursor.min(count.saturating_sub(1));
        self.state = Some(state);
    }

    /// Rows the panel needs: border, one line per filter (or a hint) and
    /// the draft line while values are picked or typed.
    pub fn height(&self) -> u16 {
        let filters = self
            .state
            .as_ref()
            .map_or(0, |s| s.current().filters.len())
            .clamp(1, 6);
        let input = usize::from(matches!(self.mode, Mode::Typing | Mode::Values));
        u16::try_from(filters + input + 2).unwrap_or(8)
    }

    fn selected_filter(&self) -> Option<Filter> {
        let state = self.state.as_ref()?;
        state.current().filters.get(self.cursor).cloned()
    }

    // ── Key handling ─────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match self.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::Attribute => self.handle_attribute_key(key),
            Mode::Operator => self.handle_operator_key(key),
            Mode::Values => self.handle_values_key(key),
            Mode::Typing => self.handle_typing_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let Some(state) = self.state.clone() else {
            return Vec::new();
        };
        let entity = state.selected_entity;
        let count = state.current().filters.len();

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.cursor + 1 < count {
                    self.cursor += 1;
                }
                Vec::new()
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Char('a') => {
                self.start_add(&state);
                Vec::new()
            }
            KeyCode::Char('d') | KeyCode::Delete | KeyCode::Backspace => {
                self.selected_filter().map_or_else(Vec::new, |f| {
                    vec![Action::Dispatch(StoreAction::RemoveFilter {
                        entity,
                        attribute: f.attribute,
                    })]
                })
            }
            KeyCode::Char('i') => self.selected_filter().map_or_else(Vec::new, |f| {
                vec![Action::Dispatch(StoreAction::SetFilterOperator {
                    entity,
                    attribute: f.attribute,
                    operator: f.operator,
                    inverse: !f.inverse,
                })]
            }),
            KeyCode::Char('o') => match self.selected_filter() {
                Some(filter) => self.start_edit(&state, &filter, Mode::Operator),
                None => Vec::new(),
            },
            KeyCode::Char('v') => match self.selected_filter() {
                Some(filter) if filter.needs_value() => self.start_edit(&state, &filter, Mode::Values),
                _ => Vec::new(),
            },
            KeyCode::Char('c') => vec![Action::Dispatch(StoreAction::ClearFilters(entity))],
            KeyCode::Enter => {
                self.focused = false;
                vec![Action::Execute(ExplorerCommand::SubmitQuery)]
            }
            KeyCode::Esc | KeyCode::Tab | KeyCode::Char('f') => {
                self.focused = false;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn start_add(&mut self, state: &ExplorerState) {
        let filtered = &state.current().filters;
        let options: Vec<(String, String)> = selectors::attributes(state)
            .iter()
            .filter(|a| !filtered.iter().any(|f| f.attribute == a.name))
            .map(|a| (a.name.clone(), a.display_name.clone()))
            .collect();
        self.attribute_select.set_selected(None);
        self.attribute_select.set_options(options);
        self.attribute_select.open();
        self.mode = Mode::Attribute;
    }

    fn start_edit(&mut self, state: &ExplorerState, filter: &Filter, mode: Mode) -> Vec<Action> {
        let Some(attribute) = selectors::attribute(state, &filter.attribute) else {
            return Vec::new();
        };
        self.draft = Some(Draft {
            entity: state.selected_entity,
            attribute: attribute.name.clone(),
            display_name: attribute.display_name.clone(),
            data_type: attribute.data_type,
            operator: filter.operator,
            inverse: filter.inverse,
            values: Vec::new(),
            editing: true,
        });
        match mode {
            Mode::Operator => {
                self.open_operators(attribute.data_type, Some(filter.operator));
                Vec::new()
            }
            _ => {
                let actions = self.begin_values();
                let current = selectors::selected_values(state)
                    .get(&filter.attribute)
                    .and_then(|v| v.first())
                    .cloned();
                self.value_select.set_selected(current);
                actions
            }
        }
    }

    fn open_operators(&mut self, data_type: DataType, current: Option<Operation>) {
        let options = operators_for(data_type)
            .iter()
            .map(|op| (op.to_string(), op.label().to_owned()))
            .collect();
        self.operator_select.set_options(options);
        self.operator_select
            .set_selected(current.map(|op| op.to_string()));
        self.operator_select.open();
        self.mode = Mode::Operator;
    }

    fn handle_attribute_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match self.attribute_select.handle_key(key) {
            SelectEvent::Chosen(name) => {
                let Some(state) = self.state.clone() else {
                    self.reset();
                    return Vec::new();
                };
                let Some(attribute) = selectors::attribute(&state, &name) else {
                    self.mode = Mode::Browse;
                    return Vec::new();
                };
                self.draft = Some(Draft {
                    entity: state.selected_entity,
                    attribute: attribute.name.clone(),
                    display_name: attribute.display_name.clone(),
                    data_type: attribute.data_type,
                    operator: Operation::Eq,
                    inverse: false,
                    values: Vec::new(),
                    editing: false,
                });
                self.open_operators(attribute.data_type, None);
                Vec::new()
            }
            SelectEvent::Cancelled => {
                self.mode = Mode::Browse;
                Vec::new()
            }
            SelectEvent::Moved | SelectEvent::Ignored => Vec::new(),
        }
    }

    fn handle_operator_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match self.operator_select.handle_key(key) {
            SelectEvent::Chosen(op) => {
                let (Ok(operator), Some(draft)) = (op.parse::<Operation>(), self.draft.as_mut())
                else {
                    self.mode = Mode::Browse;
                    return Vec::new();
                };
                draft.operator = operator;

                let mut actions = Vec::new();
                if draft.editing {
                    actions.push(Action::Dispatch(StoreAction::SetFilterOperator {
                        entity: draft.entity,
                        attribute: draft.attribute.clone(),
                        operator,
                        inverse: draft.inverse,
                    }));
                    // Values stay unless the new operator cannot use them
                    self.mode = Mode::Browse;
                    self.draft = None;
                    return actions;
                }

                if operator.arity() == Some(0) {
                    return self.finish();
                }
                actions.extend(self.begin_values());
                actions
            }
            SelectEvent::Cancelled => {
                self.mode = Mode::Browse;
                self.draft = None;
                Vec::new()
            }
            SelectEvent::Moved | SelectEvent::Ignored => Vec::new(),
        }
    }

    /// Move to the value step: the distinct-value list for enum-like
    /// attributes, text entry for the rest.
    fn begin_values(&mut self) -> Vec<Action> {
        let Some(draft) = self.draft.as_ref() else {
            self.mode = Mode::Browse;
            return Vec::new();
        };
        self.input.clear();

        if !lists_values(draft.data_type) {
            self.mode = Mode::Typing;
            return Vec::new();
        }

        self.value_select.set_placeholder(draft.display_name.clone());
        self.value_select.set_selected(None);
        self.value_select.set_options(Vec::new());
        self.value_select.open();
        self.lookup = None;
        self.mode = Mode::Values;
        vec![Action::Execute(ExplorerCommand::FetchValues {
            attribute: draft.attribute.clone(),
        })]
    }

    fn handle_values_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match self.value_select.handle_key(key) {
            SelectEvent::Chosen(value) => {
                let Some(draft) = self.draft.as_mut() else {
                    self.mode = Mode::Browse;
                    return Vec::new();
                };
                draft.values.push(value);
                if draft.has_enough_values() {
                    return self.finish();
                }
                self.value_select.open();
                Vec::new()
            }
            SelectEvent::Cancelled => self.cancel_values(),
            SelectEvent::Moved => Vec::new(),
            SelectEvent::Ignored => match key.code {
                KeyCode::Tab | KeyCode::Char('/') => {
                    self.value_select.close();
                    self.mode = Mode::Typing;
                    Vec::new()
                }
                _ => Vec::new(),
            },
        }
    }

    fn handle_typing_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Char(c) => {
                self.input.push(c);
                Vec::new()
            }
            KeyCode::Backspace => {
                self.input.pop();
                Vec::new()
            }
            KeyCode::Enter => {
                let Some(draft) = self.draft.as_mut() else {
                    self.mode = Mode::Browse;
                    return Vec::new();
                };
                draft.values.extend(
                    self.input
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_owned),
                );
                self.input.clear();
                if draft.has_enough_values() {
                    self.finish()
                } else {
                    Vec::new()
                }
            }
            // Look up values starting with what was typed so far
            KeyCode::Tab => {
                let Some(draft) = self.draft.as_ref() else {
                    return Vec::new();
                };
                if self.input.is_empty() {
                    return Vec::new();
                }
                let prefix = std::mem::take(&mut self.input);
                let attribute = draft.attribute.clone();
                self.value_select.set_placeholder(draft.display_name.clone());
                self.value_select.set_options(Vec::new());
                self.value_select.open();
                self.lookup = Some(prefix.clone());
                self.mode = Mode::Values;
                vec![Action::Execute(ExplorerCommand::FetchValuesForPrefix {
                    attribute,
                    prefix,
                })]
            }
            KeyCode::Esc => self.cancel_values(),
            _ => Vec::new(),
        }
    }

    /// Leaving the value step keeps what was picked for `in` filters and
    /// drops anything else.
    fn cancel_values(&mut self) -> Vec<Action> {
        let keep = self
            .draft
            .as_ref()
            .is_some_and(|d| d.operator == Operation::In && !d.values.is_empty());
        if keep {
            return self.finish();
        }
        self.mode = Mode::Browse;
        self.draft = None;
        self.input.clear();
        Vec::new()
    }

    /// Commit the draft to the store.
    fn finish(&mut self) -> Vec<Action> {
        self.mode = Mode::Browse;
        self.value_select.close();
        self.input.clear();
        let Some(draft) = self.draft.take() else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        if !draft.editing {
            actions.push(Action::Dispatch(StoreAction::AddFilter {
                entity: draft.entity,
                filter: Filter {
                    attribute: draft.attribute.clone(),
                    operator: draft.operator,
                    inverse: draft.inverse,
                },
            }));
        }
        if !draft.values.is_empty() || draft.editing {
            actions.push(Action::Dispatch(StoreAction::SetSelectedValue {
                entity: draft.entity,
                attribute: draft.attribute,
                values: draft.values,
            }));
        }
        actions
    }

    // ── Rendering ────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let filters = self
            .state
            .as_ref()
            .map_or(&[][..], |s| s.current().filters.as_slice());

        let block = Block::default()
            .title(format!(" Filters ({}) ", filters.len()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line> = Vec::new();
        if filters.is_empty() {
            let hint = if self.focused {
                " a add filter  Esc back"
            } else {
                " no filters, f to edit"
            };
            lines.push(Line::from(Span::styled(hint, theme::key_hint())));
        }

        if let Some(state) = self.state.as_ref() {
            let values = selectors::selected_values(state);
            for (i, filter) in filters.iter().enumerate() {
                let name = selectors::attribute(state, &filter.attribute)
                    .map_or(filter.attribute.as_str(), |a| a.display_name.as_str());
                let negation = if filter.inverse { "not " } else { "" };
                let shown = values
                    .get(&filter.attribute)
                    .map(|v| v.join(", "))
                    .unwrap_or_default();
                let missing = filter.needs_value() && shown.is_empty();
                let style = if self.focused && i == self.cursor {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };
                lines.push(Line::from(vec![
                    Span::styled(format!(" {name} "), style),
                    Span::styled(
                        format!("{negation}{} ", filter.operator.label()),
                        Style::default().fg(theme::AMBER),
                    ),
                    if missing {
                        Span::styled("(no value)", Style::default().fg(theme::ERROR_RED))
                    } else {
                        Span::styled(shown, style)
                    },
                ]));
            }
        }

        if self.mode == Mode::Typing {
            let label = self
                .draft
                .as_ref()
                .map_or_else(String::new, |d| {
                    format!("{} {}", d.display_name, d.operator.label())
                });
            lines.push(Line::from(vec![
                Span::styled(format!(" {label} › "), theme::key_hint()),
                Span::styled(self.input.clone(), Style::default().fg(theme::AQUA)),
                Span::styled("█", Style::default().fg(theme::AQUA)),
                Span::styled("  Tab suggest  Enter add", theme::key_hint()),
            ]));
        }

        if self.mode == Mode::Values {
            let label = self
                .draft
                .as_ref()
                .map_or_else(String::new, |d| format!("{} {}", d.display_name, d.operator.label()));
            lines.push(Line::from(vec![
                Span::styled(format!(" {label} ▾ "), theme::key_hint()),
                Span::styled(
                    self.value_select.title().to_owned(),
                    Style::default().fg(theme::AQUA),
                ),
                Span::styled("  Tab type", theme::key_hint()),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    /// Open menus float over the whole screen area.
    pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
        match self.mode {
            Mode::Attribute => self.attribute_select.render(frame, area),
            Mode::Operator => self.operator_select.render(frame, area),
            Mode::Values => self.value_select.render(frame, area),
            Mode::Browse | Mode::Typing => {}
        }
    }

    pub fn hints(&self) -> Line<'static> {
        let keys: &[(&str, &str)] = match self.mode {
            Mode::Browse => &[
                ("a ", "add  "),
                ("d ", "remove  "),
                ("o ", "operator  "),
                ("v ", "values  "),
                ("i ", "invert  "),
                ("c ", "clear  "),
                ("Enter ", "run query  "),
                ("Esc ", "back"),
            ],
            Mode::Attribute | Mode::Operator => &[("Enter ", "pick  "), ("Esc ", "cancel")],
            Mode::Values => &[
                ("Enter ", "pick  "),
                ("Tab ", "type  "),
                ("Esc ", "cancel"),
            ],
            Mode::Typing => &[
                ("Enter ", "add  "),
                ("Tab ", "suggest  "),
                ("Esc ", "cancel"),
            ],
        };
        let mut spans = vec![Span::raw(" ")];
        for (k, label) in keys {
            spans.push(Span::styled(*k, theme::key_hint_key()));
            spans.push(Span::styled(*label, theme::key_hint()));
        }
        Line::from(spans)
    }
}
