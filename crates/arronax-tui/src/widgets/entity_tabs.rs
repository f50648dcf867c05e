//! Entity tab bar above the explorer table.

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use arronax_core::EntityKind;

use crate::theme;

/// One line listing every entity with its number key; the active one is
/// bracketed and highlighted.
pub fn render_entity_tabs(active: EntityKind, loading: bool) -> Line<'static> {
    let mut spans = Vec::new();

    for (i, kind) in EntityKind::all().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme::key_hint()));
        }
        let label = format!("{} {}", i + 1, kind.title());
        if kind == active {
            spans.push(Span::styled(
                format!("[{label}]"),
                theme::tab_active().add_modifier(Modifier::UNDERLINED),
            ));
        } else {
            spans.push(Span::styled(label, theme::tab_inactive()));
        }
    }

    if loading {
        spans.push(Span::styled("  loading…", theme::key_hint()));
    }

    Line::from(spans)
}

/// Entity bound to a number key (`1` blocks, `2` accounts, `3` operations).
pub fn entity_for_key(c: char) -> Option<EntityKind> {
    let index = c.to_digit(10)?.checked_sub(1)?;
    EntityKind::all().nth(usize::try_from(index).ok()?)
}

/// The entity after (or before) `current`, wrapping around.
pub fn cycle(current: EntityKind, forward: bool) -> EntityKind {
    let all: Vec<EntityKind> = EntityKind::all().collect();
    let pos = all.iter().position(|k| *k == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % all.len()
    } else {
        (pos + all.len() - 1) % all.len()
    };
    all.get(next).copied().unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_map_to_entities() {
        assert_eq!(entity_for_key('1'), Some(EntityKind::Blocks));
        assert_eq!(entity_for_key('3'), Some(EntityKind::Operations));
        assert_eq!(entity_for_key('4'), None);
        assert_eq!(entity_for_key('0'), None);
    }

    #[test]
    fn cycling_wraps() {
        assert_eq!(cycle(EntityKind::Operations, true), EntityKind::Blocks);
        assert_eq!(cycle(EntityKind::Blocks, false), EntityKind::Operations);
        assert_eq!(cycle(EntityKind::Blocks, true), EntityKind::Accounts);
    }

    #[test]
    fn active_tab_is_bracketed() {
        let line = render_entity_tabs(EntityKind::Accounts, false);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("[2 Accounts]"));
        assert!(text.contains("1 Blocks"));
        assert!(!text.contains("loading"));
    }
}
