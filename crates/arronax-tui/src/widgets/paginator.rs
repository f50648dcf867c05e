//! Local page state of the explorer table.
//!
//! The page survives re-renders but resets whenever the rows it pages over
//! are replaced.

use std::ops::Range;

use ratatui::text::{Line, Span};

use arronax_core::DEFAULT_ROW_COUNT;

use crate::theme;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
}

impl Paginator {
    pub fn page(self) -> usize {
        self.page
    }

    /// Rows per page, falling back to the default for an unset (zero) count.
    pub fn rows_per_page(rows: usize) -> usize {
        if rows == 0 { DEFAULT_ROW_COUNT } else { rows }
    }

    pub fn last_page(total: usize, rows: usize) -> usize {
        let rows = Self::rows_per_page(rows);
        total.saturating_sub(1) / rows
    }

    /// Index range of the items shown on the current page, clamped to `total`.
    pub fn range(self, total: usize, rows: usize) -> Range<usize> {
        let rows = Self::rows_per_page(rows);
        let start = self.page.saturating_mul(rows).min(total);
        let end = start.saturating_add(rows).min(total);
        start..end
    }

    pub fn next(&mut self, total: usize, rows: usize) {
        self.page = (self.page + 1).min(Self::last_page(total, rows));
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    pub fn first(&mut self) {
        self.page = 0;
    }

    pub fn last(&mut self, total: usize, rows: usize) {
        self.page = Self::last_page(total, rows);
    }

    /// Pull the page back inside `[0, last_page]` after the page size changed.
    pub fn clamp(&mut self, total: usize, rows: usize) {
        self.page = self.page.min(Self::last_page(total, rows));
    }

    /// `from-to of total`, 1-based. A trailing `+` marks that the server
    /// has more rows than were fetched.
    pub fn label(self, total: usize, rows: usize, more_available: bool) -> String {
        let range = self.range(total, rows);
        let more = if more_available { "+" } else { "" };
        if range.is_empty() {
            return format!("0 of {total}{more}");
        }
        format!("{}-{} of {total}{more}", range.start + 1, range.end)
    }

    /// Footer line: position label, page counter and the paging keys.
    pub fn render_line(self, total: usize, rows: usize, more_available: bool) -> Line<'static> {
        let pages = Self::last_page(total, rows) + 1;
        Line::from(vec![
            Span::styled(
                format!(" {} ", self.label(total, rows, more_available)),
                theme::table_row(),
            ),
            Span::styled(
                format!(" page {}/{pages}  ", self.page + 1),
                theme::key_hint(),
            ),
            Span::styled("p/n ", theme::key_hint_key()),
            Span::styled("page  ", theme::key_hint()),
            Span::styled("+/- ", theme::key_hint_key()),
            Span::styled("rows  ", theme::key_hint()),
            Span::styled("e ", theme::key_hint_key()),
            Span::styled("export csv", theme::key_hint()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn slices_pages_and_clamps_the_tail() {
        let mut pager = Paginator::default();
        assert_eq!(pager.range(25, 10), 0..10);

        pager.next(25, 10);
        pager.next(25, 10);
        assert_eq!(pager.page(), 2);
        assert_eq!(pager.range(25, 10), 20..25);

        // already on the last page
        pager.next(25, 10);
        assert_eq!(pager.page(), 2);

        pager.prev();
        pager.prev();
        pager.prev();
        assert_eq!(pager.page(), 0);
    }

    #[test]
    fn zero_rows_falls_back_to_default() {
        let pager = Paginator::default();
        assert_eq!(pager.range(100, 0), 0..DEFAULT_ROW_COUNT);
        assert_eq!(Paginator::last_page(100, 0), 9);
    }

    #[test]
    fn empty_tables_have_one_page() {
        let mut pager = Paginator::default();
        pager.next(0, 10);
        assert_eq!(pager.page(), 0);
        assert_eq!(pager.range(0, 10), 0..0);
        assert_eq!(pager.label(0, 10, false), "0 of 0");
    }

    #[test]
    fn clamps_after_page_size_grows() {
        let mut pager = Paginator::default();
        pager.last(95, 10);
        assert_eq!(pager.page(), 9);

        pager.clamp(95, 50);
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.range(95, 50), 50..95);
    }

    #[test]
    fn labels_are_one_based() {
        let mut pager = Paginator::default();
        assert_eq!(pager.label(25, 10, false), "1-10 of 25");
        pager.last(25, 10);
        assert_eq!(pager.label(25, 10, true), "21-25 of 25+");
    }
}
