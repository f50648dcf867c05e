pub mod cell_fmt;
pub mod entity_modal;
pub mod entity_tabs;
pub mod filter_panel;
pub mod paginator;
pub mod value_select;
