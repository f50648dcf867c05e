pub mod explorer;

pub use explorer::ExplorerScreen;
