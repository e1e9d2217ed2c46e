//! Catalog store: the fixed, read-only set of assessments

pub mod item;
pub mod store;

pub use item::Item;
pub use store::{Catalog, CatalogStats};
