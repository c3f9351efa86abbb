mod cache;
mod error;
mod loader;

pub use cache::{CatalogCache, DEFAULT_MAX_AGE, DEFAULT_URL};
pub use error::CatalogError;
pub use loader::Catalog;
