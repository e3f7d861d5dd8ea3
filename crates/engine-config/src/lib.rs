pub mod error;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod walker;
