//! Placeholder syntax of the supported databases.

pub trait Dialect: Send + Sync {
    /// Returns the placeholder for a parameterized query, `index` is 0-based.
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    /// - MySQL uses `?`
    fn get_placeholder(&self, index: usize) -> String;
}

#[derive(Debug, Clone)]
pub struct Postgres;

impl Dialect for Postgres {
    fn get_placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }
}

#[derive(Debug, Clone)]
pub struct MySql;

impl Dialect for MySql {
    fn get_placeholder(&self, _index: usize) -> String {
        "?".into()
    }
}
