pub mod connector;
pub mod sql;
