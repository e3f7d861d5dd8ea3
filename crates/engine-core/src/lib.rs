pub mod context;
pub mod engine;
pub mod error;
pub mod importer;
pub mod parse;
pub mod query;
pub mod report;
pub mod watermark;
