pub mod data_type;
pub mod error;
pub mod pattern;
pub mod value;
pub mod watermark;
