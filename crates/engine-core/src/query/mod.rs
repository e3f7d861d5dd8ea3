pub mod binder;
pub mod builder;
