//! Input screening for catalog records and observations

pub mod data;

pub use data::{DataError, DataValidator};
