//! Runtime type definitions

pub mod value;

pub use value::{FactParams, Value};
