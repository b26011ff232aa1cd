pub mod error;
pub mod types;
pub mod value;

pub use error::{AliasError, Result};
pub use types::{AttributeSets, ClassId, FieldMap};
pub use value::Value;
