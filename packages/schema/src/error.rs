//! Schema errors
//!
//! These only describe why a component or property was skipped. Nothing
//! here is fatal to a registration pass.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Component definition is not an object")]
    NotAnObject,

    #[error("Component has no id")]
    MissingId,

    #[error("Component '{0}' has no elements")]
    NoElements(String),

    #[error("Malformed definition: {0}")]
    Malformed(#[from] serde_json::Error),
}
