//! Error types for the editor

use blocks_common::CommonError;
use blocks_controls::ControlError;
use blocks_preview::PreviewError;
use blocks_schema::SchemaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),

    #[error("Host data error: {0}")]
    Host(#[from] CommonError),

    #[error("No block registered as '{0}'")]
    UnknownBlock(String),

    #[error("Block '{0}' is a placeholder for a disabled component")]
    NotEditable(String),

    #[error("Block has no control for property '{0}'")]
    UnknownProperty(String),

    #[error("Attributes belong to component '{found}', expected '{expected}'")]
    ComponentMismatch { expected: String, found: String },

    #[error("Edit session is unmounted")]
    Unmounted,
}

pub type EditorResult<T> = Result<T, EditorError>;
