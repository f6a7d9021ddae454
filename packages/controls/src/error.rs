use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    #[error("Action for a {action} control sent to the {control} control of '{property_id}'")]
    ActionMismatch {
        property_id: String,
        control: &'static str,
        action: &'static str,
    },

    #[error("Stored value of '{property_id}' is not a valid {expected}")]
    InvalidValue {
        property_id: String,
        expected: &'static str,
    },

    #[error("Index {index} out of range for '{property_id}' ({len} items)")]
    OutOfRange {
        property_id: String,
        index: usize,
        len: usize,
    },

    #[error("Option fetch failed: {0}")]
    Fetch(String),

    #[error("Rich text engine error: {0}")]
    Engine(String),
}

pub type ControlResult<T> = Result<T, ControlError>;
