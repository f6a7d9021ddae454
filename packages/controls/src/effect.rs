use crate::fetch::FetchRequest;
use serde_json::Value;

/// What a control asks its host to do after handling an interaction
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Raw value to pass through the property store
    Write(Value),

    /// Deferred option fetch to run; results come back through
    /// `fetch_completed` with the same request id
    Fetch(FetchRequest),
}

impl Effect {
    pub fn as_write(&self) -> Option<&Value> {
        match self {
            Effect::Write(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_fetch(&self) -> Option<&FetchRequest> {
        match self {
            Effect::Fetch(request) => Some(request),
            _ => None,
        }
    }
}

pub type Effects = Vec<Effect>;

/// Last write in a batch of effects
pub fn last_write(effects: &[Effect]) -> Option<&Value> {
    effects.iter().rev().find_map(Effect::as_write)
}
