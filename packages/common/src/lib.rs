//! Shared plumbing for the component block integration: the host-provided
//! snapshot, localized strings, editor tunables and one-slot timers.

pub mod error;
pub mod host;
pub mod i18n;
pub mod result;
pub mod settings;
pub mod timer;

pub use error::*;
pub use host::*;
pub use i18n::I18n;
pub use result::*;
pub use settings::*;
pub use timer::*;
