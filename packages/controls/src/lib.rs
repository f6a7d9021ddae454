//! # Component Block Controls
//!
//! Editing widgets for component properties, one per declared type.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ PropertyControl::new(property)              │  routed by type
//! └─────────────────────────────────────────────┘
//!        ↓ render(value)          ↑ handle(action)
//! ┌──────────────────┐     ┌────────────────────┐
//! │ ControlNode tree │     │ Effects            │
//! │  drawn by host   │     │  Write(raw value)  │ → PropertyStore::update
//! └──────────────────┘     │  Fetch(request)    │ → OptionFetcher
//!                          └────────────────────┘
//! ```
//!
//! Controls never touch the store or the network themselves. Time is passed
//! in, so debounced searches are driven by `poll` with the caller's clock.

mod context;
pub mod controls;
mod dispatch;
mod dropdown;
mod effect;
mod error;
mod fetch;
mod node;
pub mod primitives;

pub use context::ControlContext;
pub use controls::rich_text::{MemoryEngine, RichTextEngine, RichTextMode};
pub use controls::MediaAsset;
pub use dispatch::{ControlAction, PropertyControl};
pub use dropdown::{selected_values, value_text, Dropdown, DropdownAction, SelectOption};
pub use effect::{last_write, Effect, Effects};
pub use error::{ControlError, ControlResult};
pub use fetch::{parse_fetch_response, FetchRequest, OptionFetcher};
pub use node::ControlNode;
