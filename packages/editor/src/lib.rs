//! # Component Blocks Editor
//!
//! Registers component blocks and drives their edit surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ HostData: components, enabled ids, i18n     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ BlockRegistrar: one registration per        │
//! │ component                                   │
//! │  - enabled  → editable block                │
//! │  - disabled → placeholder, not insertable   │
//! │  - malformed → skipped with a warning       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ BlockEditSession: per block instance        │
//! │  - property controls in one inspector panel │
//! │  - writes through PropertyStore             │
//! │  - debounced preview via PreviewReconciler  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blocks_editor::{BlockEditSession, BlockRegistrar};
//!
//! let registry = BlockRegistrar::new(host.clone(), settings.clone()).register_all();
//! let registration = registry.get("component-blocks/hero").unwrap();
//!
//! let mut session = BlockEditSession::new(registration, attrs, host, settings)?;
//! let update = session.mount(client_id, Instant::now());
//!
//! // run update.fetches, persist when update.changed, then keep polling
//! let update = session.poll(Instant::now());
//! ```

mod errors;
mod registrar;
mod session;

pub use errors::{EditorError, EditorResult};
pub use registrar::{
    BlockCategory, BlockRegistrar, BlockRegistration, BlockRegistry, BlockSupports, RegistrationKind,
    SkippedComponent, BLOCK_CATEGORY,
};
pub use session::{BlockEditSession, SessionUpdate};
