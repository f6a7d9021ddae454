//! # Component Block Schema
//!
//! The data side of the block integration:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ ComponentDefinition + PropertyDefinition     │  declared once, read-only
//! └──────────────────────────────────────────────┘
//!                     ↓
//! ┌──────────────────────────────────────────────┐
//! │ PropertyStore::update(id, raw)               │
//! │  - empty raw value → key removed             │
//! │  - otherwise coerce(raw, kind) → stored      │
//! └──────────────────────────────────────────────┘
//!                     ↓
//! ┌──────────────────────────────────────────────┐
//! │ AttributeMap { componentId, blockId,         │  per block instance
//! │                properties }                  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Absence of a property key means "inherit the component default"; presence
//! always means "override". The store never leaves empty values behind.

mod attributes;
mod coerce;
mod component;
mod error;
mod kind;
mod property;
mod store;

pub use attributes::AttributeMap;
pub use coerce::{coerce, is_empty_for, is_removable, text_from_object};
pub use component::{ComponentDefinition, ElementStub};
pub use error::SchemaError;
pub use kind::PropertyKind;
pub use property::PropertyDefinition;
pub use store::PropertyStore;

/// Raw and canonical values are plain JSON values
pub use serde_json::{Map, Value};
