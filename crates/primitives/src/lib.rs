//! Basic key-input primitives.
//!
//! Provides the foundational types for key-sequence resolution:
//! - [`Mods`] — modifier bitmask with a fixed canonical rendering order
//! - [`SymbolTable`] / [`Symbol`] — interned event symbols with properties
//! - [`SymbolicEvent`] / [`EventKey`] — decoded events and their dispatch keys
//! - [`canonicalize`] — modifier-prefix canonicalization for symbol names
//! - [`describe_event`] — echo-area key spellings (`C-x`, `ESC`, `SPC`)

pub mod canon;
pub mod describe;
pub mod event;
pub mod mods;
pub mod symbol;

pub use canon::canonicalize;
pub use describe::{describe_char, describe_event};
pub use event::{
	BufferId, ClickPosition, EventKey, MouseData, RawEvent, RawKind, ScrollBarPart, SymbolicEvent,
	WindowId,
};
pub use mods::Mods;
pub use symbol::{EventKind, Symbol, SymbolTable};
