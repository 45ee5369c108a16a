//! Binding values stored in keymaps.

use std::sync::Arc;

use quill_primitives::{EventKey, Symbol, SymbolicEvent};
use thiserror::Error;

use crate::store::KeymapId;

/// What a key is bound to.
///
/// A closed set: every shape the resolver can encounter is listed here
/// and unwrapped by [`KeymapStore::resolve`](crate::KeymapStore::resolve).
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
	/// A command, named by symbol, invoked through the command dispatcher.
	Command(Symbol),
	/// A prefix: further input selects within this keymap.
	Prefix(KeymapId),
	/// Look up `key` in `map` instead (`(KEYMAP . INDEX)` indirection).
	Indirect(KeymapId, EventKey),
	/// A symbol resolved through the store's definition table.
	Sym(Symbol),
	/// A literal event vector: keyboard macro or key-translation expansion.
	Keys(Arc<[SymbolicEvent]>),
	/// Menu-annotated entry: `(STRING . DEFN)`.
	Menu(Arc<str>, Box<Binding>),
}

impl Binding {
	/// Convenience constructor for a key-translation / macro literal.
	pub fn keys(events: impl Into<Arc<[SymbolicEvent]>>) -> Self {
		Binding::Keys(events.into())
	}
}

/// Errors raised by keymap mutation and resolution.
#[derive(Debug, Error, PartialEq)]
pub enum KeymapError {
	/// Key specification rejected at the mutation boundary.
	#[error("invalid key specification: {0}")]
	InvalidKey(String),
	/// Indirection-following exceeded its cap. Well-formed keymaps never
	/// cycle, so this is an internal-consistency failure.
	#[error("binding indirection exceeded {limit} steps (cyclic keymap?)")]
	IndirectionCycle { limit: usize },
	/// Keymap nesting exceeded its cap during copy.
	#[error("keymap nesting exceeded {limit} levels (cyclic keymap?)")]
	NestingCycle { limit: usize },
	/// An interior key of a sequence is bound to a non-prefix.
	#[error("key {at} of the sequence is bound to a non-prefix")]
	NotAPrefix { at: usize },
	/// An unknown keymap id was dereferenced.
	#[error("dangling keymap id")]
	DanglingKeymap,
}
