//! Interned symbols with event properties.

use rustc_hash::FxHashMap;

/// Handle to an interned symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

/// Event classification attached to decoder-created symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
	FunctionKey,
	MouseClick,
	ScrollBar,
}

#[derive(Debug)]
struct Entry {
	name: Box<str>,
	kind: Option<EventKind>,
	unmodified: Option<Symbol>,
}

/// Owned symbol interner.
///
/// Symbols are never dropped: the domain (key codes times modifier
/// combinations) is small and bounded, so keeping every symbol for the
/// process lifetime is cheap.
#[derive(Debug, Default)]
pub struct SymbolTable {
	entries: Vec<Entry>,
	by_name: FxHashMap<Box<str>, Symbol>,
}

impl SymbolTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Interns `name`, returning the existing symbol if already present.
	pub fn intern(&mut self, name: &str) -> Symbol {
		if let Some(&sym) = self.by_name.get(name) {
			return sym;
		}
		let sym = Symbol(self.entries.len() as u32);
		self.entries.push(Entry {
			name: name.into(),
			kind: None,
			unmodified: None,
		});
		self.by_name.insert(name.into(), sym);
		sym
	}

	/// Returns the symbol already interned under `name`, if any.
	pub fn find(&self, name: &str) -> Option<Symbol> {
		self.by_name.get(name).copied()
	}

	/// Returns the symbol's name.
	pub fn name(&self, sym: Symbol) -> &str {
		&self.entries[sym.0 as usize].name
	}

	/// Event classification, if this symbol was created by the decoder.
	pub fn event_kind(&self, sym: Symbol) -> Option<EventKind> {
		self.entries[sym.0 as usize].kind
	}

	pub fn set_event_kind(&mut self, sym: Symbol, kind: EventKind) {
		self.entries[sym.0 as usize].kind = Some(kind);
	}

	/// Bare (unmodified) symbol behind a modifier-carrying event symbol.
	pub fn unmodified(&self, sym: Symbol) -> Option<Symbol> {
		self.entries[sym.0 as usize].unmodified
	}

	pub fn set_unmodified(&mut self, sym: Symbol, bare: Symbol) {
		self.entries[sym.0 as usize].unmodified = Some(bare);
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
