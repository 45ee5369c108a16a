//! Raw-event decoding into symbolic events.
//!
//! Plain keystrokes pass through as character codes. Function keys and
//! mouse buttons go through per-kind symbol caches: the first decode of
//! any (code, modifier-combination) pair permanently interns its symbol.
//! The domain is small and bounded, so the caches only ever grow.

use std::collections::HashMap;

use quill_primitives::{
	BufferId, EventKind, Mods, MouseData, RawEvent, RawKind, Symbol, SymbolTable, SymbolicEvent,
	WindowId,
};

use crate::reader::ReadError;
use crate::source::{EventSource, SourcedEvent};

/// Resolved on-screen location of a pointer event.
#[derive(Debug, Clone, Copy)]
pub struct WindowLocation {
	pub position: quill_primitives::ClickPosition,
	/// Window-relative character cell coordinates.
	pub col: u16,
	pub row: u16,
}

/// Frame/window layer seam: resolves pixel coordinates to window parts.
pub trait WindowResolver {
	/// Locates the part and cell under pixel `(x, y)` of `window`.
	fn locate(&self, window: WindowId, x: i32, y: i32) -> WindowLocation;
	/// Buffer displayed in `window`.
	fn buffer_of(&self, window: WindowId) -> BufferId;
}

/// Key-code → base-name table supplied by the platform layer.
#[derive(Debug, Default)]
pub struct KeyNames {
	names: HashMap<u32, Box<str>>,
}

impl KeyNames {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, code: u32, name: &str) {
		self.names.insert(code, name.into());
	}

	fn name_for(&self, code: u32) -> String {
		match self.names.get(&code) {
			Some(name) => name.to_string(),
			// Unknown codes still get a stable symbol.
			None => format!("key-{code}"),
		}
	}
}

#[derive(Debug)]
struct ModCache {
	base: Symbol,
	/// Lazily allocated the first time this code arrives with modifiers.
	modified: Option<Box<[Option<Symbol>; 16]>>,
}

/// Decodes raw events, interning symbols through process-lifetime caches.
#[derive(Debug, Default)]
pub struct Decoder {
	names: KeyNames,
	function_keys: HashMap<u32, ModCache>,
	buttons: HashMap<u32, ModCache>,
	movement: Option<Symbol>,
}

impl Decoder {
	pub fn new(names: KeyNames) -> Self {
		Self { names, function_keys: HashMap::new(), buttons: HashMap::new(), movement: None }
	}

	/// Converts one raw event into its canonical symbolic event.
	pub fn decode(
		&mut self,
		symbols: &mut SymbolTable,
		windows: &dyn WindowResolver,
		raw: &RawEvent,
	) -> SymbolicEvent {
		match raw.kind {
			RawKind::Key => {
				// Plain keystroke: the character code itself, with the
				// meta modifier folded into bit 7.
				let mut code = raw.code & 0xff;
				if raw.mods.contains(Mods::META) {
					code |= 0x80;
				}
				SymbolicEvent::Char(code)
			}
			RawKind::FunctionKey => {
				SymbolicEvent::Sym(self.function_key_symbol(symbols, raw.code, raw.mods))
			}
			RawKind::MouseButton | RawKind::ScrollBar => {
				let kind = match raw.kind {
					RawKind::ScrollBar => EventKind::ScrollBar,
					_ => EventKind::MouseClick,
				};
				let head = self.button_symbol(symbols, raw.code, raw.mods, kind);
				SymbolicEvent::Mouse(self.position(windows, raw, head))
			}
			RawKind::Motion => {
				let head = *self
					.movement
					.get_or_insert_with(|| symbols.intern("mouse-movement"));
				SymbolicEvent::Mouse(self.position(windows, raw, head))
			}
		}
	}

	fn position(&self, windows: &dyn WindowResolver, raw: &RawEvent, head: Symbol) -> MouseData {
		let loc = windows.locate(raw.window, raw.x, raw.y);
		MouseData {
			head,
			window: raw.window,
			position: loc.position,
			col: loc.col,
			row: loc.row,
			timestamp: raw.timestamp,
		}
	}

	fn function_key_symbol(&mut self, symbols: &mut SymbolTable, code: u32, mods: Mods) -> Symbol {
		let names = &self.names;
		let entry = self.function_keys.entry(code).or_insert_with(|| {
			let base = symbols.intern(&names.name_for(code));
			symbols.set_event_kind(base, EventKind::FunctionKey);
			ModCache { base, modified: None }
		});
		Self::modified_symbol(symbols, entry, mods, EventKind::FunctionKey)
	}

	fn button_symbol(
		&mut self,
		symbols: &mut SymbolTable,
		button: u32,
		mods: Mods,
		kind: EventKind,
	) -> Symbol {
		let entry = self.buttons.entry(button).or_insert_with(|| {
			let base = symbols.intern(&format!("mouse-{button}"));
			symbols.set_event_kind(base, kind);
			ModCache { base, modified: None }
		});
		Self::modified_symbol(symbols, entry, mods, kind)
	}

	fn modified_symbol(
		symbols: &mut SymbolTable,
		entry: &mut ModCache,
		mods: Mods,
		kind: EventKind,
	) -> Symbol {
		if mods.is_empty() {
			return entry.base;
		}
		let slots = entry.modified.get_or_insert_with(|| Box::new([None; 16]));
		let index = mods.cache_index();
		if let Some(sym) = slots[index] {
			return sym;
		}
		let base_name = symbols.name(entry.base).to_owned();
		let sym = symbols.intern(&format!("{}{}", mods.prefix(), base_name));
		symbols.set_event_kind(sym, kind);
		symbols.set_unmodified(sym, entry.base);
		slots[index] = Some(sym);
		sym
	}
}

/// Raw-event supplier (terminal/X layer seam).
pub trait RawInput {
	fn next_raw(&mut self) -> Result<RawEvent, ReadError>;
}

/// Adapts a [`RawInput`] plus a [`Decoder`] into an [`EventSource`].
pub struct DecodingSource<'a> {
	raw: &'a mut dyn RawInput,
	decoder: &'a mut Decoder,
	windows: &'a dyn WindowResolver,
}

impl<'a> DecodingSource<'a> {
	pub fn new(
		raw: &'a mut dyn RawInput,
		decoder: &'a mut Decoder,
		windows: &'a dyn WindowResolver,
	) -> Self {
		Self { raw, decoder, windows }
	}
}

impl EventSource for DecodingSource<'_> {
	fn next_event(&mut self, symbols: &mut SymbolTable) -> Result<SourcedEvent, ReadError> {
		let raw = self.raw.next_raw()?;
		let event = self.decoder.decode(symbols, self.windows, &raw);
		Ok(SourcedEvent { event, buffer: self.windows.buffer_of(raw.window), real: true })
	}
}

#[cfg(test)]
mod tests {
	use quill_primitives::ClickPosition;

	use super::*;

	struct OneWindow;

	impl WindowResolver for OneWindow {
		fn locate(&self, _window: WindowId, x: i32, y: i32) -> WindowLocation {
			WindowLocation {
				position: ClickPosition::Text((x + y) as u32),
				col: (x / 8) as u16,
				row: (y / 16) as u16,
			}
		}

		fn buffer_of(&self, _window: WindowId) -> BufferId {
			BufferId(1)
		}
	}

	fn raw(kind: RawKind, code: u32, mods: Mods) -> RawEvent {
		RawEvent { kind, code, mods, window: WindowId(1), x: 16, y: 32, timestamp: 99 }
	}

	#[test]
	fn plain_keystroke_bypasses_symbols() {
		let mut symbols = SymbolTable::new();
		let mut decoder = Decoder::default();
		let ev = decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::Key, b'a' as u32, Mods::empty()));
		assert_eq!(ev, SymbolicEvent::Char(b'a' as u32));
		assert!(symbols.is_empty());
	}

	#[test]
	fn meta_keystroke_sets_the_high_bit() {
		let mut symbols = SymbolTable::new();
		let mut decoder = Decoder::default();
		let ev = decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::Key, b'a' as u32, Mods::META));
		assert_eq!(ev, SymbolicEvent::Char(0x80 | b'a' as u32));
	}

	#[test]
	fn function_key_symbols_are_cached() {
		let mut symbols = SymbolTable::new();
		let mut names = KeyNames::new();
		names.insert(65, "f5");
		let mut decoder = Decoder::new(names);

		let a = decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::FunctionKey, 65, Mods::empty()));
		let b = decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::FunctionKey, 65, Mods::empty()));
		assert_eq!(a, b);
		let SymbolicEvent::Sym(sym) = a else { panic!("expected a symbol") };
		assert_eq!(symbols.name(sym), "f5");
		assert_eq!(symbols.event_kind(sym), Some(EventKind::FunctionKey));
	}

	#[test]
	fn modified_function_keys_get_canonical_names_and_backrefs() {
		let mut symbols = SymbolTable::new();
		let mut names = KeyNames::new();
		names.insert(65, "f5");
		let mut decoder = Decoder::new(names);

		let bare = decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::FunctionKey, 65, Mods::empty()));
		let modded =
			decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::FunctionKey, 65, Mods::CTRL | Mods::META));
		let SymbolicEvent::Sym(bare) = bare else { panic!() };
		let SymbolicEvent::Sym(modded) = modded else { panic!() };
		assert_eq!(symbols.name(modded), "M-C-f5");
		assert_eq!(symbols.unmodified(modded), Some(bare));

		// Second decode of the same combination reuses the symbol.
		let again =
			decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::FunctionKey, 65, Mods::CTRL | Mods::META));
		assert_eq!(again, SymbolicEvent::Sym(modded));
	}

	#[test]
	fn unknown_key_codes_synthesize_names() {
		let mut symbols = SymbolTable::new();
		let mut decoder = Decoder::default();
		let ev = decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::FunctionKey, 1234, Mods::empty()));
		let SymbolicEvent::Sym(sym) = ev else { panic!() };
		assert_eq!(symbols.name(sym), "key-1234");
	}

	#[test]
	fn mouse_clicks_build_structured_events() {
		let mut symbols = SymbolTable::new();
		let mut decoder = Decoder::default();
		let ev = decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::MouseButton, 1, Mods::empty()));
		let SymbolicEvent::Mouse(data) = ev else { panic!("expected a mouse event") };
		assert_eq!(symbols.name(data.head), "mouse-1");
		assert_eq!(data.position, ClickPosition::Text(48));
		assert_eq!((data.col, data.row), (2, 2));
		assert_eq!(data.timestamp, 99);
	}

	#[test]
	fn release_events_carry_the_up_modifier() {
		let mut symbols = SymbolTable::new();
		let mut decoder = Decoder::default();
		let ev = decoder.decode(&mut symbols, &OneWindow, &raw(RawKind::MouseButton, 1, Mods::UP));
		let SymbolicEvent::Mouse(data) = ev else { panic!() };
		assert_eq!(symbols.name(data.head), "U-mouse-1");
	}
}
