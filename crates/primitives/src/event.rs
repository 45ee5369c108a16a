//! Symbolic and raw input event models.

use crate::mods::Mods;
use crate::symbol::Symbol;

/// Identifies a window; owned by the frame/window layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// Identifies a buffer; owned by the buffer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Scroll-bar sub-part under a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBarPart {
	AboveHandle,
	Handle,
	BelowHandle,
}

/// Where inside a window a mouse event landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickPosition {
	/// Buffer text, at this character position.
	Text(u32),
	ModeLine,
	VerticalDivider,
	ScrollBar(ScrollBarPart),
}

/// Structured mouse/scroll-bar event payload:
/// `(SYMBOL WINDOW POSITION (X . Y) TIMESTAMP)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseData {
	/// Head symbol; the dispatch key for keymap lookup.
	pub head: Symbol,
	pub window: WindowId,
	pub position: ClickPosition,
	/// Window-relative character cell coordinates.
	pub col: u16,
	pub row: u16,
	pub timestamp: u64,
}

/// A decoded input event.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolicEvent {
	/// Plain character, 0..=255. Bit 7 is the historical meta bit.
	Char(u32),
	/// Function key or other interned symbolic key.
	Sym(Symbol),
	/// Structured mouse / scroll-bar event.
	Mouse(MouseData),
}

impl SymbolicEvent {
	/// Dispatch key for keymap lookup: the event's head.
	pub fn key(&self) -> EventKey {
		match self {
			SymbolicEvent::Char(c) => EventKey::Char(*c),
			SymbolicEvent::Sym(s) => EventKey::Sym(*s),
			SymbolicEvent::Mouse(m) => EventKey::Sym(m.head),
		}
	}
}

/// Keymap addressing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
	Char(u32),
	Sym(Symbol),
}

/// Raw hardware event kinds delivered by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
	/// Plain keystroke carrying a character code.
	Key,
	/// Non-character keystroke carrying a platform key code.
	FunctionKey,
	MouseButton,
	ScrollBar,
	Motion,
}

/// Raw input event as delivered by the terminal/X layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEvent {
	pub kind: RawKind,
	/// Character code, function-key code, or button number.
	pub code: u32,
	pub mods: Mods,
	pub window: WindowId,
	/// Pixel coordinates for pointer events.
	pub x: i32,
	pub y: i32,
	pub timestamp: u64,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::symbol::SymbolTable;

	#[test]
	fn dispatch_key_is_the_head() {
		let mut t = SymbolTable::new();
		let m1 = t.intern("mouse-1");
		let ev = SymbolicEvent::Mouse(MouseData {
			head: m1,
			window: WindowId(1),
			position: ClickPosition::Text(42),
			col: 3,
			row: 7,
			timestamp: 1000,
		});
		assert_eq!(ev.key(), EventKey::Sym(m1));
		assert_eq!(SymbolicEvent::Char(24).key(), EventKey::Char(24));
	}
}
