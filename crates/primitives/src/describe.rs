//! Echo-area key spellings.

use crate::event::SymbolicEvent;
use crate::symbol::SymbolTable;

/// Renders one event the way the echo area spells keys.
pub fn describe_event(table: &SymbolTable, event: &SymbolicEvent) -> String {
	match event {
		SymbolicEvent::Char(c) => describe_char(*c),
		SymbolicEvent::Sym(s) => table.name(*s).to_owned(),
		SymbolicEvent::Mouse(m) => table.name(m.head).to_owned(),
	}
}

/// Renders a plain character code, splitting the meta bit off first and
/// translating control/space/DEL into mnemonic spellings.
pub fn describe_char(code: u32) -> String {
	if (128..256).contains(&code) {
		return format!("M-{}", describe_char(code & 0x7f));
	}
	match code {
		9 => "TAB".into(),
		13 => "RET".into(),
		27 => "ESC".into(),
		32 => "SPC".into(),
		127 => "DEL".into(),
		c if c < 32 => {
			let base = if (1..=26).contains(&c) {
				(c as u8 + 96) as char
			} else {
				(c as u8 + 64) as char
			};
			format!("C-{base}")
		}
		c => char::from_u32(c).map(String::from).unwrap_or_else(|| format!("key-{c}")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::symbol::SymbolTable;

	#[test]
	fn control_and_named_spellings() {
		assert_eq!(describe_char(24), "C-x");
		assert_eq!(describe_char(0), "C-@");
		assert_eq!(describe_char(27), "ESC");
		assert_eq!(describe_char(32), "SPC");
		assert_eq!(describe_char(127), "DEL");
		assert_eq!(describe_char(b'a' as u32), "a");
	}

	#[test]
	fn meta_bit_splits_first() {
		assert_eq!(describe_char(0x80 | 24), "M-C-x");
		assert_eq!(describe_char(0x80 | b'a' as u32), "M-a");
	}

	#[test]
	fn symbols_render_by_name() {
		let mut t = SymbolTable::new();
		let f5 = t.intern("f5");
		assert_eq!(describe_event(&t, &SymbolicEvent::Sym(f5)), "f5");
	}
}
