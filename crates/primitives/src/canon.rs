//! Modifier-prefix canonicalization for symbol names.
//!
//! `define-key`-style APIs may spell a modified key as `C-M-x` or `M-C-x`;
//! both must address the same keymap slot. Canonical order is meta,
//! control, shift, up.

use crate::mods::Mods;
use crate::symbol::{Symbol, SymbolTable};

fn modifier_for(letter: u8) -> Option<Mods> {
	match letter {
		b'M' => Some(Mods::META),
		b'C' => Some(Mods::CTRL),
		b'S' => Some(Mods::SHIFT),
		b'U' => Some(Mods::UP),
		_ => None,
	}
}

/// Parses the leading `X-` modifier run of `name`.
///
/// Returns the collected modifier set, the byte offset of the base name,
/// and whether the run was already canonical (each modifier at most once,
/// in canonical order).
fn parse_prefix(name: &str) -> (Mods, usize, bool) {
	let bytes = name.as_bytes();
	let mut mods = Mods::empty();
	let mut i = 0;
	let mut canonical = true;
	let mut last_rank = -1i32;
	// Never strip the whole name: the base must stay non-empty.
	while i + 2 < bytes.len() && bytes[i + 1] == b'-' {
		let Some(m) = modifier_for(bytes[i]) else { break };
		let rank = m.bits().trailing_zeros() as i32;
		if mods.contains(m) || rank < last_rank {
			canonical = false;
		}
		mods |= m;
		last_rank = last_rank.max(rank);
		i += 2;
	}
	(mods, i, canonical)
}

/// Reorders the modifier prefixes of `sym`'s name into canonical order.
///
/// The overwhelmingly common case is a name already in canonical order,
/// which returns the input symbol unchanged without interning anything.
/// Idempotent: `canonicalize(canonicalize(s)) == canonicalize(s)`.
pub fn canonicalize(table: &mut SymbolTable, sym: Symbol) -> Symbol {
	let (mods, base_offset, canonical) = parse_prefix(table.name(sym));
	if canonical {
		return sym;
	}
	let base = table.name(sym)[base_offset..].to_owned();
	let name = format!("{}{}", mods.prefix(), base);
	table.intern(&name)
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	fn canon_name(table: &mut SymbolTable, name: &str) -> String {
		let sym = table.intern(name);
		let out = canonicalize(table, sym);
		table.name(out).to_owned()
	}

	#[test]
	fn already_canonical_is_identity() {
		let mut t = SymbolTable::new();
		let sym = t.intern("C-M-x");
		// "C-M-x" is out of order; "M-C-x" is not.
		let ordered = t.intern("M-C-x");
		assert_eq!(canonicalize(&mut t, ordered), ordered);
		assert_ne!(canonicalize(&mut t, sym), sym);
	}

	#[test]
	fn reorders_to_canonical() {
		let mut t = SymbolTable::new();
		assert_eq!(canon_name(&mut t, "C-M-x"), "M-C-x");
		assert_eq!(canon_name(&mut t, "S-C-M-f5"), "M-C-S-f5");
		assert_eq!(canon_name(&mut t, "U-M-mouse-1"), "M-U-mouse-1");
	}

	#[test]
	fn both_spellings_reach_the_same_symbol() {
		let mut t = SymbolTable::new();
		let a = t.intern("C-M-x");
		let b = t.intern("M-C-x");
		assert_eq!(canonicalize(&mut t, a), canonicalize(&mut t, b));
	}

	#[test]
	fn duplicates_collapse() {
		let mut t = SymbolTable::new();
		assert_eq!(canon_name(&mut t, "C-C-x"), "C-x");
	}

	#[test]
	fn base_name_is_never_consumed() {
		let mut t = SymbolTable::new();
		// The trailing "M-" is the base name here, not a modifier.
		assert_eq!(canon_name(&mut t, "C-M-"), "C-M-");
		assert_eq!(canon_name(&mut t, "x"), "x");
	}

	proptest! {
		#[test]
		fn canonicalize_is_idempotent(name in "([MCSU]-){0,4}[a-z<>-]{1,8}") {
			let mut t = SymbolTable::new();
			let sym = t.intern(&name);
			let once = canonicalize(&mut t, sym);
			let twice = canonicalize(&mut t, once);
			prop_assert_eq!(once, twice);
		}
	}
}
