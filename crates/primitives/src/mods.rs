//! Modifier bitmask (meta, control, shift, up).

use bitflags::bitflags;

bitflags! {
	/// Modifier set attached to a key or button event.
	///
	/// When rendered into a symbol name, modifiers always appear in the
	/// fixed order meta, control, shift, up.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct Mods: u8 {
		/// Meta (Alt) held.
		const META = 1 << 0;
		/// Control held.
		const CTRL = 1 << 1;
		/// Shift held.
		const SHIFT = 1 << 2;
		/// Button release rather than press.
		const UP = 1 << 3;
	}
}

impl Mods {
	/// Modifier prefix letters in canonical order.
	pub const CANONICAL: [(Mods, char); 4] = [
		(Mods::META, 'M'),
		(Mods::CTRL, 'C'),
		(Mods::SHIFT, 'S'),
		(Mods::UP, 'U'),
	];

	/// Index into a 16-slot per-combination cache.
	pub fn cache_index(self) -> usize {
		self.bits() as usize
	}

	/// Renders the `M-C-S-U-` symbol-name prefix for this set.
	pub fn prefix(self) -> String {
		let mut out = String::new();
		for (m, letter) in Self::CANONICAL {
			if self.contains(m) {
				out.push(letter);
				out.push('-');
			}
		}
		out
	}
}
