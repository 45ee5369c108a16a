//! `kbd`-style key-string parsing.
//!
//! Parses plain-text key definitions into keymap addressing keys. It
//! supports sequences such as `"C-x C-f"` or `"M-x"` and maps them to
//! character codes and event symbols.
//!
//! ## Supported syntax
//!
//! ```text
//! sequence  = token (" " token)*
//! token     = modifiers* base
//! modifiers = ("M" | "C" | "S" | "U") "-"
//! base      = named | "<" symbol-name ">" | char
//! named     = "RET" | "TAB" | "SPC" | "ESC" | "DEL"
//! ```
//!
//! Character bases fold `C-` into the control code and `M-` into bit 7;
//! `S-` uppercases a letter. `U-` (release) and `C-`/`S-` on named keys
//! only make sense on symbolic `<...>` bases and are rejected elsewhere.

use quill_primitives::{EventKey, Mods, SymbolTable};

/// Represents an error that occurred during parsing.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
	/// Human-readable description of the parse error.
	pub message: String,
	/// Byte offset in the input where the error occurred.
	pub position: usize,
}

impl std::fmt::Display for ParseError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Parse error at position {}: {}", self.position, self.message)
	}
}

impl std::error::Error for ParseError {}

fn err(message: impl Into<String>, position: usize) -> ParseError {
	ParseError { message: message.into(), position }
}

/// Parses a whitespace-separated key sequence string.
pub fn parse_sequence(symbols: &mut SymbolTable, input: &str) -> Result<Vec<EventKey>, ParseError> {
	let mut keys = Vec::new();
	for token in input.split_whitespace() {
		let offset = token.as_ptr() as usize - input.as_ptr() as usize;
		keys.push(parse_token(symbols, token, offset)?);
	}
	if keys.is_empty() {
		return Err(err("empty key description", 0));
	}
	Ok(keys)
}

/// Parses a single key token (e.g. `"C-x"`, `"M-RET"`, `"<f5>"`, `"a"`).
pub fn parse_key(symbols: &mut SymbolTable, token: &str) -> Result<EventKey, ParseError> {
	parse_token(symbols, token.trim(), 0)
}

fn modifier_for(letter: u8) -> Option<Mods> {
	match letter {
		b'M' => Some(Mods::META),
		b'C' => Some(Mods::CTRL),
		b'S' => Some(Mods::SHIFT),
		b'U' => Some(Mods::UP),
		_ => None,
	}
}

fn parse_token(symbols: &mut SymbolTable, token: &str, offset: usize) -> Result<EventKey, ParseError> {
	let mut mods = Mods::empty();
	let mut rest = token;
	let mut consumed = 0usize;
	loop {
		let bytes = rest.as_bytes();
		if bytes.len() > 2
			&& bytes[1] == b'-'
			&& let Some(m) = modifier_for(bytes[0])
		{
			mods |= m;
			rest = &rest[2..];
			consumed += 2;
		} else {
			break;
		}
	}
	if rest.is_empty() {
		return Err(err(format!("incomplete key description: {token}"), offset));
	}

	// Symbolic base: modifiers become canonical name prefixes.
	if let Some(inner) = rest.strip_prefix('<') {
		let Some(name) = inner.strip_suffix('>') else {
			return Err(err("missing '>'", offset + token.len()));
		};
		if name.is_empty() {
			return Err(err("empty key symbol", offset + consumed));
		}
		let full = format!("{}{}", mods.prefix(), name);
		return Ok(EventKey::Sym(symbols.intern(&full)));
	}

	// Character base.
	let code = match rest {
		"RET" => 13,
		"TAB" => 9,
		"SPC" => 32,
		"ESC" => 27,
		"DEL" => 127,
		_ => {
			let mut chars = rest.chars();
			let ch = chars.next().ok_or_else(|| err("missing key", offset + consumed))?;
			if chars.next().is_some() {
				return Err(err(format!("unknown key name: {rest}"), offset + consumed));
			}
			if (ch as u32) > 255 {
				return Err(err(format!("character '{ch}' out of range"), offset + consumed));
			}
			ch as u32
		}
	};
	char_with_mods(code, mods, rest, offset + consumed)
}

fn char_with_mods(code: u32, mods: Mods, base: &str, at: usize) -> Result<EventKey, ParseError> {
	let named = base.len() > 1;
	let mut code = code;
	if mods.contains(Mods::UP) {
		return Err(err("release modifier applies to symbolic keys only", at));
	}
	if mods.contains(Mods::SHIFT) {
		let Some(ch) = char::from_u32(code).filter(|c| c.is_ascii_lowercase()) else {
			return Err(err("shift modifier requires a letter", at));
		};
		code = ch.to_ascii_uppercase() as u32;
	}
	if mods.contains(Mods::CTRL) {
		if named {
			return Err(err("control modifier on a named key", at));
		}
		code = match char::from_u32(code).map(|c| c.to_ascii_uppercase()) {
			Some(c @ 'A'..='Z') => c as u32 & 0x1f,
			Some('@') => 0,
			Some('[') => 27,
			Some('\\') => 28,
			Some(']') => 29,
			Some('^') => 30,
			Some('_') => 31,
			Some('?') => 127,
			_ => return Err(err("cannot apply control modifier here", at)),
		};
	}
	if mods.contains(Mods::META) {
		if code >= 128 {
			return Err(err("meta modifier on a non-ASCII character", at));
		}
		code |= 0x80;
	}
	Ok(EventKey::Char(code))
}
