//! Declarative keymap specification.
//!
//! A serde-deserializable list of key-string → command bindings compiled
//! into a [`KeymapStore`]. This is the configuration surface for seeding
//! global/local maps and function-key translation tables from files.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::binding::Binding;
use crate::kbd::{ParseError, parse_sequence};
use crate::store::{KeymapId, KeymapStore};
use crate::KeymapError;
use quill_primitives::SymbolTable;

/// A complete keymap specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeymapSpec {
	/// Human-readable name (e.g. `"global"`).
	pub name: String,
	/// Key-to-command bindings.
	#[serde(default)]
	pub bindings: Vec<BindingSpec>,
}

/// A single binding: a key sequence string mapped to a command symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingSpec {
	/// Key sequence string (e.g. `"C-x C-f"`).
	pub keys: String,
	/// Command the sequence dispatches to.
	pub command: String,
}

/// A problem compiling a spec into a store.
#[derive(Debug, Error)]
pub enum SpecError {
	#[error("binding `{keys}`: {source}")]
	Parse { keys: String, source: ParseError },
	#[error("binding `{keys}`: {source}")]
	Keymap { keys: String, source: KeymapError },
}

/// Compiles `spec` into a fresh sparse keymap.
///
/// Later entries for the same sequence replace earlier ones; each
/// replacement is reported with a warning, mirroring how keymap
/// compilation reports binding conflicts.
pub fn build_keymap(
	store: &mut KeymapStore,
	symbols: &mut SymbolTable,
	spec: &KeymapSpec,
) -> Result<KeymapId, SpecError> {
	let map = store.make_sparse();
	for b in &spec.bindings {
		let keys = parse_sequence(symbols, &b.keys)
			.map_err(|source| SpecError::Parse { keys: b.keys.clone(), source })?;
		let def = Binding::Command(symbols.intern(&b.command));
		let replaced = store
			.define_sequence(symbols, map, &keys, def)
			.map_err(|source| SpecError::Keymap { keys: b.keys.clone(), source })?;
		if replaced.is_some() {
			warn!(
				keymap = %spec.name,
				keys = %b.keys,
				command = %b.command,
				"binding shadows an earlier entry"
			);
		}
	}
	Ok(map)
}

#[cfg(test)]
mod tests {
	use quill_primitives::EventKey;

	use super::*;

	#[test]
	fn builds_from_toml() {
		let spec: KeymapSpec = toml::from_str(
			r#"
			name = "global"

			[[bindings]]
			keys = "C-x C-f"
			command = "find-file"

			[[bindings]]
			keys = "C-x k"
			command = "kill-buffer"
			"#,
		)
		.unwrap();

		let mut store = KeymapStore::new();
		let mut symbols = SymbolTable::new();
		let map = build_keymap(&mut store, &mut symbols, &spec).unwrap();

		let Some(Binding::Prefix(ctl_x)) =
			store.lookup(&mut symbols, map, EventKey::Char(24)).unwrap()
		else {
			panic!("C-x did not become a prefix");
		};
		let find_file = Binding::Command(symbols.intern("find-file"));
		assert_eq!(store.lookup(&mut symbols, ctl_x, EventKey::Char(6)).unwrap(), Some(find_file));
	}

	#[test]
	fn later_entries_replace_earlier_ones() {
		let spec = KeymapSpec {
			name: "test".to_owned(),
			bindings: vec![
				BindingSpec { keys: "g".to_owned(), command: "one".to_owned() },
				BindingSpec { keys: "g".to_owned(), command: "two".to_owned() },
			],
		};
		let mut store = KeymapStore::new();
		let mut symbols = SymbolTable::new();
		let map = build_keymap(&mut store, &mut symbols, &spec).unwrap();
		let two = Binding::Command(symbols.intern("two"));
		assert_eq!(
			store.lookup(&mut symbols, map, EventKey::Char(b'g' as u32)).unwrap(),
			Some(two)
		);
	}

	#[test]
	fn parse_errors_name_the_binding() {
		let spec = KeymapSpec {
			name: "test".to_owned(),
			bindings: vec![BindingSpec { keys: "C-".to_owned(), command: "x".to_owned() }],
		};
		let mut store = KeymapStore::new();
		let mut symbols = SymbolTable::new();
		let e = build_keymap(&mut store, &mut symbols, &spec).unwrap_err();
		assert!(matches!(e, SpecError::Parse { .. }));
	}
}
