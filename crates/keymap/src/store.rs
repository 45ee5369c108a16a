//! Arena-backed keymap storage.
//!
//! A keymap combines an optional dense table (plain-ASCII fast path) with
//! an ordered sparse alist. The arena makes keymap identity explicit and
//! keeps cyclic structures representable without leaking; every traversal
//! that could follow a cycle is capped.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use quill_primitives::{EventKey, Symbol, SymbolTable, canonicalize};
use slab::Slab;

use crate::binding::{Binding, KeymapError};

/// Slots in a dense keymap table (plain-ASCII fast path).
pub const DENSE_SIZE: usize = 128;
/// Cap on indirection-following in [`KeymapStore::resolve`].
pub const INDIRECTION_LIMIT: usize = 100;
/// Cap on nesting depth for [`KeymapStore::copy_keymap`].
pub const KEYMAP_NESTING_LIMIT: usize = 100;

/// Handle to a keymap in a [`KeymapStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeymapId(usize);

#[derive(Debug, Default, Clone)]
struct KeymapData {
	/// Dense table indexed by plain character code.
	dense: Option<Box<[Option<Binding>; DENSE_SIZE]>>,
	/// Ordered alist. The first entry for a key wins; later entries for
	/// the same key are shadowed, never removed automatically.
	sparse: Vec<(EventKey, Binding)>,
}

/// Arena of keymaps plus the symbol definition table (function cells).
#[derive(Debug, Default)]
pub struct KeymapStore {
	maps: Slab<KeymapData>,
	definitions: HashMap<Symbol, Binding>,
}

impl KeymapStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty sparse keymap.
	pub fn make_sparse(&mut self) -> KeymapId {
		KeymapId(self.maps.insert(KeymapData::default()))
	}

	/// Creates a keymap with a dense plain-ASCII table.
	pub fn make_dense(&mut self) -> KeymapId {
		KeymapId(self.maps.insert(KeymapData {
			dense: Some(Box::new(std::array::from_fn(|_| None))),
			sparse: Vec::new(),
		}))
	}

	pub fn contains(&self, map: KeymapId) -> bool {
		self.maps.contains(map.0)
	}

	/// Sets a symbol's definition (the function-cell analog), used when a
	/// binding is [`Binding::Sym`].
	pub fn define(&mut self, sym: Symbol, def: Binding) {
		self.definitions.insert(sym, def);
	}

	pub fn definition(&self, sym: Symbol) -> Option<&Binding> {
		self.definitions.get(&sym)
	}

	fn data(&self, map: KeymapId) -> Result<&KeymapData, KeymapError> {
		self.maps.get(map.0).ok_or(KeymapError::DanglingKeymap)
	}

	fn data_mut(&mut self, map: KeymapId) -> Result<&mut KeymapData, KeymapError> {
		self.maps.get_mut(map.0).ok_or(KeymapError::DanglingKeymap)
	}

	fn canonical_key(symbols: &mut SymbolTable, key: EventKey) -> EventKey {
		match key {
			EventKey::Sym(s) => EventKey::Sym(canonicalize(symbols, s)),
			ch => ch,
		}
	}

	/// Looks `key` up in `map`.
	///
	/// Plain characters index the dense table when present; everything
	/// else scans the sparse alist for the first matching entry. Symbol
	/// keys are canonicalized first.
	pub fn lookup(
		&self,
		symbols: &mut SymbolTable,
		map: KeymapId,
		key: EventKey,
	) -> Result<Option<Binding>, KeymapError> {
		self.lookup_canonical(map, Self::canonical_key(symbols, key))
	}

	fn lookup_canonical(&self, map: KeymapId, key: EventKey) -> Result<Option<Binding>, KeymapError> {
		let data = self.data(map)?;
		if let EventKey::Char(c) = key
			&& (c as usize) < DENSE_SIZE
			&& let Some(dense) = &data.dense
		{
			return Ok(dense[c as usize].clone());
		}
		Ok(data.sparse.iter().find(|(k, _)| *k == key).map(|(_, b)| b.clone()))
	}

	/// Binds `key` to `def` in `map`, returning the replaced binding.
	///
	/// An upsert: replaces an existing entry's value in place, else
	/// prepends a new pair. Malformed keys are rejected before any
	/// mutation.
	pub fn bind(
		&mut self,
		symbols: &mut SymbolTable,
		map: KeymapId,
		key: EventKey,
		def: Binding,
	) -> Result<Option<Binding>, KeymapError> {
		if let EventKey::Char(c) = key
			&& c > 255
		{
			return Err(KeymapError::InvalidKey(format!("character code {c} out of range")));
		}
		let key = Self::canonical_key(symbols, key);
		let data = self.data_mut(map)?;
		if let EventKey::Char(c) = key
			&& (c as usize) < DENSE_SIZE
			&& let Some(dense) = &mut data.dense
		{
			return Ok(dense[c as usize].replace(def));
		}
		if let Some((_, slot)) = data.sparse.iter_mut().find(|(k, _)| *k == key) {
			return Ok(Some(std::mem::replace(slot, def)));
		}
		data.sparse.insert(0, (key, def));
		Ok(None)
	}

	/// Follows indirections until the binding is a terminal shape.
	///
	/// Unwraps `(KEYMAP . INDEX)` pairs, menu annotations, and defined
	/// symbols, with an iteration cap: exceeding [`INDIRECTION_LIMIT`] is
	/// reported as a cycle. `Ok(None)` means the chain ended unbound.
	pub fn resolve(
		&self,
		symbols: &mut SymbolTable,
		binding: &Binding,
	) -> Result<Option<Binding>, KeymapError> {
		let mut current = binding.clone();
		for _ in 0..INDIRECTION_LIMIT {
			match current {
				Binding::Indirect(map, key) => match self.lookup(symbols, map, key)? {
					Some(next) => current = next,
					None => return Ok(None),
				},
				Binding::Menu(_, inner) => current = *inner,
				Binding::Sym(sym) => match self.definitions.get(&sym) {
					Some(next) => current = next.clone(),
					// An undefined symbol terminates; the dispatcher
					// decides what to do with it.
					None => return Ok(Some(Binding::Sym(sym))),
				},
				other => return Ok(Some(other)),
			}
		}
		Err(KeymapError::IndirectionCycle { limit: INDIRECTION_LIMIT })
	}

	/// Structurally copies `map`.
	///
	/// Deep-copies any binding value that is itself a keymap, so the
	/// copy's prefix maps are independent of the original's; non-keymap
	/// values are shared. Nesting is capped against cyclic maps.
	pub fn copy_keymap(&mut self, map: KeymapId) -> Result<KeymapId, KeymapError> {
		self.copy_at_depth(map, 0)
	}

	fn copy_at_depth(&mut self, map: KeymapId, depth: usize) -> Result<KeymapId, KeymapError> {
		if depth >= KEYMAP_NESTING_LIMIT {
			return Err(KeymapError::NestingCycle { limit: KEYMAP_NESTING_LIMIT });
		}
		let src = self.data(map)?.clone();
		let dense = match src.dense {
			Some(mut table) => {
				for slot in table.iter_mut() {
					if let Some(b) = slot.take() {
						*slot = Some(self.copy_binding(b, depth)?);
					}
				}
				Some(table)
			}
			None => None,
		};
		let mut sparse = Vec::with_capacity(src.sparse.len());
		for (key, b) in src.sparse {
			sparse.push((key, self.copy_binding(b, depth)?));
		}
		Ok(KeymapId(self.maps.insert(KeymapData { dense, sparse })))
	}

	fn copy_binding(&mut self, binding: Binding, depth: usize) -> Result<Binding, KeymapError> {
		Ok(match binding {
			Binding::Prefix(sub) => Binding::Prefix(self.copy_at_depth(sub, depth + 1)?),
			Binding::Menu(label, inner) => {
				Binding::Menu(label, Box::new(self.copy_binding(*inner, depth)?))
			}
			other => other,
		})
	}

	/// Binds a multi-key sequence, creating sparse prefix maps as needed.
	///
	/// Returns the binding the final key previously had, if any. Errors
	/// with [`KeymapError::NotAPrefix`] when an interior key is already
	/// bound to something that is not a keymap.
	pub fn define_sequence(
		&mut self,
		symbols: &mut SymbolTable,
		map: KeymapId,
		keys: &[EventKey],
		def: Binding,
	) -> Result<Option<Binding>, KeymapError> {
		let Some((last, prefix)) = keys.split_last() else {
			return Err(KeymapError::InvalidKey("empty key sequence".to_owned()));
		};
		let mut current = map;
		for (at, key) in prefix.iter().enumerate() {
			current = match self.lookup(symbols, current, *key)? {
				Some(b) => match self.resolve(symbols, &b)? {
					Some(Binding::Prefix(sub)) => sub,
					Some(_) => return Err(KeymapError::NotAPrefix { at }),
					None => self.new_prefix(symbols, current, *key)?,
				},
				None => self.new_prefix(symbols, current, *key)?,
			};
		}
		self.bind(symbols, current, *last, def)
	}

	fn new_prefix(
		&mut self,
		symbols: &mut SymbolTable,
		map: KeymapId,
		key: EventKey,
	) -> Result<KeymapId, KeymapError> {
		let sub = self.make_sparse();
		self.bind(symbols, map, key, Binding::Prefix(sub))?;
		Ok(sub)
	}

	/// Enumerates the keymaps reachable from `root` as prefix bindings,
	/// each with the key sequence that reaches it. Cyclic maps are visited
	/// once.
	pub fn accessible_keymaps(
		&self,
		symbols: &mut SymbolTable,
		root: KeymapId,
	) -> Result<Vec<(Vec<EventKey>, KeymapId)>, KeymapError> {
		let mut out = vec![(Vec::new(), root)];
		let mut seen: HashSet<KeymapId> = HashSet::from([root]);
		let mut queue: VecDeque<usize> = VecDeque::from([0]);
		while let Some(ix) = queue.pop_front() {
			let (prefix, map) = out[ix].clone();
			for (key, b) in self.entries(map)? {
				if let Some(Binding::Prefix(sub)) = self.resolve(symbols, &b)?
					&& seen.insert(sub)
				{
					let mut keys = prefix.clone();
					keys.push(key);
					out.push((keys, sub));
					queue.push_back(out.len() - 1);
				}
			}
		}
		Ok(out)
	}

	/// Labels of menu-annotated entries in `map`, in alist order.
	pub fn menu_items(&self, map: KeymapId) -> Vec<Arc<str>> {
		let Ok(data) = self.data(map) else { return Vec::new() };
		data.sparse
			.iter()
			.filter_map(|(_, b)| match b {
				Binding::Menu(label, _) => Some(label.clone()),
				_ => None,
			})
			.collect()
	}

	fn entries(&self, map: KeymapId) -> Result<Vec<(EventKey, Binding)>, KeymapError> {
		let data = self.data(map)?;
		let mut out = Vec::new();
		if let Some(dense) = &data.dense {
			for (c, slot) in dense.iter().enumerate() {
				if let Some(b) = slot {
					out.push((EventKey::Char(c as u32), b.clone()));
				}
			}
		}
		out.extend(data.sparse.iter().cloned());
		Ok(out)
	}
}
