//! The key-sequence reader.
//!
//! Reads events until the sequence selects a complete binding in one of
//! the active keymaps, walking all of them in parallel and keeping the
//! highest-priority answer. Around that core walk sit four rewrites,
//! each of which restarts the scan over the (rewritten) sequence:
//!
//! * meta folding — a character with the meta bit set becomes an ESC
//!   prefix followed by the plain character
//! * case fallback — an uppercase character unbound everywhere retries
//!   as lowercase, without rewriting the recorded event
//! * function-key translation — an unbound run of real events is matched
//!   against the function-key map and spliced with its expansion
//! * context restart — a real event arriving from a different buffer
//!   discards the pending prefix and starts over in the new context

use quill_keymap::{Binding, KeymapError, KeymapId, KeymapStore};
use quill_primitives::{BufferId, EventKey, SymbolTable, SymbolicEvent};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::echo::{EchoArea, EchoSink};
use crate::source::{EventSource, SourcedEvent};

/// Longest key sequence the reader will accumulate.
pub const KEY_SEQUENCE_MAX: usize = 30;
/// Character the meta bit folds into a prefix of.
const META_PREFIX: u32 = 27;

/// Errors that unwind an in-progress key-sequence read.
#[derive(Debug, Error)]
pub enum ReadError {
	/// The sequence hit [`KEY_SEQUENCE_MAX`] without resolving.
	#[error("key sequence exceeds {KEY_SEQUENCE_MAX} events without resolving")]
	TooLong,
	/// An interrupt arrived while waiting for input.
	#[error("interrupted while reading input")]
	Interrupted,
	/// A finite event source ran out mid-sequence.
	#[error("event source exhausted mid-sequence")]
	Exhausted,
	#[error(transparent)]
	Keymap(#[from] KeymapError),
}

/// Editor-state seam: which keymaps are searched, and in what context.
pub trait MapProvider {
	/// Active keymaps for `buffer`, highest priority first.
	fn active_maps(&self, buffer: BufferId) -> Vec<KeymapId>;
	/// Keymap translating raw escape runs into function-key events.
	fn function_key_map(&self) -> Option<KeymapId>;
	fn current_buffer(&self) -> BufferId;
}

/// Per-read options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadConfig {
	/// Echo the labels of menu-annotated entries of the pending prefix
	/// while waiting for the next key.
	pub menu_prompting: bool,
}

/// A completed read: the events consumed and the binding they selected.
/// `binding` is `None` when the sequence is unbound in every active map.
#[derive(Debug)]
pub struct ResolvedKeys {
	pub events: SmallVec<[SymbolicEvent; 8]>,
	pub binding: Option<Binding>,
}

/// Reads one complete key sequence from `source`.
///
/// Echo output accumulates in `echo` above whatever it already holds;
/// callers commit or cancel it afterwards. The `sink` is only driven
/// mid-read for menu prompts, which must be visible while the reader
/// blocks waiting for the next key. Errors leave the echo buffer for the
/// caller to discard.
#[allow(clippy::too_many_arguments)]
pub fn read_key_sequence(
	store: &KeymapStore,
	symbols: &mut SymbolTable,
	provider: &dyn MapProvider,
	config: &ReadConfig,
	source: &mut dyn EventSource,
	echo: &mut EchoArea,
	sink: &mut dyn EchoSink,
) -> Result<ResolvedKeys, ReadError> {
	let mut sequence: Vec<SourcedEvent> = Vec::new();
	// Events below this index are replays of already-accepted input and
	// are exempt from context checks and function-key translation.
	let mut mock_input = 0usize;
	let mut start_buffer = provider.current_buffer();
	// Window of events currently matched against the function-key map,
	// and the position reached inside that map.
	let mut fkey_start = 0usize;
	let mut fkey_end = 0usize;
	let mut fkey_next: Option<KeymapId> = None;
	let echo_base = echo.len();

	'restart: loop {
		let maps = provider.active_maps(start_buffer);
		let mut submaps: Vec<Option<KeymapId>> = maps.into_iter().map(Some).collect();
		let mut first_binding: Option<Binding> = None;
		echo.truncate(echo_base);
		let mut echoed = 0usize;
		let mut t = 0usize;

		loop {
			if t >= KEY_SEQUENCE_MAX {
				return Err(ReadError::TooLong);
			}

			if t >= sequence.len() {
				let prompt_mark = if config.menu_prompting && t > 0 {
					let mark = echo.len();
					if let Some(prompt) = menu_prompt(store, &submaps) {
						echo.append_text(&prompt);
						// Shown now; the read below blocks on input.
						echo.commit(sink);
					}
					Some(mark)
				} else {
					None
				};
				let next = source.next_event(symbols)?;
				if let Some(mark) = prompt_mark {
					echo.truncate(mark);
				}
				sequence.push(next);
			}
			let sourced = sequence[t].clone();

			// A real event from another buffer invalidates the prefix
			// read so far: keep only this event and start over there.
			if sourced.real && sourced.buffer != start_buffer {
				debug!(from = start_buffer.0, to = sourced.buffer.0, "input context changed, restarting");
				start_buffer = sourced.buffer;
				sequence.clear();
				sequence.push(sourced);
				mock_input = 1;
				fkey_start = 0;
				fkey_end = 0;
				fkey_next = None;
				continue 'restart;
			}

			// Meta folding: the echo keeps the `M-` spelling; the event is
			// rewritten in place and rescanned from the same position.
			if let SymbolicEvent::Char(c) = sourced.event
				&& c & 0x80 != 0
			{
				if echoed <= t {
					echo.append_event(symbols, &sourced.event);
					echoed = t + 2;
				}
				let head = SourcedEvent { event: SymbolicEvent::Char(META_PREFIX), ..sourced.clone() };
				let tail = SourcedEvent { event: SymbolicEvent::Char(c & 0x7f), ..sourced };
				sequence.splice(t..=t, [head, tail]);
				mock_input = sequence.len();
				continue;
			}

			if echoed <= t {
				echo.append_event(symbols, &sourced.event);
				echoed = t + 1;
			}

			let key = sourced.event.key();
			let mut results = lookup_key(store, symbols, &submaps, key)?;

			// Case fallback: an uppercase character unbound in every map
			// retries as lowercase. The recorded event keeps its case.
			if results.iter().all(Option::is_none)
				&& let EventKey::Char(c) = key
				&& u8::try_from(c).is_ok_and(|b| b.is_ascii_uppercase())
			{
				let lowered = lookup_key(store, symbols, &submaps, EventKey::Char(c + 32))?;
				if lowered.iter().any(Option::is_some) {
					results = lowered;
				}
			}

			// Commit: the first map with any binding decides; maps whose
			// binding is a prefix stay alive for the next key.
			first_binding = None;
			let mut winner_is_prefix = false;
			for (slot, result) in submaps.iter_mut().zip(results) {
				if slot.is_none() {
					continue;
				}
				match result {
					Some(Binding::Prefix(sub)) => {
						*slot = Some(sub);
						if first_binding.is_none() {
							first_binding = Some(Binding::Prefix(sub));
							winner_is_prefix = true;
						}
					}
					Some(other) => {
						*slot = None;
						if first_binding.is_none() {
							first_binding = Some(other);
						}
					}
					None => *slot = None,
				}
			}

			// Function-key translation: only over unbound real input.
			if first_binding.is_none()
				&& sourced.real
				&& t >= mock_input
				&& let Some(table) = provider.function_key_map()
			{
				while fkey_end <= t {
					let map = fkey_next.unwrap_or(table);
					let next_key = sequence[fkey_end].event.key();
					let found = match store.lookup(symbols, map, next_key)? {
						Some(b) => store.resolve(symbols, &b)?,
						None => None,
					};
					fkey_end += 1;
					match found {
						Some(Binding::Prefix(sub)) => fkey_next = Some(sub),
						Some(terminal) => {
							if let Some(expansion) = expansion_events(&terminal) {
								debug!(
									matched = fkey_end - fkey_start,
									spliced = expansion.len(),
									"function-key translation"
								);
								let buffer = sequence[fkey_start].buffer;
								let replacement: Vec<SourcedEvent> = expansion
									.into_iter()
									.map(|event| SourcedEvent { event, buffer, real: false })
									.collect();
								let resume = fkey_start + replacement.len();
								sequence.splice(fkey_start..fkey_end, replacement);
								fkey_start = resume;
								fkey_end = resume;
								fkey_next = None;
								mock_input = sequence.len();
								continue 'restart;
							}
							// A translation with no event form: skip it.
							fkey_start += 1;
							fkey_end = fkey_start;
							fkey_next = None;
						}
						None => {
							// No match starting here; slide the window.
							fkey_start += 1;
							fkey_end = fkey_start;
							fkey_next = None;
						}
					}
				}
			}

			// Mid-translation: a prefix of the function-key map matched
			// and more input may complete it.
			let fkey_pending = first_binding.is_none() && fkey_next.is_some();
			if winner_is_prefix || fkey_pending {
				t += 1;
				continue;
			}

			return Ok(ResolvedKeys {
				events: sequence.iter().map(|s| s.event.clone()).collect(),
				binding: first_binding,
			});
		}
	}
}

fn lookup_key(
	store: &KeymapStore,
	symbols: &mut SymbolTable,
	submaps: &[Option<KeymapId>],
	key: EventKey,
) -> Result<Vec<Option<Binding>>, KeymapError> {
	let mut out = Vec::with_capacity(submaps.len());
	for slot in submaps {
		out.push(match slot {
			Some(map) => match store.lookup(symbols, *map, key)? {
				Some(b) => store.resolve(symbols, &b)?,
				None => None,
			},
			None => None,
		});
	}
	Ok(out)
}

/// Event form a function-key translation splices into the sequence.
fn expansion_events(binding: &Binding) -> Option<Vec<SymbolicEvent>> {
	match binding {
		Binding::Keys(events) => Some(events.to_vec()),
		Binding::Sym(sym) | Binding::Command(sym) => Some(vec![SymbolicEvent::Sym(*sym)]),
		_ => None,
	}
}

fn menu_prompt(store: &KeymapStore, submaps: &[Option<KeymapId>]) -> Option<String> {
	let mut labels = Vec::new();
	for map in submaps.iter().flatten() {
		labels.extend(store.menu_items(*map));
	}
	if labels.is_empty() {
		return None;
	}
	let mut out = String::from("(");
	for (i, label) in labels.iter().enumerate() {
		if i > 0 {
			out.push_str(", ");
		}
		out.push_str(label);
	}
	out.push(')');
	Some(out)
}
