//! Top-level read/dispatch cycle.

use quill_keymap::KeymapStore;
use quill_primitives::SymbolTable;
use tracing::warn;

use crate::dispatch::{CommandHost, DispatchOutcome, Dispatcher};
use crate::echo::{EchoArea, EchoSink};
use crate::reader::{MapProvider, ReadConfig, ReadError, read_key_sequence};
use crate::source::{EventSource, ReplaySource};

/// Nested macro replays allowed before the session gives up.
const REPLAY_DEPTH_MAX: usize = 32;

/// One interactive command loop: owns the dispatcher state and the echo
/// buffer, and drives read/dispatch cycles against caller-supplied
/// keymaps, input, and editor seams.
pub struct CommandSession {
	dispatcher: Dispatcher,
	config: ReadConfig,
	echo: EchoArea,
}

impl CommandSession {
	pub fn new(symbols: &mut SymbolTable, config: ReadConfig) -> Self {
		Self { dispatcher: Dispatcher::new(symbols), config, echo: EchoArea::new() }
	}

	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	/// Reads one key sequence and dispatches it, replaying macro literals
	/// inline.
	///
	/// Unwinds caused by user input (an over-long sequence, an interrupt
	/// while waiting) bell and recover; everything else propagates.
	pub fn run_once(
		&mut self,
		store: &KeymapStore,
		symbols: &mut SymbolTable,
		provider: &dyn MapProvider,
		host: &mut dyn CommandHost,
		source: &mut dyn EventSource,
		sink: &mut dyn EchoSink,
	) -> Result<(), ReadError> {
		match self.read_dispatch(store, symbols, provider, host, source, sink, 0) {
			Ok(()) => Ok(()),
			Err(ReadError::TooLong) => {
				warn!("key sequence too long, discarding");
				self.echo.cancel(sink);
				host.bell();
				Ok(())
			}
			Err(ReadError::Interrupted) => {
				self.echo.cancel(sink);
				host.bell();
				Ok(())
			}
			Err(other) => Err(other),
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn read_dispatch(
		&mut self,
		store: &KeymapStore,
		symbols: &mut SymbolTable,
		provider: &dyn MapProvider,
		host: &mut dyn CommandHost,
		source: &mut dyn EventSource,
		sink: &mut dyn EchoSink,
		depth: usize,
	) -> Result<(), ReadError> {
		let resolved =
			read_key_sequence(store, symbols, provider, &self.config, source, &mut self.echo, sink)?;
		self.echo.commit(sink);
		let outcome =
			self.dispatcher.dispatch(store, symbols, host, &mut self.echo, sink, &resolved)?;
		if let DispatchOutcome::Replay(events) = outcome {
			if depth >= REPLAY_DEPTH_MAX {
				warn!("macro replay nested too deep, discarding");
				self.echo.cancel(sink);
				host.bell();
				return Ok(());
			}
			let buffer = provider.current_buffer();
			let mut replay = ReplaySource::new(events, buffer, source);
			while !replay.exhausted() {
				self.read_dispatch(store, symbols, provider, host, &mut replay, sink, depth + 1)?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use quill_keymap::{Binding, KeymapId, parse_sequence};
	use quill_primitives::{BufferId, EventKey, Symbol, SymbolicEvent};

	use super::*;
	use crate::source::{QueueSource, SourcedEvent};

	struct Maps {
		maps: Vec<KeymapId>,
	}

	impl MapProvider for Maps {
		fn active_maps(&self, _buffer: BufferId) -> Vec<KeymapId> {
			self.maps.clone()
		}

		fn function_key_map(&self) -> Option<KeymapId> {
			None
		}

		fn current_buffer(&self) -> BufferId {
			BufferId(1)
		}
	}

	#[derive(Default)]
	struct FakeHost {
		calls: Vec<Symbol>,
		bells: usize,
	}

	impl CommandHost for FakeHost {
		fn move_char(&mut self, _delta: i64) {}

		fn insert_char(&mut self, _ch: char) {}

		fn call_command(
			&mut self,
			command: Symbol,
			_keys: &[SymbolicEvent],
			_prefix: Option<i64>,
		) -> Option<i64> {
			self.calls.push(command);
			None
		}

		fn undo_boundary(&mut self) {}

		fn bell(&mut self) {
			self.bells += 1;
		}

		fn display_intact(&self) -> bool {
			// Forces every command through call_command for observation.
			false
		}

		fn replaying_macro(&self) -> bool {
			false
		}
	}

	#[derive(Default)]
	struct RecordingSink {
		shown: Vec<String>,
		cleared: usize,
	}

	impl EchoSink for RecordingSink {
		fn show(&mut self, text: &str) {
			self.shown.push(text.to_owned());
		}

		fn clear(&mut self) {
			self.cleared += 1;
		}
	}

	/// Yields its one event, then an interrupt.
	struct InterruptingSource {
		first: Option<SourcedEvent>,
	}

	impl EventSource for InterruptingSource {
		fn next_event(&mut self, _symbols: &mut SymbolTable) -> Result<SourcedEvent, ReadError> {
			self.first.take().ok_or(ReadError::Interrupted)
		}
	}

	#[test]
	fn reads_dispatches_and_echoes_one_sequence() {
		let mut store = KeymapStore::new();
		let mut symbols = SymbolTable::new();
		let mut session = CommandSession::new(&mut symbols, ReadConfig::default());
		let global = store.make_sparse();
		let kill = symbols.intern("kill-buffer");
		let keys = parse_sequence(&mut symbols, "C-x k").unwrap();
		store.define_sequence(&mut symbols, global, &keys, Binding::Command(kill)).unwrap();

		let provider = Maps { maps: vec![global] };
		let mut host = FakeHost::default();
		let mut source = QueueSource::new();
		source.push(SymbolicEvent::Char(24), BufferId(1));
		source.push(SymbolicEvent::Char(b'k' as u32), BufferId(1));
		let mut sink = RecordingSink::default();

		session
			.run_once(&store, &mut symbols, &provider, &mut host, &mut source, &mut sink)
			.unwrap();
		assert_eq!(host.calls, vec![kill]);
		assert_eq!(sink.shown, vec!["C-x k ".to_owned()]);
	}

	#[test]
	fn macro_bindings_replay_through_the_keymaps() {
		let mut store = KeymapStore::new();
		let mut symbols = SymbolTable::new();
		let mut session = CommandSession::new(&mut symbols, ReadConfig::default());
		let global = store.make_sparse();
		let kill = symbols.intern("kill-buffer");
		let keys = parse_sequence(&mut symbols, "C-x k").unwrap();
		store.define_sequence(&mut symbols, global, &keys, Binding::Command(kill)).unwrap();
		store
			.bind(
				&mut symbols,
				global,
				EventKey::Char(b'm' as u32),
				Binding::keys(vec![
					SymbolicEvent::Char(24),
					SymbolicEvent::Char(b'k' as u32),
					SymbolicEvent::Char(24),
					SymbolicEvent::Char(b'k' as u32),
				]),
			)
			.unwrap();

		let provider = Maps { maps: vec![global] };
		let mut host = FakeHost::default();
		let mut source = QueueSource::new();
		source.push(SymbolicEvent::Char(b'm' as u32), BufferId(1));
		let mut sink = RecordingSink::default();

		session
			.run_once(&store, &mut symbols, &provider, &mut host, &mut source, &mut sink)
			.unwrap();
		// The macro ran the bound command twice.
		assert_eq!(host.calls, vec![kill, kill]);
		// Each sequence echoes on its own; the macro key's echo does not
		// linger under the replayed ones.
		assert_eq!(sink.shown, vec!["m ".to_owned(), "C-x k ".to_owned(), "C-x k ".to_owned()]);
	}

	#[test]
	fn interrupts_discard_partial_state_and_recover() {
		let mut store = KeymapStore::new();
		let mut symbols = SymbolTable::new();
		let mut session = CommandSession::new(&mut symbols, ReadConfig::default());
		let global = store.make_sparse();
		let kill = symbols.intern("kill-buffer");
		let keys = parse_sequence(&mut symbols, "C-x k").unwrap();
		store.define_sequence(&mut symbols, global, &keys, Binding::Command(kill)).unwrap();

		let provider = Maps { maps: vec![global] };
		let mut host = FakeHost::default();
		let mut sink = RecordingSink::default();

		// A quit arrives after the prefix key.
		let mut source = InterruptingSource {
			first: Some(SourcedEvent {
				event: SymbolicEvent::Char(24),
				buffer: BufferId(1),
				real: true,
			}),
		};
		session
			.run_once(&store, &mut symbols, &provider, &mut host, &mut source, &mut sink)
			.unwrap();
		assert_eq!(host.bells, 1);
		assert!(host.calls.is_empty());
		assert_eq!(sink.cleared, 1);

		// The next read starts from a clean echo and resolves normally.
		let mut source = QueueSource::new();
		source.push(SymbolicEvent::Char(24), BufferId(1));
		source.push(SymbolicEvent::Char(b'k' as u32), BufferId(1));
		session
			.run_once(&store, &mut symbols, &provider, &mut host, &mut source, &mut sink)
			.unwrap();
		assert_eq!(host.calls, vec![kill]);
		assert_eq!(sink.shown.last(), Some(&"C-x k ".to_owned()));
	}

	#[test]
	fn self_replaying_macro_is_depth_capped() {
		let mut store = KeymapStore::new();
		let mut symbols = SymbolTable::new();
		let mut session = CommandSession::new(&mut symbols, ReadConfig::default());
		let global = store.make_sparse();
		store
			.bind(
				&mut symbols,
				global,
				EventKey::Char(b'm' as u32),
				Binding::keys(vec![SymbolicEvent::Char(b'm' as u32)]),
			)
			.unwrap();

		let provider = Maps { maps: vec![global] };
		let mut host = FakeHost::default();
		let mut source = QueueSource::new();
		source.push(SymbolicEvent::Char(b'm' as u32), BufferId(1));
		let mut sink = RecordingSink::default();

		session
			.run_once(&store, &mut symbols, &provider, &mut host, &mut source, &mut sink)
			.unwrap();
		assert_eq!(host.bells, 1);
	}

	#[test]
	fn over_long_sequences_recover_with_a_bell() {
		let mut store = KeymapStore::new();
		let mut symbols = SymbolTable::new();
		let mut session = CommandSession::new(&mut symbols, ReadConfig::default());
		let global = store.make_sparse();
		store
			.bind(&mut symbols, global, EventKey::Char(b'a' as u32), Binding::Prefix(global))
			.unwrap();

		let provider = Maps { maps: vec![global] };
		let mut host = FakeHost::default();
		let mut source = QueueSource::new();
		for _ in 0..40 {
			source.push(SymbolicEvent::Char(b'a' as u32), BufferId(1));
		}
		let mut sink = RecordingSink::default();

		session
			.run_once(&store, &mut symbols, &provider, &mut host, &mut source, &mut sink)
			.unwrap();
		assert_eq!(host.bells, 1);
		assert!(host.calls.is_empty());
	}
}
