//! Command dispatch for resolved key sequences.
//!
//! The dispatcher sits between the reader and the editor proper: it takes
//! a resolved binding and either executes it through the [`CommandHost`]
//! seam or hands a macro literal back for replay. The two commands that
//! dominate real input, cursor motion by one character and self-insert,
//! take a direct path that skips the generic command-call machinery when
//! nothing observable depends on it.

use std::sync::Arc;

use quill_keymap::{Binding, KeymapError, KeymapStore};
use quill_primitives::{Symbol, SymbolTable, SymbolicEvent};
use tracing::{debug, warn};

use crate::echo::{EchoArea, EchoSink};
use crate::reader::ResolvedKeys;

/// Editor seam the dispatcher drives.
pub trait CommandHost {
	/// Moves point by `delta` characters.
	fn move_char(&mut self, delta: i64);
	/// Inserts `ch` at point.
	fn insert_char(&mut self, ch: char);
	/// Invokes `command` interactively. `keys` is the sequence that
	/// selected it; `prefix` is the pending numeric argument. Returns the
	/// numeric argument the command leaves pending, if any.
	fn call_command(
		&mut self,
		command: Symbol,
		keys: &[SymbolicEvent],
		prefix: Option<i64>,
	) -> Option<i64>;
	/// Marks an undo boundary before a command runs.
	fn undo_boundary(&mut self);
	/// Audible/visible bell for unbound or malformed input.
	fn bell(&mut self);
	/// False while the display needs a redisplay pass; the direct paths
	/// are skipped then so the generic machinery can trigger one.
	fn display_intact(&self) -> bool;
	/// True while a keyboard macro is executing.
	fn replaying_macro(&self) -> bool;
}

/// What dispatching one resolved sequence produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
	/// A command ran (directly or through [`CommandHost::call_command`]).
	Executed(Symbol),
	/// The sequence was unbound; the host was belled.
	Unbound,
	/// The binding is a macro literal: the caller replays these events.
	Replay(Arc<[SymbolicEvent]>),
}

/// Executes resolved bindings, tracking command history and the pending
/// numeric argument across dispatches.
#[derive(Debug)]
pub struct Dispatcher {
	forward_char: Symbol,
	backward_char: Symbol,
	self_insert: Symbol,
	last_command: Option<Symbol>,
	prefix_arg: Option<i64>,
}

impl Dispatcher {
	pub fn new(symbols: &mut SymbolTable) -> Self {
		Self {
			forward_char: symbols.intern("forward-char"),
			backward_char: symbols.intern("backward-char"),
			self_insert: symbols.intern("self-insert-command"),
			last_command: None,
			prefix_arg: None,
		}
	}

	/// Command executed by the previous dispatch, if any.
	pub fn last_command(&self) -> Option<Symbol> {
		self.last_command
	}

	/// Numeric argument pending for the next command.
	pub fn prefix_arg(&self) -> Option<i64> {
		self.prefix_arg
	}

	/// Dispatches one resolved key sequence.
	///
	/// The echo buffer is cancelled on completion unless the executed
	/// command left a numeric argument pending, in which case it stays
	/// visible for the sequence still being built.
	pub fn dispatch(
		&mut self,
		store: &KeymapStore,
		symbols: &mut SymbolTable,
		host: &mut dyn CommandHost,
		echo: &mut EchoArea,
		sink: &mut dyn EchoSink,
		resolved: &ResolvedKeys,
	) -> Result<DispatchOutcome, KeymapError> {
		let Some(binding) = &resolved.binding else {
			debug!("unbound key sequence");
			host.bell();
			self.prefix_arg = None;
			echo.cancel(sink);
			return Ok(DispatchOutcome::Unbound);
		};

		let outcome = match store.resolve(symbols, binding)? {
			Some(Binding::Keys(events)) => {
				// Replay happens in the caller's read loop, above us. The
				// invoking key's echo is finished; the replayed sequences
				// echo from scratch.
				echo.cancel(sink);
				return Ok(DispatchOutcome::Replay(events));
			}
			Some(Binding::Command(sym)) | Some(Binding::Sym(sym)) => {
				self.invoke(host, sym, &resolved.events);
				DispatchOutcome::Executed(sym)
			}
			Some(Binding::Prefix(_)) => {
				warn!("complete key sequence resolved to a prefix keymap");
				host.bell();
				DispatchOutcome::Unbound
			}
			// resolve() unwraps Indirect and Menu; an unbound tail bells.
			_ => {
				host.bell();
				DispatchOutcome::Unbound
			}
		};

		if self.prefix_arg.is_some() {
			echo.commit(sink);
		} else {
			echo.cancel(sink);
		}
		Ok(outcome)
	}

	fn invoke(&mut self, host: &mut dyn CommandHost, command: Symbol, keys: &[SymbolicEvent]) {
		let direct = self.prefix_arg.is_none() && host.display_intact() && !host.replaying_macro();
		if direct {
			if command == self.forward_char {
				host.undo_boundary();
				host.move_char(1);
				self.last_command = Some(command);
				return;
			}
			if command == self.backward_char {
				host.undo_boundary();
				host.move_char(-1);
				self.last_command = Some(command);
				return;
			}
			if command == self.self_insert
				&& let Some(SymbolicEvent::Char(c)) = keys.last()
				&& let Some(ch) = char::from_u32(*c)
			{
				host.undo_boundary();
				host.insert_char(ch);
				self.last_command = Some(command);
				return;
			}
		}
		host.undo_boundary();
		self.prefix_arg = host.call_command(command, keys, self.prefix_arg.take());
		self.last_command = Some(command);
	}
}
