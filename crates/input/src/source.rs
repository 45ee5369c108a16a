//! Event sources feeding the key-sequence reader.

use std::collections::VecDeque;
use std::sync::Arc;

use quill_primitives::{BufferId, SymbolTable, SymbolicEvent};

use crate::reader::ReadError;

/// One decoded event plus its origin context.
#[derive(Debug, Clone)]
pub struct SourcedEvent {
	pub event: SymbolicEvent,
	/// Buffer shown in the window the event originated in.
	pub buffer: BufferId,
	/// True for events freshly read from the hardware layer. Function-key
	/// translation only runs over real input, never over macro replay.
	pub real: bool,
}

/// Supplies decoded events to the reader.
///
/// Blocking on the next raw event is the implementation's concern; an
/// interrupt delivered while waiting surfaces as
/// [`ReadError::Interrupted`] and unwinds the in-progress resolution.
pub trait EventSource {
	fn next_event(&mut self, symbols: &mut SymbolTable) -> Result<SourcedEvent, ReadError>;
}

/// Pre-decoded event queue (tests, pasted input).
#[derive(Debug, Default)]
pub struct QueueSource {
	queue: VecDeque<SourcedEvent>,
}

impl QueueSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, event: SymbolicEvent, buffer: BufferId) {
		self.queue.push_back(SourcedEvent { event, buffer, real: true });
	}

	pub fn push_sourced(&mut self, event: SourcedEvent) {
		self.queue.push_back(event);
	}

	pub fn is_empty(&self) -> bool {
		self.queue.is_empty()
	}
}

impl EventSource for QueueSource {
	fn next_event(&mut self, _symbols: &mut SymbolTable) -> Result<SourcedEvent, ReadError> {
		self.queue.pop_front().ok_or(ReadError::Exhausted)
	}
}

/// Replays a keyboard-macro literal, then falls through to the inner
/// source. Replayed events are not real input: the reader skips
/// function-key translation for them.
pub struct ReplaySource<'a> {
	events: Arc<[SymbolicEvent]>,
	index: usize,
	buffer: BufferId,
	inner: &'a mut dyn EventSource,
}

impl<'a> ReplaySource<'a> {
	pub fn new(events: Arc<[SymbolicEvent]>, buffer: BufferId, inner: &'a mut dyn EventSource) -> Self {
		Self { events, index: 0, buffer, inner }
	}

	/// True once every macro event has been replayed.
	pub fn exhausted(&self) -> bool {
		self.index >= self.events.len()
	}
}

impl EventSource for ReplaySource<'_> {
	fn next_event(&mut self, symbols: &mut SymbolTable) -> Result<SourcedEvent, ReadError> {
		if let Some(event) = self.events.get(self.index) {
			self.index += 1;
			return Ok(SourcedEvent { event: event.clone(), buffer: self.buffer, real: false });
		}
		// A macro may end mid-sequence; the rest comes from live input.
		self.inner.next_event(symbols)
	}
}
