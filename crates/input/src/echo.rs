//! Incremental echo of keys read so far.

use quill_primitives::{SymbolTable, SymbolicEvent, describe_event};

/// Fixed capacity of the echo buffer. Appends past it are dropped rather
/// than corrupting the buffer.
pub const ECHO_BUF_MAX: usize = 300;

/// Display layer seam for echo output.
pub trait EchoSink {
	fn show(&mut self, text: &str);
	fn clear(&mut self);
}

/// Bounded buffer of display text for the in-progress key sequence.
#[derive(Debug, Default)]
pub struct EchoArea {
	buf: String,
}

impl EchoArea {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds the buffer with a prompt, discarding prior contents.
	pub fn install_prompt(&mut self, text: &str) {
		self.buf.clear();
		self.push_bounded(text);
	}

	pub fn len(&self) -> usize {
		self.buf.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buf.is_empty()
	}

	pub fn text(&self) -> &str {
		&self.buf
	}

	/// Renders one more event and appends a separating space.
	pub fn append_event(&mut self, symbols: &SymbolTable, event: &SymbolicEvent) {
		let desc = describe_event(symbols, event);
		self.push_bounded(&desc);
		self.push_bounded(" ");
	}

	/// Appends raw prompt text (menu prompting fallback).
	pub fn append_text(&mut self, text: &str) {
		self.push_bounded(text);
	}

	/// Rewinds to a previously recorded length. Must never be asked to
	/// extend past the current length.
	pub fn truncate(&mut self, len: usize) {
		debug_assert!(len <= self.buf.len(), "echo truncation past current length");
		if len < self.buf.len() {
			self.buf.truncate(len);
		}
	}

	pub fn clear(&mut self) {
		self.buf.clear();
	}

	/// Pushes the buffer to the display layer.
	pub fn commit(&self, sink: &mut dyn EchoSink) {
		sink.show(&self.buf);
	}

	/// Clears the buffer and the display.
	pub fn cancel(&mut self, sink: &mut dyn EchoSink) {
		self.buf.clear();
		sink.clear();
	}

	fn push_bounded(&mut self, s: &str) {
		if self.buf.len() + s.len() <= ECHO_BUF_MAX {
			self.buf.push_str(s);
			return;
		}
		// Near-full: keep whole characters while they fit.
		for ch in s.chars() {
			if self.buf.len() + ch.len_utf8() > ECHO_BUF_MAX {
				break;
			}
			self.buf.push(ch);
		}
	}
}
