//! Key-sequence resolution and command dispatch.
//!
//! Turns a stream of raw input events into resolved command bindings:
//!
//! * [`Decoder`] — raw events to symbolic events, through per-kind
//!   process-lifetime symbol caches
//! * [`EchoArea`] — incremental feedback of the keys read so far
//! * [`read_key_sequence`] — the multi-keymap parallel walk with
//!   meta folding, case fallback, function-key translation, and
//!   context-change restart
//! * [`Dispatcher`] — consumes a resolved binding, with fast paths for
//!   the most frequent commands
//! * [`CommandSession`] — one top-level read/dispatch cycle

pub mod decode;
pub mod dispatch;
pub mod echo;
pub mod reader;
pub mod session;
pub mod source;

pub use decode::{Decoder, DecodingSource, KeyNames, RawInput, WindowLocation, WindowResolver};
pub use dispatch::{CommandHost, DispatchOutcome, Dispatcher};
pub use echo::{ECHO_BUF_MAX, EchoArea, EchoSink};
pub use reader::{
	KEY_SEQUENCE_MAX, MapProvider, ReadConfig, ReadError, ResolvedKeys, read_key_sequence,
};
pub use session::CommandSession;
pub use source::{EventSource, QueueSource, ReplaySource, SourcedEvent};
