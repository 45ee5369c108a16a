//! Keymap storage and binding resolution.
//!
//! Keymaps live in an arena ([`KeymapStore`]) addressed by [`KeymapId`];
//! a binding is a closed tagged variant ([`Binding`]) unwrapped by a
//! capped indirection walk. Also provides:
//! - `kbd`-style key-string parsing (`"C-x C-f"`, `"M-x"`, `"<f5>"`)
//! - a serde-deserializable binding specification compiled into a store

pub mod binding;
pub mod kbd;
pub mod spec;
pub mod store;

pub use binding::{Binding, KeymapError};
pub use kbd::{ParseError, parse_key, parse_sequence};
pub use spec::{BindingSpec, KeymapSpec, SpecError, build_keymap};
pub use store::{DENSE_SIZE, INDIRECTION_LIMIT, KEYMAP_NESTING_LIMIT, KeymapId, KeymapStore};
