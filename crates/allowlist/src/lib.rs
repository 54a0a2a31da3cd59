//! allowlist: the persisted set of window classes allowed to take focus.
//!
//! The list lives inside the user's `kwinrc` under the
//! `[Script-kwin-focus-helper]` group as a single delimiter-separated
//! value, so the KWin-side script and this crate read the same source of
//! truth. Mutations are serialized across processes with a sibling lock
//! file and made crash-safe with a write-temp-then-rename protocol.
//!
//! Public surface:
//! - [`normalize`] / [`parse_list`]: class-key normalization.
//! - [`Store`]: load/save/add/remove/list over the persisted file.

mod error;
mod key;
mod kwinrc;
mod store;

pub use error::{Error, Result};
pub use key::{join_list, normalize, parse_list};
pub use store::{CLASSES_KEY, CONFIG_DIR_ENV, GROUP, Store};
