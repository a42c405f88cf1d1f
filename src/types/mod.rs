//! The types a mailbox hands out and accepts.

mod flag;
mod message;
mod target;

pub use flag::{Flag, FlagSet};
pub use message::{Identity, Message, MessageFactory};
pub use target::{MessageSink, Target, Trash};

/// From section [2.3.1.1 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.1).
///
/// A 32-bit value assigned to each message, unique within one folder and
/// strictly ascending as messages are added. Unlike message sequence
/// numbers, UIDs are not reassigned when messages are expunged, which
/// makes them the only message identity this crate exposes. A UID stops
/// referring to anything once its message is expunged, and is never
/// reused for as long as the folder is not deleted and recreated.
pub type Uid = u32;
