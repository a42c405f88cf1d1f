use super::{Message, Uid};
use crate::error::Result;

/// A message store that can receive copies from a
/// [`Mailbox`](crate::Mailbox) it does not share a session with.
///
/// The lifecycle a copy runs through is `lock`, `add`, `flush`, `unlock`.
/// Stores with no locking primitive implement `lock`/`unlock` as no-ops;
/// `Mailbox` itself does, since IMAP offers no server-side mailbox lock.
pub trait MessageSink {
    /// Take whatever exclusivity the store supports.
    fn lock(&mut self) -> Result<()>;

    /// Add one message to the store, returning its identifier there.
    fn add(&mut self, message: &Message) -> Result<Uid>;

    /// Make the addition durable.
    fn flush(&mut self) -> Result<()>;

    /// Release what [`MessageSink::lock`] took.
    fn unlock(&mut self) -> Result<()>;
}

/// Where a copy or move lands.
///
/// A folder on the same server is addressed by name and copied
/// server-side without downloading the message. Anything else is a
/// foreign store fed through the [`MessageSink`] lifecycle, which costs a
/// full download. A handle to another `Mailbox` is always a foreign
/// target here: every `Mailbox` owns its session outright, so two handles
/// can never share one.
pub enum Target<'a> {
    /// A folder on the same server, by name.
    Folder(&'a str),
    /// A foreign message store.
    Sink(&'a mut dyn MessageSink),
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(folder: &'a str) -> Target<'a> {
        Target::Folder(folder)
    }
}

/// Where discarded messages go instead of being flagged `\Deleted` in
/// place.
pub enum Trash {
    /// A folder on the same server.
    Folder(String),
    /// A foreign store.
    Sink(Box<dyn MessageSink>),
}
