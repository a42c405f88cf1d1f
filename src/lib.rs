//! A UID-keyed view of one IMAP folder.
//!
//! [`Mailbox`] makes a folder on an IMAP server behave like a map from
//! [`Uid`] to [`Message`]: membership tests, length, iteration, get,
//! remove, pop, and append, plus flag manipulation and copy/move into
//! other folders or foreign stores. It drives the server through the
//! narrow [`Session`] capability trait; connecting, TLS, authentication,
//! and wire framing belong to whatever implements that trait.
//!
//! Messages are addressed by UID only. Sequence numbers, which the
//! protocol reassigns on every expunge, never appear in this API.
//!
//! # Usage
//!
//! ```
//! use imap_mailbox::{Mailbox, Result, Session};
//!
//! fn archive_unseen<S: Session>(session: S) -> Result<()> {
//!     let mut inbox = Mailbox::open(session, "INBOX")?;
//!     for uid in inbox.unseen()? {
//!         inbox.copy_to(uid, "Archive".into())?;
//!     }
//!     inbox.flush()
//! }
//! ```
//!
//! The last full message fetched is kept in a single-slot cache, so
//! reading a header and then the body of the same message downloads it
//! once. Nothing else is cached: searches, flags, sizes, and dates are
//! re-read from the server on every call, because another client may
//! change them at any time.
//!
//! A `Mailbox` issues one request at a time on its session and owns that
//! session exclusively. For concurrent access to several folders, open
//! one `Mailbox` per connection.

mod error;
mod mailbox;
mod parse;
mod session;
mod types;

pub use crate::error::{Error, ParseError, ProtocolError, Result};
pub use crate::mailbox::{Entries, Mailbox, Messages};
pub use crate::session::{Record, Reply, Session, Status};
pub use crate::types::*;

#[cfg(test)]
mod mock_session;
