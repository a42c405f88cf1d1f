//! The narrow session capability a [`Mailbox`](crate::Mailbox) is driven
//! through.
//!
//! A [`Session`] is a live, authenticated IMAP connection with exactly one
//! request in flight at a time. Connecting, TLS, authentication, and
//! response framing all belong to the implementor; this crate only issues
//! commands against the selected folder and interprets the payloads that
//! come back.

use std::fmt;

use crate::error::Result;

/// Status code of a tagged server reply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// The request completed successfully.
    Ok,
    /// The server refused the request.
    No,
    /// The server could not parse the request.
    Bad,
}

impl Status {
    /// Whether this is [`Status::Ok`].
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("OK"),
            Status::No => f.write_str("NO"),
            Status::Bad => f.write_str("BAD"),
        }
    }
}

/// One record of command-specific response data.
///
/// Textual records carry flag groups, sizes, dates, and SEARCH results;
/// binary records carry message literals from FETCH.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Record {
    /// A textual response record.
    Text(String),
    /// A binary response record.
    Bytes(Vec<u8>),
}

impl Record {
    /// The textual content of this record, if it has any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Record::Text(text) => Some(text),
            Record::Bytes(_) => None,
        }
    }

    /// The binary content of this record, if it has any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Record::Bytes(bytes) => Some(bytes),
            Record::Text(_) => None,
        }
    }
}

/// A tagged reply: the status code plus its response records.
///
/// An OK reply with no records is how a server signals "nothing matched";
/// for UID-addressed fetches that distinguishes a vanished message from a
/// refused request.
pub type Reply = (Status, Vec<Record>);

/// The operations this crate needs from an IMAP session.
///
/// Implementors hold the connection and speak the wire protocol; every
/// method maps onto one protocol exchange. All errors an implementation
/// cannot express as a [`Reply`] (lost connections, timeouts) surface as
/// [`Error::Io`](crate::Error::Io).
pub trait Session {
    /// Make `folder` the selected folder.
    ///
    /// Fails with [`Error::NoSuchFolder`](crate::Error::NoSuchFolder) if
    /// the server has no folder by that name.
    fn select(&mut self, folder: &str) -> Result<()>;

    /// Create `folder` on the server.
    fn create(&mut self, folder: &str) -> Result<()>;

    /// Run a UID-domain command (`SEARCH`, `FETCH`, `STORE`, `COPY`, ...)
    /// and hand back the tagged reply.
    fn uid(&mut self, command: &str, args: &[&str]) -> Result<Reply>;

    /// Append a message to `folder` with the given flag and internal-date
    /// strings, both already in their IMAP renderings.
    fn append(
        &mut self,
        folder: &str,
        flags: &str,
        internal_date: &str,
        body: &[u8],
    ) -> Result<Reply>;

    /// Permanently remove every message marked `\Deleted` from the
    /// selected folder.
    fn expunge(&mut self) -> Result<Reply>;

    /// Close the selected folder.
    fn close(&mut self) -> Result<()>;

    /// Log out and drop the connection.
    fn logout(&mut self) -> Result<()>;

    /// Re-establish the transport after a dropped connection. Idempotent.
    fn reconnect(&mut self) -> Result<()>;

    /// Re-authenticate after [`Session::reconnect`]. Idempotent.
    fn login(&mut self) -> Result<()>;
}
