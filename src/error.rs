use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
use std::result;

use crate::session::Status;
use crate::types::Uid;

/// A convenience wrapper around `Result` for `imap_mailbox::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while operating on a mailbox.
#[derive(Debug)]
pub enum Error {
    /// An `io::Error` surfaced by the underlying session transport.
    Io(IoError),
    /// The server answered a request with a non-OK status.
    Protocol(ProtocolError),
    /// The selected folder holds no message with this UID.
    NoSuchMessage(Uid),
    /// The server has no folder with this name.
    NoSuchFolder(String),
    /// An OK response whose payload could not be parsed into the expected
    /// shape. This signals a server/implementation mismatch, not caller
    /// error.
    Parse(ParseError),
    /// The operation has no honest IMAP-level equivalent.
    Unsupported(&'static str),
    /// A copy or move target that cannot be addressed over the session.
    UnsupportedTarget(String),
    /// A message was requested from a folder that holds none.
    EmptyMailbox,
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error::Io(err)
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Error {
        Error::Protocol(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => fmt::Display::fmt(e, f),
            Error::Protocol(e) => fmt::Display::fmt(e, f),
            Error::NoSuchMessage(uid) => write!(f, "no message with UID {}", uid),
            Error::NoSuchFolder(name) => write!(f, "no folder named {:?}", name),
            Error::Parse(e) => fmt::Display::fmt(e, f),
            Error::Unsupported(op) => write!(f, "{} is not supported over IMAP", op),
            Error::UnsupportedTarget(target) => {
                write!(f, "cannot address copy target {:?}", target)
            }
            Error::EmptyMailbox => f.write_str("mailbox holds no messages"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// A non-OK tagged reply, together with the command that provoked it.
#[derive(Debug)]
pub struct ProtocolError {
    /// The command as issued, including its arguments.
    pub command: String,
    /// The status the server answered with.
    pub status: Status,
    /// Joined human-readable text from the reply, if any.
    pub information: String,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} response to {}", self.status, self.command)?;
        if !self.information.is_empty() {
            write!(f, ": {}", self.information)?;
        }
        Ok(())
    }
}

/// The payload of an OK response did not have the expected shape.
#[derive(Debug)]
pub enum ParseError {
    /// A SEARCH payload that is not a whitespace-delimited list of decimal
    /// UIDs.
    UidList(String),
    /// A FLAGS fetch whose flag group is missing or untokenizable.
    Flags(String),
    /// A fetch whose `RFC822.SIZE` field is missing or non-numeric.
    Size(String),
    /// A fetch whose `INTERNALDATE` field is missing or not a date.
    InternalDate(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UidList(text) => {
                write!(f, "unparsable UID list in SEARCH response: {:?}", text)
            }
            ParseError::Flags(record) => {
                write!(f, "unparsable flag group in FETCH response: {:?}", record)
            }
            ParseError::Size(record) => {
                write!(f, "no RFC822.SIZE field in FETCH response: {:?}", record)
            }
            ParseError::InternalDate(record) => {
                write!(f, "no INTERNALDATE field in FETCH response: {:?}", record)
            }
        }
    }
}

impl StdError for ParseError {}
