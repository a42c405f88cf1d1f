use chrono::{DateTime, FixedOffset, Local};
use mailparse::MailHeaderMap;

use super::{Flag, FlagSet};

/// A message materialized from one retrieval call, or assembled locally
/// for [`Mailbox::add`](crate::Mailbox::add).
///
/// The flag set, internal date, and size reflect the server state at the
/// moment the message was fetched; nothing keeps them in sync afterwards.
#[derive(Clone, Debug)]
pub struct Message {
    raw: Vec<u8>,
    flags: FlagSet,
    internal_date: DateTime<FixedOffset>,
    size: u32,
    header_only: bool,
}

impl Message {
    /// Build an outgoing message from raw RFC822 bytes, with no flags and
    /// an internal date of now.
    pub fn new(raw: impl Into<Vec<u8>>) -> Message {
        let raw = raw.into();
        let size = raw.len() as u32;
        Message {
            raw,
            flags: FlagSet::new(),
            internal_date: Local::now().fixed_offset(),
            size,
            header_only: false,
        }
    }

    pub(crate) fn assemble(
        raw: Vec<u8>,
        flags: FlagSet,
        internal_date: DateTime<FixedOffset>,
        size: u32,
        header_only: bool,
    ) -> Message {
        Message {
            raw,
            flags,
            internal_date,
            size,
            header_only,
        }
    }

    /// Add `flag` to the message's flag set.
    pub fn with_flag(mut self, flag: Flag) -> Message {
        self.flags.insert(flag);
        self
    }

    /// Replace the message's internal date.
    pub fn with_internal_date(mut self, internal_date: DateTime<FixedOffset>) -> Message {
        self.internal_date = internal_date;
        self
    }

    /// The message in its wire-transfer encoding. For a header-only
    /// retrieval this is just the header block.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The flag set snapshot taken when this message was fetched.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// The server-assigned received timestamp. Distinct from any `Date`
    /// header inside the content.
    pub fn internal_date(&self) -> DateTime<FixedOffset> {
        self.internal_date
    }

    /// Size of the full message in bytes, as reported by the server.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Whether this view was built from a header-only fetch.
    pub fn is_header_only(&self) -> bool {
        self.header_only
    }

    /// Decoded value of the first header named `name`, if the raw bytes
    /// parse as a message and carry one.
    pub fn header(&self, name: &str) -> Option<String> {
        let parsed = mailparse::parse_mail(&self.raw).ok()?;
        parsed.headers.get_first_value(name)
    }

    /// IMAP rendering of the flag set, for APPEND.
    pub(crate) fn flag_string(&self) -> String {
        Flag::render_set(&self.flags)
    }

    /// IMAP rendering of the internal date, for APPEND.
    pub(crate) fn date_string(&self) -> String {
        self.internal_date.format("%d-%b-%Y %H:%M:%S %z").to_string()
    }
}

/// Converts each assembled [`Message`] into the representation a caller
/// wants out of a [`Mailbox`](crate::Mailbox).
///
/// Any `Fn(Message) -> T` closure works as a factory; [`Identity`] is the
/// default and hands the [`Message`] back unchanged.
pub trait MessageFactory {
    /// What retrievals produce.
    type Output;

    /// Turn an assembled message into the caller's representation.
    fn assemble(&self, message: Message) -> Self::Output;
}

/// The default factory: no transformation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl MessageFactory for Identity {
    type Output = Message;

    fn assemble(&self, message: Message) -> Message {
        message
    }
}

impl<T, F> MessageFactory for F
where
    F: Fn(Message) -> T,
{
    type Output = T;

    fn assemble(&self, message: Message) -> T {
        self(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    const RAW: &[u8] = b"From: Ada <ada@example.org>\r\nSubject: hello\r\n\r\nbody\r\n";

    #[test]
    fn outgoing_defaults() {
        let message = Message::new(RAW);
        assert_eq!(message.size(), RAW.len() as u32);
        assert!(message.flags().is_empty());
        assert!(!message.is_header_only());
        assert_eq!(message.flag_string(), "()");
    }

    #[test]
    fn header_lookup() {
        let message = Message::new(RAW);
        assert_eq!(message.header("Subject").as_deref(), Some("hello"));
        assert_eq!(message.header("X-Missing"), None);
    }

    #[test]
    fn append_renderings() {
        let date = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2021, 3, 5, 8, 30, 0)
            .unwrap();
        let message = Message::new(RAW)
            .with_flag(Flag::Seen)
            .with_flag(Flag::Custom("archived".to_string()))
            .with_internal_date(date);
        assert_eq!(message.flag_string(), r"(\Seen archived)");
        assert_eq!(message.date_string(), "05-Mar-2021 08:30:00 +0100");
    }

    #[test]
    fn closure_factory() {
        let factory = |message: Message| message.size();
        let out = MessageFactory::assemble(&factory, Message::new(RAW));
        assert_eq!(out, RAW.len() as u32);
    }
}
