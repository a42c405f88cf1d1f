use std::io::Cursor;

use chrono::{DateTime, FixedOffset};
use log::{debug, trace, warn};

use crate::error::{Error, ParseError, ProtocolError, Result};
use crate::parse;
use crate::session::{Record, Reply, Session};
use crate::types::{
    Flag, FlagSet, Identity, Message, MessageFactory, MessageSink, Target, Trash, Uid,
};

/// One folder on an IMAP server, presented as a UID-keyed collection of
/// messages.
///
/// A `Mailbox` owns its [`Session`] outright and keeps exactly one folder
/// selected on it. All message addressing is by [`Uid`]; sequence numbers
/// never appear in this API. Retrieval assembles a [`Message`] from the
/// raw bytes, the flag set, the internal date, and the size, then runs it
/// through the mailbox's [`MessageFactory`].
///
/// The only state held between calls is a single-slot cache of the last
/// full message fetched, so that a header inspection followed by a body
/// retrieval of the same UID downloads the message once. Everything else
/// round-trips to the server, since the folder can change underneath us
/// at any time.
pub struct Mailbox<S: Session, F: MessageFactory = Identity> {
    session: S,
    folder: String,
    factory: F,
    cache: Option<(Uid, Vec<u8>)>,
    trash: Option<Trash>,
}

fn command_line(command: &str, args: &[&str]) -> String {
    if args.is_empty() {
        format!("UID {}", command)
    } else {
        format!("UID {} {}", command, args.join(" "))
    }
}

fn check_ok(command: String, reply: Reply) -> Result<Vec<Record>> {
    let (status, records) = reply;
    if status.is_ok() {
        return Ok(records);
    }
    let information = records
        .iter()
        .filter_map(Record::as_text)
        .collect::<Vec<_>>()
        .join("; ");
    Err(Error::Protocol(ProtocolError {
        command,
        status,
        information,
    }))
}

fn validate_folder(folder: &str) -> Result<()> {
    // a name the session cannot transmit on one line is not addressable
    if folder.contains('\r') || folder.contains('\n') {
        return Err(Error::UnsupportedTarget(folder.to_string()));
    }
    Ok(())
}

fn select_or_create<S: Session>(session: &mut S, folder: &str, create: bool) -> Result<()> {
    match session.select(folder) {
        Err(Error::NoSuchFolder(_)) if create => {
            session.create(folder)?;
            session.select(folder)
        }
        result => result,
    }
}

impl<S: Session> Mailbox<S> {
    /// Select `folder` on `session` and bind to it.
    ///
    /// Fails with [`Error::NoSuchFolder`] if the server has no folder by
    /// that name.
    pub fn open(session: S, folder: &str) -> Result<Mailbox<S>> {
        Mailbox::bind(session, folder, false)
    }

    /// Like [`Mailbox::open`], but create the folder first if it is
    /// missing.
    pub fn open_or_create(session: S, folder: &str) -> Result<Mailbox<S>> {
        Mailbox::bind(session, folder, true)
    }

    fn bind(mut session: S, folder: &str, create: bool) -> Result<Mailbox<S>> {
        select_or_create(&mut session, folder, create)?;
        Ok(Mailbox {
            session,
            folder: folder.to_string(),
            factory: Identity,
            cache: None,
            trash: None,
        })
    }
}

impl<S: Session, F: MessageFactory> Mailbox<S, F> {
    /// Replace the message factory, keeping the session, folder, and
    /// cache.
    pub fn with_factory<G: MessageFactory>(self, factory: G) -> Mailbox<S, G> {
        Mailbox {
            session: self.session,
            folder: self.folder,
            factory,
            cache: self.cache,
            trash: self.trash,
        }
    }

    /// The name of the bound folder.
    pub fn name(&self) -> &str {
        &self.folder
    }

    /// A shared reference to the underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Route future [`Mailbox::discard`] calls into `trash` instead of
    /// flagging messages `\Deleted` in place. `None` restores in-place
    /// deletion.
    pub fn set_trash(&mut self, trash: Option<Trash>) {
        self.trash = trash;
    }

    /// The configured trash target, if any.
    pub fn trash(&self) -> Option<&Trash> {
        self.trash.as_ref()
    }

    fn uid_ok(&mut self, command: &str, args: &[&str]) -> Result<Vec<Record>> {
        let reply = self.session.uid(command, args)?;
        check_ok(command_line(command, args), reply)
    }

    // ---------- search ----------

    /// UIDs of the messages matching `criteria`, in ascending order.
    ///
    /// `criteria` is handed to the server as-is; its search grammar (RFC
    /// 3501 section 6.4.4: `ALL`, `UNSEEN`, `SINCE`, `FROM`, ...) is
    /// authoritative and nothing is validated locally. Every call
    /// round-trips to the server.
    pub fn search(&mut self, criteria: &str) -> Result<Vec<Uid>> {
        trace!("searching {:?} in {}", criteria, self.folder);
        let records = self.uid_ok("SEARCH", &[&format!("({})", criteria)])?;
        let text = records.iter().find_map(Record::as_text).unwrap_or("");
        parse::parse_uid_list(text)
    }

    /// UIDs of the messages that are neither seen nor deleted.
    pub fn unseen(&mut self) -> Result<Vec<Uid>> {
        self.search("UNSEEN UNDELETED")
    }

    /// UIDs of the messages not marked `\Deleted`.
    pub fn undeleted(&mut self) -> Result<Vec<Uid>> {
        self.search("UNDELETED")
    }

    // ---------- raw access ----------

    fn fetch_raw(&mut self, uid: Uid) -> Result<Vec<u8>> {
        if let Some((cached_uid, raw)) = &self.cache {
            if *cached_uid == uid {
                trace!("cache hit for UID {}", uid);
                return Ok(raw.clone());
            }
        }
        debug!("fetching UID {} from {}", uid, self.folder);
        let records = self.uid_ok("FETCH", &[&uid.to_string(), "(RFC822)"])?;
        let raw = records
            .into_iter()
            .find_map(|record| match record {
                Record::Bytes(bytes) => Some(bytes),
                Record::Text(_) => None,
            })
            .ok_or(Error::NoSuchMessage(uid))?;
        self.cache = Some((uid, raw.clone()));
        Ok(raw)
    }

    fn fetch_header_raw(&mut self, uid: Uid) -> Result<Vec<u8>> {
        // headers are cheap; caching them would only evict the far more
        // expensive full body
        let records = self.uid_ok("FETCH", &[&uid.to_string(), "(BODY.PEEK[HEADER])"])?;
        records
            .into_iter()
            .find_map(|record| match record {
                Record::Bytes(bytes) => Some(bytes),
                Record::Text(_) => None,
            })
            .ok_or(Error::NoSuchMessage(uid))
    }

    /// The message with `uid` in its wire-transfer encoding.
    ///
    /// Served from the single-slot cache when `uid` was the last message
    /// fetched in full.
    pub fn raw(&mut self, uid: Uid) -> Result<Vec<u8>> {
        self.fetch_raw(uid)
    }

    /// The same bytes as [`Mailbox::raw`], wrapped in a reader.
    pub fn raw_reader(&mut self, uid: Uid) -> Result<Cursor<Vec<u8>>> {
        self.fetch_raw(uid).map(Cursor::new)
    }

    // ---------- flags, size, internal date ----------

    /// The current flag set of the message with `uid`.
    ///
    /// Flags are never cached: the server can change them behind our
    /// back, so every call re-reads them.
    pub fn flags(&mut self, uid: Uid) -> Result<FlagSet> {
        let records = self.uid_ok("FETCH", &[&uid.to_string(), "(FLAGS)"])?;
        let record = records
            .iter()
            .find_map(Record::as_text)
            .ok_or_else(|| Error::Parse(ParseError::Flags(String::new())))?;
        parse::parse_flags(record)
    }

    /// Replace the flag set of the message with `uid` in one request.
    pub fn set_flags(&mut self, uid: Uid, flags: &FlagSet) -> Result<()> {
        self.uid_ok("STORE", &[&uid.to_string(), "FLAGS", &Flag::render_set(flags)])?;
        Ok(())
    }

    /// Add each of `flags` to the message with `uid`, one store request
    /// per flag.
    ///
    /// The flags are applied sequentially, not as a batch: on failure,
    /// flags before the failing one remain applied, and the returned
    /// [`ProtocolError`] names the store that failed.
    pub fn add_flags(&mut self, uid: Uid, flags: &[Flag]) -> Result<()> {
        self.store_each(uid, "+FLAGS", flags)
    }

    /// Remove each of `flags` from the message with `uid`, one store
    /// request per flag. Partial failure behaves as in
    /// [`Mailbox::add_flags`].
    pub fn remove_flags(&mut self, uid: Uid, flags: &[Flag]) -> Result<()> {
        self.store_each(uid, "-FLAGS", flags)
    }

    fn store_each(&mut self, uid: Uid, action: &str, flags: &[Flag]) -> Result<()> {
        for flag in flags {
            self.uid_ok("STORE", &[&uid.to_string(), action, &format!("({})", flag)])?;
        }
        Ok(())
    }

    /// Size in bytes of the message with `uid`, as reported by the
    /// server.
    pub fn size(&mut self, uid: Uid) -> Result<u32> {
        let records = self.uid_ok("FETCH", &[&uid.to_string(), "(RFC822.SIZE)"])?;
        let record = records
            .iter()
            .find_map(Record::as_text)
            .ok_or(Error::NoSuchMessage(uid))?;
        parse::parse_size(record)
    }

    /// Server-assigned received timestamp of the message with `uid`.
    pub fn internal_date(&mut self, uid: Uid) -> Result<DateTime<FixedOffset>> {
        let records = self.uid_ok("FETCH", &[&uid.to_string(), "(INTERNALDATE)"])?;
        let record = records
            .iter()
            .find_map(Record::as_text)
            .ok_or(Error::NoSuchMessage(uid))?;
        parse::parse_internal_date(record)
    }

    // ---------- retrieval ----------

    fn materialize(&mut self, uid: Uid, header_only: bool) -> Result<Message> {
        // the raw fetch goes first: a vanished UID short-circuits the
        // remaining round-trips
        let raw = if header_only {
            self.fetch_header_raw(uid)?
        } else {
            self.fetch_raw(uid)?
        };
        let flags = self.flags(uid)?;
        let internal_date = self.internal_date(uid)?;
        let size = self.size(uid)?;
        Ok(Message::assemble(raw, flags, internal_date, size, header_only))
    }

    /// Retrieve the full message with `uid` and run it through the
    /// factory.
    pub fn get(&mut self, uid: Uid) -> Result<F::Output> {
        let message = self.materialize(uid, false)?;
        Ok(self.factory.assemble(message))
    }

    /// Like [`Mailbox::get`], but fetch only the header block. The
    /// full-body cache is neither consulted nor evicted.
    pub fn get_header(&mut self, uid: Uid) -> Result<F::Output> {
        let message = self.materialize(uid, true)?;
        Ok(self.factory.assemble(message))
    }

    /// [`Mailbox::get`], with a vanished UID mapped to `None`.
    pub fn try_get(&mut self, uid: Uid) -> Result<Option<F::Output>> {
        match self.get(uid) {
            Ok(message) => Ok(Some(message)),
            Err(Error::NoSuchMessage(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// One summary line per UID: the UID, the sender, the message date,
    /// and the subject, truncated to terminal width.
    ///
    /// UIDs that no longer exist are skipped, so a stale snapshot from an
    /// earlier search is acceptable input.
    pub fn summaries(&mut self, uids: &[Uid]) -> Result<Vec<String>> {
        let mut lines = Vec::with_capacity(uids.len());
        for &uid in uids {
            let header = match self.materialize(uid, true) {
                Ok(message) => message,
                Err(Error::NoSuchMessage(_)) => continue,
                Err(e) => return Err(e),
            };
            lines.push(summary_line(uid, &header));
        }
        Ok(lines)
    }

    // ---------- keyed-collection surface ----------

    /// Whether a message with `uid` exists in the folder. Costs a full
    /// search.
    pub fn contains(&mut self, uid: Uid) -> Result<bool> {
        Ok(self.search("ALL")?.contains(&uid))
    }

    /// Number of messages in the folder. Costs a full search; no count
    /// is maintained locally.
    pub fn len(&mut self) -> Result<usize> {
        Ok(self.search("ALL")?.len())
    }

    /// Whether the folder holds no messages.
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.search("ALL")?.is_empty())
    }

    /// A snapshot of every UID in the folder at call time.
    pub fn uids(&mut self) -> Result<Vec<Uid>> {
        self.search("ALL")
    }

    /// Iterate over the folder's messages.
    ///
    /// The UID list is snapshotted once, up front; each message is then
    /// retrieved lazily as the iterator advances. Server-side changes
    /// after the snapshot are not reflected. Call again for a fresh
    /// snapshot.
    pub fn iter(&mut self) -> Result<Messages<'_, S, F>> {
        let uids = self.search("ALL")?;
        Ok(Messages {
            mailbox: self,
            uids: uids.into_iter(),
        })
    }

    /// Like [`Mailbox::iter`], but yielding `(uid, message)` pairs.
    pub fn entries(&mut self) -> Result<Entries<'_, S, F>> {
        let uids = self.search("ALL")?;
        Ok(Entries {
            mailbox: self,
            uids: uids.into_iter(),
        })
    }

    /// Append `message` to the folder with its flags and internal date,
    /// then flush.
    ///
    /// Returns the highest UID present after the append. That is the
    /// appended message's UID on a quiet folder, but only best-effort:
    /// the protocol does not universally report the assigned UID, and a
    /// concurrent append from another client can claim a higher one.
    pub fn add(&mut self, message: &Message) -> Result<Uid> {
        let reply = self.session.append(
            &self.folder,
            &message.flag_string(),
            &message.date_string(),
            message.raw(),
        )?;
        check_ok(format!("APPEND {}", self.folder), reply)?;
        self.flush()?;
        self.undeleted()?.into_iter().max().ok_or(Error::EmptyMailbox)
    }

    /// In-place replacement, which IMAP cannot express. Always fails
    /// with [`Error::Unsupported`]: the only emulation would be
    /// delete-plus-append, which silently changes the UID and flags
    /// under the caller.
    pub fn set(&mut self, _uid: Uid, _message: &Message) -> Result<()> {
        Err(Error::Unsupported("replacing a message in place"))
    }

    /// Retrieve the message with `uid`, then remove it and flush.
    pub fn pop(&mut self, uid: Uid) -> Result<F::Output> {
        let message = self.get(uid)?;
        self.remove(uid)?;
        self.flush()?;
        Ok(message)
    }

    /// [`Mailbox::pop`], with a vanished UID mapped to `None`.
    pub fn try_pop(&mut self, uid: Uid) -> Result<Option<F::Output>> {
        match self.pop(uid) {
            Ok(message) => Ok(Some(message)),
            Err(Error::NoSuchMessage(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove and return the first message in the folder, by UID order.
    ///
    /// Fails with [`Error::EmptyMailbox`] when there is nothing left.
    pub fn pop_first(&mut self) -> Result<(Uid, F::Output)> {
        self.flush()?;
        let uids = self.search("ALL")?;
        let uid = *uids.first().ok_or(Error::EmptyMailbox)?;
        let message = self.get(uid)?;
        self.remove(uid)?;
        self.flush()?;
        Ok((uid, message))
    }

    /// Discard every undeleted message, then flush.
    pub fn clear(&mut self) -> Result<()> {
        for uid in self.undeleted()? {
            self.discard(uid)?;
        }
        self.flush()
    }

    // ---------- transfer ----------

    /// Copy the message with `uid` into `target`.
    ///
    /// A same-server folder target is copied server-side without
    /// downloading the message; copying a message onto its own folder is
    /// a no-op. A [`Target::Sink`] costs a full retrieval, and only the
    /// flags the sink chooses to honor survive.
    pub fn copy_to(&mut self, uid: Uid, target: Target<'_>) -> Result<()> {
        match target {
            Target::Folder(folder) => {
                validate_folder(folder)?;
                if folder == self.folder {
                    return Ok(());
                }
                self.uid_ok("COPY", &[&uid.to_string(), folder])?;
                Ok(())
            }
            Target::Sink(sink) => {
                let message = self.materialize(uid, false)?;
                sink.lock()?;
                sink.add(&message)?;
                sink.flush()?;
                sink.unlock()
            }
        }
    }

    /// Copy the message with `uid` into `target`, then mark the original
    /// `\Deleted`. Moving a message onto its own folder is a no-op.
    ///
    /// The two steps are not atomic; IMAP offers no cross-folder move
    /// primitive. If the flag store fails after the copy succeeded, the
    /// message exists in both places and no compensation is attempted.
    pub fn move_to(&mut self, uid: Uid, target: Target<'_>) -> Result<()> {
        if let Target::Folder(folder) = &target {
            if *folder == self.folder {
                return Ok(());
            }
        }
        self.copy_to(uid, target)?;
        self.add_flags(uid, &[Flag::Deleted])
    }

    /// Soft-delete the message with `uid`.
    ///
    /// With a trash target configured this moves the message there;
    /// otherwise it marks the message `\Deleted` in place, leaving it
    /// present until the next [`Mailbox::expunge`].
    pub fn discard(&mut self, uid: Uid) -> Result<()> {
        match self.trash.take() {
            None => self.add_flags(uid, &[Flag::Deleted]),
            Some(mut trash) => {
                let result = match &mut trash {
                    Trash::Folder(folder) => {
                        debug!("moving UID {} to trash folder {}", uid, folder);
                        let folder = folder.clone();
                        self.move_to(uid, Target::Folder(folder.as_str()))
                    }
                    Trash::Sink(sink) => {
                        debug!("moving UID {} to trash sink", uid);
                        self.move_to(uid, Target::Sink(sink.as_mut()))
                    }
                };
                self.trash = Some(trash);
                result
            }
        }
    }

    /// Discard the message with `uid`, failing with
    /// [`Error::NoSuchMessage`] if the folder holds no such message.
    pub fn remove(&mut self, uid: Uid) -> Result<()> {
        if !self.search("ALL")?.contains(&uid) {
            return Err(Error::NoSuchMessage(uid));
        }
        self.discard(uid)
    }

    /// Physically remove every message marked `\Deleted`. Irreversible.
    pub fn expunge(&mut self) -> Result<()> {
        let reply = self.session.expunge()?;
        check_ok("EXPUNGE".to_string(), reply)?;
        Ok(())
    }

    /// Equivalent to [`Mailbox::expunge`].
    pub fn flush(&mut self) -> Result<()> {
        self.expunge()
    }

    // ---------- lifecycle ----------

    /// Flush the bound folder, then select `folder` instead, creating it
    /// first if `create` is set. Invalidates the message cache.
    pub fn switch(&mut self, folder: &str, create: bool) -> Result<()> {
        debug!("switching {} -> {}", self.folder, folder);
        self.flush()?;
        select_or_create(&mut self.session, folder, create)?;
        self.folder = folder.to_string();
        self.cache = None;
        Ok(())
    }

    /// Re-establish a dropped session: reconnect, log back in, and
    /// re-select the bound folder. The message cache is discarded.
    ///
    /// This is the only recovery path in the crate, and it runs only
    /// when called; no operation retries on its own.
    pub fn reconnect(&mut self) -> Result<()> {
        warn!("reconnecting session bound to {}", self.folder);
        self.session.reconnect()?;
        self.session.login()?;
        self.session.select(&self.folder)?;
        self.cache = None;
        Ok(())
    }

    /// Flush, close the folder, and log out, handing back the spent
    /// session object.
    pub fn close(mut self) -> Result<S> {
        self.flush()?;
        self.session.close()?;
        self.session.logout()?;
        Ok(self.session)
    }
}

impl<S: Session, F: MessageFactory> MessageSink for Mailbox<S, F> {
    fn lock(&mut self) -> Result<()> {
        // IMAP has no server-side mailbox lock
        Ok(())
    }

    fn add(&mut self, message: &Message) -> Result<Uid> {
        Mailbox::add(self, message)
    }

    fn flush(&mut self) -> Result<()> {
        Mailbox::flush(self)
    }

    fn unlock(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Lazy message iterator over a point-in-time UID snapshot.
///
/// Created by [`Mailbox::iter`].
pub struct Messages<'a, S: Session, F: MessageFactory> {
    mailbox: &'a mut Mailbox<S, F>,
    uids: std::vec::IntoIter<Uid>,
}

impl<'a, S: Session, F: MessageFactory> Iterator for Messages<'a, S, F> {
    type Item = Result<F::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        let uid = self.uids.next()?;
        Some(self.mailbox.get(uid))
    }
}

/// Lazy `(uid, message)` iterator over a point-in-time UID snapshot.
///
/// Created by [`Mailbox::entries`].
pub struct Entries<'a, S: Session, F: MessageFactory> {
    mailbox: &'a mut Mailbox<S, F>,
    uids: std::vec::IntoIter<Uid>,
}

impl<'a, S: Session, F: MessageFactory> Iterator for Entries<'a, S, F> {
    type Item = Result<(Uid, F::Output)>;

    fn next(&mut self) -> Option<Self::Item> {
        let uid = self.uids.next()?;
        Some(self.mailbox.get(uid).map(|message| (uid, message)))
    }
}

fn summary_line(uid: Uid, message: &Message) -> String {
    let index = format!("{:>2}", uid);
    let raw_from = message.header("From").unwrap_or_default();
    let from = match mailparse::addrparse(&raw_from) {
        Ok(list) => match list.first() {
            Some(mailparse::MailAddr::Single(info)) => match &info.display_name {
                Some(name) if !name.is_empty() => name.clone(),
                _ => info.addr.clone(),
            },
            Some(mailparse::MailAddr::Group(group)) => group.group_name.clone(),
            None => raw_from,
        },
        Err(_) => raw_from,
    };
    let date = message
        .header("Date")
        .and_then(|date| mailparse::dateparse(&date).ok())
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .map(|date| date.format("%m/%d/%Y %H:%M").to_string())
        .unwrap_or_else(|| " ".repeat(16));
    let subject = message.header("Subject").unwrap_or_default();
    let from_width = 25usize.saturating_sub(index.len());
    format!(
        "{} {:<from_width$} {} {:<35}",
        index,
        truncate(&from, from_width),
        date,
        truncate(&subject, 35),
        from_width = from_width,
    )
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
