use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::session::{Record, Reply, Session, Status};

/// One recorded APPEND invocation.
pub struct AppendCall {
    pub folder: String,
    pub flags: String,
    pub internal_date: String,
    pub body: Vec<u8>,
}

/// A scripted [`Session`]: plays back queued replies to UID commands and
/// records everything it is asked to do.
///
/// UID commands consume replies from the script in order and panic when
/// it runs dry (a test bug). APPEND and EXPUNGE answer OK unless a
/// failure was queued for them explicitly.
#[derive(Default)]
pub struct MockSession {
    replies: VecDeque<Reply>,
    expunge_replies: VecDeque<Reply>,
    missing_folders: Vec<String>,
    pub commands: Vec<String>,
    pub selected: Vec<String>,
    pub created: Vec<String>,
    pub appends: Vec<AppendCall>,
    pub expunges: usize,
    pub closed: bool,
    pub logged_out: bool,
    pub reconnects: usize,
    pub logins: usize,
}

impl MockSession {
    pub fn new() -> MockSession {
        MockSession::default()
    }

    pub fn reply(mut self, status: Status, records: Vec<Record>) -> MockSession {
        self.replies.push_back((status, records));
        self
    }

    /// Queue an OK reply carrying one textual record.
    pub fn text_reply(self, text: &str) -> MockSession {
        self.reply(Status::Ok, vec![Record::Text(text.to_string())])
    }

    /// Queue an OK reply carrying one binary record.
    pub fn bytes_reply(self, bytes: &[u8]) -> MockSession {
        self.reply(Status::Ok, vec![Record::Bytes(bytes.to_vec())])
    }

    /// Queue an OK reply with no records (the "nothing matched" shape).
    pub fn ok_reply(self) -> MockSession {
        self.reply(Status::Ok, vec![])
    }

    /// Queue a NO reply carrying `text`.
    pub fn no_reply(self, text: &str) -> MockSession {
        self.reply(Status::No, vec![Record::Text(text.to_string())])
    }

    /// Make the next EXPUNGE answer NO.
    pub fn failing_expunge(mut self) -> MockSession {
        self.expunge_replies.push_back((Status::No, vec![]));
        self
    }

    /// Make SELECT of `folder` fail until the folder is created.
    pub fn without_folder(mut self, folder: &str) -> MockSession {
        self.missing_folders.push(folder.to_string());
        self
    }
}

impl Session for MockSession {
    fn select(&mut self, folder: &str) -> Result<()> {
        self.selected.push(folder.to_string());
        if self.missing_folders.iter().any(|f| f == folder)
            && !self.created.iter().any(|f| f == folder)
        {
            return Err(Error::NoSuchFolder(folder.to_string()));
        }
        Ok(())
    }

    fn create(&mut self, folder: &str) -> Result<()> {
        self.created.push(folder.to_string());
        Ok(())
    }

    fn uid(&mut self, command: &str, args: &[&str]) -> Result<Reply> {
        let line = if args.is_empty() {
            format!("UID {}", command)
        } else {
            format!("UID {} {}", command, args.join(" "))
        };
        self.commands.push(line);
        Ok(self
            .replies
            .pop_front()
            .expect("mock reply script exhausted"))
    }

    fn append(
        &mut self,
        folder: &str,
        flags: &str,
        internal_date: &str,
        body: &[u8],
    ) -> Result<Reply> {
        self.appends.push(AppendCall {
            folder: folder.to_string(),
            flags: flags.to_string(),
            internal_date: internal_date.to_string(),
            body: body.to_vec(),
        });
        Ok((Status::Ok, vec![]))
    }

    fn expunge(&mut self) -> Result<Reply> {
        self.expunges += 1;
        Ok(self
            .expunge_replies
            .pop_front()
            .unwrap_or((Status::Ok, vec![])))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        self.logged_out = true;
        Ok(())
    }

    fn reconnect(&mut self) -> Result<()> {
        self.reconnects += 1;
        Ok(())
    }

    fn login(&mut self) -> Result<()> {
        self.logins += 1;
        Ok(())
    }
}
