use std::collections::HashSet;
use std::fmt;

/// The per-message flags a server tracks, unordered and re-read on every
/// retrieval since they change behind the client's back.
pub type FlagSet = HashSet<Flag>;

/// With the exception of [`Flag::Custom`], these are the system flags
/// pre-defined in [RFC 3501 section
/// 2.3.2](https://tools.ietf.org/html/rfc3501#section-2.3.2). System
/// flags begin with `\` on the wire; anything else is a server- or
/// user-defined keyword.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Flag {
    /// Message has been read.
    Seen,

    /// Message has been answered.
    Answered,

    /// Message is "flagged" for urgent/special attention.
    Flagged,

    /// Message is "deleted" for removal by a later expunge.
    Deleted,

    /// Message has not completed composition.
    Draft,

    /// Message arrived since the folder was last selected. Servers set
    /// this one; clients cannot store it.
    Recent,

    /// A non-standard keyword flag.
    Custom(String),
}

impl Flag {
    fn system(s: &str) -> Option<Self> {
        match s {
            "\\Seen" => Some(Flag::Seen),
            "\\Answered" => Some(Flag::Answered),
            "\\Flagged" => Some(Flag::Flagged),
            "\\Deleted" => Some(Flag::Deleted),
            "\\Draft" => Some(Flag::Draft),
            "\\Recent" => Some(Flag::Recent),
            _ => None,
        }
    }

    /// Render a flag set as a parenthesized IMAP flag list, sorted so the
    /// wire output is deterministic.
    pub(crate) fn render_set<'a>(flags: impl IntoIterator<Item = &'a Flag>) -> String {
        let mut rendered: Vec<String> = flags.into_iter().map(Flag::to_string).collect();
        rendered.sort();
        format!("({})", rendered.join(" "))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Seen => f.write_str("\\Seen"),
            Flag::Answered => f.write_str("\\Answered"),
            Flag::Flagged => f.write_str("\\Flagged"),
            Flag::Deleted => f.write_str("\\Deleted"),
            Flag::Draft => f.write_str("\\Draft"),
            Flag::Recent => f.write_str("\\Recent"),
            Flag::Custom(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Flag {
    fn from(s: &str) -> Self {
        if let Some(f) = Flag::system(s) {
            f
        } else {
            Flag::Custom(s.to_string())
        }
    }
}

impl From<String> for Flag {
    fn from(s: String) -> Self {
        if let Some(f) = Flag::system(&s) {
            f
        } else {
            Flag::Custom(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_round_trip() {
        for raw in ["\\Seen", "\\Answered", "\\Flagged", "\\Deleted", "\\Draft", "\\Recent"] {
            assert_eq!(Flag::from(raw).to_string(), raw);
        }
    }

    #[test]
    fn custom_keyword() {
        let flag = Flag::from("processed");
        assert_eq!(flag, Flag::Custom("processed".to_string()));
        assert_eq!(flag.to_string(), "processed");
    }

    #[test]
    fn render_set_sorted() {
        let flags: FlagSet = [Flag::Seen, Flag::Deleted, Flag::Custom("archived".into())]
            .into_iter()
            .collect();
        assert_eq!(Flag::render_set(&flags), r"(\Deleted \Seen archived)");
    }

    #[test]
    fn render_empty_set() {
        assert_eq!(Flag::render_set(&FlagSet::new()), "()");
    }
}
