use chrono::{DateTime, FixedOffset};
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ParseError, Result};
use crate::types::{Flag, FlagSet, Uid};

lazy_static! {
    static ref FLAG_GROUP: Regex = Regex::new(r"FLAGS \(([^)]*)\)").unwrap();
    static ref SIZE_FIELD: Regex = Regex::new(r"RFC822\.SIZE (\d+)").unwrap();
    static ref INTERNAL_DATE_FIELD: Regex = Regex::new(r#"INTERNALDATE "([^"]+)""#).unwrap();
}

/// Parse a SEARCH payload: a whitespace-delimited list of decimal UIDs.
///
/// An empty payload is a legitimate empty result, not an error.
pub fn parse_uid_list(text: &str) -> Result<Vec<Uid>> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<Uid>()
                .map_err(|_| ParseError::UidList(text.to_string()).into())
        })
        .collect()
}

/// Extract the flag set from a `FETCH (FLAGS)` response record, e.g.
/// `17 (UID 17 FLAGS (\Seen \Flagged customtag))`.
pub fn parse_flags(record: &str) -> Result<FlagSet> {
    let group = FLAG_GROUP
        .captures(record)
        .and_then(|cap| cap.get(1))
        .ok_or_else(|| ParseError::Flags(record.to_string()))?;
    Ok(group.as_str().split_whitespace().map(Flag::from).collect())
}

/// Extract the byte count from a `FETCH (RFC822.SIZE)` response record.
pub fn parse_size(record: &str) -> Result<u32> {
    let field = SIZE_FIELD
        .captures(record)
        .and_then(|cap| cap.get(1))
        .ok_or_else(|| ParseError::Size(record.to_string()))?;
    field
        .as_str()
        .parse::<u32>()
        .map_err(|_| ParseError::Size(record.to_string()).into())
}

/// Extract the server-assigned received timestamp from a
/// `FETCH (INTERNALDATE)` response record.
///
/// The date-time inside the quotes uses the fixed `dd-Mon-yyyy
/// hh:mm:ss +zzzz` form, with a possible leading space on single-digit
/// days.
pub fn parse_internal_date(record: &str) -> Result<DateTime<FixedOffset>> {
    let field = INTERNAL_DATE_FIELD
        .captures(record)
        .and_then(|cap| cap.get(1))
        .ok_or_else(|| ParseError::InternalDate(record.to_string()))?;
    DateTime::parse_from_str(field.as_str().trim_start(), "%d-%b-%Y %H:%M:%S %z")
        .map_err(|_| ParseError::InternalDate(record.to_string()).into())
}
