use std::sync::LazyLock;

use regex::Regex;
use strum::Display;

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:http|ftp)s?://",
        // dotted hostname
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)",
        // or IPv4
        r"|[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3})",
        r"(?::[0-9]+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("valid url regex")
});

static TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9]{1,2}:)?(?:[0-9]{1,2}:)?[0-9]{1,2}$").expect("valid timestamp regex")
});

/// Why a clip command was turned away before any work started
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    #[strum(to_string = "expected <url> <start> <end>")]
    MissingArguments,
    #[strum(to_string = "url is not well-formed")]
    InvalidUrl,
    #[strum(to_string = "timestamp is not SS, MM:SS or HH:MM:SS")]
    InvalidTimestamp,
}

pub fn is_valid_url(url: &str) -> bool {
    URL_REGEX.is_match(url)
}

/// Syntax only: `99:99:99` passes.
pub fn is_valid_timestamp(timestamp: &str) -> bool {
    TIMESTAMP_REGEX.is_match(timestamp)
}

pub fn validate(url: &str, start_time: &str, end_time: &str) -> Result<(), Malformed> {
    if !is_valid_url(url) {
        return Err(Malformed::InvalidUrl);
    }

    if !is_valid_timestamp(start_time) || !is_valid_timestamp(end_time) {
        return Err(Malformed::InvalidTimestamp);
    }

    Ok(())
}
