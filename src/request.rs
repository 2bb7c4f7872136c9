use teloxide::types::ChatId;

use crate::validator::{Malformed, validate};

/// Identity used as the rate-limit key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequesterId(pub i64);

impl From<ChatId> for RequesterId {
    fn from(chat_id: ChatId) -> Self {
        Self(chat_id.0)
    }
}

impl std::fmt::Display for RequesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated `/clip` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    pub url: String,
    pub start_time: String,
    pub end_time: String,
    pub requester: RequesterId,
}

impl ClipRequest {
    /// Build a request from the command arguments. Tokens past the third are ignored.
    pub fn parse(args: &str, requester: RequesterId) -> Result<Self, Malformed> {
        let mut tokens = args.split_whitespace();
        let (Some(url), Some(start_time), Some(end_time)) =
            (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(Malformed::MissingArguments);
        };

        validate(url, start_time, end_time)?;

        Ok(Self {
            url: url.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            requester,
        })
    }
}
