use std::{fmt, path::PathBuf, time::Duration};

/// Errors raised while serving bot commands and running clip jobs
#[derive(Debug)]
pub enum BotError {
    /// Config file was absent (a template has been written) or incomplete
    ConfigMissing(PathBuf),
    /// Config file exists but holds unusable values
    ConfigInvalid(String),
    /// Filesystem errors
    FileSystemError(std::io::Error),
    /// Telegram API errors
    TelegramError(teloxide::RequestError),
    /// Errors parsing external tool output or config
    ParseError(String),
    /// Expected output file was not produced
    FileNotFound(String),
    /// External command exited with an error
    ExternalCommandError { command: String, stderr: String },
    /// External command ran longer than allowed
    Timeout { command: String, limit: Duration },
    /// General error with a description
    General(String),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::ConfigMissing(path) => {
                write!(f, "Configuration missing in {}", path.display())
            }
            BotError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            BotError::FileSystemError(e) => write!(f, "Filesystem error: {}", e),
            BotError::TelegramError(e) => write!(f, "Telegram API error: {}", e),
            BotError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            BotError::FileNotFound(path) => write!(f, "File not found: {}", path),
            BotError::ExternalCommandError { command, stderr } => {
                write!(f, "Command {} failed: {}", command, stderr)
            }
            BotError::Timeout { command, limit } => {
                write!(f, "Command {} timed out after {:?}", command, limit)
            }
            BotError::General(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BotError::FileSystemError(e) => Some(e),
            BotError::TelegramError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::FileSystemError(err)
    }
}

impl From<teloxide::RequestError> for BotError {
    fn from(err: teloxide::RequestError) -> Self {
        BotError::TelegramError(err)
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::ParseError(format!("JSON parsing error: {}", err))
    }
}

impl From<toml::de::Error> for BotError {
    fn from(err: toml::de::Error) -> Self {
        BotError::ParseError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for BotError {
    fn from(err: toml::ser::Error) -> Self {
        BotError::ParseError(format!("TOML serialization error: {}", err))
    }
}

impl BotError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn external_command_error(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::ExternalCommandError {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    pub fn timeout(command: impl Into<String>, limit: Duration) -> Self {
        Self::Timeout {
            command: command.into(),
            limit,
        }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }
}

pub type BotResult<T> = Result<T, BotError>;

/// Result for dispatcher endpoints
pub type HandlerResult = BotResult<()>;
