use std::time::Duration;

use thiserror::Error;

use crate::channel::MailboxError;

/// `StackUnderflow` is fatal and ends the session; the remaining variants
/// are recoverable or teardown signals observed by a blocked thread.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("call stack underflow: return from '{function}' at depth 0")]
    StackUnderflow { function: String },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("no local named '{0}' in the last captured frame")]
    NameNotFound(String),

    #[error("mailbox operation timed out after {0:?}")]
    MailboxTimeout(Duration),

    #[error("debug session closed")]
    SessionClosed,
}

impl From<MailboxError> for EngineError {
    fn from(err: MailboxError) -> Self {
        match err {
            MailboxError::Timeout(waited) => EngineError::MailboxTimeout(waited),
            MailboxError::Closed => EngineError::SessionClosed,
        }
    }
}
