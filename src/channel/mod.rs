mod handshake;
mod mailbox;

pub use handshake::HandshakeChannel;
pub use mailbox::{Mailbox, MailboxError};
