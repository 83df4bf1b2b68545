use super::Mailbox;
use crate::tracer::{ResumeSignal, SessionEvent};

/// The pair of single-slot mailboxes tying the traced thread to the
/// controller thread. Strict alternation falls out of the single-slot
/// discipline: report N must be retrieved before command N can be
/// deposited, and vice versa.
pub struct HandshakeChannel {
    pub reports: Mailbox<SessionEvent>,
    pub commands: Mailbox<ResumeSignal>,
}

impl HandshakeChannel {
    pub fn new() -> Self {
        Self {
            reports: Mailbox::new(),
            commands: Mailbox::new(),
        }
    }

    pub fn close(&self) {
        self.reports.close();
        self.commands.close();
    }
}

impl Default for HandshakeChannel {
    fn default() -> Self {
        Self::new()
    }
}
