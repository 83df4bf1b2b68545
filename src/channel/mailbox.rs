use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MailboxError {
    #[error("mailbox wait expired after {0:?}")]
    Timeout(Duration),
    #[error("mailbox closed")]
    Closed,
}

struct State<T> {
    slot: Option<T>,
    closed: bool,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    cond: Condvar,
}

/// Single-slot blocking handoff: `deposit` blocks while the slot is
/// occupied, `retrieve` blocks while it is empty. `close` poisons the slot
/// so a blocked peer unblocks; a pending item is still drained first.
pub struct Mailbox<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    slot: None,
                    closed: false,
                }),
                cond: Condvar::new(),
            }),
        }
    }

    pub fn deposit(&self, value: T) -> Result<(), MailboxError> {
        self.deposit_inner(value, None)
    }

    pub fn deposit_within(&self, value: T, timeout: Duration) -> Result<(), MailboxError> {
        self.deposit_inner(value, Some(timeout))
    }

    pub fn retrieve(&self) -> Result<T, MailboxError> {
        self.retrieve_inner(None)
    }

    pub fn retrieve_within(&self, timeout: Duration) -> Result<T, MailboxError> {
        self.retrieve_inner(Some(timeout))
    }

    pub fn close(&self) {
        let mut state = self.inner.state.lock().unwrap();
        state.closed = true;
        self.inner.cond.notify_all();
    }

    pub fn is_occupied(&self) -> bool {
        self.inner.state.lock().unwrap().slot.is_some()
    }

    fn deposit_inner(&self, value: T, timeout: Option<Duration>) -> Result<(), MailboxError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.inner.state.lock().unwrap();
        loop {
            if state.closed {
                return Err(MailboxError::Closed);
            }
            if state.slot.is_none() {
                state.slot = Some(value);
                self.inner.cond.notify_all();
                return Ok(());
            }
            state = self.wait(state, deadline, timeout)?;
        }
    }

    fn retrieve_inner(&self, timeout: Option<Duration>) -> Result<T, MailboxError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.inner.state.lock().unwrap();
        loop {
            if let Some(value) = state.slot.take() {
                self.inner.cond.notify_all();
                return Ok(value);
            }
            if state.closed {
                return Err(MailboxError::Closed);
            }
            state = self.wait(state, deadline, timeout)?;
        }
    }

    fn wait<'a>(
        &'a self,
        state: std::sync::MutexGuard<'a, State<T>>,
        deadline: Option<Instant>,
        timeout: Option<Duration>,
    ) -> Result<std::sync::MutexGuard<'a, State<T>>, MailboxError> {
        match deadline {
            None => Ok(self.inner.cond.wait(state).unwrap()),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(MailboxError::Timeout(timeout.unwrap_or_default()));
                }
                let (state, _) = self.inner.cond.wait_timeout(state, deadline - now).unwrap();
                Ok(state)
            }
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
