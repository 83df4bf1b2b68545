use std::time::Duration;

use log::{debug, info};
use serde_json::Value;

use super::protocol::{self, Command};
use crate::channel::{HandshakeChannel, Mailbox, MailboxError};
use crate::error::EngineError;
use crate::snapshot::LocalsSnapshot;
use crate::tracer::{ResumeSignal, SessionEvent, SharedStepMode, StepMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The tracer's initial entry-point report has not been drained yet.
    AwaitingFirstStop,
    Stopped,
    Running,
    Completed,
}

/// Controller-side half of the engine: applies decoded commands to the
/// stepping mode, releases the tracer's block, and forwards stop reports
/// outward with the step counter attached.
pub struct CommandRouter {
    reports: Mailbox<SessionEvent>,
    commands: Mailbox<ResumeSignal>,
    mode: SharedStepMode,
    state: SessionState,
    step_count: u64,
    last_depth: usize,
    last_locals: Option<LocalsSnapshot>,
    mailbox_timeout: Option<Duration>,
}

impl CommandRouter {
    pub fn new(
        channel: &HandshakeChannel,
        mode: SharedStepMode,
        mailbox_timeout: Option<Duration>,
    ) -> Self {
        Self {
            reports: channel.reports.clone(),
            commands: channel.commands.clone(),
            mode,
            state: SessionState::AwaitingFirstStop,
            step_count: 0,
            last_depth: 0,
            last_locals: None,
            mailbox_timeout,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// One command in, zero or more outbound messages out. A first `step`
    /// forwards two reports: the primed entry point and the next stop.
    pub fn handle(&mut self, command: Command) -> Result<Vec<Value>, EngineError> {
        match command {
            Command::Step => self.handle_step(),
            Command::StepOver => self.handle_step_over(),
            Command::InspectValue { name } => self.handle_inspect(&name).map(|msg| vec![msg]),
        }
    }

    fn handle_step(&mut self) -> Result<Vec<Value>, EngineError> {
        if self.state == SessionState::Completed {
            return Err(EngineError::SessionClosed);
        }

        let mut outbound = Vec::new();
        if self.state == SessionState::AwaitingFirstStop {
            // Consume the initial entry-point report before resuming.
            outbound.push(self.forward_next()?);
            if self.state == SessionState::Completed {
                return Ok(outbound);
            }
        }

        // An armed step-over filters this resume; the mode reverts to plain
        // stepping once its stop has been delivered.
        self.step_count += 1;
        self.resume()?;
        let message = match self.forward_next() {
            Ok(message) => message,
            // The tracer died after the primed report was drained; deliver
            // what we have. The next command observes the closed session.
            Err(EngineError::SessionClosed) if !outbound.is_empty() => return Ok(outbound),
            Err(err) => return Err(err),
        };
        self.mode.set(StepMode::Step);
        outbound.push(message);
        Ok(outbound)
    }

    fn handle_step_over(&mut self) -> Result<Vec<Value>, EngineError> {
        if self.state == SessionState::Completed {
            return Err(EngineError::SessionClosed);
        }

        let mut outbound = Vec::new();
        if self.state == SessionState::AwaitingFirstStop {
            outbound.push(self.forward_next()?);
            if self.state == SessionState::Completed {
                return Ok(outbound);
            }
        }

        // Record the threshold; the next `step` is what actually resumes.
        debug!("step-over armed at depth {}", self.last_depth);
        self.mode.set(StepMode::StepOver {
            depth: self.last_depth,
        });
        Ok(outbound)
    }

    // Read-only against the last stop's locals; never touches the
    // mailboxes or the stepping state.
    fn handle_inspect(&self, name: &str) -> Result<Value, EngineError> {
        let value = self
            .last_locals
            .as_ref()
            .and_then(|locals| locals.get(name))
            .ok_or_else(|| EngineError::NameNotFound(name.to_string()))?;
        Ok(protocol::value_message(name, value))
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        match self.mailbox_timeout {
            Some(timeout) => self.commands.deposit_within(ResumeSignal, timeout)?,
            None => self.commands.deposit(ResumeSignal)?,
        }
        self.state = SessionState::Running;
        Ok(())
    }

    fn forward_next(&mut self) -> Result<Value, EngineError> {
        let event = match self.mailbox_timeout {
            Some(timeout) => self.reports.retrieve_within(timeout),
            None => self.reports.retrieve(),
        };
        match event {
            Ok(SessionEvent::Stopped(stop)) => {
                self.state = SessionState::Stopped;
                self.last_depth = stop.depth;
                let mut frame = stop.frame;
                frame.step_count = self.step_count;
                let message = protocol::stop_message(&frame, &stop.locals);
                self.last_locals = Some(stop.locals);
                Ok(message)
            }
            Ok(SessionEvent::Terminated) => {
                info!("traced program completed after {} steps", self.step_count);
                self.state = SessionState::Completed;
                Ok(protocol::terminated_message(self.step_count))
            }
            Err(MailboxError::Closed) => {
                // The tracer aborted (fatal error) or the session was torn
                // down; either way no further reports will come.
                self.state = SessionState::Completed;
                Err(EngineError::SessionClosed)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Poison both mailboxes so a blocked tracer exits instead of hanging.
    pub fn close(&mut self) {
        self.reports.close();
        self.commands.close();
        self.state = SessionState::Completed;
    }
}
