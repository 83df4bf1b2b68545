use std::time::Duration;

use log::{debug, trace, warn};

use super::events::{
    CodeLocation, FrameReport, ResumeSignal, SessionEvent, StopReport, TraceDirective,
    TraceEventKind, TraceHooks,
};
use super::mode::{SharedStepMode, StepMode};
use super::stack::CallStack;
use crate::channel::{HandshakeChannel, Mailbox, MailboxError};
use crate::error::EngineError;
use crate::snapshot::LocalsSnapshot;

#[derive(Debug, Clone)]
pub struct TracerConfig {
    /// Synthetic filename prefix marking user code (the cell); anything
    /// else is library code and never stopped on.
    pub user_code_prefix: String,
    /// The engine's own inbound-message dispatch function. Its frames are
    /// infrastructure, not target code.
    pub dispatch_function: String,
    /// Bound on every mailbox wait; `None` blocks indefinitely.
    pub mailbox_timeout: Option<Duration>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            user_code_prefix: "<cell-input-".to_string(),
            dispatch_function: "comm_dispatch".to_string(),
            // Matches the longest the controller is given to answer a stop.
            mailbox_timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// Runs inline on the traced thread: maintains the logical call stack,
/// decides which line events are stop points, and on a stop blocks until
/// the controller deposits a resume signal.
pub struct ExecutionTracer {
    config: TracerConfig,
    code_lines: Vec<String>,
    stack: CallStack,
    mode: SharedStepMode,
    reports: Mailbox<SessionEvent>,
    commands: Mailbox<ResumeSignal>,
}

impl ExecutionTracer {
    pub fn new(
        code_lines: Vec<String>,
        config: TracerConfig,
        mode: SharedStepMode,
        channel: &HandshakeChannel,
    ) -> Self {
        Self {
            config,
            code_lines,
            stack: CallStack::new(),
            mode,
            reports: channel.reports.clone(),
            commands: channel.commands.clone(),
        }
    }

    /// Deposit the terminal event (best effort) and poison both mailboxes.
    pub fn finish(&self) {
        match self.deposit(SessionEvent::Terminated) {
            Ok(()) => {}
            Err(err) => warn!("could not deliver termination event: {}", err),
        }
        self.shutdown();
    }

    pub fn shutdown(&self) {
        self.reports.close();
        self.commands.close();
    }

    fn is_user_code(&self, location: &CodeLocation) -> bool {
        location.filename.starts_with(&self.config.user_code_prefix)
    }

    fn is_dispatch(&self, location: &CodeLocation) -> bool {
        location.function_name == self.config.dispatch_function
    }

    fn deposit(&self, event: SessionEvent) -> Result<(), MailboxError> {
        match self.config.mailbox_timeout {
            Some(timeout) => self.reports.deposit_within(event, timeout),
            None => self.reports.deposit(event),
        }
    }

    fn suspend(&mut self, stop: StopReport) -> Result<(), EngineError> {
        debug!(
            "stopping at {}:{} ({})",
            stop.frame.function_name, stop.frame.lineno, stop.depth
        );
        self.deposit(SessionEvent::Stopped(stop))?;
        match self.config.mailbox_timeout {
            Some(timeout) => self.commands.retrieve_within(timeout)?,
            None => self.commands.retrieve()?,
        };
        trace!("resumed");
        Ok(())
    }

    fn build_report(&self, event: TraceEventKind, location: &CodeLocation) -> FrameReport {
        // 1-based line numbers; out-of-range lookups degrade to None
        // rather than failing.
        let source_line = location
            .lineno
            .checked_sub(1)
            .and_then(|idx| self.code_lines.get(idx))
            .cloned();
        FrameReport {
            event,
            source_line,
            filename: location.filename.clone(),
            function_name: location.function_name.clone(),
            lineno: location.lineno,
            step_count: 0,
        }
    }
}

impl TraceHooks for ExecutionTracer {
    fn on_call(
        &mut self,
        location: &CodeLocation,
        _locals: &LocalsSnapshot,
    ) -> Result<TraceDirective, EngineError> {
        // Infrastructure and library frames never touch the stack. Guarding
        // before the push is the symmetric form of the push-then-undo
        // correction: it holds even when the host never delivers the
        // skipped frame's return.
        if self.is_dispatch(location) || !self.is_user_code(location) {
            trace!("call into {} (not traced)", location.function_name);
            return Ok(TraceDirective::SkipChildren);
        }
        self.stack.push(location.function_name.clone());
        Ok(TraceDirective::TraceChildren)
    }

    fn on_return(
        &mut self,
        location: &CodeLocation,
        _locals: &LocalsSnapshot,
    ) -> Result<TraceDirective, EngineError> {
        if self.is_dispatch(location) || !self.is_user_code(location) {
            return Ok(TraceDirective::SkipChildren);
        }
        match self.stack.pop() {
            Some(_) => Ok(TraceDirective::TraceChildren),
            None => Err(EngineError::StackUnderflow {
                function: location.function_name.clone(),
            }),
        }
    }

    fn on_line(
        &mut self,
        location: &CodeLocation,
        locals: &LocalsSnapshot,
    ) -> Result<TraceDirective, EngineError> {
        if !self.is_user_code(location) {
            return Ok(TraceDirective::SkipChildren);
        }

        // Stop-point decision: always stop on a user-code line, unless
        // stepping over and still inside a deeper call.
        if let StepMode::StepOver { depth } = self.mode.get() {
            if self.stack.depth() > depth {
                trace!(
                    "skipping {}:{} at depth {} (> {})",
                    location.function_name,
                    location.lineno,
                    self.stack.depth(),
                    depth
                );
                return Ok(TraceDirective::TraceChildren);
            }
        }

        let stop = StopReport {
            frame: self.build_report(TraceEventKind::Line, location),
            depth: self.stack.depth(),
            locals: locals.clone(),
        };
        self.suspend(stop)?;
        Ok(TraceDirective::TraceChildren)
    }
}
