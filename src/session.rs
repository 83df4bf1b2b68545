use std::time::Duration;

use serde_json::Value;

use crate::channel::HandshakeChannel;
use crate::error::EngineError;
use crate::router::{Command, CommandRouter, SessionState};
use crate::tracer::{ExecutionTracer, SharedStepMode, TracerConfig};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_code_prefix: String,
    pub dispatch_function: String,
    pub mailbox_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let tracer = TracerConfig::default();
        Self {
            user_code_prefix: tracer.user_code_prefix,
            dispatch_function: tracer.dispatch_function,
            mailbox_timeout: tracer.mailbox_timeout,
        }
    }
}

/// One debug session over one traced execution. `open` wires the shared
/// step mode and handshake channel, then splits into the tracer half
/// (moved into the interpreter thread) and the controller half (driven by
/// the transport).
pub struct DebugSession;

impl DebugSession {
    pub fn open(
        code_lines: Vec<String>,
        config: SessionConfig,
    ) -> (ExecutionTracer, SessionController) {
        let mode = SharedStepMode::new();
        let channel = HandshakeChannel::new();

        let tracer = ExecutionTracer::new(
            code_lines.clone(),
            TracerConfig {
                user_code_prefix: config.user_code_prefix.clone(),
                dispatch_function: config.dispatch_function.clone(),
                mailbox_timeout: config.mailbox_timeout,
            },
            mode.clone(),
            &channel,
        );
        let router = CommandRouter::new(&channel, mode, config.mailbox_timeout);

        (
            tracer,
            SessionController {
                router,
                code_lines,
            },
        )
    }
}

pub struct SessionController {
    router: CommandRouter,
    code_lines: Vec<String>,
}

impl SessionController {
    /// One-time attach message, sent outward when the session opens.
    pub fn attach_message(&self) -> Value {
        crate::router::attach_message(&self.code_lines)
    }

    pub fn handle(&mut self, command: Command) -> Result<Vec<Value>, EngineError> {
        self.router.handle(command)
    }

    pub fn handle_json(&mut self, text: &str) -> Result<Vec<Value>, EngineError> {
        let command = Command::from_json(text)?;
        self.handle(command)
    }

    pub fn state(&self) -> SessionState {
        self.router.state()
    }

    pub fn step_count(&self) -> u64 {
        self.router.step_count()
    }

    pub fn close(&mut self) {
        self.router.close();
    }
}
