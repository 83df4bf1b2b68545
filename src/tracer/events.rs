use serde::Serialize;

use crate::error::EngineError;
use crate::snapshot::LocalsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceEventKind {
    Call,
    Line,
    Return,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeLocation {
    pub filename: String,
    pub function_name: String,
    /// 1-based, as interpreters report line numbers.
    pub lineno: usize,
}

impl CodeLocation {
    pub fn new(
        filename: impl Into<String>,
        function_name: impl Into<String>,
        lineno: usize,
    ) -> Self {
        Self {
            filename: filename.into(),
            function_name: function_name.into(),
            lineno,
        }
    }
}

/// Whether the host should keep delivering the current frame's own
/// line/return events. A hint; the tracer stays correct if it is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDirective {
    TraceChildren,
    SkipChildren,
}

/// Hooks run inline on the traced thread and may block; that is how
/// stepping suspends execution.
pub trait TraceHooks {
    fn on_call(
        &mut self,
        location: &CodeLocation,
        locals: &LocalsSnapshot,
    ) -> Result<TraceDirective, EngineError>;

    fn on_return(
        &mut self,
        location: &CodeLocation,
        locals: &LocalsSnapshot,
    ) -> Result<TraceDirective, EngineError>;

    fn on_line(
        &mut self,
        location: &CodeLocation,
        locals: &LocalsSnapshot,
    ) -> Result<TraceDirective, EngineError>;
}

/// Field names match the wire format.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FrameReport {
    pub event: TraceEventKind,
    pub source_line: Option<String>,
    pub filename: String,
    pub function_name: String,
    pub lineno: usize,
    /// Attached by the command router at forwarding time.
    pub step_count: u64,
}

#[derive(Debug, Clone)]
pub struct StopReport {
    pub frame: FrameReport,
    pub depth: usize,
    pub locals: LocalsSnapshot,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Stopped(StopReport),
    /// The traced program ran off the end of its events; terminal.
    Terminated,
}

/// Teardown is signalled by closing the mailbox, not by a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeSignal;
