use std::collections::VecDeque;

use super::{ProgramSource, TracedStep};
use crate::snapshot::{LocalValue, LocalsSnapshot};
use crate::tracer::{CodeLocation, TraceEventKind};

/// A pre-recorded event stream standing in for a live interpreter.
///
/// Builder methods append events bound to the program's own (user-code)
/// filename; the `lib_*` variants record events in library code, which the
/// tracer must never stop on.
#[derive(Debug, Clone)]
pub struct ScriptedProgram {
    filename: String,
    steps: VecDeque<TracedStep>,
}

impl ScriptedProgram {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            steps: VecDeque::new(),
        }
    }

    pub fn call(self, function: &str, lineno: usize) -> Self {
        let filename = self.filename.clone();
        self.event(TraceEventKind::Call, &filename, function, lineno, &[])
    }

    pub fn line(self, function: &str, lineno: usize, locals: &[(&str, LocalValue)]) -> Self {
        let filename = self.filename.clone();
        self.event(TraceEventKind::Line, &filename, function, lineno, locals)
    }

    pub fn ret(self, function: &str, lineno: usize) -> Self {
        let filename = self.filename.clone();
        self.event(TraceEventKind::Return, &filename, function, lineno, &[])
    }

    pub fn lib_call(self, filename: &str, function: &str, lineno: usize) -> Self {
        self.event(TraceEventKind::Call, filename, function, lineno, &[])
    }

    pub fn lib_line(self, filename: &str, function: &str, lineno: usize) -> Self {
        self.event(TraceEventKind::Line, filename, function, lineno, &[])
    }

    pub fn lib_ret(self, filename: &str, function: &str, lineno: usize) -> Self {
        self.event(TraceEventKind::Return, filename, function, lineno, &[])
    }

    pub fn event(
        mut self,
        event: TraceEventKind,
        filename: &str,
        function: &str,
        lineno: usize,
        locals: &[(&str, LocalValue)],
    ) -> Self {
        let locals: LocalsSnapshot = locals
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        self.steps.push_back(TracedStep {
            event,
            location: CodeLocation::new(filename, function, lineno),
            locals,
        });
        self
    }
}

impl ProgramSource for ScriptedProgram {
    fn next_step(&mut self) -> Option<TracedStep> {
        self.steps.pop_front()
    }
}
