/// Logical call stack of the traced program: function names, pushed on
/// `call` and popped on `return`. Only user-code frames are recorded;
/// infrastructure frames never touch it.
#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<String>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, function_name: impl Into<String>) {
        self.frames.push(function_name.into());
    }

    /// `None` signals underflow; the caller turns that into the fatal
    /// `StackUnderflow` error.
    pub fn pop(&mut self) -> Option<String> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }
}
