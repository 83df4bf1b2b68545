use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    Step,
    /// Stop at the next line event at stack depth <= `depth`; line events
    /// in deeper frames are skipped silently.
    StepOver { depth: usize },
}

/// Shared between the two threads: written only by the command router,
/// read only by the tracer.
#[derive(Debug, Clone)]
pub struct SharedStepMode {
    inner: Arc<Mutex<StepMode>>,
}

impl SharedStepMode {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StepMode::Step)),
        }
    }

    pub fn get(&self) -> StepMode {
        *self.inner.lock().unwrap()
    }

    pub fn set(&self, mode: StepMode) {
        *self.inner.lock().unwrap() = mode;
    }
}

impl Default for SharedStepMode {
    fn default() -> Self {
        Self::new()
    }
}
