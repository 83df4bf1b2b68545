mod events;
mod mode;
mod stack;
mod trace;

pub use events::{
    CodeLocation, FrameReport, ResumeSignal, SessionEvent, StopReport, TraceDirective,
    TraceEventKind, TraceHooks,
};
pub use mode::{SharedStepMode, StepMode};
pub use stack::CallStack;
pub use trace::{ExecutionTracer, TracerConfig};
