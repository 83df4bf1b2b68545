mod scripted;

pub use scripted::ScriptedProgram;

use log::{debug, error, warn};

use crate::error::EngineError;
use crate::snapshot::LocalsSnapshot;
use crate::tracer::{CodeLocation, ExecutionTracer, TraceDirective, TraceEventKind, TraceHooks};

#[derive(Debug, Clone)]
pub struct TracedStep {
    pub event: TraceEventKind,
    pub location: CodeLocation,
    pub locals: LocalsSnapshot,
}

/// Feeds call/line/return events to the tracer, in execution order.
pub trait ProgramSource {
    fn next_step(&mut self) -> Option<TracedStep>;
}

/// Drive a program source through the tracer on the traced thread.
///
/// `SkipChildren` mutes the skipped frame's own line and return events;
/// calls made underneath it are still delivered. A poisoned session
/// (controller closed first) ends the run quietly.
pub fn run_traced<S: ProgramSource>(
    mut tracer: ExecutionTracer,
    mut source: S,
) -> Result<(), EngineError> {
    // One entry per live frame: true when the frame's own events are muted.
    let mut muted: Vec<bool> = Vec::new();

    while let Some(step) = source.next_step() {
        let result = match step.event {
            TraceEventKind::Call => match tracer.on_call(&step.location, &step.locals) {
                Ok(directive) => {
                    muted.push(directive == TraceDirective::SkipChildren);
                    Ok(())
                }
                Err(err) => Err(err),
            },
            TraceEventKind::Line => {
                if muted.last().copied().unwrap_or(false) {
                    continue;
                }
                match tracer.on_line(&step.location, &step.locals) {
                    Ok(TraceDirective::SkipChildren) => {
                        if let Some(top) = muted.last_mut() {
                            *top = true;
                        }
                        Ok(())
                    }
                    Ok(TraceDirective::TraceChildren) => Ok(()),
                    Err(err) => Err(err),
                }
            }
            TraceEventKind::Return => {
                let was_muted = muted.pop().unwrap_or(false);
                if was_muted {
                    continue;
                }
                tracer.on_return(&step.location, &step.locals).map(|_| ())
            }
        };

        match result {
            Ok(()) => {}
            Err(EngineError::SessionClosed) => {
                // Controller tore the session down while we were stopped.
                warn!("session closed underneath the traced program");
                tracer.shutdown();
                return Ok(());
            }
            Err(err) => {
                error!("fatal trace error: {}", err);
                tracer.shutdown();
                return Err(err);
            }
        }
    }

    debug!("program source exhausted");
    tracer.finish();
    Ok(())
}
