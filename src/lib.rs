//! Source-level single-stepping debugger engine for interpreted code
//! cells: an execution tracer embedded in the traced program's thread, a
//! single-slot handshake channel, and a controller-side command router.

pub mod channel;
pub mod error;
pub mod host;
pub mod router;
pub mod session;
pub mod snapshot;
pub mod tracer;

pub use error::EngineError;
pub use session::{DebugSession, SessionConfig, SessionController};
