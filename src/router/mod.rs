mod protocol;
mod route;

pub use protocol::{attach_message, error_message, terminated_message, value_message, Command};
pub use route::{CommandRouter, SessionState};
