//! Error taxonomy for the tandem runtime.
//!
//! Every failure that crosses a public surface is an [`AgentError`] carrying a
//! code from the closed [`ErrorCode`] set. Each code has fixed defaults for
//! severity and retryability; [`wrap_error`] infers the code from a cause's
//! display text when none is given.

mod agent_error;
mod code;

pub use agent_error::{AgentError, Result, get_user_message, wrap_error, wrap_error_with_code};
pub use code::{ErrorCode, Severity};
