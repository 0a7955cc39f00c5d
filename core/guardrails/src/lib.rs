//! Guardrail pipeline: input and output gating.
//!
//! A guardrail is a pure predicate over text that may block. Input gating
//! races all guardrails and cancels the losers once one blocks; output gating
//! buffers stream chunks until the guardrail passes, so blocked content never
//! reaches the consumer.

mod buffered;
mod guardrail;
mod race;
mod timeout;

pub use buffered::{BufferState, BufferedOutputGuardrail};
pub use guardrail::{FnGuardrail, Guardrail, GuardrailVerdict, permission_denied};
pub use race::race_guardrails;
pub use timeout::TimeoutGuardrail;
