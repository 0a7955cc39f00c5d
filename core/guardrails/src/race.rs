//! Racing input gate.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tandem_error::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::guardrail::Guardrail;
use crate::guardrail::permission_denied;

/// Run all guardrails in parallel against the input text.
///
/// The first blocking result wins: the shared child token is cancelled so the
/// losers can bail out, and the returned error carries the winner's reason
/// and blocked message ids. A guardrail that itself fails is treated as not
/// blocking when `fail_open` is set (the default policy), otherwise its error
/// propagates.
pub async fn race_guardrails(
    guardrails: &[Arc<dyn Guardrail>],
    text: &str,
    cancel: &CancellationToken,
    fail_open: bool,
) -> Result<()> {
    if guardrails.is_empty() {
        return Ok(());
    }

    let race_token = cancel.child_token();
    let mut checks = FuturesUnordered::new();
    for guardrail in guardrails {
        let guardrail = guardrail.clone();
        let token = race_token.clone();
        let text = text.to_string();
        checks.push(async move {
            let verdict = guardrail.check(&text, &token).await;
            (guardrail.name().to_string(), verdict)
        });
    }

    while let Some((name, verdict)) = checks.next().await {
        match verdict {
            Ok(verdict) if verdict.blocked => {
                debug!(guardrail = %name, "Input blocked by guardrail");
                race_token.cancel();
                let reason = verdict.reason.as_deref().unwrap_or("blocked");
                return Err(permission_denied(reason, &verdict.blocked_message_ids));
            }
            Ok(_) => {}
            Err(e) if fail_open => {
                warn!(guardrail = %name, error = %e, "Guardrail failed; treating as pass");
            }
            Err(e) => {
                race_token.cancel();
                return Err(e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "race.test.rs"]
mod tests;
