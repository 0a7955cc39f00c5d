//! The closed error code set and its per-code defaults.

use serde::Deserialize;
use serde::Serialize;
use strum::AsRefStr;
use strum::EnumIter;

/// How serious an error is for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recoverable; the turn may continue.
    Warning,
    /// The current operation failed.
    Error,
    /// The agent cannot make progress without operator intervention.
    Fatal,
}

macro_rules! define_error_codes {
    ($(
        $(#[$attr:meta])*
        $name:ident = $code:literal => {
            severity: $severity:ident,
            retryable: $retryable:expr,
            retry_after_ms: $retry_after:expr,
            user_message: $user_msg:literal $(,)?
        }
    ),* $(,)?) => {
        /// Error classification codes.
        ///
        /// The set is closed: every error surfaced from the runtime carries
        /// exactly one of these codes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
        pub enum ErrorCode {
            $($(#[$attr])* $name,)*
        }

        impl ErrorCode {
            /// The wire representation, e.g. `RATE_LIMIT_ERROR`.
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$name => $code,)*
                }
            }

            /// Default severity for this code.
            pub fn severity(&self) -> Severity {
                match self {
                    $(Self::$name => Severity::$severity,)*
                }
            }

            /// Whether errors with this code are retryable by default.
            pub fn is_retryable(&self) -> bool {
                match self {
                    $(Self::$name => $retryable,)*
                }
            }

            /// Default retry delay in milliseconds, if any.
            pub fn retry_after_ms(&self) -> Option<u64> {
                match self {
                    $(Self::$name => $retry_after,)*
                }
            }

            /// Canned user-facing message. Never exposes internals.
            pub fn user_message(&self) -> &'static str {
                match self {
                    $(Self::$name => $user_msg,)*
                }
            }

            /// Parse a wire code back into an `ErrorCode`.
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(Self::$name),)*
                    _ => None,
                }
            }
        }
    };
}

define_error_codes! {
    /// Invalid or contradictory agent configuration.
    Configuration = "CONFIGURATION_ERROR" => {
        severity: Fatal,
        retryable: false,
        retry_after_ms: None,
        user_message: "The agent is misconfigured. Check the agent options.",
    },
    /// Caller-supplied input failed validation.
    Validation = "VALIDATION_ERROR" => {
        severity: Error,
        retryable: false,
        retry_after_ms: None,
        user_message: "The request was invalid.",
    },
    /// A tool invocation was rejected or failed.
    Tool = "TOOL_ERROR" => {
        severity: Error,
        retryable: false,
        retry_after_ms: None,
        user_message: "A tool call failed.",
    },
    /// The model produced an error response.
    Model = "MODEL_ERROR" => {
        severity: Error,
        retryable: false,
        retry_after_ms: None,
        user_message: "The model returned an error.",
    },
    /// Provider rate limit hit.
    RateLimit = "RATE_LIMIT_ERROR" => {
        severity: Error,
        retryable: true,
        retry_after_ms: Some(30_000),
        user_message: "Rate limit reached. Please retry shortly.",
    },
    /// An operation exceeded its deadline.
    Timeout = "TIMEOUT_ERROR" => {
        severity: Error,
        retryable: true,
        retry_after_ms: None,
        user_message: "The operation timed out.",
    },
    /// Transport-level failure reaching a dependency.
    Network = "NETWORK_ERROR" => {
        severity: Error,
        retryable: true,
        retry_after_ms: None,
        user_message: "A network error occurred. Please retry.",
    },
    /// Credentials missing or rejected.
    Authentication = "AUTHENTICATION_ERROR" => {
        severity: Fatal,
        retryable: false,
        retry_after_ms: None,
        user_message: "Authentication failed. Check your credentials.",
    },
    /// Authenticated but not permitted.
    Authorization = "AUTHORIZATION_ERROR" => {
        severity: Fatal,
        retryable: false,
        retry_after_ms: None,
        user_message: "You are not authorized to perform this action.",
    },
    /// Checkpoint persistence failed.
    Checkpoint = "CHECKPOINT_ERROR" => {
        severity: Error,
        retryable: false,
        retry_after_ms: None,
        user_message: "Saving or loading conversation state failed.",
    },
    /// Upstream service returned a server-side error.
    Backend = "BACKEND_ERROR" => {
        severity: Error,
        retryable: true,
        retry_after_ms: None,
        user_message: "The upstream service is unavailable. Please retry.",
    },
    /// Context window management failed.
    Context = "CONTEXT_ERROR" => {
        severity: Error,
        retryable: false,
        retry_after_ms: None,
        user_message: "Conversation context could not be managed.",
    },
    /// A child agent task failed.
    Subagent = "SUBAGENT_ERROR" => {
        severity: Error,
        retryable: false,
        retry_after_ms: None,
        user_message: "A background task failed.",
    },
    /// Memory/knowledge loading failed.
    Memory = "MEMORY_ERROR" => {
        severity: Error,
        retryable: false,
        retry_after_ms: None,
        user_message: "Agent memory could not be loaded.",
    },
    /// The operation was cancelled.
    Abort = "ABORT_ERROR" => {
        severity: Warning,
        retryable: false,
        retry_after_ms: None,
        user_message: "The operation was cancelled.",
    },
    /// A runtime-internal failure.
    Agent = "AGENT_ERROR" => {
        severity: Error,
        retryable: false,
        retry_after_ms: None,
        user_message: "The agent encountered an internal error.",
    },
    /// Unclassifiable failure.
    Unknown = "UNKNOWN_ERROR" => {
        severity: Error,
        retryable: false,
        retry_after_ms: None,
        user_message: "An unexpected error occurred.",
    },
}

impl ErrorCode {
    /// Classify an error from its display text.
    ///
    /// Used by `wrap_error` when no explicit code is supplied. Patterns are
    /// matched case-insensitively; the first match wins.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("rate_limit")
            || lower.contains("429")
            || lower.contains("overload")
        {
            Self::RateLimit
        } else if lower.contains("timed out") || lower.contains("timeout") {
            Self::Timeout
        } else if lower.contains("401")
            || lower.contains("unauthorized")
            || lower.contains("invalid api key")
            || lower.contains("authentication")
        {
            Self::Authentication
        } else if lower.contains("403") || lower.contains("forbidden") {
            Self::Authorization
        } else if lower.contains("500")
            || lower.contains("502")
            || lower.contains("503")
            || lower.contains("504")
            || lower.contains("internal server error")
            || lower.contains("service unavailable")
            || lower.contains("bad gateway")
        {
            Self::Backend
        } else if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("socket")
        {
            Self::Network
        } else if lower.contains("abort") || lower.contains("cancel") {
            Self::Abort
        } else {
            Self::Unknown
        }
    }

    /// Codes that justify switching to the fallback model.
    ///
    /// Transient, retryable classes only: rate limits, timeouts, network
    /// failures and upstream 5xx responses. Auth and validation failures
    /// never qualify.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Timeout | Self::Network | Self::Backend
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Self::from_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code: {code}")))
    }
}

#[cfg(test)]
#[path = "code.test.rs"]
mod tests;
