//! Explicit success-or-fallback result shared by every AI-backed operation.

use std::fmt;

/// Why an operation substituted its deterministic fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No AI credential at startup; the AI path is never attempted.
    Disabled,
    /// The collaborator (AI or matching engine) was unreachable or errored.
    Transport(String),
    /// The AI replied but the reply did not fit the schema.
    Validation(String),
    /// The AI replied with a label outside a closed set.
    Anomaly(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Disabled => f.write_str("disabled"),
            FallbackReason::Transport(e) => write!(f, "transport: {}", e),
            FallbackReason::Validation(e) => write!(f, "validation: {}", e),
            FallbackReason::Anomaly(e) => write!(f, "anomaly: {}", e),
        }
    }
}

/// Either the collaborator's value or the fallback that replaced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Primary(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Outcome<T> {
    pub fn fallback(value: T, reason: FallbackReason) -> Self {
        Outcome::Fallback { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Primary(v) => v,
            Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Primary(v) => v,
            Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&FallbackReason> {
        match self {
            Outcome::Primary(_) => None,
            Outcome::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Primary(v) => Outcome::Primary(f(v)),
            Outcome::Fallback { value, reason } => Outcome::Fallback {
                value: f(value),
                reason,
            },
        }
    }
}
