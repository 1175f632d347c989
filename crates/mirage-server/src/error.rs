//! Error taxonomy for the mock pipeline.
//!
//! Nothing here is allowed to crash the process: backend failures are
//! recoverable through the synthetic fallback, store failures degrade to cache
//! misses and empty context, and schema generation without traffic is reported
//! as a structured not-found.

/// Errors produced by the generation pipeline and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum MirageError {
    #[error("Backend request timed out after {0}s")]
    BackendTimeout(u64),
    #[error("Backend transport error: {0}")]
    BackendTransport(String),
    #[error("Backend authentication error: {0}")]
    BackendAuth(String),
    #[error("Failed to parse backend output: {0}")]
    ResponseParse(String),
    #[error("No traffic recorded: need at least {0} logged requests")]
    NoTraffic(usize),
}

impl MirageError {
    /// True when the synthetic fallback can stand in for this failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MirageError::BackendTimeout(_)
                | MirageError::BackendTransport(_)
                | MirageError::BackendAuth(_)
                | MirageError::ResponseParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_are_recoverable() {
        assert!(MirageError::BackendTimeout(30).is_recoverable());
        assert!(MirageError::BackendTransport("reset".into()).is_recoverable());
        assert!(MirageError::BackendAuth("401".into()).is_recoverable());
        assert!(!MirageError::NoTraffic(10).is_recoverable());
    }

    #[test]
    fn test_display_messages() {
        let err = MirageError::BackendTimeout(30);
        assert_eq!(err.to_string(), "Backend request timed out after 30s");
    }
}
