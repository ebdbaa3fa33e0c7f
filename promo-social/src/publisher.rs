use async_trait::async_trait;
use thiserror::Error;

/// A post accepted by the remote platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Published {
    pub id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Error)]
pub enum PublishError {
    /// The request could not be signed; usually a clock or key problem.
    #[error("request signing failed: {0}")]
    Signing(String),
    /// The client could not be constructed or the request could not be built.
    #[error("client error: {0}")]
    Client(String),
    /// No usable response arrived (DNS, connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),
    /// The platform answered with a non-2xx status.
    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// The platform answered 2xx but not `201 Created`.
    #[error("unexpected status {0}, expected 201")]
    UnexpectedStatus(u16),
}

impl PublishError {
    /// Ordinary failures end the cycle; everything else is a fault in our own
    /// setup that warrants the short retry delay.
    pub fn is_cycle_failure(&self) -> bool {
        matches!(
            self,
            PublishError::Transport(_)
                | PublishError::Rejected { .. }
                | PublishError::UnexpectedStatus(_)
        )
    }
}

/// Publishes one piece of text. Implementations never retry.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<Published, PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_remote_failures_as_cycle_failures() {
        assert!(PublishError::Transport("timeout".into()).is_cycle_failure());
        assert!(
            PublishError::Rejected {
                status: 403,
                message: "duplicate".into()
            }
            .is_cycle_failure()
        );
        assert!(PublishError::UnexpectedStatus(200).is_cycle_failure());
        assert!(!PublishError::Signing("clock".into()).is_cycle_failure());
        assert!(!PublishError::Client("bad url".into()).is_cycle_failure());
    }
}
