//! Errors raised while serving a role.

use shallot_onion::OnionError;

/// Failure of a registry, relay or user request.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Protocol failure from the onion layer.
    #[error(transparent)]
    Onion(#[from] OnionError),

    /// The registry could not be queried or refused a request.
    #[error("registry error: {0}")]
    Registry(String),

    /// The request body lacked a required field.
    #[error("{0}")]
    InvalidRequest(String),
}

impl NodeError {
    /// Whether the caller, rather than this node or a downstream hop, is at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            NodeError::InvalidRequest(_) => true,
            NodeError::Onion(e) => matches!(
                e,
                OnionError::DuplicateNode { .. } | OnionError::MissingMessage
            ),
            NodeError::Registry(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(NodeError::from(OnionError::MissingMessage).is_client_error());
        assert!(NodeError::from(OnionError::DuplicateNode { node_id: 7 }).is_client_error());
        assert!(NodeError::InvalidRequest("x".into()).is_client_error());

        assert!(!NodeError::from(OnionError::Decryption("bad".into())).is_client_error());
        assert!(!NodeError::from(OnionError::Forward("down".into())).is_client_error());
        assert!(
            !NodeError::from(OnionError::InsufficientNodes { need: 3, have: 2 }).is_client_error()
        );
        assert!(!NodeError::Registry("down".into()).is_client_error());
    }

    #[test]
    fn test_transparent_display() {
        let err = NodeError::from(OnionError::InsufficientNodes { need: 3, have: 2 });
        assert_eq!(err.to_string(), "insufficient nodes: need 3, have 2");
    }
}
