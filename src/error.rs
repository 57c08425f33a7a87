use thiserror::Error;

/// Error kinds per the error-handling design: invalid input is a caller
/// mistake, everything else collapses transport failures, timeouts and
/// malformed payloads into a single "can't trust this peer right now" signal
/// so that callers can fall back structurally instead of branching on cause.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("peer unreachable: {0}")]
    Unreachable(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("scheduled task cancelled: {0}")]
    Scheduling(String),
}

impl From<tonic::transport::Error> for NodeError {
    fn from(e: tonic::transport::Error) -> Self {
        NodeError::Unreachable(e.to_string())
    }
}

impl From<tonic::Status> for NodeError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::InvalidArgument => NodeError::InvalidInput(status.message().to_string()),
            tonic::Code::Unavailable | tonic::Code::DeadlineExceeded | tonic::Code::Cancelled => {
                NodeError::Unreachable(status.message().to_string())
            }
            _ => NodeError::Protocol(status.message().to_string()),
        }
    }
}

impl From<NodeError> for tonic::Status {
    fn from(e: NodeError) -> Self {
        match e {
            NodeError::InvalidInput(msg) => tonic::Status::invalid_argument(msg),
            NodeError::Unreachable(msg) => tonic::Status::unavailable(msg),
            NodeError::Protocol(msg) => tonic::Status::internal(msg),
            NodeError::Scheduling(msg) => tonic::Status::internal(msg),
        }
    }
}

impl From<std::io::Error> for NodeError {
    fn from(e: std::io::Error) -> Self {
        NodeError::Unreachable(e.to_string())
    }
}

impl From<bincode::Error> for NodeError {
    fn from(e: bincode::Error) -> Self {
        NodeError::Protocol(e.to_string())
    }
}
