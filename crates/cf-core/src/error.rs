use thiserror::Error;

/// Everything that can go wrong while building or tearing down the fabric.
#[derive(Debug, Error)]
pub enum FabricError {
    #[error("command failed (exit {exit_code}): {args:?}\nstdout: {stdout}\nstderr: {stderr}")]
    CommandFailure {
        exit_code: i32,
        args: Vec<String>,
        stdout: String,
        stderr: String,
    },

    #[error("inconsistent state: {0}")]
    Inconsistent(String),

    #[error("network {network} is already at capacity ({limit} interfaces)")]
    CapacityExceeded { network: String, limit: usize },

    #[error("name {name:?} is {len} bytes, must be under {limit}")]
    NameTooLong {
        name: String,
        len: usize,
        limit: usize,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0} is already configured")]
    AlreadyConfigured(String),

    #[error("unknown policy: {0}")]
    UnknownPolicy(String),

    #[error("interface {0} not found")]
    InterfaceNotFound(String),

    #[error("network {0} not found")]
    NetworkNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FabricError {
    pub fn command_failure(exit_code: i32, args: Vec<String>, stdout: String, stderr: String) -> Self {
        Self::CommandFailure {
            exit_code,
            args,
            stdout,
            stderr,
        }
    }

    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::Inconsistent(msg.into())
    }

    /// True for kinds a caller can reasonably treat as "try something else"
    /// rather than a programming error. Conflict and AlreadyConfigured are
    /// expected outcomes of racing or repeated calls, not bugs.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::AlreadyConfigured(_))
    }

    pub fn is_command_failure(&self) -> bool {
        matches!(self, Self::CommandFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, FabricError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_formats_exit_code() {
        let err = FabricError::command_failure(
            1,
            vec!["ip".into(), "link".into()],
            String::new(),
            "no such device".into(),
        );
        let msg = err.to_string();
        assert!(msg.contains("exit 1"));
        assert!(msg.contains("no such device"));
    }

    #[test]
    fn conflict_and_already_configured_are_recoverable() {
        assert!(FabricError::Conflict("x".into()).is_recoverable());
        assert!(FabricError::AlreadyConfigured("x".into()).is_recoverable());
        assert!(!FabricError::inconsistent("y").is_recoverable());
    }

    #[test]
    fn name_too_long_carries_len_and_limit() {
        let err = FabricError::NameTooLong {
            name: "vethaaaaaaaaaaaaaaaa".into(),
            len: 20,
            limit: 16,
        };
        assert!(err.to_string().contains("20 bytes"));
    }
}
