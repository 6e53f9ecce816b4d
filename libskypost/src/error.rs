//! Error types for Skypost

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SkypostError>;

#[derive(Error, Debug)]
pub enum SkypostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("XRPC error: {0}")]
    Xrpc(#[from] XrpcError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SkypostError {
    /// Returns the process exit code the CLI should use for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SkypostError::InvalidInput(_) => 3,
            SkypostError::Xrpc(XrpcError::Auth { .. }) => 2,
            SkypostError::Xrpc(_) => 1,
            SkypostError::Config(_) => 1,
            SkypostError::Store(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No stored session for handle '{0}'")]
    NotFound(String),

    #[error("No stored sessions found in {0}")]
    Empty(String),

    #[error("Refusing to use session file '{0}': it is a symbolic link")]
    Symlink(String),
}

/// Failures talking to the PDS
///
/// `Auth` is a non-success answer from the session endpoints, `Rejected` one
/// from any other endpoint. `Resolution` and `Validation` are recovered
/// locally while building facets; the rest surface to the caller of the
/// operation that hit them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XrpcError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("{operation} failed: {status}, {body}")]
    Auth {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation} rejected: {status}, {body}")]
    Rejected {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Handle resolution failed: {0}")]
    Resolution(String),

    #[error("Invalid link: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for XrpcError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            XrpcError::Decode(error.to_string())
        } else {
            XrpcError::Transport(error.to_string())
        }
    }
}

impl From<reqwest::Error> for SkypostError {
    fn from(error: reqwest::Error) -> Self {
        SkypostError::Xrpc(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = SkypostError::InvalidInput("Content cannot be empty".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_auth_error() {
        let error = SkypostError::Xrpc(XrpcError::Auth {
            operation: "refresh session".to_string(),
            status: 401,
            body: "{}".to_string(),
        });
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_errors() {
        let transport = SkypostError::Xrpc(XrpcError::Transport("refused".to_string()));
        assert_eq!(transport.exit_code(), 1);

        let decode = SkypostError::Xrpc(XrpcError::Decode("eof".to_string()));
        assert_eq!(decode.exit_code(), 1);

        let config = SkypostError::Config(ConfigError::MissingField("password".to_string()));
        assert_eq!(config.exit_code(), 1);

        let store = SkypostError::Store(StoreError::NotFound("alice.bsky.social".to_string()));
        assert_eq!(store.exit_code(), 1);
    }

    #[test]
    fn test_auth_error_carries_status_and_body_verbatim() {
        let body = r#"{"error":"ExpiredToken","message":"Token has expired"}"#;
        let error = XrpcError::Auth {
            operation: "refresh session".to_string(),
            status: 400,
            body: body.to_string(),
        };

        let message = error.to_string();
        assert_eq!(message, format!("refresh session failed: 400, {}", body));
    }

    #[test]
    fn test_error_message_formatting_nested() {
        let error: SkypostError = XrpcError::Resolution("status 400".to_string()).into();
        assert_eq!(
            error.to_string(),
            "XRPC error: Handle resolution failed: status 400"
        );

        let error: SkypostError = StoreError::Empty("/tmp/sessions".to_string()).into();
        assert_eq!(
            error.to_string(),
            "Session store error: No stored sessions found in /tmp/sessions"
        );
    }

    #[test]
    fn test_config_error_invalid_value_formatting() {
        let error = ConfigError::InvalidValue {
            field: "service.pds_url".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("service.pds_url"));
        assert!(message.contains("relative URL"));
    }

    #[test]
    fn test_store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: SkypostError = StoreError::from(io).into();
        match error {
            SkypostError::Store(StoreError::Io(_)) => {}
            other => panic!("Expected store IO error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_is_not_an_auth_exit() {
        let error = SkypostError::Xrpc(XrpcError::Rejected {
            operation: "create record".to_string(),
            status: 400,
            body: "{}".to_string(),
        });
        assert_eq!(error.exit_code(), 1);
        assert_eq!(error.to_string(), "XRPC error: create record rejected: 400, {}");
    }

    #[test]
    fn test_xrpc_error_clone() {
        let original = XrpcError::Transport("Connection failed".to_string());
        assert_eq!(original.clone(), original);
    }
}
