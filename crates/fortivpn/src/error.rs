use std::time::Duration;

/// High-level error category for deciding the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller did not supply a usable gateway endpoint
    Usage,
    /// Talking to the gateway or the IdP went wrong
    Authentication,
    /// Local problems - port binding, listener thread, settings file
    System,
}

/// Process-level result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    Success,
    GeneralError,
    UsageError,
}

impl LoginStatus {
    /// Exit code handed back to the shell.
    pub fn code(self) -> u8 {
        match self {
            LoginStatus::Success => 0,
            LoginStatus::GeneralError => 1,
            LoginStatus::UsageError => 2,
        }
    }

    pub fn of<T>(result: &Result<T, LoginError>) -> Self {
        match result {
            Ok(_) => LoginStatus::Success,
            Err(e) => e.exit_status(),
        }
    }
}

/// Error types returned by the SAML login flow.
/// Every variant is terminal for a single login attempt.
#[derive(Debug, Clone)]
pub enum LoginError {
    /// No gateway URL was configured or passed on the command line
    ConfigMissing,
    InvalidEndpoint {
        input: String,
        reason: String,
    },

    /// Network, TLS or response-shape failure talking to the gateway
    Connect {
        message: String,
    },

    /// Local callback listener problems
    Bind {
        addr: String,
        message: String,
    },
    Listener {
        message: String,
    },
    Timeout {
        waited: Duration,
    },

    /// The IdP redirected back with the "-1" sentinel
    InvalidIdentifier,

    /// Settings file could not be read or written
    Config {
        message: String,
    },
}

impl LoginError {
    pub fn connect(message: impl Into<String>) -> Self {
        LoginError::Connect {
            message: message.into(),
        }
    }

    /// Returns the high-level category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            LoginError::ConfigMissing | LoginError::InvalidEndpoint { .. } => ErrorCategory::Usage,
            LoginError::Connect { .. } | LoginError::InvalidIdentifier => {
                ErrorCategory::Authentication
            }
            LoginError::Bind { .. }
            | LoginError::Listener { .. }
            | LoginError::Timeout { .. }
            | LoginError::Config { .. } => ErrorCategory::System,
        }
    }

    pub fn exit_status(&self) -> LoginStatus {
        match self.category() {
            ErrorCategory::Usage => LoginStatus::UsageError,
            _ => LoginStatus::GeneralError,
        }
    }

    /// Returns the user-facing error message
    pub fn user_message(&self) -> String {
        match self {
            LoginError::ConfigMissing => {
                "\"forti_url\" option is not set. Use \"-s\" or \"--configure\" to set it."
                    .to_string()
            }
            LoginError::InvalidEndpoint { input, reason } => {
                format!("Invalid gateway URL '{}': {}", input, reason)
            }
            LoginError::Connect { message } => {
                format!("Could not talk to the Fortigate gateway: {}", message)
            }
            LoginError::Bind { addr, message } => {
                format!("Cannot listen for the SAML callback on {}: {}", addr, message)
            }
            LoginError::Listener { message } => {
                format!("SAML callback listener failed: {}", message)
            }
            LoginError::Timeout { waited } => format!(
                "No SAML callback received within {}s. Try again.",
                waited.as_secs()
            ),
            LoginError::InvalidIdentifier => {
                "Invalid ID from provider. Try again or contact your provider support.".to_string()
            }
            LoginError::Config { message } => format!("Configuration error: {}", message),
        }
    }
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for LoginError {}

impl From<anyhow::Error> for LoginError {
    fn from(err: anyhow::Error) -> Self {
        LoginError::Connect {
            message: format!("{:#}", err),
        }
    }
}
