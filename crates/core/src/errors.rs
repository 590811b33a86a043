use thiserror::Error;

/// Boundary-facing error classes for the chat request path.
///
/// Internal detail stays in `message` for logs; callers only ever see
/// `user_message`, so a store or model failure never leaks specifics.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl InterfaceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InterfaceError;

    #[test]
    fn user_messages_never_leak_internal_detail() {
        let internal = InterfaceError::internal("sqlite pool exhausted at /var/db/triage.db");
        assert!(!internal.user_message().contains("sqlite"));

        let bad = InterfaceError::bad_request("last message must have role user");
        assert!(bad.user_message().contains("request"));
    }
}
