use mdxql::MdxError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum XmlaError {
    ConnectionError(String),
    ProtocolError(String),
    /// Non-2xx HTTP status.
    ServerError(String),
    /// SOAP fault string.
    Fault(String),
    /// Error descriptions reported inside an `ExecuteResponse`.
    Exception(Vec<String>),
}

impl std::fmt::Display for XmlaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XmlaError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            XmlaError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            XmlaError::ServerError(msg) => write!(f, "Server error: {}", msg),
            XmlaError::Fault(msg) => write!(f, "SOAP fault: {}", msg),
            XmlaError::Exception(messages) => match messages.as_slice() {
                [single] => write!(f, "MDX error: {}", single),
                many => write!(f, "MDX errors: {}", many.join("; ")),
            },
        }
    }
}

impl std::error::Error for XmlaError {}

impl From<XmlaError> for MdxError {
    fn from(err: XmlaError) -> Self {
        MdxError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            XmlaError::Exception(vec!["Unknown cube".to_string()]).to_string(),
            "MDX error: Unknown cube"
        );
        assert_eq!(
            XmlaError::Exception(vec!["a".to_string(), "b".to_string()]).to_string(),
            "MDX errors: a; b"
        );
        assert_eq!(
            XmlaError::Fault("XML for Analysis parser".to_string()).to_string(),
            "SOAP fault: XML for Analysis parser"
        );
    }

    #[test]
    fn test_into_transport_error() {
        let err: MdxError = XmlaError::ServerError("HTTP 500".to_string()).into();
        assert!(matches!(err, MdxError::Transport(ref msg) if msg == "Server error: HTTP 500"));
    }
}
