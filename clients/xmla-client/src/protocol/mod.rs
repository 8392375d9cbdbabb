mod envelope;
mod error;
mod response;

pub use envelope::{
    execute_envelope, ExecuteProperties, DEFAULT_LOCALE_IDENTIFIER, DEFAULT_TIMEOUT_SECS,
    SOAP_NAMESPACE, XMLA_NAMESPACE,
};
pub use error::XmlaError;
pub use response::{parse_execute_response, EXCEPTION_NAMESPACE, MDDATASET_NAMESPACE};
