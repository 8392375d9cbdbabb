//! Unwraps an `ExecuteResponse` envelope into a decoded cellset or an error.

use mdxql::{decode_cellset, MdxResult, Response};
use roxmltree::{Document, Node};

use super::envelope::{SOAP_NAMESPACE, XMLA_NAMESPACE};
use super::XmlaError;

pub const MDDATASET_NAMESPACE: &str = "urn:schemas-microsoft-com:xml-analysis:mddataset";
pub const EXCEPTION_NAMESPACE: &str = "urn:schemas-microsoft-com:xml-analysis:exception";

/// Finds `Envelope/Body/ExecuteResponse/return/root` and decodes it. Without
/// a cellset root, reports the embedded exception messages, then the SOAP
/// fault string, then a generic protocol error.
pub fn parse_execute_response(xml: &str) -> MdxResult<Response> {
    let document = Document::parse(xml)
        .map_err(|e| XmlaError::ProtocolError(format!("Failed to parse response: {}", e)))?;

    let envelope = document.root_element();
    if !envelope.has_tag_name((SOAP_NAMESPACE, "Envelope")) {
        return Err(XmlaError::ProtocolError("Response is not a SOAP envelope".to_string()).into());
    }
    let body = child(envelope, SOAP_NAMESPACE, "Body")
        .ok_or_else(|| XmlaError::ProtocolError("SOAP envelope has no body".to_string()))?;

    let returned = child(body, XMLA_NAMESPACE, "ExecuteResponse")
        .and_then(|n| child(n, XMLA_NAMESPACE, "return"));
    if let Some(root) = returned.and_then(|n| child(n, MDDATASET_NAMESPACE, "root")) {
        return decode_cellset(root);
    }

    Err(failure(body, returned).into())
}

fn failure(body: Node<'_, '_>, returned: Option<Node<'_, '_>>) -> XmlaError {
    let messages: Vec<String> = returned
        .into_iter()
        .flat_map(|n| n.descendants())
        .filter(|n| n.has_tag_name((EXCEPTION_NAMESPACE, "Error")))
        .filter_map(|n| n.attribute("Description"))
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();
    if !messages.is_empty() {
        return XmlaError::Exception(messages);
    }

    let fault = body
        .children()
        .find(|n| n.has_tag_name((SOAP_NAMESPACE, "Fault")))
        .and_then(|fault| fault.children().find(|n| n.tag_name().name() == "faultstring"))
        .and_then(|n| n.text())
        .filter(|t| !t.trim().is_empty());
    match fault {
        Some(fault) => XmlaError::Fault(fault.trim().to_string()),
        None => XmlaError::ProtocolError(
            "Encountered an unexpected MDX error. No response was provided.".to_string(),
        ),
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, namespace: &str, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name((namespace, name)))
}
