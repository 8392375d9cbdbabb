//! SOAP `Execute` request envelope.

pub const SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const XMLA_NAMESPACE: &str = "urn:schemas-microsoft-com:xml-analysis";

pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_LOCALE_IDENTIFIER: u32 = 9;

/// `PropertyList` entries sent with every statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteProperties {
    pub catalog: String,
    pub timeout_secs: u64,
    pub locale_identifier: u32,
    /// Additional `(name, value)` properties, appended in order.
    pub extra: Vec<(String, String)>,
}

impl ExecuteProperties {
    pub fn new(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            locale_identifier: DEFAULT_LOCALE_IDENTIFIER,
            extra: Vec::new(),
        }
    }
}

pub fn execute_envelope(statement: &str, properties: &ExecuteProperties) -> String {
    let mut property_list = format!(
        "<Catalog>{}</Catalog>\n          <ShowHiddenCubes>True</ShowHiddenCubes>\n          <Timeout>{}</Timeout>\n          <LocaleIdentifier>{}</LocaleIdentifier>",
        escape(&properties.catalog),
        properties.timeout_secs,
        properties.locale_identifier
    );
    for (name, value) in &properties.extra {
        property_list.push_str(&format!("\n          <{name}>{}</{name}>", escape(value)));
    }

    format!(
        r#"<Envelope xmlns="{SOAP_NAMESPACE}">
  <Body>
    <Execute xmlns="{XMLA_NAMESPACE}">
      <Command>
        <Statement><![CDATA[{}]]></Statement>
      </Command>
      <Properties>
        <PropertyList>
          {}
        </PropertyList>
      </Properties>
    </Execute>
  </Body>
</Envelope>"#,
        cdata(statement),
        property_list
    )
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// A CDATA section cannot contain `]]>`; split it across two sections.
fn cdata(text: &str) -> String {
    text.replace("]]>", "]]]]><![CDATA[>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trips_through_xml() {
        let mut properties = ExecuteProperties::new("Sales & Returns");
        properties.extra.push(("Format".to_string(), "Multidimensional".to_string()));
        let statement = "SELECT {[A]} ON COLUMNS FROM [Sales]\nWHERE ([B].&[x]]>])";
        let envelope = execute_envelope(statement, &properties);

        let document = roxmltree::Document::parse(&envelope).unwrap();
        let text_of = |name: &str| {
            document
                .descendants()
                .find(|n| n.has_tag_name((XMLA_NAMESPACE, name)))
                .and_then(|n| n.text())
                .map(str::to_string)
        };

        assert_eq!(text_of("Catalog").as_deref(), Some("Sales & Returns"));
        assert_eq!(text_of("ShowHiddenCubes").as_deref(), Some("True"));
        assert_eq!(text_of("Timeout").as_deref(), Some("3600"));
        assert_eq!(text_of("LocaleIdentifier").as_deref(), Some("9"));
        assert_eq!(text_of("Format").as_deref(), Some("Multidimensional"));

        let statement_node = document
            .descendants()
            .find(|n| n.has_tag_name((XMLA_NAMESPACE, "Statement")))
            .unwrap();
        let text: String = statement_node
            .children()
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(text, statement);
    }
}
