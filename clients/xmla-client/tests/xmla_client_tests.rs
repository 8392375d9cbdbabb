//! XmlaClient against a one-shot local HTTP server.

use mdxql::query::IS_NON_EMPTY_MEMBER;
use mdxql::{DimensionOptions, Mdx, MdxError, MdxValue, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use xmla_client::{XmlaClient, XmlaClientBuilder};

/// Serves one request with `status` and `body`; resolves to the raw request.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/xmla", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request_complete(&request) {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        String::from_utf8_lossy(&request).to_string()
    });

    (url, handle)
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}

fn client(url: &str) -> XmlaClient {
    XmlaClientBuilder::new(url)
        .catalog("Sales DW")
        .credentials("analyst", "secret")
        .build()
        .unwrap()
}

fn soap(body: &str) -> String {
    format!(
        r#"<?xml version="1.0"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>{}</soap:Body></soap:Envelope>"#,
        body
    )
}

#[tokio::test]
async fn test_dimension_query_over_http() {
    let cellset = format!(
        r#"<ExecuteResponse xmlns="urn:schemas-microsoft-com:xml-analysis"><return>
            <root xmlns="urn:schemas-microsoft-com:xml-analysis:mddataset" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                <Axes>
                    <Axis name="Axis0"><Tuples><Tuple><Member Hierarchy="[Measures]"><UName>{}</UName><LNum>0</LNum></Member></Tuple></Tuples></Axis>
                    <Axis name="Axis1"><Tuples>
                        <Tuple><Member Hierarchy="[Geo].[Country]"><UName>[Geo].[Country].&amp;[US]</UName><Caption>US</Caption><LName>[Geo].[Country]</LName><LNum>1</LNum><MEMBER_VALUE xsi:type="xsd:string">US</MEMBER_VALUE></Member></Tuple>
                        <Tuple><Member Hierarchy="[Geo].[Country]"><UName>[Geo].[Country].&amp;[CA]</UName><Caption>CA</Caption><LName>[Geo].[Country]</LName><LNum>1</LNum><MEMBER_VALUE xsi:type="xsd:string">CA</MEMBER_VALUE></Member></Tuple>
                    </Tuples></Axis>
                </Axes>
                <CellData>
                    <Cell CellOrdinal="0"><Value xsi:type="xsd:int">1</Value></Cell>
                    <Cell CellOrdinal="1"><Value xsi:type="xsd:int">1</Value></Cell>
                </CellData>
            </root>
        </return></ExecuteResponse>"#,
        IS_NON_EMPTY_MEMBER
    );
    let (url, server) = serve_once("200 OK", soap(&cellset)).await;
    let mdx = Mdx::new("Sales", client(&url));

    let result = mdx
        .get_dimension_data(vec!["[Geo].[Country]".to_string()], DimensionOptions::default())
        .await
        .unwrap();
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[1].data["[Geo].[Country]"], Some(MdxValue::from("CA")));
    assert!(result.rows.iter().all(|r| r.is_non_empty));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /xmla HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("content-type: text/xml"));
    assert!(request.to_ascii_lowercase().contains("authorization: basic"));
    assert!(request.contains("<Catalog>Sales DW</Catalog>"));
    assert!(request.contains("SET [queryAttributes] AS [Geo].[Country].children"));
}

#[tokio::test]
async fn test_server_exception_becomes_transport_error() {
    let body = soap(
        r#"<ExecuteResponse xmlns="urn:schemas-microsoft-com:xml-analysis"><return>
            <root xmlns="urn:schemas-microsoft-com:xml-analysis:empty">
                <Messages xmlns="urn:schemas-microsoft-com:xml-analysis:exception">
                    <Error ErrorCode="3238658057" Description="The Sales cube either does not exist or has not been processed." />
                </Messages>
            </root>
        </return></ExecuteResponse>"#,
    );
    let (url, server) = serve_once("200 OK", body).await;

    let err = client(&url).post("SELECT").await.unwrap_err();
    assert!(matches!(
        err,
        MdxError::Transport(ref msg) if msg == "MDX error: The Sales cube either does not exist or has not been processed."
    ));
    server.await.unwrap();
}

#[tokio::test]
async fn test_http_error_status() {
    let (url, server) = serve_once("500 Internal Server Error", String::new()).await;

    let err = client(&url).post("SELECT").await.unwrap_err();
    match err {
        MdxError::Transport(msg) => {
            assert!(msg.starts_with("Server error: HTTP 500"));
            assert!(msg.contains("No response was provided"));
        }
        other => panic!("expected a transport error, got {:?}", other),
    }
    server.await.unwrap();
}

#[test]
fn test_connection_refused() {
    let err = tokio_test::block_on(async {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/xmla", listener.local_addr().unwrap());
        drop(listener);
        client(&url).post("SELECT").await.unwrap_err()
    });
    assert!(matches!(err, MdxError::Transport(ref msg) if msg.starts_with("Connection error")));
}
