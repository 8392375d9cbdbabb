//! Common test utilities for mdxql integration tests
//!
//! Provides:
//! - A stub transport that records statements and replays cellset XML
//! - Small builders for cellset XML fixtures

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use mdxql::{decode_cellset_str, MdxError, MdxResult, Response, Transport};

const NS: &str = r#"xmlns="urn:schemas-microsoft-com:xml-analysis:mddataset" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#;

/// Replays queued cellsets in order and records every posted statement.
#[derive(Default)]
pub struct StubTransport {
    replies: Mutex<VecDeque<Result<String, String>>>,
    statements: Mutex<Vec<String>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, xml: String) -> Self {
        self.replies.lock().unwrap().push_back(Ok(xml));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn last_statement(&self) -> String {
        self.statements().pop().unwrap_or_default()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn post(&self, statement: &str) -> MdxResult<Response> {
        self.statements.lock().unwrap().push(statement.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(xml)) => decode_cellset_str(&xml),
            Some(Err(message)) => Err(MdxError::Transport(message)),
            None => Err(MdxError::Transport("no reply queued".to_string())),
        }
    }
}

// ==================== Cellset fixtures ====================

pub fn measure(unique_name: &str) -> String {
    format!(
        r#"<Member Hierarchy="[Measures]"><UName>{}</UName><Caption>{}</Caption><LName>[Measures].[MeasuresLevel]</LName><LNum>0</LNum></Member>"#,
        unique_name, unique_name
    )
}

/// A member of `level` (e.g. `[Geo].[Country]`) whose key is `key`.
pub fn attribute(level: &str, key: &str, level_number: u32) -> String {
    let value_type = if key.parse::<f64>().is_ok() { "xsd:int" } else { "xsd:string" };
    format!(
        r#"<Member Hierarchy="{level}"><UName>{level}.&amp;[{key}]</UName><Caption>{key}</Caption><LName>{level}</LName><LNum>{level_number}</LNum><MEMBER_VALUE xsi:type="{value_type}">{key}</MEMBER_VALUE></Member>"#
    )
}

/// The `All` member of `level`.
pub fn all_member(level: &str) -> String {
    format!(
        r#"<Member Hierarchy="{level}"><UName>{level}.[All]</UName><Caption>All</Caption><LName>{level}</LName><LNum>0</LNum></Member>"#
    )
}

pub fn tuple(members: &[String]) -> String {
    format!("<Tuple>{}</Tuple>", members.concat())
}

/// Cells in ordinal order; `None` cells are left out of the XML.
pub fn cells(values: &[Option<f64>]) -> String {
    values
        .iter()
        .enumerate()
        .filter_map(|(ordinal, value)| {
            value.map(|v| {
                format!(
                    r#"<Cell CellOrdinal="{}"><Value xsi:type="xsd:double">{}</Value><FmtValue>{}</FmtValue></Cell>"#,
                    ordinal, v, v
                )
            })
        })
        .collect()
}

pub fn cellset(columns: &[String], rows: Option<&[String]>, cell_xml: &str) -> String {
    let mut axes = format!(r#"<Axis name="Axis0"><Tuples>{}</Tuples></Axis>"#, columns.concat());
    if let Some(rows) = rows {
        axes.push_str(&format!(
            r#"<Axis name="Axis1"><Tuples>{}</Tuples></Axis>"#,
            rows.concat()
        ));
    }
    axes.push_str(r#"<Axis name="SlicerAxis"><Tuples/></Axis>"#);
    format!(
        "<root {}><Axes>{}</Axes><CellData>{}</CellData></root>",
        NS, axes, cell_xml
    )
}
