//! Query intent models and the compiler that turns them into MDX statements.
//!
//! - `builder`: assembles the clauses of one statement
//! - `factory`: decides axis placement and the sort/paging aware row grain
//! - `serializer`: dimension and table query shapes

mod builder;
mod factory;
mod serializer;

#[cfg(test)]
mod tests;

pub use builder::QueryBuilder;
pub use factory::ExpressionFactory;
pub use serializer::QuerySerializer;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MdxError;
use crate::types::{Filter, OrderBy};

/// Named set holding the requested dimension attributes.
pub const ATTRIBUTES_SET: &str = "[queryAttributes]";
/// Named set holding the requested measures.
pub const MEASURES_SET: &str = "[queryMeasures]";
/// Named set holding the column attributes of a table query.
pub const COLUMNS_SET: &str = "[queryColumns]";
/// Named set holding the row attributes of a table query.
pub const ROWS_SET: &str = "[queryRows]";
/// Calculated member: 1 when any requested measure is non-empty, else 0.
pub const IS_NON_EMPTY_MEMBER: &str = "[Measures].[_isNonEmpty]";
/// Calculated member: row count before sorting and paging.
pub const TOTAL_COUNT_MEMBER: &str = "[Measures].[_totalCount]";

pub(crate) const RESERVED_NAMES: [&str; 6] = [
    ATTRIBUTES_SET,
    MEASURES_SET,
    COLUMNS_SET,
    ROWS_SET,
    IS_NON_EMPTY_MEMBER,
    TOTAL_COUNT_MEMBER,
];

/// Filtering, ordering and paging shared by every query shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
    #[serde(default)]
    pub include_total_count: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_total_count(mut self) -> Self {
        self.include_total_count = true;
        self
    }

    /// True when the query or any of its filters asks for a total count.
    pub fn requests_total_count(&self) -> bool {
        self.include_total_count || self.filters.iter().any(|f| f.include_total_count)
    }

    /// True when any filter asks for the `All` aggregate, i.e. a totals row.
    pub fn requests_totals(&self) -> bool {
        self.filters.iter().any(|f| f.include_all)
    }
}

/// Which rows a dimension query with measures keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DimensionQueryType {
    #[default]
    All,
    Empty,
    NonEmpty,
}

impl FromStr for DimensionQueryType {
    type Err = MdxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(DimensionQueryType::All),
            "empty" => Ok(DimensionQueryType::Empty),
            "nonEmpty" => Ok(DimensionQueryType::NonEmpty),
            other => Err(MdxError::InvalidQuery(format!(
                "Invalid dimension query type {}.",
                other
            ))),
        }
    }
}

/// Lists dimension members, optionally flagging those with measure data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionQuery {
    pub attributes: Vec<String>,
    #[serde(default)]
    pub measures: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub query_type: Option<DimensionQueryType>,
    #[serde(flatten)]
    pub options: QueryOptions,
}

/// Measures broken down by column and row attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableQuery {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub measures: Vec<String>,
    #[serde(default)]
    pub rows: Vec<String>,
    #[serde(flatten)]
    pub options: QueryOptions,
}

/// Everything of a [`DimensionQuery`] except its attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionOptions {
    #[serde(default)]
    pub measures: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub query_type: Option<DimensionQueryType>,
    #[serde(flatten)]
    pub options: QueryOptions,
}

impl DimensionOptions {
    pub fn into_query(self, attributes: Vec<String>) -> DimensionQuery {
        DimensionQuery {
            attributes,
            measures: self.measures,
            query_type: self.query_type,
            options: self.options,
        }
    }
}

impl From<QueryOptions> for DimensionOptions {
    fn from(options: QueryOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }
}
