//! mdxql - MDX query compiler and cellset materializer for OLAP cubes.
//!
//! Callers describe the data they want (attributes, measures, filters, sort
//! order, paging, totals) as plain option structs. mdxql compiles that intent
//! into an MDX statement, posts it through a [`Transport`], decodes the
//! multi-axis cellset and turns it into rows, dimension listings or charts.
//!
//! # Main Components
//!
//! - **Expression**: typed MDX expression algebra (values, members, sets)
//! - **Query**: query intent models, the statement builder and the serializer
//! - **Response**: the normalized cellset and its XML decoder
//! - **Result**: table, dimension, chart and virtual row materializers
//! - **Client**: the [`Mdx`] facade tying the pieces together
//!
//! # Example
//!
//! ```rust
//! use mdxql::{DimensionQuery, QuerySerializer};
//!
//! let serializer = QuerySerializer::new("Sales");
//! let statement = serializer
//!     .serialize_dimension_query(&DimensionQuery {
//!         attributes: vec!["[Geo].[Country]".to_string()],
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! assert!(statement.starts_with("WITH"));
//! assert!(statement.contains("FROM [Sales]"));
//! ```

pub mod client;
pub mod error;
pub mod expression;
pub mod query;
pub mod response;
pub mod result;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{Mdx, VirtualTableBuilder};
pub use error::{MdxError, MdxResult};
pub use expression::{Expression, ExpressionKind, LevelExpression, MemberExpression, SetExpression};
pub use query::{
    DimensionOptions, DimensionQuery, DimensionQueryType, QueryBuilder, QueryOptions,
    QuerySerializer, TableQuery,
};
pub use response::{decode_cellset, decode_cellset_str, Axis, Cell, Member, Response, Tuple};
pub use result::{
    AttributeData, Chart, ChartConfig, DimensionRow, DimensionRowResult, ExpressionMap,
    TableRowResult, VirtualRow,
};
pub use transport::{ProxyTransport, Transport};
pub use types::{
    measure, parse_filters, ComparisonOperator, Dimension, Filter, MdxValue, OrderBy, SortDirection,
};
