//! Materializers turning a decoded [`Response`](crate::response::Response)
//! into application-shaped results.

mod chart;
mod dimension;
mod table;
mod virtual_row;

pub use chart::{chart_data, Chart, ChartConfig, SeriesGroup, DEFAULT_SERIES};
pub use dimension::{dimension_rows, DimensionRow, DimensionRowResult};
pub use table::{table_rows, TableRowResult};
pub use virtual_row::{VirtualCell, VirtualRow, VirtualRowBuilder, VirtualTable};

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::error::{MdxError, MdxResult};
use crate::types::MdxValue;

/// Values keyed by level expression (attributes and measures alike).
pub type AttributeData = BTreeMap<String, Option<MdxValue>>;

/// Maps level expressions back to the property names of a DTO.
#[derive(Debug, Clone, Default)]
pub struct ExpressionMap {
    entries: Vec<(String, String)>,
}

impl ExpressionMap {
    /// Builds the map from `(property, expression)` pairs. Entries whose
    /// expression is not level shaped are ignored.
    pub fn new<P, X>(properties: impl IntoIterator<Item = (P, X)>) -> MdxResult<Self>
    where
        P: Into<String>,
        X: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (property, expression) in properties {
            let expression = expression.into();
            if !(expression.starts_with('[') && expression.ends_with(']')) {
                continue;
            }
            if entries.iter().any(|(e, _)| *e == expression) {
                return Err(MdxError::InvalidExpression(format!(
                    "{} detected. It may not be defined more than once.",
                    expression
                )));
            }
            entries.push((expression, property.into()));
        }
        Ok(Self { entries })
    }

    /// Level expressions in declaration order.
    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(e, _)| e.as_str())
    }

    pub fn property(&self, expression: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(e, _)| e == expression)
            .map(|(_, p)| p.as_str())
    }

    /// Re-keys `data` by property name and deserializes it into `T`.
    pub fn to_dto<T: DeserializeOwned>(&self, data: &AttributeData) -> MdxResult<T> {
        let mut object = serde_json::Map::with_capacity(data.len());
        for (expression, value) in data {
            let property = self.property(expression).ok_or_else(|| {
                MdxError::InvalidResponse(format!(
                    "Level expression {} was provided but unexpected.",
                    expression
                ))
            })?;
            object.insert(property.to_string(), serde_json::to_value(value).map_err(dto_error)?);
        }
        serde_json::from_value(serde_json::Value::Object(object)).map_err(dto_error)
    }
}

fn dto_error(err: serde_json::Error) -> MdxError {
    MdxError::InvalidResponse(err.to_string())
}
