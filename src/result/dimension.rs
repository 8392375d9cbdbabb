use serde::Serialize;

use super::table::count_of;
use super::AttributeData;
use crate::error::{MdxError, MdxResult};
use crate::response::Response;
use crate::types::MdxValue;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRow<T> {
    pub data: T,
    pub is_non_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRowResult<T> {
    pub rows: Vec<DimensionRow<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl<T> DimensionRowResult<T> {
    pub fn try_map<U>(self, mut f: impl FnMut(T) -> MdxResult<U>) -> MdxResult<DimensionRowResult<U>> {
        let rows = self
            .rows
            .into_iter()
            .map(|r| {
                Ok(DimensionRow {
                    data: f(r.data)?,
                    is_non_empty: r.is_non_empty,
                })
            })
            .collect::<MdxResult<_>>()?;
        Ok(DimensionRowResult {
            rows,
            total_count: self.total_count,
        })
    }
}

/// One row per row tuple. Each row consumes its non-empty flag cell, followed
/// by the total count cell when `include_total_count` is set.
pub fn dimension_rows(
    response: &Response,
    include_total_count: bool,
) -> MdxResult<DimensionRowResult<AttributeData>> {
    let row_tuples = &response.row_axis()?.tuples;
    let cells_per_row = if include_total_count { 2 } else { 1 };

    let mut rows = Vec::with_capacity(row_tuples.len());
    let mut total_count = None;
    if !row_tuples.is_empty() {
        let expected = row_tuples.len() * cells_per_row;
        if expected != response.cells.len() {
            return Err(MdxError::InvalidResponse(format!(
                "The number of rows ({}) must match the number of returned cells ({}).",
                expected,
                response.cells.len()
            )));
        }

        let mut index = 0;
        for tuple in row_tuples {
            let data: AttributeData = tuple
                .members
                .iter()
                .map(|m| (m.level_expression.clone(), m.value.clone()))
                .collect();
            let flag = response.cell_value(index)?;
            index += 1;
            rows.push(DimensionRow {
                data,
                is_non_empty: flag.and_then(MdxValue::as_f64) == Some(1.0),
            });

            if include_total_count {
                total_count = response.cell_value(index)?.cloned();
                index += 1;
            }
        }
    }

    Ok(DimensionRowResult {
        rows,
        total_count: include_total_count.then(|| count_of(total_count.as_ref())),
    })
}
