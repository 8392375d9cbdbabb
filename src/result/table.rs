use serde::Serialize;

use super::AttributeData;
use crate::error::{MdxError, MdxResult};
use crate::query::TOTAL_COUNT_MEMBER;
use crate::response::Response;
use crate::types::MdxValue;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRowResult<T> {
    pub rows: Vec<T>,
    /// Present only when a filter asked for the `All` aggregate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl<T> TableRowResult<T> {
    pub fn try_map<U>(self, mut f: impl FnMut(T) -> MdxResult<U>) -> MdxResult<TableRowResult<U>> {
        Ok(TableRowResult {
            rows: self.rows.into_iter().map(&mut f).collect::<MdxResult<_>>()?,
            totals: self.totals.map(&mut f).transpose()?,
            total_count: self.total_count,
        })
    }
}

/// Builds one row per row tuple, holding every measure cell plus the row
/// members' values.
///
/// The row whose members sit at level 0 is the totals row; exactly one is
/// expected when `include_totals` is set and none otherwise. The total count
/// column, when requested, is read into `total_count` instead of the row.
pub fn table_rows(
    response: &Response,
    include_totals: bool,
    include_total_count: bool,
) -> MdxResult<TableRowResult<AttributeData>> {
    let column_tuples = &response.column_axis()?.tuples;
    let row_tuples = &response.row_axis()?.tuples;

    let mut measures = Vec::with_capacity(column_tuples.len());
    for tuple in column_tuples {
        measures.push(tuple.first_member()?.level_expression.as_str());
    }
    let is_total_count = |measure: &str| include_total_count && measure == TOTAL_COUNT_MEMBER;

    let mut rows = Vec::with_capacity(row_tuples.len());
    let mut totals = Vec::new();
    let mut total_count = None;

    if row_tuples.is_empty() {
        if include_totals {
            let empty_row: AttributeData = measures
                .iter()
                .filter(|m| !is_total_count(*m))
                .map(|m| (m.to_string(), Some(MdxValue::Number(0.0))))
                .collect();
            totals.push(empty_row);
        }
    } else {
        let mut index = 0;
        for tuple in row_tuples {
            let mut row = AttributeData::new();
            for measure in &measures {
                let value = response.cell_value(index)?.cloned();
                index += 1;
                if is_total_count(*measure) {
                    total_count = value;
                } else {
                    row.insert(measure.to_string(), value);
                }
            }

            let mut level_number = u32::MAX;
            for member in &tuple.members {
                level_number = level_number.min(member.level_number);
                row.insert(member.level_expression.clone(), member.value.clone());
            }

            if level_number > 0 {
                rows.push(row);
            } else {
                totals.push(row);
            }
        }
    }

    if totals.len() > 1 {
        return Err(MdxError::InvalidResponse(
            "Multiple totals were provided.".to_string(),
        ));
    }
    if include_totals && totals.is_empty() {
        return Err(MdxError::InvalidResponse(
            "Totals were not provided, but expected.".to_string(),
        ));
    }
    if !include_totals && !totals.is_empty() {
        return Err(MdxError::InvalidResponse(
            "Totals were provided, but unexpected.".to_string(),
        ));
    }

    Ok(TableRowResult {
        rows,
        totals: totals.pop(),
        total_count: include_total_count.then(|| count_of(total_count.as_ref())),
    })
}

/// A missing or non-numeric count reads as 0.
pub(crate) fn count_of(value: Option<&MdxValue>) -> u64 {
    value
        .and_then(MdxValue::as_f64)
        .filter(|n| n.is_finite() && *n > 0.0)
        .map_or(0, |n| n as u64)
}
