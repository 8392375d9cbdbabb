use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MdxError, MdxResult};
use crate::response::{Member, Response};
use crate::types::MdxValue;

/// Series name used when rows are not grouped.
pub const DEFAULT_SERIES: &str = "default";

/// Series values by series name, aligned with the x axis.
pub type SeriesGroup = BTreeMap<String, Vec<Option<f64>>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub measures: Vec<String>,
    pub x_axis_level_expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by_level_expression: Option<String>,
}

impl ChartConfig {
    pub fn new(measures: Vec<String>, x_axis_level_expression: impl Into<String>) -> Self {
        Self {
            measures,
            x_axis_level_expression: x_axis_level_expression.into(),
            group_by_level_expression: None,
        }
    }

    pub fn group_by(mut self, level_expression: impl Into<String>) -> Self {
        self.group_by_level_expression = Some(level_expression.into());
        self
    }

    /// Row attributes of the underlying table query.
    pub fn rows(&self) -> Vec<String> {
        let mut rows = vec![self.x_axis_level_expression.clone()];
        rows.extend(self.group_by_level_expression.iter().cloned());
        rows
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    /// Series groups by measure.
    pub data: BTreeMap<String, SeriesGroup>,
    pub measures: Vec<String>,
    /// Sorted.
    pub series_names: Vec<String>,
    pub x_axis: Vec<MdxValue>,
}

impl Chart {
    pub fn series_group(&self, measure: &str) -> MdxResult<&SeriesGroup> {
        self.data.get(measure).ok_or_else(|| {
            MdxError::InvalidResponse(format!(
                "Invalid measure {}. It does not belong to the chart.",
                measure
            ))
        })
    }

    /// One series; `None` selects the default series.
    pub fn series(&self, measure: &str, series_name: Option<&str>) -> MdxResult<&[Option<f64>]> {
        let group = self.series_group(measure)?;
        series_from_group(group, series_name.unwrap_or(DEFAULT_SERIES))
    }

    pub fn filter_measures(mut self, mut predicate: impl FnMut(&str) -> bool) -> Self {
        self.measures.retain(|m| predicate(m));
        self
    }

    pub fn filter_series_names(mut self, mut predicate: impl FnMut(&str) -> bool) -> Self {
        self.series_names.retain(|s| predicate(s));
        self
    }

    /// Calls `f(series, series_name, measure)` for every series, measure by
    /// measure.
    pub fn map<T>(&self, mut f: impl FnMut(&[Option<f64>], &str, &str) -> T) -> MdxResult<Vec<T>> {
        let mut output = Vec::with_capacity(self.measures.len() * self.series_names.len());
        for measure in &self.measures {
            let group = self.series_group(measure)?;
            for series_name in &self.series_names {
                output.push(f(series_from_group(group, series_name)?, series_name, measure));
            }
        }
        Ok(output)
    }

    /// Calls `f(points, series_name, measures)` once per series name, where
    /// `points[i]` holds every measure's value at x axis position `i`.
    pub fn zip<T>(
        &self,
        mut f: impl FnMut(Vec<Vec<Option<f64>>>, &str, &[String]) -> T,
    ) -> MdxResult<Vec<T>> {
        let mut output = Vec::with_capacity(self.series_names.len());
        for series_name in &self.series_names {
            let series = self
                .measures
                .iter()
                .map(|m| self.series(m, Some(series_name)))
                .collect::<MdxResult<Vec<_>>>()?;
            let points = (0..self.x_axis.len())
                .map(|i| series.iter().map(|s| s.get(i).copied().flatten()).collect())
                .collect();
            output.push(f(points, series_name, &self.measures));
        }
        Ok(output)
    }
}

fn series_from_group<'a>(group: &'a SeriesGroup, series_name: &str) -> MdxResult<&'a [Option<f64>]> {
    group.get(series_name).map(Vec::as_slice).ok_or_else(|| {
        if series_name == DEFAULT_SERIES {
            MdxError::InvalidResponse(
                "Invalid series group. It does not contain the default series.".to_string(),
            )
        } else {
            MdxError::InvalidResponse(format!(
                "Invalid series group. It does not contain the series {}.",
                series_name
            ))
        }
    })
}

/// Appends one value per measure to the `series_name` series.
fn push_values(
    data: &mut BTreeMap<String, SeriesGroup>,
    measures: &[String],
    series_name: &str,
    values: &[Option<f64>],
) -> MdxResult<()> {
    for (measure, value) in measures.iter().zip(values) {
        let group = data.get_mut(measure).ok_or_else(|| {
            MdxError::InvalidResponse(format!(
                "Invalid chart data. Measure {} was defined but not initialized.",
                measure
            ))
        })?;
        let series = group.get_mut(series_name).ok_or_else(|| {
            MdxError::InvalidResponse(format!(
                "Invalid chart series group. Series {} was defined but not initialized.",
                series_name
            ))
        })?;
        series.push(*value);
    }
    Ok(())
}

fn series_name_of(members: &[Member]) -> &str {
    members
        .get(1)
        .and_then(|m| m.caption.as_deref())
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_SERIES)
}

/// Pivots table rows of `[x axis]` or `[x axis, group by]` tuples into one
/// series per measure and series name.
///
/// Rows arrive grouped by x axis value. Whenever the x axis value changes,
/// every series not seen for the previous value receives a `None` so that all
/// series stay aligned with the x axis.
pub fn chart_data(response: &Response) -> MdxResult<Chart> {
    let column_tuples = &response.column_axis()?.tuples;
    let row_tuples = &response.row_axis()?.tuples;

    let mut x_axis: Vec<MdxValue> = Vec::new();
    let mut series_names: Vec<String> = Vec::new();
    for tuple in row_tuples {
        let x = tuple
            .first_member()?
            .value
            .clone()
            .unwrap_or_else(|| MdxValue::from(""));
        if !x_axis.contains(&x) {
            x_axis.push(x);
        }
        let series_name = series_name_of(&tuple.members);
        if !series_names.iter().any(|s| s == series_name) {
            series_names.push(series_name.to_string());
        }
    }
    if series_names.is_empty() {
        series_names.push(DEFAULT_SERIES.to_string());
    }
    series_names.sort();

    let mut measures = Vec::with_capacity(column_tuples.len());
    let mut data = BTreeMap::new();
    for tuple in column_tuples {
        let measure = tuple.first_member()?.level_expression.clone();
        let group: SeriesGroup = series_names
            .iter()
            .map(|s| (s.clone(), Vec::with_capacity(x_axis.len())))
            .collect();
        data.insert(measure.clone(), group);
        measures.push(measure);
    }

    let gap = vec![None; measures.len()];
    let mut index = 0;
    let mut remaining: Vec<String> = series_names.clone();
    let mut previous_x: Option<&Option<MdxValue>> = None;
    for tuple in row_tuples {
        let current = tuple.first_member()?;
        if previous_x.is_some_and(|p| *p != current.value) {
            for series_name in std::mem::replace(&mut remaining, series_names.clone()) {
                push_values(&mut data, &measures, &series_name, &gap)?;
            }
        }

        let mut values = Vec::with_capacity(measures.len());
        for _ in &measures {
            values.push(response.cell_value(index)?.and_then(MdxValue::as_f64));
            index += 1;
        }
        let series_name = series_name_of(&tuple.members);
        push_values(&mut data, &measures, series_name, &values)?;
        remaining.retain(|s| s != series_name);
        previous_x = Some(&current.value);
    }
    if !row_tuples.is_empty() {
        for series_name in &remaining {
            push_values(&mut data, &measures, series_name, &gap)?;
        }
    }

    Ok(Chart {
        data,
        measures,
        series_names,
        x_axis,
    })
}
