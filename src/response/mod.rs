//! Normalized cellset: axes of tuples of members plus a dense cell array.

mod decoder;

pub use decoder::{decode_cellset, decode_cellset_str};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MdxError, MdxResult};
use crate::types::MdxValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub is_measure: bool,
    pub level_expression: String,
    /// 0 for the `All` member of a hierarchy and for measures.
    pub level_number: u32,
    pub caption: Option<String>,
    pub value: Option<MdxValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tuple {
    pub members: Vec<Member>,
}

impl Tuple {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn first_member(&self) -> MdxResult<&Member> {
        self.members.first().ok_or_else(no_members)
    }

    pub fn last_member(&self) -> MdxResult<&Member> {
        self.members.last().ok_or_else(no_members)
    }
}

fn no_members() -> MdxError {
    MdxError::InvalidResponse("Invalid tuple. No members were defined.".to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub tuples: Vec<Tuple>,
}

impl Axis {
    pub fn new(tuples: Vec<Tuple>) -> Self {
        Self { tuples }
    }

    pub fn first_tuple(&self) -> MdxResult<&Tuple> {
        self.tuples.first().ok_or_else(no_tuples)
    }

    pub fn last_tuple(&self) -> MdxResult<&Tuple> {
        self.tuples.last().ok_or_else(no_tuples)
    }
}

fn no_tuples() -> MdxError {
    MdxError::InvalidResponse("Invalid axis. No tuples were defined.".to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub value: Option<MdxValue>,
    pub formatted_value: Option<String>,
}

impl Cell {
    /// Placeholder for an ordinal the server left out.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One decoded reply. Axis 0 holds the columns, axis 1 the rows; cells are
/// row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub axes: Vec<Axis>,
    pub cells: Vec<Cell>,
}

impl Response {
    pub fn new(axes: Vec<Axis>, cells: Vec<Cell>) -> Self {
        Self { axes, cells }
    }

    pub fn column_axis(&self) -> MdxResult<&Axis> {
        self.axes.first().ok_or_else(|| {
            MdxError::InvalidResponse(format!("Column axis is undefined ({}).", self.counts()))
        })
    }

    pub fn row_axis(&self) -> MdxResult<&Axis> {
        self.axes.get(1).ok_or_else(|| {
            MdxError::InvalidResponse(format!("Row axis is undefined ({}).", self.counts()))
        })
    }

    pub fn cell(&self, index: usize) -> MdxResult<&Cell> {
        self.cells.get(index).ok_or_else(|| {
            MdxError::InvalidResponse(format!(
                "Cell at index {} is undefined ({}).",
                index,
                self.counts()
            ))
        })
    }

    pub fn cell_value(&self, index: usize) -> MdxResult<Option<&MdxValue>> {
        self.cell(index).map(|c| c.value.as_ref())
    }

    /// Shape summary used in integrity error messages.
    pub fn counts(&self) -> ResponseCounts {
        let axes = self
            .axes
            .iter()
            .enumerate()
            .map(|(axis_number, axis)| {
                let member_counts = axis.tuples.iter().map(|t| t.members.len());
                AxisCounts {
                    axis_number,
                    tuple_count: axis.tuples.len(),
                    min_member_count: member_counts.clone().min().unwrap_or(0),
                    max_member_count: member_counts.max().unwrap_or(0),
                }
            })
            .collect();

        ResponseCounts {
            axes,
            axis_count: self.axes.len(),
            cell_count: self.cells.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisCounts {
    pub axis_number: usize,
    pub tuple_count: usize,
    pub min_member_count: usize,
    pub max_member_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCounts {
    pub axes: Vec<AxisCounts>,
    pub axis_count: usize,
    pub cell_count: usize,
}

impl fmt::Display for ResponseCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axisCount={}, cellCount={}", self.axis_count, self.cell_count)?;
        for axis in &self.axes {
            write!(
                f,
                ", axis {}: tupleCount={}, memberCount={}..{}",
                axis.axis_number, axis.tuple_count, axis.min_member_count, axis.max_member_count
            )?;
        }
        Ok(())
    }
}
