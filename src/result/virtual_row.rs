use std::fmt;

use serde::Serialize;

use crate::error::{MdxError, MdxResult};
use crate::response::{Cell, Member, Response};

type MeasureCellFn<C> = Box<dyn Fn(&Cell, &Member) -> C + Send + Sync>;

/// One cell of a caller-described row.
pub enum VirtualCell<C> {
    Static(C),
    /// Computed from the next measure column of the cellset.
    Measure(MeasureCellFn<C>),
}

impl<C: fmt::Debug> fmt::Debug for VirtualCell<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VirtualCell::Static(value) => f.debug_tuple("Static").field(value).finish(),
            VirtualCell::Measure(_) => f.write_str("Measure(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualRow<C, E> {
    pub cells: Vec<C>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<E>,
}

#[derive(Debug)]
pub struct VirtualRowBuilder<C, E> {
    cells: Vec<VirtualCell<C>>,
    measures: Vec<String>,
    extended_properties: Option<E>,
}

impl<C, E> VirtualRowBuilder<C, E> {
    fn new(extended_properties: Option<E>) -> Self {
        Self {
            cells: Vec::new(),
            measures: Vec::new(),
            extended_properties,
        }
    }

    /// Registers `measure` and computes the cell from its value.
    pub fn add_measure_cell<F>(mut self, measure: impl Into<String>, cell: F) -> Self
    where
        F: Fn(&Cell, &Member) -> C + Send + Sync + 'static,
    {
        self.measures.push(measure.into());
        self.cells.push(VirtualCell::Measure(Box::new(cell)));
        self
    }

    pub fn add_static_cell(mut self, cell: C) -> Self {
        self.cells.push(VirtualCell::Static(cell));
        self
    }
}

/// Rows described cell by cell; measure cells consume the columns of a
/// measures-only table query in declaration order.
#[derive(Debug)]
pub struct VirtualTable<C, E> {
    rows: Vec<VirtualRowBuilder<C, E>>,
}

impl<C, E> Default for VirtualTable<C, E> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<C, E> VirtualTable<C, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_virtual_row(
        mut self,
        setup: impl FnOnce(VirtualRowBuilder<C, E>) -> VirtualRowBuilder<C, E>,
        extended_properties: Option<E>,
    ) -> Self {
        self.rows.push(setup(VirtualRowBuilder::new(extended_properties)));
        self
    }

    /// Measures registered by all rows, in declaration order.
    pub fn measures(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|r| r.measures.iter().cloned())
            .collect()
    }

    pub fn materialize(&self, response: &Response) -> MdxResult<Vec<VirtualRow<C, E>>>
    where
        C: Clone,
        E: Clone,
    {
        let column_tuples = &response.column_axis()?.tuples;
        if column_tuples.len() != response.cells.len() {
            return Err(MdxError::InvalidResponse(format!(
                "The number of columns ({}) must match the number of returned cells ({}).",
                column_tuples.len(),
                response.cells.len()
            )));
        }
        let measure_count = self.rows.iter().map(|r| r.measures.len()).sum::<usize>();
        if column_tuples.len() != measure_count {
            return Err(MdxError::InvalidResponse(format!(
                "The number of columns ({}) must match the number of requested measures ({}).",
                column_tuples.len(),
                measure_count
            )));
        }
        if column_tuples.is_empty() {
            return Ok(Vec::new());
        }

        let mut index = 0;
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut cells = Vec::with_capacity(row.cells.len());
            for cell in &row.cells {
                match cell {
                    VirtualCell::Static(value) => cells.push(value.clone()),
                    VirtualCell::Measure(compute) => {
                        let data = response.cell(index)?;
                        let measure = column_tuples[index].first_member()?;
                        cells.push(compute(data, measure));
                        index += 1;
                    }
                }
            }
            rows.push(VirtualRow {
                cells,
                extended_properties: row.extended_properties.clone(),
            });
        }
        Ok(rows)
    }
}
