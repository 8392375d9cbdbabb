use crate::error::{MdxError, MdxResult};
use crate::expression::{Expression, SetExpression};

const CELL_PROPERTIES: &str = "CELL PROPERTIES VALUE, FORMATTED_VALUE";
const DIMENSION_PROPERTIES: &str = "DIMENSION PROPERTIES MEMBER_VALUE";
const LINE_BREAK: &str = "\r\n";

/// Accumulates the clauses of one MDX statement in call order.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    cube: String,
    scope: Vec<String>,
    column_axis: Option<SetExpression>,
    row_axis: Option<SetExpression>,
    query_axis: Option<SetExpression>,
    slicer_axis: Option<SetExpression>,
}

impl QueryBuilder {
    pub fn new(cube: impl Into<String>) -> Self {
        Self {
            cube: cube.into(),
            scope: Vec::new(),
            column_axis: None,
            row_axis: None,
            query_axis: None,
            slicer_axis: None,
        }
    }

    pub fn define_member(
        &mut self,
        name: &str,
        value: impl Into<Expression>,
        caption: Option<&str>,
    ) -> &mut Self {
        let value = value.into();
        let definition = match caption {
            Some(caption) => format!(
                "MEMBER {} AS {}, CAPTION = '{}'",
                name,
                value,
                caption.replace('\'', "''")
            ),
            None => format!("MEMBER {} AS {}", name, value),
        };
        self.scope.push(definition);
        self
    }

    pub fn define_set(&mut self, name: &str, set: &SetExpression) -> &mut Self {
        self.scope.push(format!("SET {} AS {}", name, set));
        self
    }

    /// Restricts the cube through a nested sub-select.
    pub fn filter_by_query_axis(&mut self, set: Option<SetExpression>) -> &mut Self {
        self.query_axis = set;
        self
    }

    /// Restricts the cube through the WHERE clause.
    pub fn filter_by_slicer_axis(&mut self, set: Option<SetExpression>) -> &mut Self {
        self.slicer_axis = set;
        self
    }

    pub fn on_columns(&mut self, set: SetExpression) -> &mut Self {
        self.column_axis = Some(set);
        self
    }

    pub fn on_rows(&mut self, set: SetExpression) -> &mut Self {
        self.row_axis = Some(set);
        self
    }

    pub fn on_pages(&mut self, _set: SetExpression) -> MdxResult<&mut Self> {
        Err(MdxError::UnsupportedAxis(
            "The page axis is not yet supported.".to_string(),
        ))
    }

    pub fn to_statement(&self) -> MdxResult<String> {
        let mut lines: Vec<String> = Vec::with_capacity(self.scope.len() + 5);
        if !self.scope.is_empty() {
            lines.push("WITH".to_string());
            lines.extend(self.scope.iter().cloned());
        }
        lines.push(self.select_statement()?);
        lines.push(self.from_statement());
        if let Some(slicer) = &self.slicer_axis {
            lines.push(format!("WHERE ({})", slicer));
        }
        lines.push(CELL_PROPERTIES.to_string());
        Ok(lines.join(LINE_BREAK))
    }

    fn select_statement(&self) -> MdxResult<String> {
        let columns = self.column_axis.as_ref().ok_or_else(|| {
            MdxError::InvalidQuery(
                "Invalid select statement. Column axis must be specified.".to_string(),
            )
        })?;

        let columns = format!("{} {} ON COLUMNS", columns, DIMENSION_PROPERTIES);
        Ok(match &self.row_axis {
            Some(rows) => format!(
                "SELECT {}, {} {} ON ROWS",
                columns, rows, DIMENSION_PROPERTIES
            ),
            None => format!("SELECT {}", columns),
        })
    }

    fn from_statement(&self) -> String {
        match &self.query_axis {
            Some(query_axis) => format!(
                "FROM (SELECT {} ON COLUMNS FROM [{}])",
                query_axis, self.cube
            ),
            None => format!("FROM [{}]", self.cube),
        }
    }
}
