use tracing::debug;

use super::{
    DimensionQuery, DimensionQueryType, ExpressionFactory, QueryBuilder, QueryOptions, TableQuery,
    ATTRIBUTES_SET, COLUMNS_SET, IS_NON_EMPTY_MEMBER, MEASURES_SET, RESERVED_NAMES, ROWS_SET,
    TOTAL_COUNT_MEMBER,
};
use crate::error::{MdxError, MdxResult};
use crate::expression::{Comparable, LevelExpression, MemberExpression, SetExpression};

const IS_NON_EMPTY_CAPTION: &str = "Is Non-Empty";
const TOTAL_COUNT_CAPTION: &str = "Total Count";

/// Compiles query intents into MDX statements against one cube.
#[derive(Debug, Clone)]
pub struct QuerySerializer {
    cube: String,
}

impl QuerySerializer {
    pub fn new(cube: impl Into<String>) -> Self {
        Self { cube: cube.into() }
    }

    pub fn cube(&self) -> &str {
        &self.cube
    }

    /// One row per member of the requested attributes. Columns carry the
    /// non-empty flag, followed by the total count when requested.
    pub fn serialize_dimension_query(&self, query: &DimensionQuery) -> MdxResult<String> {
        let attributes = LevelExpression::from_attributes(&query.attributes)?;
        let measures = LevelExpression::from_measures(&query.measures)?;
        if attributes.is_empty() {
            return Err(MdxError::InvalidQuery(
                "Invalid dimension query. At least one attribute must be specified.".to_string(),
            ));
        }
        check_reserved(&attributes, &measures)?;

        let attributes_with_order_by = attributes_with_order_by(&attributes, &query.options);
        let mut should_extract = attributes_with_order_by.len() > attributes.len();
        let factory = ExpressionFactory::new(&attributes_with_order_by, &query.options)?;

        let is_non_empty = MemberExpression::new(IS_NON_EMPTY_MEMBER);
        let mut column_axis = is_non_empty.as_set();
        let mut row_axis = SetExpression::new(ATTRIBUTES_SET);

        let mut builder = QueryBuilder::new(&self.cube);
        builder.define_set(
            ATTRIBUTES_SET,
            &factory.create_set_from_attributes(&attributes_with_order_by)?,
        );

        if measures.is_empty() {
            builder.define_member(IS_NON_EMPTY_MEMBER, 1, Some(IS_NON_EMPTY_CAPTION));
        } else {
            let measure_set = SetExpression::new(MEASURES_SET);
            let flag = measure_set.count(true).equal_to(0).iif(0, 1)?;
            builder
                .define_set(MEASURES_SET, &SetExpression::from_measures(&measures)?)
                .define_member(IS_NON_EMPTY_MEMBER, flag, Some(IS_NON_EMPTY_CAPTION));

            row_axis = row_axis.cross_join(&[measure_set])?;
            row_axis = match query.query_type.unwrap_or_default() {
                DimensionQueryType::All => row_axis,
                DimensionQueryType::Empty => row_axis.filter(&is_non_empty.equal_to(0)),
                DimensionQueryType::NonEmpty => row_axis.filter(&is_non_empty.equal_to(1)),
            };
            should_extract = true;
        }

        if query.options.requests_total_count() {
            let count_set = match factory.total_count_set()? {
                Some(set) => set,
                None if should_extract => row_axis.extract(&attributes)?,
                None => row_axis.clone(),
            };
            column_axis = define_total_count(&mut builder, &column_axis, &count_set)?;
        }

        row_axis = factory.extend_set_with_sort_options(&row_axis, &query.options);
        if should_extract {
            row_axis = row_axis.extract(&attributes)?;
        }

        builder
            .on_columns(column_axis)
            .on_rows(row_axis)
            .filter_by_query_axis(factory.query_axis()?)
            .filter_by_slicer_axis(factory.slicer_axis()?);

        let statement = builder.to_statement()?;
        debug!(cube = %self.cube, "Serialized dimension query:\n{}", statement);
        Ok(statement)
    }

    /// Measures on columns, optionally broken down by column attributes, with
    /// row attributes on rows. Sorting and paging act on the rows when there
    /// are any, on the columns otherwise.
    pub fn serialize_table_query(&self, query: &TableQuery) -> MdxResult<String> {
        let columns = LevelExpression::from_attributes(&query.columns)?;
        let measures = LevelExpression::from_measures(&query.measures)?;
        let rows = LevelExpression::from_attributes(&query.rows)?;
        check_reserved(&columns, &measures)?;
        check_reserved(&rows, &[])?;

        let attributes: Vec<LevelExpression> = columns.iter().chain(rows.iter()).cloned().collect();
        let factory = ExpressionFactory::new(&attributes, &query.options)?;
        let measure_set = SetExpression::new(MEASURES_SET);
        let mut builder = QueryBuilder::new(&self.cube);

        let mut column_axis = match (columns.is_empty(), measures.is_empty()) {
            (true, true) => {
                return Err(MdxError::InvalidQuery(
                    "Invalid table query. At least one column or measure must be specified."
                        .to_string(),
                ))
            }
            (true, false) => {
                builder.define_set(MEASURES_SET, &SetExpression::from_measures(&measures)?);
                measure_set.clone()
            }
            (false, true) => {
                builder.define_set(COLUMNS_SET, &factory.create_set_from_attributes(&columns)?);
                SetExpression::new(COLUMNS_SET)
            }
            (false, false) => {
                let column_set = factory
                    .create_set_from_attributes(&columns)?
                    .non_empty(Some(&measure_set));
                builder
                    .define_set(MEASURES_SET, &SetExpression::from_measures(&measures)?)
                    .define_set(COLUMNS_SET, &column_set);
                SetExpression::new(COLUMNS_SET).cross_join(&[measure_set.clone()])?
            }
        };

        let has_measures = !measures.is_empty();
        let mut row_axis = None;
        if rows.is_empty() {
            column_axis = factory.extend_set_with_sort_options(&column_axis, &query.options);
        } else {
            let row_set = factory.create_set_from_sort_options_with(&rows, &query.options, |lowest| {
                if has_measures {
                    lowest.non_empty(Some(&measure_set))
                } else {
                    lowest
                }
            })?;
            builder.define_set(ROWS_SET, &row_set);
            row_axis = Some(SetExpression::new(ROWS_SET));
        }

        if query.options.requests_total_count() {
            let count_set = match factory.total_count_set()? {
                Some(set) => set,
                None => {
                    let grain = if rows.is_empty() { &columns } else { &rows };
                    if grain.is_empty() {
                        return Err(MdxError::InvalidQuery(
                            "Invalid table query. A total count needs at least one row or column attribute."
                                .to_string(),
                        ));
                    }
                    factory.create_set_from_attributes(grain)?
                }
            };
            let count_set = if has_measures {
                count_set.non_empty(Some(&measure_set))
            } else {
                count_set
            };
            column_axis = define_total_count(&mut builder, &column_axis, &count_set)?;
        }

        builder.on_columns(column_axis);
        if let Some(row_axis) = row_axis {
            builder.on_rows(row_axis);
        }
        builder
            .filter_by_query_axis(factory.query_axis()?)
            .filter_by_slicer_axis(factory.slicer_axis()?);

        let statement = builder.to_statement()?;
        debug!(cube = %self.cube, "Serialized table query:\n{}", statement);
        Ok(statement)
    }
}

/// Defines the total count member over `count_set` and appends it to the
/// column axis.
fn define_total_count(
    builder: &mut QueryBuilder,
    column_axis: &SetExpression,
    count_set: &SetExpression,
) -> MdxResult<SetExpression> {
    let total_count = MemberExpression::new(TOTAL_COUNT_MEMBER);
    builder.define_member(TOTAL_COUNT_MEMBER, count_set.count(false), Some(TOTAL_COUNT_CAPTION));
    column_axis.union(&[total_count.as_set()])
}

/// Requested attributes followed by any attribute levels only named in order-by.
fn attributes_with_order_by(attributes: &[LevelExpression], options: &QueryOptions) -> Vec<LevelExpression> {
    let mut levels = attributes.to_vec();
    for order in &options.order_by {
        if let Some(level) = order.level_expression.as_deref() {
            let level = LevelExpression::new(level);
            if !level.is_measure() && !levels.contains(&level) {
                levels.push(level);
            }
        }
    }
    levels
}

fn check_reserved(attributes: &[LevelExpression], measures: &[LevelExpression]) -> MdxResult<()> {
    if let Some(a) = attributes.iter().find(|a| RESERVED_NAMES.contains(&a.text())) {
        return Err(MdxError::InvalidAttribute(format!(
            "{} detected. The name is reserved.",
            a
        )));
    }
    if let Some(m) = measures.iter().find(|m| RESERVED_NAMES.contains(&m.text())) {
        return Err(MdxError::InvalidMeasure(format!(
            "{} detected. The name is reserved.",
            m
        )));
    }
    Ok(())
}
