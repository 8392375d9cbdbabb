use tracing::trace;

use super::QueryOptions;
use crate::error::{MdxError, MdxResult};
use crate::expression::{Comparable, Expression, LevelExpression, SetExpression};
use crate::types::Filter;

/// Splits the filters of one query between the query axis (sub-select) and
/// the slicer axis (WHERE), and derives axis sets from the query attributes.
///
/// Filters naming a requested attribute restrict the query axis; all other
/// filters end up on the slicer.
#[derive(Debug, Clone)]
pub struct ExpressionFactory {
    query_axis_filters: Vec<Filter>,
    slicer_axis_filters: Vec<Filter>,
    total_count_levels: Vec<String>,
}

impl ExpressionFactory {
    pub fn new(attributes: &[LevelExpression], options: &QueryOptions) -> MdxResult<Self> {
        let mut slicer_axis_filters: Vec<Filter> = Vec::with_capacity(options.filters.len());
        for filter in &options.filters {
            if slicer_axis_filters
                .iter()
                .any(|f| f.level_expression == filter.level_expression)
            {
                return Err(MdxError::InvalidFilter(format!(
                    "{} detected. It may not be filtered more than once.",
                    filter.level_expression
                )));
            }
            slicer_axis_filters.push(filter.clone());
        }

        let mut query_axis_filters: Vec<Filter> = Vec::with_capacity(attributes.len());
        let mut total_count_levels = Vec::new();
        for attribute in attributes {
            if query_axis_filters
                .iter()
                .any(|f| f.level_expression == attribute.text())
            {
                return Err(MdxError::InvalidAttribute(format!(
                    "{} detected. It may not be defined more than once.",
                    attribute
                )));
            }

            let filter = match slicer_axis_filters
                .iter()
                .position(|f| f.level_expression == attribute.text())
            {
                Some(index) => slicer_axis_filters.remove(index),
                None => Filter::new(attribute.text()),
            };
            if filter.include_total_count {
                total_count_levels.push(attribute.text().to_string());
            }
            query_axis_filters.push(filter);
        }

        trace!(
            query_axis = query_axis_filters.len(),
            slicer_axis = slicer_axis_filters.len(),
            "Split query filters"
        );

        Ok(Self {
            query_axis_filters,
            slicer_axis_filters,
            total_count_levels,
        })
    }

    /// Sub-select restriction built from the filters on requested attributes.
    pub fn query_axis(&self) -> MdxResult<Option<SetExpression>> {
        convert_axis_filters(&self.query_axis_filters)
    }

    /// WHERE restriction built from the remaining filters.
    pub fn slicer_axis(&self) -> MdxResult<Option<SetExpression>> {
        convert_axis_filters(&self.slicer_axis_filters)
    }

    pub fn has_total_count(&self) -> bool {
        !self.total_count_levels.is_empty()
    }

    /// Cross join of the attributes flagged for a total count, if any.
    pub fn total_count_set(&self) -> MdxResult<Option<SetExpression>> {
        if self.total_count_levels.is_empty() {
            return Ok(None);
        }
        let levels = LevelExpression::from_attributes(&self.total_count_levels)?;
        self.create_set_from_attributes(&levels).map(Some)
    }

    /// `members` when the attribute's filter asks for the `All` aggregate,
    /// `children` otherwise.
    pub fn create_set_from_attribute(&self, attribute: &LevelExpression) -> SetExpression {
        let include_all = self
            .query_axis_filters
            .iter()
            .chain(self.slicer_axis_filters.iter())
            .find(|f| f.level_expression == attribute.text())
            .map(|f| f.include_all)
            .unwrap_or(false);
        attribute.set(include_all)
    }

    pub fn create_set_from_attributes(&self, attributes: &[LevelExpression]) -> MdxResult<SetExpression> {
        let sets: Vec<SetExpression> = attributes
            .iter()
            .map(|a| self.create_set_from_attribute(a))
            .collect();
        SetExpression::from_sets(&sets)
    }

    pub fn create_set_from_sort_options(
        &self,
        attributes: &[LevelExpression],
        options: &QueryOptions,
    ) -> MdxResult<SetExpression> {
        self.create_set_from_sort_options_with(attributes, options, |set| set)
    }

    /// Builds the axis set for `attributes` so that ordering and paging act on
    /// the finest grain they need.
    ///
    /// Walking the attributes from the innermost outwards, every attribute
    /// until all ordering and total-count levels are covered joins the lowest
    /// inclusive set; outer attributes stay as plain cross-joined sets. Levels
    /// that are not among the attributes are appended to the lowest inclusive
    /// set and extracted away again after sorting. `setup` runs on the lowest
    /// inclusive set before ordering and paging are applied.
    pub fn create_set_from_sort_options_with<F>(
        &self,
        attributes: &[LevelExpression],
        options: &QueryOptions,
        setup: F,
    ) -> MdxResult<SetExpression>
    where
        F: FnOnce(SetExpression) -> SetExpression,
    {
        let inclusive = self.inclusive_levels(options);
        let mut pending: Vec<SetExpression> = Vec::new();
        let mut to_extract: Vec<LevelExpression> = Vec::new();

        let lowest = if inclusive.is_empty() {
            self.create_set_from_attributes(attributes)?
        } else {
            let mut unmatched: Vec<LevelExpression> =
                inclusive.into_iter().filter(|l| !l.is_measure()).collect();
            let mut included: Vec<LevelExpression> = Vec::new();

            if unmatched.is_empty() {
                // measures only: sort at the innermost attribute
                if let Some((last, outer)) = attributes.split_last() {
                    pending = outer.iter().map(|a| self.create_set_from_attribute(a)).collect();
                    included.push(last.clone());
                }
            } else {
                for attribute in attributes.iter().rev() {
                    if unmatched.is_empty() {
                        pending.insert(0, self.create_set_from_attribute(attribute));
                    } else {
                        unmatched.retain(|l| l != attribute);
                        included.insert(0, attribute.clone());
                    }
                }
                if !unmatched.is_empty() {
                    to_extract = included.clone();
                    included.extend(unmatched);
                }
            }

            if included.is_empty() {
                SetExpression::from_sets(&std::mem::take(&mut pending))?
            } else {
                self.create_set_from_attributes(&included)?
            }
        };

        let lowest = self.extend_set_with_sort_options(&setup(lowest), options);
        let lowest = if to_extract.is_empty() {
            lowest
        } else {
            lowest.extract(&to_extract)?
        };

        if pending.is_empty() {
            Ok(lowest)
        } else {
            pending.push(lowest);
            SetExpression::from_sets(&pending)
        }
    }

    /// Applies ordering (last key innermost) and then paging to `set`.
    pub fn extend_set_with_sort_options(&self, set: &SetExpression, options: &QueryOptions) -> SetExpression {
        let mut cumulative = set.clone();
        for order in options.order_by.iter().rev() {
            if let Some(level) = &order.level_expression {
                cumulative = cumulative.order(LevelExpression::new(level.as_str()).value(), order.sort_direction);
            }
        }

        match (options.skip, options.top) {
            (Some(skip), Some(top)) => cumulative.subset(skip, Some(top.into())),
            (Some(skip), None) => cumulative.subset(skip, Some(set.count(false).into())),
            (None, Some(top)) => cumulative.head(Some(top.into())),
            (None, None) => cumulative,
        }
    }

    /// Order-by levels followed by total-count levels, without repeats.
    fn inclusive_levels(&self, options: &QueryOptions) -> Vec<LevelExpression> {
        let mut levels: Vec<LevelExpression> = Vec::new();
        let order_levels = options
            .order_by
            .iter()
            .filter_map(|o| o.level_expression.as_deref());
        for level in order_levels.chain(self.total_count_levels.iter().map(String::as_str)) {
            if !levels.iter().any(|l| l.text() == level) {
                levels.push(LevelExpression::new(level));
            }
        }
        levels
    }
}

fn convert_axis_filters(filters: &[Filter]) -> MdxResult<Option<SetExpression>> {
    let mut sets = Vec::new();
    for filter in filters.iter().filter(|f| f.has_condition()) {
        let level = LevelExpression::new(filter.level_expression.as_str());
        let mut set = if filter.member_keys.is_empty() {
            level.set(filter.include_all)
        } else {
            level.select(&filter.member_keys)?
        };
        if let Some(operator) = filter.comparison_operator {
            let value = filter.comparison_value.as_ref().map(Expression::from);
            set = set.filter(&level.value().evaluate(value, operator));
        }
        sets.push(set);
    }

    if sets.is_empty() {
        Ok(None)
    } else {
        SetExpression::from_sets(&sets).map(Some)
    }
}
