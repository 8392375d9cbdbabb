use std::fmt;

use super::{Expression, LevelExpression, LogicalExpression, MemberExpression, ValueExpression};
use crate::error::{MdxError, MdxResult};
use crate::types::SortDirection;

/// An ordered collection of tuples or members.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetExpression(String);

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl SetExpression {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    /// A single measure stays bare, several are wrapped in braces.
    pub fn from_measures(measures: &[LevelExpression]) -> MdxResult<Self> {
        match measures {
            [] => Err(MdxError::empty("set", "measure")),
            [measure] => Ok(Self::new(measure.text())),
            _ => Ok(Self::new(format!("{{{}}}", join(measures)))),
        }
    }

    pub fn from_members(members: &[MemberExpression]) -> MdxResult<Self> {
        match members {
            [] => Err(MdxError::empty("set", "member")),
            [member] => Ok(member.as_set()),
            _ => Ok(Self::new(format!("{{{}}}", join(members)))),
        }
    }

    pub fn from_sets(sets: &[SetExpression]) -> MdxResult<Self> {
        match sets {
            [] => Err(MdxError::empty("set", "expression")),
            [set] => Ok(set.clone()),
            _ => Ok(Self::new(format!("CROSSJOIN({})", join(sets)))),
        }
    }

    pub fn count(&self, exclude_empty: bool) -> ValueExpression {
        if exclude_empty {
            ValueExpression::numeric(format!("COUNT({},EXCLUDEEMPTY)", self.0))
        } else {
            ValueExpression::numeric(format!("COUNT({})", self.0))
        }
    }

    pub fn cross_join(&self, sets: &[SetExpression]) -> MdxResult<Self> {
        if sets.is_empty() {
            return Err(MdxError::InvalidExpression(format!(
                "Invalid cross join on '{}'. At least one other set expression must be defined.",
                self.0
            )));
        }
        Ok(Self::new(format!("CROSSJOIN({},{})", self.0, join(sets))))
    }

    pub fn union(&self, sets: &[SetExpression]) -> MdxResult<Self> {
        if sets.is_empty() {
            return Err(MdxError::InvalidExpression(format!(
                "Invalid union on '{}'. At least one other set expression must be defined.",
                self.0
            )));
        }
        Ok(Self::new(format!("UNION({},{})", self.0, join(sets))))
    }

    pub fn extract(&self, hierarchies: &[LevelExpression]) -> MdxResult<Self> {
        if hierarchies.is_empty() {
            return Err(MdxError::InvalidExpression(format!(
                "Invalid extract on '{}'. At least one hierarchy expression must be defined.",
                self.0
            )));
        }
        Ok(Self::new(format!("EXTRACT({},{})", self.0, join(hierarchies))))
    }

    pub fn filter(&self, constraint: &LogicalExpression) -> Self {
        Self::new(format!("FILTER({},{})", self.0, constraint))
    }

    pub fn non_empty(&self, set: Option<&SetExpression>) -> Self {
        match set {
            Some(set) => Self::new(format!("NONEMPTY({},{})", self.0, set)),
            None => Self::new(format!("NONEMPTY({})", self.0)),
        }
    }

    pub fn order(&self, value: impl Into<Expression>, direction: Option<SortDirection>) -> Self {
        let value = value.into();
        match direction {
            Some(direction) => Self::new(format!("ORDER({},{},{})", self.0, value, direction)),
            None => Self::new(format!("ORDER({},{})", self.0, value)),
        }
    }

    pub fn subset(&self, start: impl Into<Expression>, count: Option<Expression>) -> Self {
        let start = start.into();
        match count {
            Some(count) => Self::new(format!("SUBSET({},{},{})", self.0, start, count)),
            None => Self::new(format!("SUBSET({},{})", self.0, start)),
        }
    }

    pub fn head(&self, count: Option<Expression>) -> Self {
        match count {
            Some(count) => Self::new(format!("HEAD({},{})", self.0, count)),
            None => Self::new(format!("HEAD({})", self.0)),
        }
    }

    pub fn tail(&self, count: Option<Expression>) -> Self {
        match count {
            Some(count) => Self::new(format!("TAIL({},{})", self.0, count)),
            None => Self::new(format!("TAIL({})", self.0)),
        }
    }

    pub fn top_count(&self, count: impl Into<Expression>, sort_by: Option<Expression>) -> Self {
        let count = count.into();
        match sort_by {
            Some(sort_by) => Self::new(format!("TOPCOUNT({},{},{})", self.0, count, sort_by)),
            None => Self::new(format!("TOPCOUNT({},{})", self.0, count)),
        }
    }

    pub fn bottom_count(&self, count: impl Into<Expression>, sort_by: Option<Expression>) -> Self {
        let count = count.into();
        match sort_by {
            Some(sort_by) => Self::new(format!("BOTTOMCOUNT({},{},{})", self.0, count, sort_by)),
            None => Self::new(format!("BOTTOMCOUNT({},{})", self.0, count)),
        }
    }
}

impl fmt::Display for SetExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SetExpression {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<SetExpression> for Expression {
    fn from(value: SetExpression) -> Self {
        Expression::Set(value.0)
    }
}
