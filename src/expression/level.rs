use std::collections::HashSet;
use std::fmt;

use super::{Comparable, Expression, SetExpression, ValueExpression};
use crate::error::{MdxError, MdxResult};
use crate::types::MdxValue;

const MEASURES_PREFIX: &str = "[Measures]";

/// A hierarchy level or a measure, e.g. `[Geo].[Country]` or `[Measures].[Sales]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelExpression(String);

impl LevelExpression {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Validates a list of attribute names: level shaped, not measures, unique.
    pub fn from_attributes<S: AsRef<str>>(attributes: &[S]) -> MdxResult<Vec<Self>> {
        let mut unique = HashSet::new();
        attributes
            .iter()
            .map(|a| {
                let a = a.as_ref();
                let level = LevelExpression::new(a);
                if !level.is_valid() {
                    return Err(MdxError::InvalidAttribute(format!(
                        "{} detected. It must be a level expression.",
                        a
                    )));
                }
                if level.is_measure() {
                    return Err(MdxError::InvalidAttribute(format!(
                        "{} detected. It must not be a measure.",
                        a
                    )));
                }
                if !unique.insert(a) {
                    return Err(MdxError::InvalidAttribute(format!(
                        "{} detected. It may not be defined more than once.",
                        a
                    )));
                }
                Ok(level)
            })
            .collect()
    }

    /// Mirror of [`from_attributes`](Self::from_attributes) for measures.
    pub fn from_measures<S: AsRef<str>>(measures: &[S]) -> MdxResult<Vec<Self>> {
        let mut unique = HashSet::new();
        measures
            .iter()
            .map(|m| {
                let m = m.as_ref();
                let level = LevelExpression::new(m);
                if !level.is_valid() {
                    return Err(MdxError::InvalidMeasure(format!(
                        "{} detected. It must be a level expression.",
                        m
                    )));
                }
                if !level.is_measure() {
                    return Err(MdxError::InvalidMeasure(format!(
                        "{} detected. It must not be an attribute.",
                        m
                    )));
                }
                if !unique.insert(m) {
                    return Err(MdxError::InvalidMeasure(format!(
                        "{} detected. It may not be defined more than once.",
                        m
                    )));
                }
                Ok(level)
            })
            .collect()
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    /// `<level>.&[key]`, or `<level>.&` for a missing or empty key.
    pub fn member(&self, key: Option<&MdxValue>) -> MemberExpression {
        match key {
            Some(MdxValue::Text(k)) if k.is_empty() => MemberExpression::new(format!("{}.&", self.0)),
            Some(k) => MemberExpression::new(format!("{}.&[{}]", self.0, k)),
            None => MemberExpression::new(format!("{}.&", self.0)),
        }
    }

    pub fn children(&self) -> SetExpression {
        SetExpression::new(format!("{}.children", self.0))
    }

    pub fn members(&self) -> SetExpression {
        SetExpression::new(format!("{}.members", self.0))
    }

    pub fn select(&self, keys: &[MdxValue]) -> MdxResult<SetExpression> {
        let members: Vec<MemberExpression> = keys.iter().map(|k| self.member(Some(k))).collect();
        SetExpression::from_members(&members)
    }

    /// `members` includes the `All` aggregate, `children` does not.
    pub fn set(&self, include_all: bool) -> SetExpression {
        if include_all {
            self.members()
        } else {
            self.children()
        }
    }

    pub fn value(&self) -> ValueExpression {
        if self.is_measure() {
            ValueExpression::numeric(self.0.clone())
        } else {
            ValueExpression::unknown(format!("{}.MEMBER_VALUE", self.0))
        }
    }

    pub fn is_measure(&self) -> bool {
        self.0.starts_with(MEASURES_PREFIX)
    }

    pub fn is_valid(&self) -> bool {
        self.0.starts_with('[') && self.0.ends_with(']')
    }
}

impl fmt::Display for LevelExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LevelExpression {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<LevelExpression> for Expression {
    fn from(value: LevelExpression) -> Self {
        Expression::Level(value.0)
    }
}

/// One concrete member reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberExpression(String);

impl MemberExpression {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn as_set(&self) -> SetExpression {
        SetExpression::new(self.0.clone())
    }

    pub fn children(&self) -> SetExpression {
        SetExpression::new(format!("{}.children", self.0))
    }

    pub fn as_value(&self) -> ValueExpression {
        ValueExpression {
            text: self.0.clone(),
            kind: super::ExpressionKind::Member,
        }
    }
}

impl Comparable for MemberExpression {}

impl fmt::Display for MemberExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberExpression {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<MemberExpression> for Expression {
    fn from(value: MemberExpression) -> Self {
        Expression::Member(value.0)
    }
}
