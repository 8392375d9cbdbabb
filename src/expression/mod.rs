//! Typed MDX expression fragments.
//!
//! Every fragment is an immutable piece of MDX text tagged with the kind of
//! value it denotes. The kind never changes after construction; the typed
//! wrappers (`LevelExpression`, `SetExpression`, ...) expose only the
//! operations that make sense for their kind.

mod level;
mod set;


pub use level::{LevelExpression, MemberExpression};
pub use set::SetExpression;

use std::fmt;

use serde::Serialize;

use crate::error::{MdxError, MdxResult};
use crate::types::{ComparisonOperator, MdxValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionKind {
    String,
    Numeric,
    Logical,
    Member,
    Level,
    Set,
    /// Fallback when value operands of different kinds are merged.
    StringOrNumeric,
}

impl ExpressionKind {
    /// Kinds that may appear where a scalar value is expected.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            ExpressionKind::String
                | ExpressionKind::Numeric
                | ExpressionKind::Member
                | ExpressionKind::StringOrNumeric
        )
    }
}

impl fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpressionKind::String => "string",
            ExpressionKind::Numeric => "numeric",
            ExpressionKind::Logical => "logical",
            ExpressionKind::Member => "member",
            ExpressionKind::Level => "level",
            ExpressionKind::Set => "set",
            ExpressionKind::StringOrNumeric => "stringOrNumeric",
        };
        f.write_str(name)
    }
}

/// An MDX fragment, one variant per kind.
///
/// Raw strings convert to `String`, numbers to `Numeric`; typed wrappers keep
/// their own kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    String(String),
    Numeric(String),
    Logical(String),
    Member(String),
    Level(String),
    Set(String),
    StringOrNumeric(String),
}

impl Expression {
    pub fn new(text: impl Into<String>, kind: ExpressionKind) -> Self {
        let text = text.into();
        match kind {
            ExpressionKind::String => Expression::String(text),
            ExpressionKind::Numeric => Expression::Numeric(text),
            ExpressionKind::Logical => Expression::Logical(text),
            ExpressionKind::Member => Expression::Member(text),
            ExpressionKind::Level => Expression::Level(text),
            ExpressionKind::Set => Expression::Set(text),
            ExpressionKind::StringOrNumeric => Expression::StringOrNumeric(text),
        }
    }

    pub fn kind(&self) -> ExpressionKind {
        match self {
            Expression::String(_) => ExpressionKind::String,
            Expression::Numeric(_) => ExpressionKind::Numeric,
            Expression::Logical(_) => ExpressionKind::Logical,
            Expression::Member(_) => ExpressionKind::Member,
            Expression::Level(_) => ExpressionKind::Level,
            Expression::Set(_) => ExpressionKind::Set,
            Expression::StringOrNumeric(_) => ExpressionKind::StringOrNumeric,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Expression::String(t)
            | Expression::Numeric(t)
            | Expression::Logical(t)
            | Expression::Member(t)
            | Expression::Level(t)
            | Expression::Set(t)
            | Expression::StringOrNumeric(t) => t,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Expression::String(t)
            | Expression::Numeric(t)
            | Expression::Logical(t)
            | Expression::Member(t)
            | Expression::Level(t)
            | Expression::Set(t)
            | Expression::StringOrNumeric(t) => t,
        }
    }

    pub fn as_value(&self) -> Option<ValueExpression> {
        ValueExpression::from_kind(self.text(), self.kind()).ok()
    }

    pub fn as_logical(&self) -> Option<LogicalExpression> {
        match self {
            Expression::Logical(t) => Some(LogicalExpression::new(t.clone())),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<SetExpression> {
        match self {
            Expression::Set(t) => Some(SetExpression::new(t.clone())),
            _ => None,
        }
    }

    pub fn as_level(&self) -> Option<LevelExpression> {
        match self {
            Expression::Level(t) => Some(LevelExpression::new(t.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Expression::String(value.to_string())
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Expression::String(value)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::Numeric(value.to_string())
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Expression::Numeric(value.to_string())
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Expression::Numeric(value.to_string())
    }
}

impl From<usize> for Expression {
    fn from(value: usize) -> Self {
        Expression::Numeric(value.to_string())
    }
}

impl From<&MdxValue> for Expression {
    fn from(value: &MdxValue) -> Self {
        match value {
            MdxValue::Number(n) => Expression::from(*n),
            MdxValue::Text(s) => Expression::String(s.clone()),
        }
    }
}

/// Common kind shared by all operands, or `StringOrNumeric` when they differ.
pub fn merge_expression_types(values: &[Expression]) -> MdxResult<ExpressionKind> {
    let (first, rest) = values
        .split_first()
        .ok_or_else(|| MdxError::empty("expression type merge", "value"))?;

    let kind = first.kind();
    if rest.iter().all(|v| v.kind() == kind) {
        Ok(kind)
    } else {
        Ok(ExpressionKind::StringOrNumeric)
    }
}

/// Capability of value-like fragments to take part in comparisons.
pub trait Comparable: fmt::Display {
    /// Renders `<self> <op> <value>`, with `NULL` for a missing value.
    fn evaluate(&self, value: Option<Expression>, operator: ComparisonOperator) -> LogicalExpression {
        let rhs = value.map(Expression::into_text);
        LogicalExpression::new(format!(
            "{} {} {}",
            self,
            operator,
            rhs.as_deref().unwrap_or("NULL")
        ))
    }

    fn greater_than<V: Into<Expression>>(&self, value: V) -> LogicalExpression {
        self.evaluate(Some(value.into()), ComparisonOperator::GreaterThan)
    }

    fn greater_than_or_equal_to<V: Into<Expression>>(&self, value: V) -> LogicalExpression {
        self.evaluate(Some(value.into()), ComparisonOperator::GreaterThanOrEqual)
    }

    fn equal_to<V: Into<Expression>>(&self, value: V) -> LogicalExpression {
        self.evaluate(Some(value.into()), ComparisonOperator::Equal)
    }

    fn less_than<V: Into<Expression>>(&self, value: V) -> LogicalExpression {
        self.evaluate(Some(value.into()), ComparisonOperator::LessThan)
    }

    fn less_than_or_equal_to<V: Into<Expression>>(&self, value: V) -> LogicalExpression {
        self.evaluate(Some(value.into()), ComparisonOperator::LessThanOrEqual)
    }

    fn not_equal_to<V: Into<Expression>>(&self, value: V) -> LogicalExpression {
        self.evaluate(Some(value.into()), ComparisonOperator::NotEqual)
    }
}

/// A scalar-valued fragment: string, numeric, member or the mixed fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueExpression {
    text: String,
    kind: ExpressionKind,
}

impl ValueExpression {
    pub fn from_kind(text: impl Into<String>, kind: ExpressionKind) -> MdxResult<Self> {
        if !kind.is_value() {
            return Err(MdxError::InvalidExpression(format!(
                "Invalid value expression. Type {} is not supported.",
                kind
            )));
        }
        Ok(Self {
            text: text.into(),
            kind,
        })
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ExpressionKind::String,
        }
    }

    pub fn numeric(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ExpressionKind::Numeric,
        }
    }

    pub fn unknown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ExpressionKind::StringOrNumeric,
        }
    }

    /// Accepts a raw value or an already typed value expression.
    pub fn qualify(value: impl Into<Expression>) -> MdxResult<Self> {
        let value = value.into();
        let kind = value.kind();
        Self::from_kind(value.into_text(), kind)
    }

    pub fn kind(&self) -> ExpressionKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Comparable for ValueExpression {}

impl fmt::Display for ValueExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<ValueExpression> for Expression {
    fn from(value: ValueExpression) -> Self {
        Expression::new(value.text, value.kind)
    }
}

/// A boolean condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalExpression(String);

impl LogicalExpression {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    /// `IIF(<cond>,<then>,<else>)`; a member-kinded result degrades to the
    /// mixed fallback since a conditional member reference is not a member.
    pub fn iif(
        &self,
        then_value: impl Into<Expression>,
        else_value: impl Into<Expression>,
    ) -> MdxResult<ValueExpression> {
        let operands = [then_value.into(), else_value.into()];
        let mut kind = merge_expression_types(&operands)?;
        if kind == ExpressionKind::Member {
            kind = ExpressionKind::StringOrNumeric;
        }

        let [then_value, else_value] = operands;
        ValueExpression::from_kind(
            format!("IIF({},{},{})", self.0, then_value, else_value),
            kind,
        )
    }
}

impl fmt::Display for LogicalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogicalExpression {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<LogicalExpression> for Expression {
    fn from(value: LogicalExpression) -> Self {
        Expression::Logical(value.0)
    }
}
