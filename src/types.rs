//! Plain value types shared by the query and response sides.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MdxError, MdxResult};

/// Scalar carried by members and cells. Absence of a value is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MdxValue {
    Number(f64),
    Text(String),
}

impl MdxValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MdxValue::Number(n) => Some(*n),
            MdxValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MdxValue::Text(s) => Some(s),
            MdxValue::Number(_) => None,
        }
    }

    /// Numbers when the text parses as one, text otherwise.
    pub fn infer(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) if !raw.trim().is_empty() => MdxValue::Number(n),
            _ => MdxValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for MdxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MdxValue::Number(n) => write!(f, "{}", n),
            MdxValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MdxValue {
    fn from(value: &str) -> Self {
        MdxValue::Text(value.to_string())
    }
}

impl From<String> for MdxValue {
    fn from(value: String) -> Self {
        MdxValue::Text(value)
    }
}

impl From<f64> for MdxValue {
    fn from(value: f64) -> Self {
        MdxValue::Number(value)
    }
}

impl From<i64> for MdxValue {
    fn from(value: i64) -> Self {
        MdxValue::Number(value as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "<>")]
    NotEqual,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::NotEqual => "<>",
            ComparisonOperator::Equal => "=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOperator {
    type Err = MdxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(ComparisonOperator::LessThan),
            "<=" => Ok(ComparisonOperator::LessThanOrEqual),
            "<>" => Ok(ComparisonOperator::NotEqual),
            "=" => Ok(ComparisonOperator::Equal),
            ">" => Ok(ComparisonOperator::GreaterThan),
            ">=" => Ok(ComparisonOperator::GreaterThanOrEqual),
            other => Err(MdxError::InvalidFilter(format!(
                "operator {} detected. It must be one of <, <=, <>, =, >, >=.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
    /// Ascending, breaking the hierarchy.
    Basc,
    /// Descending, breaking the hierarchy.
    Bdesc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
            SortDirection::Basc => "BASC",
            SortDirection::Bdesc => "BDESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = MdxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            "BASC" => Ok(SortDirection::Basc),
            "BDESC" => Ok(SortDirection::Bdesc),
            other => Err(MdxError::InvalidQuery(format!(
                "sort direction {} is not supported",
                other
            ))),
        }
    }
}

/// Restriction or grain hint for one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub level_expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_operator: Option<ComparisonOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_value: Option<MdxValue>,
    #[serde(default)]
    pub include_all: bool,
    #[serde(default)]
    pub include_total_count: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_keys: Vec<MdxValue>,
}

impl Filter {
    pub fn new(level_expression: impl Into<String>) -> Self {
        Self {
            level_expression: level_expression.into(),
            ..Default::default()
        }
    }

    pub fn include_all(mut self) -> Self {
        self.include_all = true;
        self
    }

    pub fn include_total_count(mut self) -> Self {
        self.include_total_count = true;
        self
    }

    pub fn members(mut self, keys: impl IntoIterator<Item = impl Into<MdxValue>>) -> Self {
        self.member_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn compare(mut self, operator: ComparisonOperator, value: Option<MdxValue>) -> Self {
        self.comparison_operator = Some(operator);
        self.comparison_value = value;
        self
    }

    /// Whether this filter restricts an axis rather than only shaping grain.
    pub fn has_condition(&self) -> bool {
        self.comparison_operator.is_some() || !self.member_keys.is_empty()
    }
}

static COMPARISON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*([<>=]{1,2})\s*([a-zA-Z0-9() .,'/-]+)$").unwrap());
static MEMBER_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&\[([a-zA-Z0-9() .,'/-]+)\]$").unwrap());
static INCLUDE_ALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(children|members)$").unwrap());
static ORDER_BY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i) (B?(?:ASC|DESC))$").unwrap());

/// Parses `<level>[.members|.children][&[key]][ <op> <value>]`.
impl FromStr for Filter {
    type Err = MdxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut raw = s.trim();
        let mut filter = Filter::default();

        if let Some(caps) = COMPARISON_RE.captures(raw) {
            let operator: ComparisonOperator = caps[1].parse()?;
            let value = caps[2].trim();
            filter.comparison_operator = Some(operator);
            filter.comparison_value = (!value.is_empty()).then(|| MdxValue::infer(value));
            raw = &raw[..raw.len() - caps[0].len()];
        }

        if let Some(caps) = MEMBER_KEY_RE.captures(raw) {
            filter.member_keys = vec![MdxValue::infer(&caps[1])];
            raw = &raw[..raw.len() - caps[0].len()];
        }

        if let Some(caps) = INCLUDE_ALL_RE.captures(raw) {
            filter.include_all = caps[1].eq_ignore_ascii_case("members");
            raw = &raw[..raw.len() - caps[0].len()];
        }

        let raw = raw.trim();
        if !(raw.starts_with('[') && raw.ends_with(']')) {
            return Err(MdxError::InvalidFilter(format!(
                "{} detected. It must be a level expression.",
                s
            )));
        }

        filter.level_expression = raw.to_string();
        Ok(filter)
    }
}

/// One ordering key; entries without a level expression are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    #[serde(default)]
    pub level_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
}

impl OrderBy {
    pub fn new(level_expression: impl Into<String>) -> Self {
        Self {
            level_expression: Some(level_expression.into()),
            sort_direction: None,
        }
    }

    pub fn asc(level_expression: impl Into<String>) -> Self {
        Self::new(level_expression).direction(SortDirection::Asc)
    }

    pub fn desc(level_expression: impl Into<String>) -> Self {
        Self::new(level_expression).direction(SortDirection::Desc)
    }

    pub fn direction(mut self, direction: SortDirection) -> Self {
        self.sort_direction = Some(direction);
        self
    }
}

/// Parses `<level>[ ASC|DESC|BASC|BDESC]`.
impl FromStr for OrderBy {
    type Err = MdxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        match ORDER_BY_RE.captures(raw) {
            Some(caps) => {
                let direction: SortDirection = caps[1].parse()?;
                let level = raw[..raw.len() - caps[0].len()].trim();
                Ok(OrderBy::new(level).direction(direction))
            }
            None => Ok(OrderBy::new(raw)),
        }
    }
}

/// Builds qualified attribute names for one dimension.
#[derive(Debug, Clone)]
pub struct Dimension {
    name: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn attribute(&self, name: &str, hierarchy: Option<&str>) -> String {
        match hierarchy {
            Some(hierarchy) => format!("[{}].[{}].[{}]", self.name, hierarchy, name),
            None => format!("[{}].[{}]", self.name, name),
        }
    }
}

pub fn measure(name: &str) -> String {
    format!("[Measures].[{}]", name)
}

/// Validates a textual filter list up front, failing on the first bad entry.
pub fn parse_filters<'a>(raw: impl IntoIterator<Item = &'a str>) -> MdxResult<Vec<Filter>> {
    raw.into_iter()
        .filter(|line| !line.trim().is_empty())
        .map(str::parse)
        .collect()
}
