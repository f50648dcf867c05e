// Conseil entity query builder.
//
// Queries are plain data: a field projection, a predicate list, an ordering
// list, aggregations and a row limit. Every builder method takes the query
// by value and hands back the extended query, so a caller can fold a filter
// list into one query without intermediate mutable state.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::Error;

/// Default row limit of a blank query.
pub const DEFAULT_LIMIT: usize = 100;

// ── Predicate operations ─────────────────────────────────────────────

/// Comparison operations understood by the Conseil data endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum Operation {
    Between,
    Like,
    In,
    Eq,
    Gt,
    Lt,
    Before,
    After,
    StartsWith,
    EndsWith,
    Isnull,
}

impl Operation {
    /// Number of values the operation expects, or `None` for a variable set.
    pub fn arity(self) -> Option<usize> {
        match self {
            Self::Between => Some(2),
            Self::In => None,
            Self::Isnull => Some(0),
            Self::Like
            | Self::Eq
            | Self::Gt
            | Self::Lt
            | Self::Before
            | Self::After
            | Self::StartsWith
            | Self::EndsWith => Some(1),
        }
    }

    /// Human label used in menus and table output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Between => "is between",
            Self::Like => "is like",
            Self::In => "is in",
            Self::Eq => "is",
            Self::Gt => "is greater than",
            Self::Lt => "is less than",
            Self::Before => "is before",
            Self::After => "is after",
            Self::StartsWith => "starts with",
            Self::EndsWith => "ends with",
            Self::Isnull => "is null",
        }
    }
}

/// Sort direction for an ordering clause.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Aggregation functions applied server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AggregationFunction {
    Sum,
    Count,
    Max,
    Min,
    Avg,
}

/// Response encoding requested from the data endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputType {
    #[default]
    Json,
    Csv,
}

// ── Query clauses ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub operation: Operation,
    pub set: Vec<String>,
    pub inverse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub field: String,
    pub function: AggregationFunction,
}

/// A Conseil entity query, serialized as the POST body of the data endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConseilQuery {
    pub fields: Vec<String>,
    pub predicates: Vec<Predicate>,
    pub order_by: Vec<Ordering>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregation: Vec<Aggregation>,
    pub limit: usize,
    #[serde(default)]
    pub output: OutputType,
}

impl Default for ConseilQuery {
    fn default() -> Self {
        Self::blank()
    }
}

impl ConseilQuery {
    /// An empty query: every field, no predicates, no ordering, 100 rows.
    pub fn blank() -> Self {
        Self {
            fields: Vec::new(),
            predicates: Vec::new(),
            order_by: Vec::new(),
            aggregation: Vec::new(),
            limit: DEFAULT_LIMIT,
            output: OutputType::Json,
        }
    }

    /// Append fields to the projection, skipping ones already present.
    pub fn add_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }

    /// Append a predicate, validating the value count against the operation.
    pub fn add_predicate<I, S>(
        mut self,
        field: impl Into<String>,
        operation: Operation,
        set: I,
        inverse: bool,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field = field.into();
        let set: Vec<String> = set.into_iter().map(Into::into).collect();

        match operation.arity() {
            Some(0) if !set.is_empty() => {
                return Err(Error::invalid_query(format!(
                    "{operation} on '{field}' takes no values, got {}",
                    set.len()
                )));
            }
            Some(n) if n > 0 && set.len() != n => {
                return Err(Error::invalid_query(format!(
                    "{operation} on '{field}' needs {n} value(s), got {}",
                    set.len()
                )));
            }
            None if set.is_empty() => {
                return Err(Error::invalid_query(format!(
                    "{operation} on '{field}' needs at least one value"
                )));
            }
            _ => {}
        }

        self.predicates.push(Predicate {
            field,
            operation,
            set,
            inverse,
            precision: None,
            group: None,
        });
        Ok(self)
    }

    /// Append an ordering clause. A field already ordered is re-ordered in place.
    pub fn add_ordering(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        let field = field.into();
        if let Some(existing) = self.order_by.iter_mut().find(|o| o.field == field) {
            existing.direction = direction;
        } else {
            self.order_by.push(Ordering { field, direction });
        }
        self
    }

    /// Set the row limit. Zero is rejected by the server, so it is refused here.
    pub fn set_limit(mut self, limit: usize) -> Result<Self, Error> {
        if limit == 0 {
            return Err(Error::invalid_query("limit must be at least 1"));
        }
        self.limit = limit;
        Ok(self)
    }

    pub fn set_output(mut self, output: OutputType) -> Self {
        self.output = output;
        self
    }

    /// Aggregate `field` with `function`. The field is added to the projection if missing.
    pub fn add_aggregation(mut self, field: impl Into<String>, function: AggregationFunction) -> Self {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field.clone());
        }
        self.aggregation.retain(|a| a.field != field);
        self.aggregation.push(Aggregation { field, function });
        self
    }
}
