//! Documents & Queries

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter, Result as FmtResult},
};

use serde_json::{Map, Value};

/// Top-level document fields.
pub type Fields = Map<String, Value>;

/// Named collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Recurring weekly classes.
    Courses,
    /// Dated class instances, each carrying its roster.
    Schedules,
    /// Submitted bookings.
    Bookings,
    /// User profiles owned by the auth provider.
    Users,
    /// Cart rows, pending until booked.
    Cart,
}

impl Collection {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Schedules => "schedules",
            Self::Bookings => "bookings",
            Self::Users => "users",
            Self::Cart => "cart",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// A stored document: its id plus schemaless fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Equal.
    Eq,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

/// A single `field <op> value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    fn matches(&self, fields: &Fields) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };

        if self.op == FilterOp::Eq {
            return compare_values(actual, &self.value) == Some(Ordering::Equal)
                || actual == &self.value;
        }

        let Some(ordering) = compare_values(actual, &self.value) else {
            return false;
        };

        match self.op {
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Le => ordering != Ordering::Greater,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Ge => ordering != Ordering::Less,
            FilterOp::Eq => ordering == Ordering::Equal,
        }
    }
}

/// Sort direction of an [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest value first.
    Ascending,
    /// Largest value first.
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Conjunction of filters with an ordering.
///
/// Documents lacking an `order_by` field are excluded from results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters.iter().all(|filter| filter.matches(fields))
            && self
                .order_by
                .iter()
                .all(|order| fields.contains_key(&order.field))
    }

    /// Order documents per `order_by`; the sort is stable.
    pub fn sort(&self, documents: &mut [Document]) {
        documents.sort_by(|a, b| {
            for order in &self.order_by {
                let ordering = match (a.fields.get(&order.field), b.fields.get(&order.field)) {
                    (Some(left), Some(right)) => {
                        compare_values(left, right).unwrap_or(Ordering::Equal)
                    }
                    _ => Ordering::Equal,
                };

                let ordering = match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                };

                if ordering != Ordering::Equal {
                    return ordering;
                }
            }

            Ordering::Equal
        });
    }
}

/// Compare two values of the same kind; mixed kinds are incomparable.
pub(crate) fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}
