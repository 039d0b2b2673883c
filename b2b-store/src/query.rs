use std::cmp::Ordering;

use serde_json::{Map, Value};

/// A stored row: a JSON object keyed by column name.
pub type Row = Map<String, Value>;

/// A single condition in a conjunctive filter.
///
/// A filter is a `&[Predicate]`; every predicate must hold for a row
/// to match. An empty filter matches every row.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`. A missing column compares as `null`.
    Eq { column: String, value: Value },
    /// `column IN (values)`. An empty list matches nothing.
    In { column: String, values: Vec<Value> },
    /// Case-insensitive substring match on a string column.
    Contains { column: String, needle: String },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Predicate::Contains {
            column: column.into(),
            needle: needle.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. }
            | Predicate::In { column, .. }
            | Predicate::Contains { column, .. } => column,
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        let cell = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Predicate::Eq { value, .. } => cell == value,
            Predicate::In { values, .. } => values.iter().any(|v| v == cell),
            Predicate::Contains { needle, .. } => cell
                .as_str()
                .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

/// True when every predicate holds for `row`.
pub fn matches_all(filter: &[Predicate], row: &Row) -> bool {
    filter.iter().all(|p| p.matches(row))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// A read against one table: filter, ordering and an optional window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Vec<Predicate>,
    pub order: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Vec<Predicate>) -> Self {
        self.filter = filter;
        self
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.filter.push(predicate);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

/// Total order over JSON cells used for `ORDER BY`.
///
/// Nulls sort first, then booleans, numbers, strings; arrays and
/// objects compare equal to each other.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Compare two rows by an `ORDER BY` list.
pub fn compare_rows(order: &[OrderBy], a: &Row, b: &Row) -> Ordering {
    for key in order {
        let left = a.get(&key.column).unwrap_or(&Value::Null);
        let right = b.get(&key.column).unwrap_or(&Value::Null);
        let ord = match key.direction {
            Direction::Asc => compare_values(left, right),
            Direction::Desc => compare_values(right, left),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
