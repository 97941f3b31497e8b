use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use super::error::{DatasetError, Result};

/// Column holding the calendar year a season finished in.
pub const SEASON_END_YEAR: &str = "season_end_year";
/// Column holding the club name.
pub const TEAM: &str = "team";

// ---------------------------------------------------------------------------
// Value – a single cell of the league table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, inferred from the raw text the way a dataframe
/// library infers dtypes on read.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// Empty cell.
    Null,
}

impl Value {
    /// Infer a typed value from a raw text field.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
        if raw.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        Value::String(raw.to_string())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view used by the form calculations.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// -- Total order so tables compare with `==` even when they hold NaN --

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

/// Renders the text form written to CSV. Whole floats keep their `.0` so a
/// saved file reads back with the same types.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the whole standings dataset
// ---------------------------------------------------------------------------

/// One team's line in one season, values in column order.
pub type Record = Vec<Value>;

/// Ordered records sharing the column schema discovered from the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column names in header order.
    pub columns: Vec<String>,
    /// Rows in file order; each has exactly `columns.len()` values.
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Table { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Table::column_index`] but a missing column is a schema error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DatasetError::missing_column(name))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// New table with the same columns holding the rows that satisfy `keep`,
    /// in their original order.
    pub fn retain_where(&self, mut keep: impl FnMut(&Record) -> bool) -> Table {
        let rows = self.rows.iter().filter(|r| keep(r)).cloned().collect();
        Table::new(self.columns.clone(), rows)
    }

    /// Distinct season-end years present in the table, ascending.
    pub fn seasons(&self) -> Result<BTreeSet<i64>> {
        let idx = self.require_column(SEASON_END_YEAR)?;
        Ok(self
            .rows
            .iter()
            .filter_map(|r| r[idx].as_i64())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_infers_types() {
        assert_eq!(Value::parse(""), Value::Null);
        assert_eq!(Value::parse("2024"), Value::Integer(2024));
        assert_eq!(Value::parse("-3"), Value::Integer(-3));
        assert_eq!(Value::parse("1.5"), Value::Float(1.5));
        assert_eq!(Value::parse("True"), Value::Bool(true));
        assert_eq!(Value::parse("false"), Value::Bool(false));
        assert_eq!(
            Value::parse("Manchester City"),
            Value::String("Manchester City".into())
        );
    }

    #[test]
    fn display_reparses_to_same_value() {
        for v in [
            Value::Integer(80),
            Value::Float(80.0),
            Value::Float(0.1),
            Value::Float(1e-7),
            Value::Bool(true),
            Value::String("Arsenal".into()),
            Value::Null,
        ] {
            assert_eq!(Value::parse(&v.to_string()), v, "value {v:?}");
        }
    }

    #[test]
    fn whole_float_keeps_decimal_point() {
        assert_eq!(Value::Float(80.0).to_string(), "80.0");
    }

    #[test]
    fn integer_and_float_are_distinct() {
        assert_ne!(Value::Integer(1), Value::Float(1.0));
    }

    #[test]
    fn seasons_requires_column() {
        let t = Table::new(vec!["team".into()], vec![vec![Value::String("A".into())]]);
        assert!(matches!(t.seasons(), Err(DatasetError::Schema(_))));
    }

    #[test]
    fn seasons_are_sorted_and_distinct() {
        let t = Table::new(
            vec![SEASON_END_YEAR.into()],
            vec![
                vec![Value::Integer(2023)],
                vec![Value::Integer(2021)],
                vec![Value::Integer(2023)],
            ],
        );
        let seasons: Vec<i64> = t.seasons().unwrap().into_iter().collect();
        assert_eq!(seasons, vec![2021, 2023]);
    }
}
