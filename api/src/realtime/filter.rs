//! Row filters in `column=op.value` form
//!
//! Supported operators: `eq`, `neq`, `gt`, `gte`, `lt`, `lte` and
//! `in.(a,b,c)`. Numbers compare numerically, everything else as text.

use std::cmp::Ordering;
use std::str::FromStr;

use serde_json::Value;

use crate::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FromStr for FilterOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(FilterOp::Eq),
            "neq" => Ok(FilterOp::Neq),
            "gt" => Ok(FilterOp::Gt),
            "gte" => Ok(FilterOp::Gte),
            "lt" => Ok(FilterOp::Lt),
            "lte" => Ok(FilterOp::Lte),
            "in" => Ok(FilterOp::In),
            other => Err(FilterError::UnknownOperator(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub column: String,
    pub op: FilterOp,
    /// One value, or several for `in`
    pub values: Vec<String>,
}

impl RowFilter {
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let malformed = || FilterError::Malformed(input.to_string());

        let (column, rest) = input.split_once('=').ok_or_else(malformed)?;
        let (op, raw_value) = rest.split_once('.').ok_or_else(malformed)?;
        let column = column.trim();
        if column.is_empty() {
            return Err(malformed());
        }

        let op: FilterOp = op.trim().parse()?;

        let values = if op == FilterOp::In {
            let inner = raw_value
                .strip_prefix('(')
                .and_then(|v| v.strip_suffix(')'))
                .ok_or_else(|| FilterError::InvalidList(raw_value.to_string()))?;
            let items: Vec<String> = inner
                .split(',')
                .map(|v| decode(v.trim()))
                .filter(|v| !v.is_empty())
                .collect();
            if items.is_empty() {
                return Err(FilterError::InvalidList(raw_value.to_string()));
            }
            items
        } else {
            vec![decode(raw_value)]
        };

        Ok(Self {
            column: column.to_string(),
            op,
            values,
        })
    }

    /// Evaluate against a JSON row. A missing column only matches `eq.null`.
    pub fn matches(&self, row: &Value) -> bool {
        let field = row.get(&self.column).unwrap_or(&Value::Null);

        match self.op {
            FilterOp::Eq => equals(field, &self.values[0]),
            FilterOp::Neq => !equals(field, &self.values[0]),
            FilterOp::In => self.values.iter().any(|v| equals(field, v)),
            FilterOp::Gt => compare(field, &self.values[0]) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                compare(field, &self.values[0]),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt => compare(field, &self.values[0]) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                compare(field, &self.values[0]),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

impl FromStr for RowFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RowFilter::parse(s)
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn equals(field: &Value, expected: &str) -> bool {
    match field {
        Value::Null => expected == "null",
        Value::Bool(b) => expected.eq_ignore_ascii_case(if *b { "true" } else { "false" }),
        Value::Number(n) => match (n.as_f64(), expected.parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => n.to_string() == expected,
        },
        Value::String(s) => s == expected,
        other => other.to_string() == expected,
    }
}

fn compare(field: &Value, expected: &str) -> Option<Ordering> {
    match field {
        Value::Number(n) => {
            let b = expected.parse::<f64>().ok()?;
            n.as_f64()?.partial_cmp(&b)
        }
        Value::String(s) => Some(s.as_str().cmp(expected)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_eq() {
        let f = RowFilter::parse("status=eq.needs_maintenance").unwrap();
        assert_eq!(f.column, "status");
        assert_eq!(f.op, FilterOp::Eq);
        assert_eq!(f.values, vec!["needs_maintenance".to_string()]);
    }

    #[test]
    fn parse_in_list() {
        let f = RowFilter::parse("status=in.(pending,confirmed)").unwrap();
        assert_eq!(f.op, FilterOp::In);
        assert_eq!(f.values.len(), 2);
    }

    #[test]
    fn parse_decodes_values() {
        let f = RowFilter::parse("notes=eq.front%20bumper").unwrap();
        assert_eq!(f.values[0], "front bumper");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            RowFilter::parse("status").unwrap_err(),
            FilterError::Malformed("status".to_string())
        );
        assert!(matches!(
            RowFilter::parse("status=like.foo"),
            Err(FilterError::UnknownOperator(_))
        ));
        assert!(matches!(
            RowFilter::parse("status=in.pending"),
            Err(FilterError::InvalidList(_))
        ));
        assert!(matches!(
            RowFilter::parse("status=in.()"),
            Err(FilterError::InvalidList(_))
        ));
        assert!(RowFilter::parse("=eq.x").is_err());
    }

    #[test]
    fn string_matching() {
        let row = json!({"status": "confirmed", "customer_id": "abc"});
        assert!(RowFilter::parse("status=eq.confirmed").unwrap().matches(&row));
        assert!(!RowFilter::parse("status=neq.confirmed").unwrap().matches(&row));
        assert!(RowFilter::parse("status=in.(pending,confirmed)")
            .unwrap()
            .matches(&row));
        assert!(!RowFilter::parse("status=in.(cancelled)").unwrap().matches(&row));
    }

    #[test]
    fn numeric_matching() {
        let row = json!({"total_cents": 22000});
        assert!(RowFilter::parse("total_cents=gt.10000").unwrap().matches(&row));
        assert!(RowFilter::parse("total_cents=gte.22000").unwrap().matches(&row));
        assert!(!RowFilter::parse("total_cents=lt.22000").unwrap().matches(&row));
        assert!(RowFilter::parse("total_cents=lte.22000").unwrap().matches(&row));
        assert!(RowFilter::parse("total_cents=eq.22000").unwrap().matches(&row));
        // numeric field against a non-numeric operand never orders
        assert!(!RowFilter::parse("total_cents=gt.abc").unwrap().matches(&row));
    }

    #[test]
    fn null_and_missing_columns() {
        let row = json!({"vehicle_id": null, "active": true});
        assert!(RowFilter::parse("vehicle_id=eq.null").unwrap().matches(&row));
        assert!(RowFilter::parse("missing=eq.null").unwrap().matches(&row));
        assert!(!RowFilter::parse("missing=eq.x").unwrap().matches(&row));
        assert!(RowFilter::parse("active=eq.true").unwrap().matches(&row));
    }
}
