//! Column values exchanged with SQLite.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;

/// Core value types for SQLite operations
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Reads the value as an integer the way `sqlite3_column_int64` does:
    /// reals truncate, text yields its leading integer (`"12abc"` is 12,
    /// `"3.5"` is 3). `None` for NULL and text without leading digits.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Real(v) => Some(*v as i64),
            Value::Text(v) => leading_integer(v),
            Value::Blob(v) => leading_integer(&String::from_utf8_lossy(v)),
            Value::Null => None,
        }
    }

    /// Reads the value as a double the way `sqlite3_column_double` does:
    /// text yields its leading numeric prefix. `None` for NULL and text
    /// without one.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            Value::Text(v) => leading_real(v),
            Value::Blob(v) => leading_real(&String::from_utf8_lossy(v)),
            Value::Null => None,
        }
    }

    /// Reads the value as text the way `sqlite3_column_text` does, so a
    /// REAL renders as `2.0` or `1.0e+20`. `None` only for NULL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Real(v) => Some(real_to_text(*v)),
            other => Some(other.to_string()),
        }
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Out-of-range prefixes clamp to the i64 bounds.
    let value = digits[..end].bytes().fold(0_i64, |acc, b| {
        let digit = i64::from(b - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        }
    });
    Some(value)
}

fn leading_real(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digits += frac_end - end - 1;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
        }
    }
    text[..end].parse::<f64>().ok()
}

/// SQLite's REAL to text conversion: `%!.15g`, which always keeps one
/// digit after the decimal point and pads the exponent to two digits.
fn real_to_text(v: f64) -> String {
    if v.is_nan() {
        return String::new();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    let scientific = format!("{v:.14e}");
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return scientific;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..15).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let decimals = usize::try_from(14 - exp).unwrap_or(0);
        trim_fraction(&format!("{v:.decimals$}"))
    }
}

fn trim_fraction(number: &str) -> String {
    match number.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            format!("{int}.{}", if frac.is_empty() { "0" } else { frac })
        }
        None => format!("{number}.0"),
    }
}

/// Canonical string form used in column maps. NULL renders as the empty
/// string; integers and reals use their shortest decimal form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => f.write_str(&String::from_utf8_lossy(v)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v.as_slice())),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Value::Blob(v.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_takes_leading_digits() {
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
        assert_eq!(Value::Real(2.9).as_integer(), Some(2));
        assert_eq!(Value::Text(" 42 ".into()).as_integer(), Some(42));
        assert_eq!(Value::Text("12abc".into()).as_integer(), Some(12));
        assert_eq!(Value::Text("3.5".into()).as_integer(), Some(3));
        assert_eq!(Value::Text("-8e2".into()).as_integer(), Some(-8));
        assert_eq!(Value::Text("99999999999999999999".into()).as_integer(), Some(i64::MAX));
        assert_eq!(Value::Text("abc".into()).as_integer(), None);
        assert_eq!(Value::Text("-".into()).as_integer(), None);
        assert_eq!(Value::Null.as_integer(), None);
    }

    #[test]
    fn real_takes_leading_number() {
        assert_eq!(Value::Integer(3).as_real(), Some(3.0));
        assert_eq!(Value::Text("1.25".into()).as_real(), Some(1.25));
        assert_eq!(Value::Text(" 2.5kg".into()).as_real(), Some(2.5));
        assert_eq!(Value::Text("1e3x".into()).as_real(), Some(1000.0));
        assert_eq!(Value::Text("4e".into()).as_real(), Some(4.0));
        assert_eq!(Value::Text(".".into()).as_real(), None);
        assert_eq!(Value::Text("zz".into()).as_real(), None);
    }

    #[test]
    fn text_renders_reals_like_sqlite() {
        assert_eq!(Value::Integer(3).as_text().as_deref(), Some("3"));
        assert_eq!(Value::Real(2.0).as_text().as_deref(), Some("2.0"));
        assert_eq!(Value::Real(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(Value::Real(0.1).as_text().as_deref(), Some("0.1"));
        assert_eq!(Value::Real(-12.75).as_text().as_deref(), Some("-12.75"));
        assert_eq!(Value::Real(1e20).as_text().as_deref(), Some("1.0e+20"));
        assert_eq!(Value::Real(1.5e-7).as_text().as_deref(), Some("1.5e-07"));
        assert_eq!(
            Value::Real(123456789012345678.0).as_text().as_deref(),
            Some("1.23456789012346e+17")
        );
        assert_eq!(Value::Null.as_text(), None);
    }

    #[test]
    fn display_is_shortest_decimal() {
        assert_eq!(Value::Integer(-12).to_string(), "-12");
        assert_eq!(Value::Real(2.0).to_string(), "2");
        assert_eq!(Value::Real(0.1).to_string(), "0.1");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(true), Value::Integer(1));
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }
}
