//! RSQL filter expressions
//!
//! The repository filters collections with RSQL. These helpers quote values
//! and parenthesise compound expressions so filters need not be assembled by
//! hand.
//!
//! ```
//! use pass_client::rsql;
//!
//! let filter = rsql::and([
//!     rsql::equals("submitted", "true"),
//!     rsql::has_member("grants", "42"),
//! ]);
//! assert_eq!(filter, "(submitted=='true');(grants=hasmember='42')");
//! ```

use std::fmt::Display;

/// `field=='value'`
pub fn equals(field: &str, value: impl Display) -> String {
    comparison(field, "==", value)
}

/// `field!='value'`
pub fn not_equals(field: &str, value: impl Display) -> String {
    comparison(field, "!=", value)
}

pub fn gt(field: &str, value: impl Display) -> String {
    comparison(field, "=gt=", value)
}

pub fn gte(field: &str, value: impl Display) -> String {
    comparison(field, "=ge=", value)
}

pub fn lt(field: &str, value: impl Display) -> String {
    comparison(field, "=lt=", value)
}

pub fn lte(field: &str, value: impl Display) -> String {
    comparison(field, "=le=", value)
}

/// `field=in=('a','b')`
pub fn is_in<I, V>(field: &str, values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: Display,
{
    format!("{}=in=({})", field, quote_all(values))
}

/// `field=out=('a','b')`
pub fn out<I, V>(field: &str, values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: Display,
{
    format!("{}=out=({})", field, quote_all(values))
}

/// A to-many relationship or list attribute contains `value`
pub fn has_member(field: &str, value: impl Display) -> String {
    comparison(field, "=hasmember=", value)
}

pub fn has_no_member(field: &str, value: impl Display) -> String {
    comparison(field, "=hasnomember=", value)
}

/// `field=isnull=true`, or `=isnull=false` to require a value
pub fn is_null(field: &str, null: bool) -> String {
    format!("{}=isnull={}", field, null)
}

/// Conjunction; each operand is parenthesised
pub fn and<I, S>(expressions: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    join(expressions, ";")
}

/// Disjunction; each operand is parenthesised
pub fn or<I, S>(expressions: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    join(expressions, ",")
}

/// Single-quote `value`, escaping `'` and `\`
pub fn quote(value: impl Display) -> String {
    let raw = value.to_string();
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('\'');
    for c in raw.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

fn comparison(field: &str, operator: &str, value: impl Display) -> String {
    format!("{}{}{}", field, operator, quote(value))
}

fn quote_all<I, V>(values: I) -> String
where
    I: IntoIterator<Item = V>,
    V: Display,
{
    values.into_iter().map(quote).collect::<Vec<_>>().join(",")
}

fn join<I, S>(expressions: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    expressions
        .into_iter()
        .map(|expression| format!("({})", expression.as_ref()))
        .collect::<Vec<_>>()
        .join(separator)
}
