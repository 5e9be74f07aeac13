//! Reply parsing cascade.
//!
//! Model replies are free text. Each tier is a pure function that either
//! recovers records or gives up; tiers run in order and the first success
//! wins. The last-resort arithmetic tier only runs when nothing earlier
//! produced a record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use tracing::{debug, warn};

use inkcalc_core::ParsedRecord;

use crate::arithmetic;
use crate::literal;

static LIST_OF_DICTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[\s*\{.*?\}\s*\]").unwrap());

static EXPR_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bexpr['"]?\s*:\s*(?:'([^']*)'|"([^"]*)")"#).unwrap());

static RESULT_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bresult['"]?\s*:\s*(?:'([^']*)'|"([^"]*)"|([^\s,}\]'"]+))"#).unwrap()
});

static ARITHMETIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+[+\-*/]\d+(?:[+\-*/]\d+)*").unwrap());

/// The tier that produced a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Literal,
    ExtractedJson,
    Fields,
    Arithmetic,
    Exhausted,
}

/// Run the full cascade over a model reply.
///
/// Returns the records (possibly empty) and the tier that produced them.
/// Every returned record has `assign` set, `false` unless the reply said so.
pub fn parse_reply(text: &str) -> (Vec<ParsedRecord>, Tier) {
    let structured = parse_literal_tier(text)
        .map(|records| (records, Tier::Literal))
        .or_else(|| parse_json_tier(text).map(|records| (records, Tier::ExtractedJson)))
        .or_else(|| parse_fields_tier(text).map(|records| (records, Tier::Fields)));

    match structured {
        Some((records, tier)) if !records.is_empty() => (records, tier),
        _ => match parse_arithmetic_tier(text) {
            Some(records) => (records, Tier::Arithmetic),
            None => {
                warn!("No tier could recover records from the model reply");
                (Vec::new(), Tier::Exhausted)
            }
        },
    }
}

fn to_records(items: &[Value]) -> Option<Vec<ParsedRecord>> {
    items
        .iter()
        .map(|item| item.as_object().map(ParsedRecord::from_map))
        .collect()
}

/// Tier 1: the whole reply is a literal list of mappings.
pub fn parse_literal_tier(text: &str) -> Option<Vec<ParsedRecord>> {
    match literal::parse_literal(text) {
        Ok(Value::Array(items)) => {
            let records = to_records(&items);
            if records.is_none() {
                debug!("Literal reply is a list but not of mappings");
            }
            records
        }
        Ok(other) => {
            debug!(kind = value_kind(&other), "Literal reply is not a list");
            None
        }
        Err(e) => {
            debug!(error = %e, "Direct literal parse failed");
            None
        }
    }
}

/// Tier 2: a `[ { ... } ]` span somewhere in the reply parses as JSON once
/// single quotes are swapped for double quotes, or failing that, as a literal.
pub fn parse_json_tier(text: &str) -> Option<Vec<ParsedRecord>> {
    let raw = LIST_OF_DICTS.find(text)?.as_str();
    let span = raw.replace('\'', "\"");
    match serde_json::from_str::<Vec<Value>>(&span) {
        Ok(items) => {
            let records = to_records(&items)?;
            debug!(json = %span, "Extracted JSON list from reply");
            Some(records)
        }
        Err(e) => {
            debug!(error = %e, "Extracted span is not valid JSON, trying literal");
            match literal::parse_literal(raw) {
                Ok(Value::Array(items)) => to_records(&items),
                _ => None,
            }
        }
    }
}

/// Tier 3: pick out `expr: '...'` and `result: ...` fields independently.
pub fn parse_fields_tier(text: &str) -> Option<Vec<ParsedRecord>> {
    let expr = first_group(&EXPR_FIELD, text)?;
    let result = first_group(&RESULT_FIELD, text)?;
    let result = coerce_scalar(result.trim());
    debug!(expr = %expr, result = %result, "Extracted fields from reply");
    Some(vec![ParsedRecord::new(expr, result)])
}

/// Tier 4: evaluate the first bare arithmetic chain in the reply.
pub fn parse_arithmetic_tier(text: &str) -> Option<Vec<ParsedRecord>> {
    let expr = ARITHMETIC.find(text)?.as_str();
    match arithmetic::evaluate(expr) {
        Ok(value) => {
            debug!(expr = %expr, value = %value, "Evaluated arithmetic from reply");
            Some(vec![ParsedRecord::new(expr, value)])
        }
        Err(e) => {
            debug!(expr = %expr, error = %e, "Arithmetic fallback failed");
            None
        }
    }
}

fn first_group<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    let caps = re.captures(text)?;
    (1..caps.len()).find_map(|i| caps.get(i)).map(|m| m.as_str())
}

/// Integer if it parses as one, else a finite float, else the text itself.
fn coerce_scalar(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::Number(i.into());
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
