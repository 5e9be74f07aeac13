use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Expression shown when nothing could be recognized in the image.
pub const PLACEHOLDER_EXPR: &str = "No expression detected";
/// Result shown alongside [`PLACEHOLDER_EXPR`].
pub const PLACEHOLDER_RESULT: &str = "N/A";

/// A user-assigned variable value: either text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Number(Number),
    Text(String),
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Number(n) => write!(f, "{}", n),
            VarValue::Text(s) => f.write_str(s),
        }
    }
}

/// Variable name -> value. Sorted so its serialized form is canonical.
pub type Variables = BTreeMap<String, VarValue>;

/// Body of a calculate request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Data URI (`data:image/png;base64,...`) or header-prefixed base64 image.
    pub data: String,
    #[serde(default)]
    pub dict_of_vars: Variables,
}

/// An image that has been base64-decoded and successfully decoded to pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A record as recovered from the model reply, before normalization.
///
/// `expr` and `result` keep whatever JSON shape the reply used; `assign`
/// defaults to `false` when the reply did not mention it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub expr: Option<Value>,
    pub result: Option<Value>,
    pub assign: bool,
}

impl ParsedRecord {
    pub fn new(expr: impl Into<Value>, result: impl Into<Value>) -> Self {
        Self {
            expr: Some(expr.into()),
            result: Some(result.into()),
            assign: false,
        }
    }

    /// Build a record from a parsed mapping. Unknown keys are ignored and
    /// `null` values count as absent.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let field = |key: &str| map.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            expr: field("expr"),
            result: field("result"),
            assign: map.get("assign").map(is_truthy).unwrap_or(false),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// A normalized record as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionRecord {
    pub expr: String,
    pub result: String,
    pub assign: bool,
}

impl ExpressionRecord {
    /// The record substituted when no expression was recognized.
    pub fn placeholder() -> Self {
        Self {
            expr: PLACEHOLDER_EXPR.to_string(),
            result: PLACEHOLDER_RESULT.to_string(),
            assign: false,
        }
    }
}

impl From<ExpressionRecord> for ParsedRecord {
    fn from(record: ExpressionRecord) -> Self {
        Self {
            expr: Some(Value::String(record.expr)),
            result: Some(Value::String(record.result)),
            assign: record.assign,
        }
    }
}

/// Render a reply value as caller-facing text. `null` has no text form.
///
/// Integral floats keep a trailing `.0` so `3.0` and `3` stay distinguishable.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(number_to_text(n)),
        other => Some(other.to_string()),
    }
}

fn number_to_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 => {
            format!("{:.1}", f)
        }
        _ => n.to_string(),
    }
}
