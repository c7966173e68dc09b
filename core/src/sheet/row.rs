use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

lazy_static! {
    static ref LEADING_FLOAT: Regex =
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("leading float regex");
}

/// 表格中的一行，字段保持原始列顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoredRow(Map<String, Value>);

impl ScoredRow {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert, mainly for tests and synthetic rows.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field rendered as display text; missing and null become "".
    pub fn text(&self, key: &str) -> String {
        match self.0.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Numeric score, `None` when absent or unparsable.
    pub fn parsed_score(&self) -> Option<f64> {
        let v = match self.0.get("score")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_leading_float(s),
            _ => None,
        }?;
        (!v.is_nan()).then_some(v)
    }

    /// Lossy numeric score: anything unparsable counts as 0.
    pub fn score(&self) -> f64 {
        self.parsed_score().unwrap_or(0.0)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ScoredRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Parse the longest numeric prefix of `s`, ignoring leading whitespace.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let m = LEADING_FLOAT.find(s.trim_start())?;
    m.as_str().parse::<f64>().ok()
}
