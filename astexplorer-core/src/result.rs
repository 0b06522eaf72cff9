use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use std::ops::Deref;

/// Indent used by the explorer output pane.
pub const DEFAULT_INDENT: usize = 4;

/// The decoded output of the external parser. No schema is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParseResult(Value);

impl ParseResult {
    /// Decode the entry point's serialized output.
    ///
    /// Nesting depth is unbounded: ASTs for long expression chains easily go
    /// past serde_json's default limit of 128. Deep input grows the stack on
    /// the heap instead of overflowing it.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        Ok(Self(value))
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Multi-line rendering with `indent` spaces per level.
    ///
    /// Key order follows the decoded value, so the output is stable for equal
    /// inputs and re-decodes to an equal value.
    pub fn render(&self, indent: usize) -> String {
        render_value(&self.0, indent)
    }
}

impl From<Value> for ParseResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Deref for ParseResult {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

pub fn render_value(value: &Value, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(pad.as_bytes()));

    // Serializing a Value into a Vec cannot fail: keys are always strings.
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }

    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
