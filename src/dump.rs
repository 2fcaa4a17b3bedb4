//! Literal value dumper.
//!
//! Renders a raw `serde_json::Value` as a short human literal for error
//! reports. This is deliberately not a JSON serializer: strings may render
//! unquoted, containers wrap only past a width limit, and deep nesting is
//! elided instead of expanded.

use serde_json::Value;

const ELISION: &str = "...";

/// Rendering options for literals inside reports.
#[derive(Clone, Debug)]
pub struct Dumper {
    /// Wrap string literals in single quotes.
    pub quote_strings: bool,
    /// Spaces per nesting level once a container wraps.
    pub indent_width: usize,
    /// Inline a container only while its rendering fits this many columns.
    pub wrap_width: usize,
    /// Containers nested deeper than this render as an elision marker.
    pub max_depth: usize,
}

impl Default for Dumper {
    fn default() -> Self {
        Self {
            quote_strings: true,
            indent_width: 2,
            wrap_width: 60,
            max_depth: 8,
        }
    }
}

impl Dumper {
    pub fn dump(&self, value: &Value) -> String {
        self.dump_at(value, 0)
    }

    fn dump_at(&self, value: &Value, depth: usize) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => {
                if self.quote_strings {
                    format!("'{s}'")
                } else {
                    s.clone()
                }
            }
            Value::Array(items) => {
                if depth >= self.max_depth {
                    return ELISION.to_string();
                }
                let parts: Vec<String> =
                    items.iter().map(|v| self.dump_at(v, depth + 1)).collect();
                self.container("[", "]", parts, depth)
            }
            Value::Object(map) => {
                if depth >= self.max_depth {
                    return ELISION.to_string();
                }
                let parts: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", self.dump_at(v, depth + 1)))
                    .collect();
                self.container("{", "}", parts, depth)
            }
        }
    }

    fn container(&self, open: &str, close: &str, parts: Vec<String>, depth: usize) -> String {
        let inline = format!("{open}{}{close}", parts.join(", "));
        // Already-wrapped children force the wrapped form too.
        if inline.len() <= self.wrap_width && !inline.contains('\n') {
            return inline;
        }
        let pad = " ".repeat(self.indent_width * (depth + 1));
        let pad_close = " ".repeat(self.indent_width * depth);
        let body = parts
            .iter()
            .map(|p| format!("{pad}{p}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{open}\n{body}\n{pad_close}{close}")
    }
}
