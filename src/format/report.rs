//! Intermediate report tree.
//!
//! The formatter walk lowers a type node into this small IR once; each back
//! end then serializes it without re-traversing the type tree.

use serde_json::{Map, Value};

/// One rendered fragment of a report.
#[derive(Clone, Debug, PartialEq)]
pub enum Report {
    /// Fully rendered leaf text (a simple type, an enum, a message).
    Leaf(String),
    /// Fragments joined by a separator (compound subtypes, pair sides).
    Seq { sep: String, parts: Vec<Report> },
    /// A labelled fragment (`field: detail`, `key: detail`).
    Entry { label: String, detail: Box<Report> },
    /// A headed block with bracketed entries (`Class[...]`, `array(...)[...]`).
    Group { head: String, entries: Vec<Report> },
}

impl Report {
    pub fn leaf(text: impl Into<String>) -> Report {
        Report::Leaf(text.into())
    }

    pub fn entry(label: impl Into<String>, detail: Report) -> Report {
        Report::Entry {
            label: label.into(),
            detail: Box::new(detail),
        }
    }

    /// Serialize as a flat text report.
    pub fn to_text(&self) -> String {
        match self {
            Report::Leaf(text) => text.clone(),
            Report::Seq { sep, parts } => parts
                .iter()
                .map(Report::to_text)
                .collect::<Vec<_>>()
                .join(sep),
            Report::Entry { label, detail } => format!("{label}: {}", detail.to_text()),
            Report::Group { head, entries } => {
                if entries.is_empty() {
                    head.clone()
                } else {
                    let body = entries
                        .iter()
                        .map(Report::to_text)
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{head}[{body}]")
                }
            }
        }
    }

    /// Serialize as a nested container, mirroring the text structure:
    /// leaves become strings, sequences arrays, entries and groups
    /// single-key objects.
    pub fn to_value(&self) -> Value {
        match self {
            Report::Leaf(text) => Value::String(text.clone()),
            Report::Seq { parts, .. } => {
                if let [only] = parts.as_slice() {
                    only.to_value()
                } else {
                    Value::Array(parts.iter().map(Report::to_value).collect())
                }
            }
            Report::Entry { label, detail } => {
                let mut map = Map::new();
                map.insert(label.clone(), detail.to_value());
                Value::Object(map)
            }
            Report::Group { head, entries } => {
                if entries.is_empty() {
                    Value::String(head.clone())
                } else {
                    let body: Vec<Value> = entries.iter().map(Report::to_value).collect();
                    let mut map = Map::new();
                    map.insert(head.clone(), Value::Array(body));
                    Value::Object(map)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report::Group {
            head: "User".into(),
            entries: vec![
                Report::entry("age", Report::leaf("int(min: 1)")),
                Report::entry(
                    "tag",
                    Report::Seq {
                        sep: " || ".into(),
                        parts: vec![Report::leaf("int"), Report::leaf("string")],
                    },
                ),
            ],
        }
    }

    #[test]
    fn text_back_end_joins_and_brackets() {
        assert_eq!(
            sample().to_text(),
            "User[age: int(min: 1), tag: int || string]"
        );
    }

    #[test]
    fn container_back_end_mirrors_the_structure() {
        assert_eq!(
            sample().to_value(),
            serde_json::json!({
                "User": [
                    {"age": "int(min: 1)"},
                    {"tag": ["int", "string"]},
                ]
            })
        );
    }

    #[test]
    fn single_part_sequences_collapse_in_containers() {
        let seq = Report::Seq {
            sep: " => ".into(),
            parts: vec![Report::leaf("int")],
        };
        assert_eq!(seq.to_value(), serde_json::json!("int"));
        assert_eq!(seq.to_text(), "int");
    }

    #[test]
    fn empty_groups_render_as_their_head() {
        let group = Report::Group {
            head: "array".into(),
            entries: vec![],
        };
        assert_eq!(group.to_text(), "array");
        assert_eq!(group.to_value(), serde_json::json!("array"));
    }
}
