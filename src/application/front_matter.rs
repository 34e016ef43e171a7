//! Front matter blocks at the top of a document.
//!
//! Two forms are recognised: YAML-like `---` blocks holding `key: value`
//! lines and `- item` block lists, and TOML `+++` blocks.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::domain::document::Metadata;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontMatterError {
    #[error("invalid TOML front matter: {message}")]
    Toml { message: String },
}

/// Front matter split off a document.
#[derive(Debug, PartialEq)]
pub struct Extracted<'a> {
    pub metadata: Result<Metadata, FrontMatterError>,
    pub body: &'a str,
}

/// Split `content` into metadata and body.
///
/// A document without a block yields empty metadata and the whole content as
/// body. A malformed TOML block is reported through [`Extracted::metadata`]
/// while the body still excludes the block.
pub fn extract(content: &str) -> Extracted<'_> {
    match detect(content) {
        Some((block, body, Format::Toml)) => Extracted {
            metadata: parse_toml(block),
            body,
        },
        Some((block, body, Format::Yaml)) => Extracted {
            metadata: Ok(parse_yaml_like(block)),
            body,
        },
        None => Extracted {
            metadata: Ok(Metadata::default()),
            body: content,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Toml,
}

fn detect(content: &str) -> Option<(&str, &str, Format)> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();

    for (fence, format) in [("---", Format::Yaml), ("+++", Format::Toml)] {
        let Some(rest) = trimmed.strip_prefix(fence) else {
            continue;
        };
        if !rest.starts_with('\n') && !rest.starts_with("\r\n") {
            continue;
        }
        let closing = format!("\n{fence}");
        if let Some(end) = rest.find(&closing) {
            let block = rest[..end].trim();
            let after = &rest[end + closing.len()..];
            let body = after
                .strip_prefix("\r\n")
                .or_else(|| after.strip_prefix('\n'))
                .unwrap_or(after);
            return Some((block, body, format));
        }
    }

    None
}

fn parse_yaml_like(block: &str) -> Metadata {
    let mut fields = Map::new();
    // Key whose value was left empty; `- item` lines below it form a list.
    let mut list_key: Option<String> = None;

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(item) = line.strip_prefix('-') {
            if let Some(key) = list_key.as_ref() {
                push_list_item(&mut fields, key, item.trim());
            }
            continue;
        }

        list_key = None;
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = value.trim();
            if value.is_empty() {
                list_key = Some(key.to_string());
            }
            fields.insert(key.to_string(), parse_yaml_value(value));
        }
    }

    Metadata::from_map(fields)
}

fn push_list_item(fields: &mut Map<String, Value>, key: &str, item: &str) {
    if item.is_empty() {
        return;
    }
    let value = Value::String(unquote(item).unwrap_or(item).to_string());
    match fields.get_mut(key) {
        Some(Value::Array(items)) => items.push(value),
        _ => {
            fields.insert(key.to_string(), Value::Array(vec![value]));
        }
    }
}

fn parse_toml(block: &str) -> Result<Metadata, FrontMatterError> {
    let table: toml::Table = toml::from_str(block).map_err(|err| FrontMatterError::Toml {
        message: err.to_string(),
    })?;

    let fields = table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect();

    Ok(Metadata::from_map(fields))
}

/// Scalars become booleans, null, integers or floats; comma lists become
/// arrays; quoted text is unquoted; everything else stays a string.
fn parse_yaml_value(raw: &str) -> Value {
    if let Some(unquoted) = unquote(raw) {
        return Value::String(unquoted.to_string());
    }

    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw == "~" {
        return Value::Null;
    }

    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = raw.parse::<f64>()
        && let Some(num) = Number::from_f64(n)
    {
        return Value::Number(num);
    }

    if raw.contains(',') {
        let items = raw
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(unquote(item).unwrap_or(item).to_string()))
            .collect();
        return Value::Array(items);
    }

    Value::String(raw.to_string())
}

fn unquote(raw: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        raw.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_block_is_typed_and_stripped() {
        let content = "---\ntitle: \"Getting Started\"\ndraft: false\norder: 3\nweight: 1.5\ntags: a, b\nnote: ~\n---\n# Body\n";
        let extracted = extract(content);
        let metadata = extracted.metadata.expect("metadata");

        assert_eq!(metadata.title.as_deref(), Some("Getting Started"));
        assert_eq!(metadata.extra["draft"], json!(false));
        assert_eq!(metadata.extra["order"], json!(3));
        assert_eq!(metadata.extra["weight"], json!(1.5));
        assert_eq!(metadata.extra["tags"], json!(["a", "b"]));
        assert_eq!(metadata.extra["note"], Value::Null);
        assert_eq!(extracted.body, "# Body\n");
    }

    #[test]
    fn yaml_block_lists_are_collected_under_their_key() {
        let content = "---\ntitle: Lists\ntags:\n  - rust\n  - \"docs\"\nempty:\ndraft: true\n---\nBody";
        let metadata = extract(content).metadata.expect("metadata");

        assert_eq!(metadata.extra["tags"], json!(["rust", "docs"]));
        assert_eq!(metadata.extra["empty"], Value::Null);
        assert_eq!(metadata.extra["draft"], json!(true));
    }

    #[test]
    fn stray_list_items_are_ignored() {
        let content = "---\ntitle: x\n- orphan\n---\nBody";
        let metadata = extract(content).metadata.expect("metadata");

        assert_eq!(metadata.title.as_deref(), Some("x"));
        assert!(!metadata.extra.contains_key("orphan"));
    }

    #[test]
    fn toml_block_is_parsed() {
        let content = "+++\ntitle = \"Hello\"\ntags = [\"a\", \"b\"]\n+++\n\nBody";
        let extracted = extract(content);
        let metadata = extracted.metadata.expect("metadata");

        assert_eq!(metadata.title.as_deref(), Some("Hello"));
        assert_eq!(metadata.extra["tags"], json!(["a", "b"]));
        assert_eq!(extracted.body, "\nBody");
    }

    #[test]
    fn malformed_toml_reports_error_but_strips_block() {
        let extracted = extract("+++\ntitle = \n+++\nBody");
        assert!(extracted.metadata.is_err());
        assert_eq!(extracted.body, "Body");
    }

    #[test]
    fn content_without_block_is_untouched() {
        let extracted = extract("# Just content\n---\n");
        assert_eq!(extracted.metadata, Ok(Metadata::default()));
        assert_eq!(extracted.body, "# Just content\n---\n");
    }

    #[test]
    fn unterminated_block_is_treated_as_body() {
        let content = "---\ntitle: x\n";
        assert_eq!(extract(content).body, content);
    }
}
