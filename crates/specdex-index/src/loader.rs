//! Reading specification and markdown sources from disk.

use std::path::Path;

use serde_json::Value;

use crate::error::{IndexError, Result};

/// Parse a JSON or YAML specification file into a JSON tree.
///
/// `.yaml`/`.yml` files are read as YAML, `.json` as JSON; anything else is
/// tried as JSON first, then YAML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load_spec(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path).await?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => Ok(serde_json::from_str(&raw)?),
        Some("yaml" | "yml") => parse_yaml(&raw),
        _ => serde_json::from_str(&raw).or_else(|_| parse_yaml(&raw)),
    }
}

/// Read a markdown document as UTF-8 text.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn load_markdown(path: &Path) -> Result<String> {
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Default source id for a file: its file name.
#[must_use]
pub fn source_id(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Parse YAML, keeping mapping order and stringifying non-string keys such
/// as bare response codes.
///
/// # Errors
///
/// Returns an error if the text is not valid YAML.
pub fn parse_yaml(raw: &str) -> Result<Value> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(raw)?;
    yaml_to_json(yaml)
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n)?,
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Value> {
    if let Some(i) = n.as_i64() {
        Ok(Value::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::from(u))
    } else {
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| IndexError::Other(format!("unrepresentable YAML number: {n}")))
    }
}

fn yaml_key(key: serde_yaml::Value) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_owned()),
        other => Err(IndexError::Other(format!(
            "unsupported YAML mapping key: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_json_spec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.json");
        std::fs::write(&path, r#"{"info": {"title": "T", "version": "1"}}"#).unwrap();
        let spec = load_spec(&path).await.unwrap();
        assert_eq!(spec["info"]["title"], "T");
    }

    #[tokio::test]
    async fn loads_yaml_spec_with_numeric_keys_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.yaml");
        std::fs::write(
            &path,
            "openapi: 3.0.0\npaths:\n  /b:\n    get:\n      responses:\n        200:\n          description: ok\n        404:\n          description: missing\n  /a:\n    get: {}\n",
        )
        .unwrap();
        let spec = load_spec(&path).await.unwrap();
        let responses = spec["paths"]["/b"]["get"]["responses"].as_object().unwrap();
        assert_eq!(responses["200"]["description"], "ok");
        let paths: Vec<&String> = spec["paths"].as_object().unwrap().keys().collect();
        assert_eq!(paths, ["/b", "/a"]);
    }

    #[tokio::test]
    async fn unknown_extension_falls_back_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.txt");
        std::fs::write(&path, "info:\n  title: Fallback\n").unwrap();
        let spec = load_spec(&path).await.unwrap();
        assert_eq!(spec["info"]["title"], "Fallback");
    }

    #[tokio::test]
    async fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_spec(&path).await, Err(IndexError::Json(_))));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = load_spec(Path::new("/nonexistent/spec.json")).await.unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
    }

    #[test]
    fn source_id_is_file_name() {
        assert_eq!(source_id(Path::new("/tmp/docs/guide.md")), "guide.md");
    }
}
