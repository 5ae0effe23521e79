//! Best-effort context extraction from a raw OpenAPI document.
//!
//! JSON documents are read structurally.  Anything else (usually YAML) goes
//! through line heuristics that recover the title, version and path list.
//! Extraction never fails: unusable input yields a mostly-empty context.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*title:[ \t]*["']?([^"'\r\n]+?)["']?[ \t\r]*$"#).expect("valid title regex")
});

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*version:[ \t]*["']?([^"'\r\n]+?)["']?[ \t\r]*$"#).expect("valid version regex")
});

/// One declared path with its operation keys, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEntry {
    pub path: String,
    pub operations: Vec<String>,
}

/// Normalized summary of an OpenAPI document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpecContext {
    /// The `info` object as declared.
    pub info: Map<String, Value>,
    pub title: String,
    pub version: String,
    pub paths: Vec<PathEntry>,
    /// `components.securitySchemes`, keyed by scheme name.
    pub security_schemes: Map<String, Value>,
    pub schema_names: Vec<String>,
    /// OAuth2 authorization-code scopes across all security schemes.
    pub scopes: Vec<String>,
}

impl SpecContext {
    pub fn path_names(&self) -> Vec<&str> {
        self.paths.iter().map(|p| p.path.as_str()).collect()
    }

    pub fn security_scheme_names(&self) -> Vec<&str> {
        self.security_schemes.keys().map(String::as_str).collect()
    }
}

/// Extract a [`SpecContext`] from spec text.
pub fn extract_context(spec: &str) -> SpecContext {
    match serde_json::from_str::<Value>(spec) {
        Ok(doc) => from_json(&doc),
        Err(e) => {
            debug!(error = %e, "spec is not JSON, using text heuristics");
            from_text(spec)
        }
    }
}

fn object<'a>(value: Option<&'a Value>) -> Option<&'a Map<String, Value>> {
    value.and_then(Value::as_object)
}

fn keys(value: Option<&Value>) -> Vec<String> {
    object(value)
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default()
}

fn from_json(doc: &Value) -> SpecContext {
    let info = object(doc.get("info")).cloned().unwrap_or_default();
    let text_field = |key: &str| {
        info.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let title = text_field("title");
    let version = text_field("version");

    let paths = object(doc.get("paths"))
        .map(|paths| {
            paths
                .iter()
                .map(|(path, item)| PathEntry {
                    path: path.clone(),
                    operations: keys(Some(item)),
                })
                .collect()
        })
        .unwrap_or_default();

    let components = doc.get("components");
    let security_schemes = object(components.and_then(|c| c.get("securitySchemes")))
        .cloned()
        .unwrap_or_default();
    let schema_names = keys(components.and_then(|c| c.get("schemas")));

    let mut scopes: Vec<String> = Vec::new();
    for scheme in security_schemes.values() {
        let flow_scopes = scheme
            .get("flows")
            .and_then(|f| f.get("authorizationCode"))
            .and_then(|f| f.get("scopes"));
        for scope in keys(flow_scopes) {
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
    }

    SpecContext {
        info,
        title,
        version,
        paths,
        security_schemes,
        schema_names,
        scopes,
    }
}

fn capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn mapping_key(trimmed: &str) -> &str {
    trimmed
        .split(':')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
}

fn from_text(spec: &str) -> SpecContext {
    let title = capture(&TITLE_RE, spec);
    let version = capture(&VERSION_RE, spec);

    let mut info = Map::new();
    if !title.is_empty() {
        info.insert("title".into(), Value::String(title.clone()));
    }
    if !version.is_empty() {
        info.insert("version".into(), Value::String(version.clone()));
    }

    SpecContext {
        info,
        title,
        version,
        paths: text_paths(spec),
        ..SpecContext::default()
    }
}

fn text_paths(spec: &str) -> Vec<PathEntry> {
    let mut lines = spec.lines().skip_while(|l| !l.trim().starts_with("paths:"));
    let Some(paths_line) = lines.next() else {
        return Vec::new();
    };
    // The block ends at the next key indented no deeper than `paths:`.
    let block_indent = indent_of(paths_line);

    let mut paths: Vec<PathEntry> = Vec::new();
    // (indent of the current path line, indent of its direct children)
    let mut current: Option<(usize, Option<usize>)> = None;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = indent_of(line);
        if indent <= block_indent {
            break;
        }
        let key = mapping_key(trimmed);

        if key.starts_with('/') {
            paths.push(PathEntry {
                path: key.to_string(),
                operations: Vec::new(),
            });
            current = Some((indent, None));
            continue;
        }

        let Some((path_indent, child_indent)) = current.as_mut() else {
            continue;
        };
        if indent <= *path_indent {
            current = None;
            continue;
        }
        let child = *child_indent.get_or_insert(indent);
        if indent == child && HTTP_METHODS.contains(&key) {
            if let Some(entry) = paths.last_mut() {
                entry.operations.push(key.to_string());
            }
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETSTORE_JSON: &str = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Petstore", "version": "1.2.0", "description": "Pets"},
        "paths": {
            "/pets": {"get": {}, "post": {}},
            "/pets/{id}": {"get": {}, "delete": {}},
            "/health": {"get": {}}
        },
        "components": {
            "schemas": {"Pet": {}, "Error": {}},
            "securitySchemes": {
                "oauth": {
                    "type": "oauth2",
                    "flows": {
                        "authorizationCode": {
                            "authorizationUrl": "https://example.com/auth",
                            "tokenUrl": "https://example.com/token",
                            "scopes": {"read:pets": "Read", "write:pets": "Write"}
                        }
                    }
                },
                "apiKey": {"type": "apiKey", "in": "header", "name": "X-Key"}
            }
        }
    }"#;

    const PETSTORE_YAML: &str = r#"openapi: 3.0.0
info:
  title: "Petstore"
  version: "1.2.0"
paths:
  /pets:
    get:
      summary: List pets
      responses:
        '200':
          description: ok
    post:
      summary: Create a pet
  /pets/{id}:
    get:
      parameters:
        - name: id
components:
  schemas:
    Pet:
      type: object
"#;

    #[test]
    fn json_paths_keep_declared_order() {
        let ctx = extract_context(PETSTORE_JSON);
        assert_eq!(ctx.path_names(), vec!["/pets", "/pets/{id}", "/health"]);
        assert_eq!(ctx.paths[0].operations, vec!["get", "post"]);
        assert_eq!(ctx.paths[1].operations, vec!["get", "delete"]);
    }

    #[test]
    fn json_info_and_components() {
        let ctx = extract_context(PETSTORE_JSON);
        assert_eq!(ctx.title, "Petstore");
        assert_eq!(ctx.version, "1.2.0");
        assert_eq!(ctx.info["description"], "Pets");
        assert_eq!(ctx.schema_names, vec!["Pet", "Error"]);
        assert_eq!(ctx.security_scheme_names(), vec!["oauth", "apiKey"]);
        assert_eq!(ctx.scopes, vec!["read:pets", "write:pets"]);
    }

    #[test]
    fn json_without_sections_is_empty() {
        let ctx = extract_context(r#"{"openapi": "3.1.0"}"#);
        assert!(ctx.title.is_empty());
        assert!(ctx.paths.is_empty());
        assert!(ctx.security_schemes.is_empty());
        assert!(ctx.scopes.is_empty());
    }

    #[test]
    fn non_object_json_is_tolerated() {
        let ctx = extract_context("[1, 2, 3]");
        assert_eq!(ctx, SpecContext::default());
    }

    #[test]
    fn non_object_path_item_has_no_operations() {
        let ctx = extract_context(r#"{"paths": {"/a": null, "/b": {"put": {}}}}"#);
        assert_eq!(ctx.paths[0].operations, Vec::<String>::new());
        assert_eq!(ctx.paths[1].operations, vec!["put"]);
    }

    #[test]
    fn scopes_are_deduplicated_across_schemes() {
        let spec = r#"{"components": {"securitySchemes": {
            "a": {"flows": {"authorizationCode": {"scopes": {"read": "", "write": ""}}}},
            "b": {"flows": {"authorizationCode": {"scopes": {"write": "", "admin": ""}}}},
            "c": {"flows": {"clientCredentials": {"scopes": {"ignored": ""}}}}
        }}}"#;
        let ctx = extract_context(spec);
        assert_eq!(ctx.scopes, vec!["read", "write", "admin"]);
    }

    #[test]
    fn yaml_fallback_recovers_title_version_paths() {
        let ctx = extract_context(PETSTORE_YAML);
        assert_eq!(ctx.title, "Petstore");
        assert_eq!(ctx.version, "1.2.0");
        assert_eq!(ctx.path_names(), vec!["/pets", "/pets/{id}"]);
        assert_eq!(ctx.paths[0].operations, vec!["get", "post"]);
        assert_eq!(ctx.paths[1].operations, vec!["get"]);
        assert!(ctx.security_schemes.is_empty());
        assert!(ctx.schema_names.is_empty());
        assert!(ctx.scopes.is_empty());
        assert_eq!(ctx.info["title"], "Petstore");
    }

    #[test]
    fn yaml_quoted_paths_are_unquoted() {
        let spec = "paths:\n  \"/users\":\n    get: {}\n";
        let ctx = extract_context(spec);
        assert_eq!(ctx.path_names(), vec!["/users"]);
    }

    #[test]
    fn yaml_paths_key_may_carry_a_comment() {
        let spec = "openapi: 3.0.0\npaths: # all routes\n  /pets:\n    get: {}\ncomponents:\n  schemas: {}\n";
        let ctx = extract_context(spec);
        assert_eq!(ctx.path_names(), vec!["/pets"]);
        assert_eq!(ctx.paths[0].operations, vec!["get"]);
    }

    #[test]
    fn yaml_indented_paths_block_ends_at_sibling_key() {
        let spec = "api:\n  paths:\n    /orders:\n      post: {}\n    /orders/{id}:\n      get: {}\n  servers:\n    - url: /v1\n";
        let ctx = extract_context(spec);
        assert_eq!(ctx.path_names(), vec!["/orders", "/orders/{id}"]);
        assert_eq!(ctx.paths[0].operations, vec!["post"]);
    }

    #[test]
    fn garbage_never_panics() {
        for input in ["", "{", "paths:", "::::", "title:\nversion:", "\u{0}\u{1}"] {
            let ctx = extract_context(input);
            assert!(ctx.security_schemes.is_empty());
            assert!(ctx.schema_names.is_empty());
            assert!(ctx.scopes.is_empty());
        }
    }
}
