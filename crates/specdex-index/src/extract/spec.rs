//! OpenAPI 3.x / Swagger 2.x walker.
//!
//! Emits chunks in a stable order: info, root-level sections, paths and
//! operations in source order, schemas, then aggregated components.
//! Malformed nodes are counted and skipped.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::ExtractionReport;
use crate::chunk::{ChunkConfig, ChunkType, DocumentChunk};
use crate::tokens::TokenCounter;
use crate::windower::ChunkWindower;

const VENDOR_PREFIX: &str = "x-";
const MAX_ENUM_SAMPLES: usize = 5;

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const COMPONENT_KINDS: [&str; 8] = [
    "parameters",
    "requestBodies",
    "responses",
    "examples",
    "headers",
    "securitySchemes",
    "links",
    "callbacks",
];

/// Swagger 2.x root sections aggregated like their 3.x component kinds.
const LEGACY_COMPONENT_KINDS: [(&str, &str); 3] = [
    ("parameters", "parameters"),
    ("responses", "responses"),
    ("securityDefinitions", "securitySchemes"),
];

/// Recursively drop every object key carrying the vendor-extension prefix.
#[must_use]
pub fn strip_vendor_extensions(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !k.starts_with(VENDOR_PREFIX))
                .map(|(k, v)| (k.clone(), strip_vendor_extensions(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_vendor_extensions).collect()),
        other => other.clone(),
    }
}

#[derive(Debug, Clone)]
pub struct SpecExtractor {
    counter: TokenCounter,
    windower: ChunkWindower,
    config: ChunkConfig,
}

impl SpecExtractor {
    #[must_use]
    pub fn new(counter: TokenCounter, config: ChunkConfig) -> Self {
        let windower = ChunkWindower::from_config(counter.clone(), &config);
        Self {
            counter,
            windower,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Walk a parsed specification tree and emit typed chunks.
    #[must_use]
    pub fn extract(&self, spec: &Value) -> ExtractionReport {
        let pruned;
        let spec = if self.config.prune_vendor_extensions {
            pruned = strip_vendor_extensions(spec);
            &pruned
        } else {
            spec
        };

        let mut walk = Walk {
            root: spec,
            counter: &self.counter,
            windower: &self.windower,
            min_tokens: self.config.min_tokens,
            report: ExtractionReport::default(),
        };
        if spec.is_object() {
            walk.document();
        } else {
            walk.skip("$", "document root is not an object");
        }
        walk.report
    }
}

struct Walk<'a> {
    root: &'a Value,
    counter: &'a TokenCounter,
    windower: &'a ChunkWindower,
    min_tokens: usize,
    report: ExtractionReport,
}

impl<'a> Walk<'a> {
    fn document(&mut self) {
        self.info();
        self.servers();
        self.tags();
        self.external_docs();
        self.paths();
        self.schemas();
        self.components();
    }

    fn skip(&mut self, node: &str, reason: &str) {
        debug!(node, reason, "skipping malformed spec node");
        self.report.skipped += 1;
    }

    fn push(&mut self, text: &str, chunk_type: ChunkType, metadata: &BTreeMap<String, String>) {
        for piece in self.windower.split(text) {
            if piece.trim().is_empty() {
                continue;
            }
            self.report.chunks.push(DocumentChunk::new(
                self.counter,
                piece,
                chunk_type,
                metadata.clone(),
            ));
        }
    }

    /// Like [`Self::push`], but when the text needs several windows, pieces
    /// under `min_tokens` are dropped.
    fn push_dropping_small(
        &mut self,
        text: &str,
        chunk_type: ChunkType,
        metadata: &BTreeMap<String, String>,
    ) {
        let pieces = self.windower.split(text);
        if pieces.len() == 1 {
            self.push(text, chunk_type, metadata);
            return;
        }
        for piece in pieces {
            let chunk = DocumentChunk::new(self.counter, piece, chunk_type, metadata.clone());
            if chunk.token_count() >= self.min_tokens {
                self.report.chunks.push(chunk);
            }
        }
    }

    fn info(&mut self) {
        let Some(info) = self.root.get("info") else {
            return;
        };
        if !info.is_object() {
            self.skip("info", "not an object");
            return;
        }
        let Some(title) = text(info, "title") else {
            self.skip("info", "missing title");
            return;
        };

        let mut lines = vec![format!("API: {title}")];
        if let Some(version) = text(info, "version") {
            lines.push(format!("Version: {version}"));
        }
        if let Some(format) = text(self.root, "openapi")
            .map(|v| format!("OpenAPI {v}"))
            .or_else(|| text(self.root, "swagger").map(|v| format!("Swagger {v}")))
        {
            lines.push(format!("Specification: {format}"));
        }
        if let Some(description) = text(info, "description") {
            lines.push(format!("Description: {description}"));
        }
        if let Some(contact) = info.get("contact").filter(|c| c.is_object()) {
            let parts: Vec<String> = [
                text(contact, "name").map(str::to_owned),
                text(contact, "email").map(|e| format!("<{e}>")),
                text(contact, "url").map(|u| format!("({u})")),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !parts.is_empty() {
                lines.push(format!("Contact: {}", parts.join(" ")));
            }
        }
        if let Some(license) = info.get("license").and_then(|l| text(l, "name")) {
            lines.push(format!("License: {license}"));
        }
        if let Some(terms) = text(info, "termsOfService") {
            lines.push(format!("Terms of service: {terms}"));
        }
        extension_lines(info, &mut lines);
        extension_lines(self.root, &mut lines);

        let metadata = metadata(&[("section", "info"), ("title", title)]);
        self.push(&lines.join("\n"), ChunkType::Info, &metadata);
    }

    fn servers(&mut self) {
        let mut lines = Vec::new();
        if let Some(servers) = self.root.get("servers") {
            match servers.as_array() {
                Some(list) => {
                    for server in list {
                        match text(server, "url") {
                            Some(url) => lines.push(match text(server, "description") {
                                Some(d) => format!("- {url}: {d}"),
                                None => format!("- {url}"),
                            }),
                            None => self.skip("servers[]", "missing url"),
                        }
                    }
                }
                None => self.skip("servers", "not an array"),
            }
        }

        if let Some(host) = text(self.root, "host") {
            let base_path = text(self.root, "basePath").unwrap_or("");
            let schemes = str_list(self.root.get("schemes"));
            if schemes.is_empty() {
                lines.push(format!("- https://{host}{base_path}"));
            } else {
                for scheme in schemes {
                    lines.push(format!("- {scheme}://{host}{base_path}"));
                }
            }
        }

        if !lines.is_empty() {
            let text = format!("Servers:\n{}", lines.join("\n"));
            self.push(&text, ChunkType::Servers, &metadata(&[("section", "servers")]));
        }
    }

    fn tags(&mut self) {
        let Some(tags) = self.root.get("tags") else {
            return;
        };
        let Some(list) = tags.as_array() else {
            self.skip("tags", "not an array");
            return;
        };
        let mut lines = Vec::new();
        for tag in list {
            match text(tag, "name") {
                Some(name) => lines.push(match text(tag, "description") {
                    Some(d) => format!("- {name}: {d}"),
                    None => format!("- {name}"),
                }),
                None => self.skip("tags[]", "missing name"),
            }
        }
        if !lines.is_empty() {
            let text = format!("API tags:\n{}", lines.join("\n"));
            self.push(&text, ChunkType::Tags, &metadata(&[("section", "tags")]));
        }
    }

    fn external_docs(&mut self) {
        let Some(docs) = self.root.get("externalDocs") else {
            return;
        };
        let Some(url) = text(docs, "url") else {
            self.skip("externalDocs", "missing url");
            return;
        };
        let mut lines = vec![format!("External documentation: {url}")];
        if let Some(description) = text(docs, "description") {
            lines.push(description.to_owned());
        }
        self.push(
            &lines.join("\n"),
            ChunkType::ExternalDocs,
            &metadata(&[("section", "external_docs")]),
        );
    }

    fn paths(&mut self) {
        let Some(paths) = self.root.get("paths") else {
            return;
        };
        let Some(paths) = paths.as_object() else {
            self.skip("paths", "not an object");
            return;
        };
        for (path, item) in paths {
            if item.is_object() {
                self.path_item(path, item);
            } else {
                self.skip(path, "path item is not an object");
            }
        }
    }

    fn path_item(&mut self, path: &str, item: &'a Value) {
        let path_meta = metadata(&[("section", "paths"), ("path", path)]);

        let mut lines = vec![format!("Path: {path}")];
        if let Some(summary) = text(item, "summary") {
            lines.push(format!("Summary: {summary}"));
        }
        if let Some(description) = text(item, "description") {
            lines.push(format!("Description: {description}"));
        }
        if let Some(servers) = item.get("servers").and_then(Value::as_array) {
            let urls: Vec<&str> = servers.iter().filter_map(|s| text(s, "url")).collect();
            if !urls.is_empty() {
                lines.push(format!("Servers: {}", urls.join(", ")));
            }
        }
        extension_lines(item, &mut lines);
        if lines.len() > 1 {
            self.push(&lines.join("\n"), ChunkType::PathMetadata, &path_meta);
        }

        if let Some(params) = item.get("parameters") {
            let lines = self.parameter_lines(path, params);
            if !lines.is_empty() {
                let text = format!("Shared parameters for {path}:\n{}", lines.join("\n"));
                self.push(&text, ChunkType::PathParameters, &path_meta);
            }
        }

        let Some(entries) = item.as_object() else {
            return;
        };
        for (key, operation) in entries {
            if !HTTP_METHODS.contains(&key.as_str()) {
                continue;
            }
            let method = key.to_uppercase();
            if operation.is_object() {
                self.operation(path, &method, operation);
            } else {
                self.skip(&format!("{method} {path}"), "operation is not an object");
            }
        }
    }

    fn operation(&mut self, path: &str, method: &str, op: &'a Value) {
        let operation_id = text(op, "operationId").unwrap_or("");
        let tags = str_list(op.get("tags"));
        let op_meta = metadata(&[
            ("section", "paths"),
            ("path", path),
            ("method", method),
            ("operation_id", operation_id),
            ("tags", &tags.join(",")),
        ]);
        let endpoint = format!("{method} {path}");

        let mut lines = vec![format!("Endpoint: {endpoint}")];
        if !operation_id.is_empty() {
            lines.push(format!("Operation ID: {operation_id}"));
        }
        if !tags.is_empty() {
            lines.push(format!("Tags: {}", tags.join(", ")));
        }
        if let Some(summary) = text(op, "summary") {
            lines.push(format!("Summary: {summary}"));
        }
        if let Some(description) = text(op, "description") {
            lines.push(format!("Description: {description}"));
        }
        if op.get("deprecated").and_then(Value::as_bool) == Some(true) {
            lines.push("Deprecated: yes".to_owned());
        }
        if let Some(security) = op.get("security").and_then(Value::as_array) {
            let schemes: Vec<&str> = security
                .iter()
                .filter_map(Value::as_object)
                .flat_map(Map::keys)
                .map(String::as_str)
                .collect();
            if !schemes.is_empty() {
                lines.push(format!("Security: {}", schemes.join(", ")));
            }
        }
        extension_lines(op, &mut lines);
        self.push(&lines.join("\n"), ChunkType::OperationMetadata, &op_meta);

        if let Some(params) = op.get("parameters") {
            let lines = self.parameter_lines(&endpoint, params);
            if !lines.is_empty() {
                let text = format!("Parameters for {endpoint}:\n{}", lines.join("\n"));
                self.push(&text, ChunkType::OperationParameters, &op_meta);
            }
        }

        let body = self.request_body_lines(&endpoint, op);
        if !body.is_empty() {
            let text = format!("Request body for {endpoint}:\n{}", body.join("\n"));
            self.push(&text, ChunkType::OperationRequestBody, &op_meta);
        }

        let responses = self.response_lines(&endpoint, op);
        if !responses.is_empty() {
            let text = format!("Responses for {endpoint}:\n{}", responses.join("\n"));
            self.push(&text, ChunkType::OperationResponses, &op_meta);
        }
    }

    /// One line per non-body parameter. Body parameters belong to the
    /// request-body chunk.
    fn parameter_lines(&mut self, owner: &str, params: &Value) -> Vec<String> {
        let Some(list) = params.as_array() else {
            self.skip(owner, "parameters is not an array");
            return Vec::new();
        };
        let mut lines = Vec::new();
        for param in list {
            if let Some(reference) = param.get("$ref").and_then(Value::as_str) {
                lines.push(format!("- {} (shared parameter)", ref_name(reference)));
                continue;
            }
            let (Some(name), Some(location)) = (text(param, "name"), text(param, "in")) else {
                self.skip(owner, "parameter without name or location");
                continue;
            };
            if location == "body" {
                continue;
            }
            let required = param.get("required").and_then(Value::as_bool) == Some(true);
            let schema = param.get("schema").unwrap_or(param);
            let mut line = format!(
                "- {name} (in {location}, {}, {})",
                if required { "required" } else { "optional" },
                type_label(schema)
            );
            if let Some(description) = text(param, "description") {
                line.push_str(": ");
                line.push_str(description);
            }
            if let Some(values) = enum_samples(schema) {
                line.push_str(&format!("; values: {values}"));
            }
            line.push_str(&extensions_inline(param));
            lines.push(line);
        }
        lines
    }

    fn request_body_lines(&mut self, endpoint: &str, op: &Value) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(body) = op.get("requestBody") {
            if let Some(reference) = body.get("$ref").and_then(Value::as_str) {
                lines.push(format!("See {}", ref_name(reference)));
            } else if body.is_object() {
                let required = body.get("required").and_then(Value::as_bool) == Some(true);
                lines.push(format!("Required: {}", yes_no(required)));
                if let Some(description) = text(body, "description") {
                    lines.push(format!("Description: {description}"));
                }
                if let Some(content) = body.get("content").and_then(Value::as_object) {
                    for (content_type, media) in content {
                        lines.push(media_line(content_type, media));
                    }
                }
                extension_lines(body, &mut lines);
            } else {
                self.skip(endpoint, "requestBody is not an object");
            }
        }

        let body_params = op
            .get("parameters")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|p| p.get("in").and_then(Value::as_str) == Some("body"));
        for param in body_params {
            let name = text(param, "name").unwrap_or("body");
            let required = param.get("required").and_then(Value::as_bool) == Some(true);
            lines.push(format!("Body parameter {name} (required: {})", yes_no(required)));
            if let Some(description) = text(param, "description") {
                lines.push(format!("Description: {description}"));
            }
            let schema = param.get("schema");
            let label = schema.map_or_else(|| "any".to_owned(), type_label);
            let example = schema.is_some_and(has_example);
            for content_type in self.media_types(op, "consumes") {
                lines.push(format!(
                    "- {content_type}: schema {label}, example: {}",
                    yes_no(example)
                ));
            }
        }
        lines
    }

    fn response_lines(&mut self, endpoint: &str, op: &Value) -> Vec<String> {
        let Some(responses) = op.get("responses") else {
            return Vec::new();
        };
        let Some(responses) = responses.as_object() else {
            self.skip(endpoint, "responses is not an object");
            return Vec::new();
        };

        let mut lines = Vec::new();
        for (status, response) in responses {
            if let Some(reference) = response.get("$ref").and_then(Value::as_str) {
                lines.push(format!("- {status}: see {}", ref_name(reference)));
                continue;
            }
            if !response.is_object() {
                self.skip(&format!("{endpoint} {status}"), "response is not an object");
                continue;
            }
            let mut line = format!(
                "- {status}: {}",
                text(response, "description").unwrap_or("no description")
            );
            if let Some(content) = response.get("content").and_then(Value::as_object) {
                let types: Vec<String> = content
                    .iter()
                    .map(|(ct, media)| match media.get("schema") {
                        Some(schema) => format!("{ct} ({})", type_label(schema)),
                        None => ct.clone(),
                    })
                    .collect();
                if !types.is_empty() {
                    line.push_str(&format!(". Content: {}", types.join(", ")));
                }
                let example = content.values().any(media_has_example);
                line.push_str(&format!(". Example: {}", yes_no(example)));
            } else if let Some(schema) = response.get("schema") {
                let types = self.media_types(op, "produces");
                line.push_str(&format!(
                    ". Content: {} ({})",
                    types.join(", "),
                    type_label(schema)
                ));
                let example = response
                    .get("examples")
                    .and_then(Value::as_object)
                    .is_some_and(|e| !e.is_empty())
                    || has_example(schema);
                line.push_str(&format!(". Example: {}", yes_no(example)));
            }
            if let Some(headers) = response.get("headers").and_then(Value::as_object)
                && !headers.is_empty()
            {
                let names: Vec<&str> = headers.keys().map(String::as_str).collect();
                line.push_str(&format!(". Headers: {}", names.join(", ")));
            }
            line.push_str(&extensions_inline(response));
            lines.push(line);
        }
        lines
    }

    /// Swagger 2.x media types for an operation: its own list, else the
    /// root list, else JSON.
    fn media_types(&self, op: &Value, key: &str) -> Vec<String> {
        let own = str_list(op.get(key));
        let types = if own.is_empty() {
            str_list(self.root.get(key))
        } else {
            own
        };
        if types.is_empty() {
            vec!["application/json".to_owned()]
        } else {
            types.into_iter().map(str::to_owned).collect()
        }
    }

    fn schemas(&mut self) {
        let sources = [
            ("components.schemas", self.root.get("components").and_then(|c| c.get("schemas"))),
            ("definitions", self.root.get("definitions")),
        ];
        for (node, schemas) in sources {
            let Some(schemas) = schemas else {
                continue;
            };
            let Some(schemas) = schemas.as_object() else {
                self.skip(node, "not an object");
                continue;
            };
            for (name, schema) in schemas {
                if schema.is_object() {
                    self.schema(name, schema);
                } else {
                    self.skip(name, "schema is not an object");
                }
            }
        }
    }

    fn schema(&mut self, name: &str, schema: &Value) {
        let schema_meta = metadata(&[("section", "schemas"), ("schema_name", name)]);
        let required = str_list(schema.get("required"));

        let mut lines = vec![format!("Schema: {name}")];
        let mut composed = false;
        for (key, label) in [("allOf", "All of"), ("oneOf", "One of"), ("anyOf", "Any of")] {
            if let Some(parts) = schema.get(key).and_then(Value::as_array) {
                let names: Vec<String> = parts.iter().map(type_label).collect();
                lines.push(format!("{label}: {}", names.join(", ")));
                composed = true;
            }
        }
        if !composed || schema.get("type").is_some() {
            lines.push(format!("Type: {}", base_type_label(schema)));
        }
        if let Some(description) = text(schema, "description") {
            lines.push(format!("Description: {description}"));
        }
        if !required.is_empty() {
            lines.push(format!("Required: {}", required.join(", ")));
        }
        if let Some(values) = enum_samples(schema) {
            lines.push(format!("Values: {values}"));
        }
        if let Some(discriminator) = schema
            .get("discriminator")
            .and_then(|d| text(d, "propertyName").or_else(|| d.as_str()))
        {
            lines.push(format!("Discriminator: {discriminator}"));
        }
        extension_lines(schema, &mut lines);
        self.push(&lines.join("\n"), ChunkType::SchemaSummary, &schema_meta);

        let Some(properties) = schema.get("properties") else {
            return;
        };
        let Some(properties) = properties.as_object() else {
            self.skip(name, "properties is not an object");
            return;
        };
        let mut lines = Vec::new();
        for (prop, prop_schema) in properties {
            if !prop_schema.is_object() {
                self.skip(&format!("{name}.{prop}"), "property is not an object");
                continue;
            }
            let mut line = format!("- {prop} ({}", type_label(prop_schema));
            if required.contains(&prop.as_str()) {
                line.push_str(", required");
            }
            line.push(')');
            if let Some(description) = text(prop_schema, "description") {
                line.push_str(": ");
                line.push_str(description);
            }
            if let Some(values) = enum_samples(prop_schema) {
                line.push_str(&format!("; values: {values}"));
            }
            line.push_str(&extensions_inline(prop_schema));
            lines.push(line);
        }
        if !lines.is_empty() {
            let text = format!("Properties of {name}:\n{}", lines.join("\n"));
            self.push_dropping_small(&text, ChunkType::SchemaProperties, &schema_meta);
        }
    }

    fn components(&mut self) {
        if let Some(components) = self.root.get("components") {
            if components.is_object() {
                for kind in COMPONENT_KINDS {
                    if let Some(entries) = components.get(kind) {
                        self.component_group(kind, entries);
                    }
                }
            } else {
                self.skip("components", "not an object");
            }
        }
        for (key, kind) in LEGACY_COMPONENT_KINDS {
            if let Some(entries) = self.root.get(key) {
                self.component_group(kind, entries);
            }
        }
    }

    fn component_group(&mut self, kind: &str, entries: &Value) {
        let Some(entries) = entries.as_object() else {
            self.skip(kind, "component group is not an object");
            return;
        };
        let mut lines = Vec::new();
        for (name, entry) in entries {
            if entry.is_object() {
                lines.push(format!(
                    "- {name}: {}{}",
                    component_summary(kind, entry),
                    extensions_inline(entry)
                ));
            } else {
                self.skip(&format!("{kind}.{name}"), "component is not an object");
            }
        }
        if !lines.is_empty() {
            let text = format!("Components ({kind}):\n{}", lines.join("\n"));
            let meta = metadata(&[("section", "components"), ("component_type", kind)]);
            self.push(&text, ChunkType::Components, &meta);
        }
    }
}

fn metadata(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

/// Non-empty trimmed string field of an object node.
fn text<'v>(node: &'v Value, key: &str) -> Option<&'v str> {
    node.get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn str_list(node: Option<&Value>) -> Vec<&str> {
    node.and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn extension_lines(node: &Value, lines: &mut Vec<String>) {
    if let Some(map) = node.as_object() {
        for (key, value) in map.iter().filter(|(k, _)| k.starts_with(VENDOR_PREFIX)) {
            lines.push(format!("{key}: {}", render_value(value)));
        }
    }
}

fn extensions_inline(node: &Value) -> String {
    let mut lines = Vec::new();
    extension_lines(node, &mut lines);
    if lines.is_empty() {
        String::new()
    } else {
        format!(" [{}]", lines.join("; "))
    }
}

/// Declared type of a schema as shown in chunk text: referenced name for
/// `$ref`, `array<item>` for arrays, composition listing, `type(format)`.
fn type_label(schema: &Value) -> String {
    if !schema.is_object() {
        return "any".to_owned();
    }
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        return ref_name(reference).to_owned();
    }
    for key in ["allOf", "oneOf", "anyOf"] {
        if let Some(parts) = schema.get(key).and_then(Value::as_array) {
            let names: Vec<String> = parts.iter().map(type_label).collect();
            return format!("{key}[{}]", names.join(", "));
        }
    }
    base_type_label(schema)
}

fn base_type_label(schema: &Value) -> String {
    let base = match schema.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("|"),
        _ if schema.get("properties").is_some() => "object".to_owned(),
        _ => "any".to_owned(),
    };
    if base == "array" {
        let item = schema
            .get("items")
            .map_or_else(|| "any".to_owned(), type_label);
        return format!("array<{item}>");
    }
    match text(schema, "format") {
        Some(format) => format!("{base}({format})"),
        None => base,
    }
}

fn enum_samples(schema: &Value) -> Option<String> {
    let values = schema.get("enum")?.as_array()?;
    if values.is_empty() {
        return None;
    }
    let mut samples: Vec<String> = values
        .iter()
        .take(MAX_ENUM_SAMPLES)
        .map(render_value)
        .collect();
    if values.len() > MAX_ENUM_SAMPLES {
        samples.push("...".to_owned());
    }
    Some(samples.join(", "))
}

fn has_example(schema: &Value) -> bool {
    schema.get("example").is_some()
}

fn media_has_example(media: &Value) -> bool {
    media.get("example").is_some()
        || media
            .get("examples")
            .and_then(Value::as_object)
            .is_some_and(|e| !e.is_empty())
        || media.get("schema").is_some_and(has_example)
}

fn media_line(content_type: &str, media: &Value) -> String {
    let schema = media
        .get("schema")
        .map_or_else(|| "none".to_owned(), type_label);
    format!(
        "- {content_type}: schema {schema}, example: {}",
        yes_no(media_has_example(media))
    )
}

fn component_summary(kind: &str, entry: &Value) -> String {
    if let Some(reference) = entry.get("$ref").and_then(Value::as_str) {
        return format!("see {}", ref_name(reference));
    }
    let mut parts: Vec<String> = Vec::new();
    match kind {
        "parameters" | "headers" => {
            if let Some(location) = text(entry, "in") {
                parts.push(format!("in {location}"));
            }
            parts.push(type_label(entry.get("schema").unwrap_or(entry)));
            if entry.get("required").and_then(Value::as_bool) == Some(true) {
                parts.push("required".to_owned());
            }
        }
        "securitySchemes" => {
            for key in ["type", "scheme", "bearerFormat", "in", "name", "flow"] {
                if let Some(value) = text(entry, key) {
                    parts.push(format!("{key} {value}"));
                }
            }
            if let Some(flows) = entry.get("flows").and_then(Value::as_object) {
                let names: Vec<&str> = flows.keys().map(String::as_str).collect();
                parts.push(format!("flows {}", names.join(", ")));
            }
        }
        "requestBodies" | "responses" => {
            if let Some(content) = entry.get("content").and_then(Value::as_object) {
                let types: Vec<&str> = content.keys().map(String::as_str).collect();
                parts.push(format!("content {}", types.join(", ")));
            } else if let Some(schema) = entry.get("schema") {
                parts.push(format!("schema {}", type_label(schema)));
            }
        }
        "examples" => {
            if let Some(summary) = text(entry, "summary") {
                parts.push(summary.to_owned());
            }
            if let Some(url) = text(entry, "externalValue") {
                parts.push(format!("external {url}"));
            }
        }
        "links" => {
            if let Some(target) = text(entry, "operationId").or_else(|| text(entry, "operationRef")) {
                parts.push(format!("targets {target}"));
            }
        }
        "callbacks" => {
            if let Some(map) = entry.as_object() {
                let expressions: Vec<&str> = map
                    .keys()
                    .filter(|k| !k.starts_with(VENDOR_PREFIX))
                    .map(String::as_str)
                    .collect();
                if !expressions.is_empty() {
                    parts.push(format!("on {}", expressions.join(", ")));
                }
            }
        }
        _ => {}
    }
    if let Some(description) = text(entry, "description") {
        parts.push(description.to_owned());
    }
    if parts.is_empty() {
        "no details".to_owned()
    } else {
        parts.join("; ")
    }
}
