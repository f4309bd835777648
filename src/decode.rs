//! Schema-checked YAML decoding with deferred validation.
//!
//! Parsing goes through `serde_json::Value` so the same tree can be walked
//! for validation, merged with an overlay, and finally deserialized into the
//! typed document. Syntax errors are fatal immediately; schema findings are
//! accumulated across the whole document and checked once by the caller, so
//! an operator sees every problem in a single pass.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, Field};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Findings from one decode pass.
///
/// Created fresh per decode, checked once immediately after, then discarded.
/// An empty report means the decode is accepted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Keys present in the source document with no matching schema field.
    pub unknown_keys: BTreeSet<String>,
    /// Schema fields with a non-null default that the source document
    /// explicitly set to null.
    pub nullified_required_keys: BTreeSet<String>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.nullified_required_keys.is_empty()
    }

    /// Turn a non-empty report into a single error listing every finding.
    pub fn check(&self, location: &str) -> ConfigResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        let mut parts = Vec::new();
        if !self.unknown_keys.is_empty() {
            parts.push(format!(
                "unknown settings [{}]; please remove them",
                join(&self.unknown_keys)
            ));
        }
        if !self.nullified_required_keys.is_empty() {
            parts.push(format!(
                "settings [{}] may not be set to null",
                join(&self.nullified_required_keys)
            ));
        }
        Err(ConfigError::Invalid(format!(
            "invalid configuration in {location}: {}",
            parts.join("; ")
        )))
    }
}

fn join(keys: &BTreeSet<String>) -> String {
    keys.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Result of one decode pass: the sanitized configuration tree plus the
/// validation findings.
#[derive(Debug, Clone)]
pub struct Decoded {
    tree: Value,
    report: ValidationReport,
}

impl Decoded {
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// The configuration tree with unknown keys and illegal nulls stripped.
    /// Only meaningful once the report has been checked; the strip exists so
    /// a typed document can always be produced from it.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn into_tree(self) -> Value {
        self.tree
    }

    /// Deserialize the typed document.
    pub fn document(&self) -> ConfigResult<Config> {
        Config::from_tree(self.tree.clone())
    }
}

/// Decode raw bytes into a configuration tree, recording every unknown key
/// and every explicit null on a required field.
///
/// `location` only labels diagnostics. Empty input decodes to the default
/// document. Fails only on malformed YAML; validation findings are reported,
/// not raised.
pub fn decode(bytes: &[u8], location: &str) -> ConfigResult<Decoded> {
    let tree: Value = serde_yaml::from_slice(bytes)
        .map_err(|err| ConfigError::syntax(location, err.to_string()))?;

    // An empty file parses to null; use the default configuration rather
    // than failing later on a non-mapping root.
    let tree = match tree {
        Value::Null => Value::Object(Map::new()),
        Value::Object(_) => tree,
        other => {
            return Err(ConfigError::syntax(
                location,
                format!(
                    "expected a mapping of settings at the top level, found {}",
                    kind_name(&other)
                ),
            ));
        }
    };

    let mut report = ValidationReport::default();
    if let Value::Object(map) = &tree {
        check_mapping(map, Config::SCHEMA, "", &mut report);
    }
    let tree = sanitize(tree, Config::SCHEMA);
    Ok(Decoded { tree, report })
}

/// One walk over the document: collect all findings, never abort early.
fn check_mapping(
    map: &Map<String, Value>,
    schema: &'static [Field],
    prefix: &str,
    report: &mut ValidationReport,
) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match schema.iter().find(|field| field.name == key) {
            None => {
                report.unknown_keys.insert(path);
            }
            Some(field) => {
                if value.is_null() && !field.nullable {
                    report.nullified_required_keys.insert(path.clone());
                }
                if let (Some(children), Value::Object(nested)) = (field.children, value) {
                    check_mapping(nested, children, &path, report);
                }
            }
        }
    }
}

/// Drop unknown keys and nulls on required fields so deserialization always
/// succeeds. Nulls on nullable fields are kept (they decode to `None`).
fn sanitize(tree: Value, schema: &'static [Field]) -> Value {
    let Value::Object(map) = tree else {
        return tree;
    };
    let mut clean = Map::new();
    for (key, value) in map {
        let Some(field) = schema.iter().find(|field| field.name == key) else {
            continue;
        };
        if value.is_null() && !field.nullable {
            continue;
        }
        let value = match (field.children, value) {
            (Some(children), nested @ Value::Object(_)) => sanitize(nested, children),
            (_, value) => value,
        };
        clean.insert(key, value);
    }
    Value::Object(clean)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_decodes_to_defaults() {
        let decoded = decode(b"", "test.yaml").unwrap();
        assert!(decoded.report().is_empty());
        assert_eq!(decoded.document().unwrap(), Config::default());
    }

    #[test]
    fn test_comment_only_input_decodes_to_defaults() {
        let decoded = decode(b"# nothing configured yet\n", "test.yaml").unwrap();
        assert!(decoded.report().is_empty());
        assert_eq!(decoded.document().unwrap(), Config::default());
    }

    #[test]
    fn test_well_formed_document_has_empty_report() {
        let source = b"cluster_name: Metrics\nstorage_port: 7100\nlisten_address: 10.0.0.5\n";
        let decoded = decode(source, "test.yaml").unwrap();
        assert!(decoded.report().is_empty());

        let config = decoded.document().unwrap();
        assert_eq!(config.cluster_name, "Metrics");
        assert_eq!(config.storage_port, 7100);
        assert_eq!(config.listen_address.as_deref(), Some("10.0.0.5"));
        // Missing fields stay at their defaults.
        assert_eq!(config.native_transport_port, 9042);
    }

    #[test]
    fn test_unknown_keys_are_all_collected() {
        let source = b"not_a_real_setting: 1\ncluster_name: X\nanother_bogus_key: 2\n";
        let decoded = decode(source, "test.yaml").unwrap();

        assert!(decoded.report().unknown_keys.contains("not_a_real_setting"));
        assert!(decoded.report().unknown_keys.contains("another_bogus_key"));
        assert_eq!(decoded.report().unknown_keys.len(), 2);

        // Decoding continued past the findings.
        assert_eq!(decoded.document().unwrap().cluster_name, "X");
    }

    #[test]
    fn test_null_on_required_field_is_recorded() {
        let decoded = decode(b"cluster_name: null\n", "test.yaml").unwrap();
        assert!(
            decoded
                .report()
                .nullified_required_keys
                .contains("cluster_name")
        );
        // The document is still produced for the caller that checks later.
        assert!(decoded.document().is_ok());
    }

    #[test]
    fn test_null_on_nullable_field_is_accepted() {
        let decoded = decode(b"listen_address: null\n", "test.yaml").unwrap();
        assert!(decoded.report().is_empty());
        assert!(decoded.document().unwrap().listen_address.is_none());
    }

    #[test]
    fn test_nested_unknown_key_uses_dotted_path() {
        let source = b"seed_provider:\n  class_name: x\n  bogus: 1\n";
        let decoded = decode(source, "test.yaml").unwrap();
        assert!(decoded.report().unknown_keys.contains("seed_provider.bogus"));
    }

    #[test]
    fn test_nested_null_on_required_field() {
        let source = b"seed_provider:\n  class_name: null\n";
        let decoded = decode(source, "test.yaml").unwrap();
        assert!(
            decoded
                .report()
                .nullified_required_keys
                .contains("seed_provider.class_name")
        );
    }

    #[test]
    fn test_malformed_yaml_is_fatal() {
        let err = decode(b"cluster_name: [unterminated\n", "bad.yaml").unwrap_err();
        match err {
            ConfigError::Syntax { location, .. } => assert_eq!(location, "bad.yaml"),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_mapping_root_is_fatal() {
        let err = decode(b"- just\n- a\n- list\n", "bad.yaml").unwrap_err();
        assert!(err.to_string().contains("a sequence"));
    }

    #[test]
    fn test_check_lists_every_finding() {
        let source = b"bogus_a: 1\nbogus_b: 2\ncluster_name: null\n";
        let decoded = decode(source, "quartzdb.yaml").unwrap();
        let err = decoded.report().check("quartzdb.yaml").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bogus_a"));
        assert!(message.contains("bogus_b"));
        assert!(message.contains("cluster_name"));
        assert!(message.contains("quartzdb.yaml"));
    }

    #[test]
    fn test_seed_provider_round_trips_typed() {
        let source = b"seed_provider:\n  class_name: org.quartzdb.locator.SimpleSeedProvider\n  parameters:\n    seeds: 10.0.0.1\n";
        let decoded = decode(source, "test.yaml").unwrap();
        assert!(decoded.report().is_empty());

        let provider = decoded.document().unwrap().seed_provider.unwrap();
        assert_eq!(provider.class_name, "org.quartzdb.locator.SimpleSeedProvider");
        assert_eq!(
            provider.parameters.get(&"seeds".to_string()).as_deref(),
            Some("10.0.0.1")
        );
    }
}
