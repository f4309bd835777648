//! Server configuration schema and its static descriptor table.
//!
//! The schema itself is owned by the surrounding server; this module declares
//! the typed document plus a static table the decoder consults to tell
//! unknown keys apart from known ones and to know which fields may legally be
//! set to an explicit `null`.

use crate::concurrent::{ConcurrentList, ConcurrentMap, ConcurrentSet};
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One entry in the static schema table.
///
/// The decoder walks the source document against these descriptors instead of
/// doing any runtime introspection.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Setting name as it appears in the YAML document.
    pub name: &'static str,
    /// Whether an explicit `null` in the source document is legal. Fields
    /// whose default value is non-null are not nullable.
    pub nullable: bool,
    /// Descriptors for nested mapping fields. `None` for scalars,
    /// collections, and free-form maps (which accept arbitrary keys).
    pub children: Option<&'static [Field]>,
}

/// The decoded server configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the cluster this node belongs to.
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,

    /// Port for inter-node storage traffic.
    #[serde(default = "default_storage_port")]
    pub storage_port: u16,

    /// Port for the client protocol.
    #[serde(default = "default_native_transport_port")]
    pub native_transport_port: u16,

    /// Commit log sync period in milliseconds.
    #[serde(default = "default_commitlog_sync_period_ms")]
    pub commitlog_sync_period_ms: u64,

    /// Number of concurrent read threads.
    #[serde(default = "default_concurrent_reads")]
    pub concurrent_reads: u32,

    /// Whether the dynamic snitch is enabled.
    #[serde(default = "default_dynamic_snitch")]
    pub dynamic_snitch: bool,

    /// Address to bind for inter-node traffic; `null`/absent means the node
    /// picks one at startup.
    #[serde(default)]
    pub listen_address: Option<String>,

    /// Address to bind for client traffic.
    #[serde(default)]
    pub rpc_address: Option<String>,

    /// Pluggable seed provider with free-form string parameters.
    #[serde(default)]
    pub seed_provider: Option<ParameterizedClass>,

    /// Directories where data files live. Mutated at runtime when disks are
    /// blacklisted, hence the concurrent container.
    #[serde(default)]
    pub data_file_directories: ConcurrentList<String>,

    /// Datacenters excluded from hinted handoff.
    #[serde(default)]
    pub hinted_handoff_disabled_datacenters: ConcurrentSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster_name: default_cluster_name(),
            storage_port: default_storage_port(),
            native_transport_port: default_native_transport_port(),
            commitlog_sync_period_ms: default_commitlog_sync_period_ms(),
            concurrent_reads: default_concurrent_reads(),
            dynamic_snitch: default_dynamic_snitch(),
            listen_address: None,
            rpc_address: None,
            seed_provider: None,
            data_file_directories: ConcurrentList::new(),
            hinted_handoff_disabled_datacenters: ConcurrentSet::new(),
        }
    }
}

fn default_cluster_name() -> String {
    "Test Cluster".to_string()
}

fn default_storage_port() -> u16 {
    7000
}

fn default_native_transport_port() -> u16 {
    9042
}

fn default_commitlog_sync_period_ms() -> u64 {
    10_000
}

fn default_concurrent_reads() -> u32 {
    32
}

fn default_dynamic_snitch() -> bool {
    true
}

const SEED_PROVIDER_FIELDS: &[Field] = &[
    Field {
        name: "class_name",
        nullable: false,
        children: None,
    },
    Field {
        name: "parameters",
        nullable: false,
        children: None,
    },
];

impl Config {
    /// Static schema table consulted by the decoder.
    pub const SCHEMA: &'static [Field] = &[
        Field {
            name: "cluster_name",
            nullable: false,
            children: None,
        },
        Field {
            name: "storage_port",
            nullable: false,
            children: None,
        },
        Field {
            name: "native_transport_port",
            nullable: false,
            children: None,
        },
        Field {
            name: "commitlog_sync_period_ms",
            nullable: false,
            children: None,
        },
        Field {
            name: "concurrent_reads",
            nullable: false,
            children: None,
        },
        Field {
            name: "dynamic_snitch",
            nullable: false,
            children: None,
        },
        Field {
            name: "listen_address",
            nullable: true,
            children: None,
        },
        Field {
            name: "rpc_address",
            nullable: true,
            children: None,
        },
        Field {
            name: "seed_provider",
            nullable: true,
            children: Some(SEED_PROVIDER_FIELDS),
        },
        Field {
            name: "data_file_directories",
            nullable: false,
            children: None,
        },
        Field {
            name: "hinted_handoff_disabled_datacenters",
            nullable: false,
            children: None,
        },
    ];

    /// Build a typed document from an already-validated configuration tree.
    pub fn from_tree(tree: serde_json::Value) -> ConfigResult<Self> {
        serde_json::from_value(tree).map_err(|err| {
            ConfigError::Invalid(format!(
                "configuration does not match the expected schema: {err}"
            ))
        })
    }
}

/// A pluggable component named by class with a free-form parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterizedClass {
    /// Fully-qualified name of the implementation to load.
    #[serde(default)]
    pub class_name: String,

    /// Implementation-specific parameters. Scalar values in the source
    /// document are rendered to strings, so `port: 7000` and `port: "7000"`
    /// decode identically.
    #[serde(default, deserialize_with = "parameter_map")]
    pub parameters: ConcurrentMap<String, String>,
}

impl Default for ParameterizedClass {
    fn default() -> Self {
        Self {
            class_name: String::new(),
            parameters: ConcurrentMap::new(),
        }
    }
}

fn parameter_map<'de, D>(deserializer: D) -> Result<ConcurrentMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = HashMap::<String, serde_json::Value>::deserialize(deserializer)?;
    let map = ConcurrentMap::new();
    for (key, value) in raw {
        let rendered = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(D::Error::custom(format!(
                    "seed_provider parameter '{key}' must be a scalar, found {other}"
                )));
            }
        };
        map.insert(key, rendered);
    }
    Ok(map)
}
