//! Resource resolution: logical configuration names to openable locations.
//!
//! Resolution tries, in order: the environment override for the given key,
//! interpreting the resulting string as a directly openable URI (probed by
//! opening and immediately closing it), and a lookup of the bare name
//! against the configured search directories. Each tier that fails produces
//! a distinct, actionable error, because each implies a different operator
//! fix.

use crate::error::{ConfigError, ConfigResult};
use std::env;
use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

/// Default logical name for the primary configuration resource.
pub const DEFAULT_CONFIG: &str = "quartzdb.yaml";
/// Default logical name for the overlay configuration resource.
pub const DEFAULT_CONFIG_OVERLAY: &str = "quartzdb-overlay.yaml";
/// Overrides the primary configuration location.
pub const ENV_CONFIG: &str = "QUARTZDB_CONFIG";
/// Overrides the overlay configuration location.
pub const ENV_CONFIG_OVERLAY: &str = "QUARTZDB_CONFIG_OVERLAY";
/// Disables overlay processing; must be "true" or "false" when present.
pub const ENV_CONFIG_OVERLAY_DISABLE: &str = "QUARTZDB_CONFIG_OVERLAY_DISABLE";
/// Platform path-separator list of directories searched for bare names.
pub const ENV_CONFIG_SEARCH_PATH: &str = "QUARTZDB_CONFIG_SEARCH_PATH";

/// Required prefix for locally-addressed resources.
pub const LOCAL_PREFIX: &str = "file://";

#[derive(Debug, Clone, PartialEq, Eq)]
enum LocationKind {
    Local(PathBuf),
    Remote(String),
}

/// A resolved, openable configuration resource.
///
/// Keeps the original logical name alongside the concrete address; the name
/// is used for diagnostics and for the facade's default-overlay decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    name: String,
    kind: LocationKind,
}

impl ResourceLocation {
    /// A local file location.
    pub fn local(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: LocationKind::Local(path.into()),
        }
    }

    /// A remote location addressed by URL.
    pub fn remote(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LocationKind::Remote(url.into()),
        }
    }

    /// The logical name this location was resolved from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Verify the location is actually openable by opening and immediately
    /// dropping a handle. A well-formed but unreachable address fails here.
    pub fn probe(&self) -> ConfigResult<()> {
        match &self.kind {
            LocationKind::Local(path) => File::open(path)
                .map(drop)
                .map_err(|err| ConfigError::io(self.to_string(), err.to_string())),
            LocationKind::Remote(url) => reqwest::blocking::get(url.as_str())
                .and_then(reqwest::blocking::Response::error_for_status)
                .map(drop)
                .map_err(|err| ConfigError::io(self.to_string(), err.to_string())),
        }
    }

    /// Read the full contents of the resource.
    pub fn read(&self) -> ConfigResult<Vec<u8>> {
        match &self.kind {
            LocationKind::Local(path) => std::fs::read(path).map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    ConfigError::not_found(self.name.clone(), LOCAL_PREFIX)
                } else {
                    ConfigError::io(self.to_string(), err.to_string())
                }
            }),
            LocationKind::Remote(url) => {
                let response = reqwest::blocking::get(url.as_str())
                    .map_err(|err| ConfigError::io(self.to_string(), err.to_string()))?;
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(ConfigError::not_found(self.name.clone(), LOCAL_PREFIX));
                }
                response
                    .error_for_status()
                    .and_then(|response| response.bytes())
                    .map(|bytes| bytes.to_vec())
                    .map_err(|err| ConfigError::io(self.to_string(), err.to_string()))
            }
        }
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LocationKind::Local(path) => write!(f, "{}", path.display()),
            LocationKind::Remote(url) => write!(f, "{url}"),
        }
    }
}

fn parse_direct(name: &str) -> Option<LocationKind> {
    if let Some(path) = name.strip_prefix(LOCAL_PREFIX) {
        Some(LocationKind::Local(PathBuf::from(path)))
    } else if name.starts_with("http://") || name.starts_with("https://") {
        Some(LocationKind::Remote(name.to_string()))
    } else {
        None
    }
}

/// Resolves logical configuration names against the process environment and
/// a fixed set of search directories.
#[derive(Debug, Clone)]
pub struct Resolver {
    search_path: Vec<PathBuf>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Resolver {
    /// Build the search path from `QUARTZDB_CONFIG_SEARCH_PATH`, defaulting
    /// to the working directory and `conf/`.
    pub fn from_env() -> Self {
        let search_path = env::var_os(ENV_CONFIG_SEARCH_PATH)
            .map(|raw| env::split_paths(&raw).collect())
            .unwrap_or_else(|| vec![PathBuf::from("."), PathBuf::from("conf")]);
        Self { search_path }
    }

    /// Explicit search directories, used by tests and embedding servers.
    pub fn with_search_path(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Resolve using the environment override for `env_key`, falling back to
    /// `default_name`.
    pub fn resolve(&self, env_key: &str, default_name: &str) -> ConfigResult<ResourceLocation> {
        let name = env::var(env_key).unwrap_or_else(|_| default_name.to_string());
        self.resolve_name(env_key, &name)
    }

    /// Resolve a concrete location string. `env_key` only labels diagnostics.
    pub fn resolve_name(&self, env_key: &str, name: &str) -> ConfigResult<ResourceLocation> {
        // Directly openable address. A syntactically valid location that
        // points nowhere is rejected here, not at the first read.
        if let Some(kind) = parse_direct(name) {
            let location = ResourceLocation {
                name: name.to_string(),
                kind,
            };
            match location.probe() {
                Ok(()) => {
                    info!("configuration location: {location}");
                    return Ok(location);
                }
                Err(err) => debug!("direct open of {name} failed: {err}"),
            }
        }

        // Bare (or unreachable) names fall back to the search path.
        for dir in &self.search_path {
            let candidate = dir.join(name);
            if candidate.is_file() {
                let location = ResourceLocation {
                    name: name.to_string(),
                    kind: LocationKind::Local(candidate),
                };
                info!("configuration location: {location}");
                return Ok(location);
            }
        }

        if parse_direct(name).is_none() {
            return Err(ConfigError::Invalid(format!(
                "expecting a URI in {env_key}: found [{name}]; please prefix the file \
                 with [{LOCAL_PREFIX}] for local files and [http://<server>/ or \
                 https://<server>/] for remote files"
            )));
        }
        Err(ConfigError::not_found(name, LOCAL_PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_file_uri_resolves_off_the_search_path() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "node.yaml", "cluster_name: X\n");

        // Empty search path: resolution must come from the direct probe.
        let resolver = Resolver::with_search_path(vec![]);
        let uri = format!("{LOCAL_PREFIX}{}", path.display());
        let location = resolver.resolve_name(ENV_CONFIG, &uri).unwrap();
        assert_eq!(location.name(), uri);
        assert!(location.read().unwrap().starts_with(b"cluster_name"));
    }

    #[test]
    fn test_bare_name_found_on_search_path() {
        let temp = TempDir::new().unwrap();
        write_file(&temp, "quartzdb.yaml", "cluster_name: X\n");

        let resolver = Resolver::with_search_path(vec![temp.path().to_path_buf()]);
        let location = resolver.resolve_name(ENV_CONFIG, "quartzdb.yaml").unwrap();
        assert_eq!(location.name(), "quartzdb.yaml");
        assert!(location.probe().is_ok());
    }

    #[test]
    fn test_bare_name_missing_everywhere_names_required_prefix() {
        let temp = TempDir::new().unwrap();
        let resolver = Resolver::with_search_path(vec![temp.path().to_path_buf()]);

        let err = resolver.resolve_name(ENV_CONFIG, "nowhere.yaml").unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(message.contains("nowhere.yaml"));
        assert!(message.contains(LOCAL_PREFIX));
        assert!(message.contains(ENV_CONFIG));
    }

    #[test]
    fn test_prefixed_but_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let resolver = Resolver::with_search_path(vec![temp.path().to_path_buf()]);

        let uri = format!("{LOCAL_PREFIX}{}/missing.yaml", temp.path().display());
        let err = resolver.resolve_name(ENV_CONFIG, &uri).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn test_search_path_order_first_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_file(&first, "quartzdb.yaml", "cluster_name: First\n");
        write_file(&second, "quartzdb.yaml", "cluster_name: Second\n");

        let resolver = Resolver::with_search_path(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let location = resolver.resolve_name(ENV_CONFIG, "quartzdb.yaml").unwrap();
        let bytes = location.read().unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("First"));
    }

    #[test]
    fn test_unreadable_resource_reports_invalid_with_location() {
        let temp = TempDir::new().unwrap();
        // A directory opens but cannot be read as a file.
        let location = ResourceLocation::local("conf", temp.path());

        let err = location.read().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains(&temp.path().display().to_string()));
    }

    #[test]
    fn test_read_of_deleted_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "gone.yaml", "cluster_name: X\n");
        let location = ResourceLocation::local("gone.yaml", &path);

        std::fs::remove_file(&path).unwrap();
        assert!(location.read().unwrap_err().is_not_found());
    }
}
