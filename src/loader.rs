//! Loader facade: resolve, decode, overlay, return the effective config.
//!
//! Locations and the overlay-disable flag are resolved once, at startup,
//! into [`LoaderSettings`] and passed into the loader explicitly. The loader
//! never re-resolves, even if the environment changes later.

use crate::decode::decode;
use crate::error::{ConfigError, ConfigResult};
use crate::merge::apply_overlay;
use crate::resolve::{
    DEFAULT_CONFIG, DEFAULT_CONFIG_OVERLAY, ENV_CONFIG, ENV_CONFIG_OVERLAY,
    ENV_CONFIG_OVERLAY_DISABLE, ResourceLocation, Resolver,
};
use crate::types::Config;
use serde_json::Value;
use std::env;
use tracing::debug;

/// Resolved configuration locations, computed once per process.
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    primary: ResourceLocation,
    overlay: Option<ResourceLocation>,
    /// Whether the operator explicitly requested an overlay location. A
    /// missing default overlay is benign; a missing requested one is fatal.
    overlay_overridden: bool,
}

impl LoaderSettings {
    /// Resolve everything from the process environment.
    ///
    /// A default-named overlay that fails to resolve yields no overlay. An
    /// explicitly overridden overlay that fails to resolve is an error: the
    /// operator clearly expected one and would not like a surprise.
    pub fn from_env(resolver: &Resolver) -> ConfigResult<Self> {
        let disable_overlay =
            parse_overlay_disable(env::var(ENV_CONFIG_OVERLAY_DISABLE).ok().as_deref())?;
        let primary = resolver.resolve(ENV_CONFIG, DEFAULT_CONFIG)?;

        let override_name = env::var(ENV_CONFIG_OVERLAY).ok();
        let overlay_overridden = override_name.is_some();
        let overlay = if disable_overlay {
            None
        } else {
            let name = override_name.as_deref().unwrap_or(DEFAULT_CONFIG_OVERLAY);
            match resolver.resolve_name(ENV_CONFIG_OVERLAY, name) {
                Ok(location) => Some(location),
                Err(err) if !overlay_overridden => {
                    debug!("no overlay configuration: {err}");
                    None
                }
                Err(err) => return Err(err),
            }
        };

        Ok(Self {
            primary,
            overlay,
            overlay_overridden,
        })
    }

    /// Explicit settings, for tests and embedding servers that manage their
    /// own resolution.
    pub fn new(
        primary: ResourceLocation,
        overlay: Option<ResourceLocation>,
        overlay_overridden: bool,
    ) -> Self {
        Self {
            primary,
            overlay,
            overlay_overridden,
        }
    }

    pub fn primary(&self) -> &ResourceLocation {
        &self.primary
    }

    pub fn overlay(&self) -> Option<&ResourceLocation> {
        self.overlay.as_ref()
    }
}

/// Parse the overlay-disable flag. Absent means enabled; anything other than
/// "true" or "false" (case-insensitive) is fatal.
fn parse_overlay_disable(raw: Option<&str>) -> ConfigResult<bool> {
    match raw {
        None => Ok(false),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ConfigError::Invalid(format!(
                "environment variable '{ENV_CONFIG_OVERLAY_DISABLE}', when present, \
                 should be set to 'true' or 'false'; it was set to '{raw}'"
            ))),
        },
    }
}

/// The single public entry point for configuration loading.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: LoaderSettings,
}

impl ConfigLoader {
    pub fn new(settings: LoaderSettings) -> Self {
        Self { settings }
    }

    /// Resolve locations from the environment once and build a loader.
    pub fn from_env() -> ConfigResult<Self> {
        let settings = LoaderSettings::from_env(&Resolver::from_env())?;
        Ok(Self::new(settings))
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Load the effective configuration: primary, then overlay if present.
    pub fn load(&self) -> ConfigResult<Config> {
        let mut tree = load_tree(&self.settings.primary)?;

        if let Some(overlay) = &self.settings.overlay {
            match load_tree(overlay) {
                Ok(overlay_tree) => apply_overlay(&mut tree, overlay_tree),
                Err(err) if err.is_not_found() && !self.settings.overlay_overridden => {
                    // The default overlay vanished since resolution; not
                    // finding one is expected.
                    debug!("skipping overlay {overlay}: {err}");
                }
                Err(err) => return Err(err),
            }
        }

        Config::from_tree(tree)
    }

    /// Decode exactly one resource, with full validation but no overlay
    /// processing.
    pub fn load_location(location: &ResourceLocation) -> ConfigResult<Config> {
        load_tree(location).and_then(Config::from_tree)
    }
}

fn load_tree(location: &ResourceLocation) -> ConfigResult<Value> {
    debug!("loading settings from {location}");
    let bytes = location.read()?;
    let label = location.to_string();
    let decoded = decode(&bytes, &label)?;
    decoded.report().check(&label)?;
    Ok(decoded.into_tree())
}
