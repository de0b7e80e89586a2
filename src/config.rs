//! Runtime settings.
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file,
//! `NODEWATCH_*` environment variables, then command-line overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::data::duration::parse_duration;
use crate::wire::LayoutVersion;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:6767";
pub const DEFAULT_TICK: &str = "1s";
pub const DEFAULT_LOG_FILE: &str = "nodewatch.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_PREFIX: &str = "NODEWATCH";

/// Settings as read from the layered sources, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Address the UDP socket binds to.
    pub listen: String,
    /// Wire layout: `current`, `compact` or `legacy`.
    pub layout: LayoutVersion,
    /// Liveness tick interval, e.g. `"1s"` or `"500ms"`.
    pub tick: String,
    pub log_file: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Values supplied on the command line; `None` leaves the layered value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub layout: Option<LayoutVersion>,
    pub tick: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Settings {
    /// Load settings from `file` (if given), the process environment and
    /// `overrides`.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(file, Environment::with_prefix(ENV_PREFIX), overrides)
    }

    fn load_with_env(file: Option<&Path>, env: Environment, overrides: &Overrides) -> Result<Self> {
        let mut builder = defaults()?;

        if let Some(path) = file {
            if !path.exists() {
                return Err(anyhow!("config file not found: {}", path.display()));
            }
            builder = builder.add_source(File::from(path));
        }

        let log_file = overrides
            .log_file
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let settings = builder
            .add_source(env)
            .set_override_option("listen", overrides.listen.clone())?
            .set_override_option("layout", overrides.layout.map(LayoutVersion::name))?
            .set_override_option("tick", overrides.tick.clone())?
            .set_override_option("log_file", log_file)?
            .set_override_option("log_level", overrides.log_level.clone())?
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        Ok(settings)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .with_context(|| format!("invalid listen address '{}'", self.listen))
    }

    pub fn tick_interval(&self) -> Result<Duration> {
        let tick = parse_duration(&self.tick).with_context(|| format!("invalid tick '{}'", self.tick))?;
        if tick.is_zero() {
            return Err(anyhow!("tick interval must be greater than zero"));
        }
        Ok(tick)
    }
}

fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>> {
    Ok(Config::builder()
        .set_default("listen", DEFAULT_LISTEN)?
        .set_default("layout", LayoutVersion::default().name())?
        .set_default("tick", DEFAULT_TICK)?
        .set_default("log_file", DEFAULT_LOG_FILE)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?)
}
