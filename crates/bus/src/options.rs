//! Bus configuration.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

pub(crate) const DEFAULT_BUS_NAME: &str = "herald";

/// Tunables for an [`EventBus`](crate::EventBus).
///
/// Parsed from TOML; every key is optional:
///
/// ```toml
/// name = "plugins"
/// catch_panics = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusOptions {
	/// Name attached to diagnostics emitted by this bus.
	pub name: String,
	/// Contain handler panics instead of unwinding into the poster.
	pub catch_panics: bool,
}

impl Default for BusOptions {
	fn default() -> Self {
		Self {
			name: DEFAULT_BUS_NAME.to_string(),
			catch_panics: true,
		}
	}
}

impl BusOptions {
	pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
		let options: Self = toml::from_str(src)?;
		if options.name.trim().is_empty() {
			return Err(ConfigError::EmptyName);
		}
		Ok(options)
	}
}

impl FromStr for BusOptions {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_toml(s)
	}
}
