use thiserror::Error;

/// A target was handed an event of a type it cannot accept.
///
/// This only happens when a [`Target`](crate::Target) was registered under a
/// different [`EventKind`](crate::EventKind) than the one it was built for, so
/// the dispatcher treats it as a programming error rather than a handler fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("target for `{expected}` rejected event of type `{actual}`")]
pub struct TargetRejected {
	pub expected: &'static str,
	pub actual: &'static str,
}

/// Bus configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid bus options: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("bus name must not be empty")]
	EmptyName,
}
