//! Diagnostic reporting for the bus.
//!
//! Every bus owns a [`Diagnostics`] sink handed to it at construction. The
//! default, [`TracingDiagnostics`], forwards reports as structured `tracing`
//! events. Tests can swap in `testing::RecordingDiagnostics`, available with
//! the `test-support` feature.

use std::fmt;

use tracing::Level;

/// Something the bus wants to tell its owner about.
#[derive(Debug)]
pub enum Report<'a> {
	/// A listener declared a handler that cannot be subscribed.
	MalformedHandler {
		listener: &'a str,
		method: &'a str,
		arity: usize,
	},
	/// A handler returned an error while handling an event.
	HandlerFailed {
		event: &'a str,
		listener: &'a str,
		method: Option<&'a str>,
		error: &'a anyhow::Error,
	},
	/// A handler panicked while handling an event.
	HandlerPanicked {
		event: &'a str,
		listener: &'a str,
		method: Option<&'a str>,
		message: &'a str,
	},
	Registered {
		listener: &'a str,
		count: usize,
	},
	Unregistered {
		listener: &'a str,
		count: usize,
	},
}

impl Report<'_> {
	pub fn level(&self) -> Level {
		match self {
			Report::MalformedHandler { .. } => Level::INFO,
			Report::HandlerFailed { .. } | Report::HandlerPanicked { .. } => Level::WARN,
			Report::Registered { .. } | Report::Unregistered { .. } => Level::DEBUG,
		}
	}
}

impl fmt::Display for Report<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Report::MalformedHandler {
				listener,
				method,
				arity,
			} => write!(
				f,
				"method {method} in {listener} takes {arity} parameters, expected exactly one"
			),
			Report::HandlerFailed {
				event,
				listener,
				error,
				..
			} => write!(f, "error dispatching {event} to {listener}: {error:#}"),
			Report::HandlerPanicked {
				event,
				listener,
				message,
				..
			} => write!(f, "handler in {listener} panicked on {event}: {message}"),
			Report::Registered { listener, count } => {
				write!(f, "registered {count} handler(s) for {listener}")
			}
			Report::Unregistered { listener, count } => {
				write!(f, "unregistered {count} handler(s) for {listener}")
			}
		}
	}
}

/// Sink for bus diagnostics.
pub trait Diagnostics: Send + Sync {
	fn report(&self, report: &Report<'_>);
}

/// Forwards reports to `tracing`, tagged with the owning bus's name.
#[derive(Debug, Clone)]
pub struct TracingDiagnostics {
	bus: String,
}

impl TracingDiagnostics {
	pub fn new(bus: impl Into<String>) -> Self {
		Self { bus: bus.into() }
	}
}

impl Default for TracingDiagnostics {
	fn default() -> Self {
		Self::new(crate::options::DEFAULT_BUS_NAME)
	}
}

impl Diagnostics for TracingDiagnostics {
	fn report(&self, report: &Report<'_>) {
		let bus = self.bus.as_str();
		match report {
			Report::MalformedHandler {
				listener,
				method,
				arity,
			} => tracing::info!(
				bus,
				listener,
				method,
				arity,
				"handler does not have a single event parameter, skipping"
			),
			Report::HandlerFailed {
				event,
				listener,
				method,
				error,
			} => {
				let cause = format!("{error:#}");
				tracing::warn!(
					bus,
					event,
					listener,
					method = method.unwrap_or("<closure>"),
					error = %cause,
					"error dispatching event"
				)
			}
			Report::HandlerPanicked {
				event,
				listener,
				method,
				message,
			} => tracing::warn!(
				bus,
				event,
				listener,
				method = method.unwrap_or("<closure>"),
				panic = message,
				"handler panicked during dispatch"
			),
			Report::Registered { listener, count } => {
				tracing::debug!(bus, listener, count, "listener registered")
			}
			Report::Unregistered { listener, count } => {
				tracing::debug!(bus, listener, count, "listener unregistered")
			}
		}
	}
}

#[cfg(any(test, feature = "test-support"))]
pub mod testing {
	//! Test helpers for asserting on bus diagnostics.

	use parking_lot::Mutex;
	use tracing::Level;

	use super::{Diagnostics, Report};

	/// Owned copy of a [`Report`].
	#[derive(Debug, Clone, PartialEq, Eq)]
	pub struct Recorded {
		pub level: Level,
		pub kind: RecordedKind,
		pub message: String,
	}

	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub enum RecordedKind {
		MalformedHandler,
		HandlerFailed,
		HandlerPanicked,
		Registered,
		Unregistered,
	}

	/// Keeps every report it receives.
	#[derive(Debug, Default)]
	pub struct RecordingDiagnostics {
		records: Mutex<Vec<Recorded>>,
	}

	impl RecordingDiagnostics {
		pub fn new() -> Self {
			Self::default()
		}

		pub fn records(&self) -> Vec<Recorded> {
			self.records.lock().clone()
		}

		pub fn of_kind(&self, kind: RecordedKind) -> Vec<Recorded> {
			self.records.lock().iter().filter(|r| r.kind == kind).cloned().collect()
		}
	}

	impl Diagnostics for RecordingDiagnostics {
		fn report(&self, report: &Report<'_>) {
			let kind = match report {
				Report::MalformedHandler { .. } => RecordedKind::MalformedHandler,
				Report::HandlerFailed { .. } => RecordedKind::HandlerFailed,
				Report::HandlerPanicked { .. } => RecordedKind::HandlerPanicked,
				Report::Registered { .. } => RecordedKind::Registered,
				Report::Unregistered { .. } => RecordedKind::Unregistered,
			};
			self.records.lock().push(Recorded {
				level: report.level(),
				kind,
				message: report.to_string(),
			});
		}
	}
}
