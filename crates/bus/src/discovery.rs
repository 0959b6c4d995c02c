//! Turning a listener into subscribable handler descriptors.

use std::borrow::Cow;
use std::sync::Arc;

use crate::diagnostics::{Diagnostics, Report};
use crate::event::{EventKind, Priority};
use crate::listener::{Listener, ListenerKey};
use crate::target::Target;

/// A handler ready to be registered.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
	pub method: Cow<'static, str>,
	pub event: EventKind,
	pub priority: Priority,
	pub target: Target,
}

/// Extracts handler descriptors from a listener.
///
/// Implementations report unusable candidates through `diagnostics` and leave
/// them out of the result; they never fail the registration as a whole.
pub trait Discovery: Send + Sync {
	fn discover(
		&self,
		key: ListenerKey,
		listener: Arc<dyn Listener>,
		diagnostics: &dyn Diagnostics,
	) -> Vec<HandlerDescriptor>;
}

/// Reads the manifest returned by [`Listener::handlers`].
///
/// Methods that do not take exactly one event are dropped with an
/// [`Report::MalformedHandler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestDiscovery;

impl Discovery for ManifestDiscovery {
	fn discover(
		&self,
		key: ListenerKey,
		listener: Arc<dyn Listener>,
		diagnostics: &dyn Diagnostics,
	) -> Vec<HandlerDescriptor> {
		listener
			.handlers()
			.into_iter()
			.filter_map(|method| {
				if method.arity() != 1 {
					diagnostics.report(&Report::MalformedHandler {
						listener: key.type_name(),
						method: &method.name,
						arity: method.arity(),
					});
					return None;
				}
				let name = method.name.clone();
				let priority = method.priority;
				let target = method.into_target()?;
				Some(HandlerDescriptor {
					method: name,
					event: target.accepts(),
					priority,
					target,
				})
			})
			.collect()
	}
}
